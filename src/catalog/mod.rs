//! Typed catalog of story arcs and the items (episodes or chapters) inside them.
//!
//! A [`Catalog`] is rebuilt from scratch on every refresh cycle, consumed by
//! one scheduler pass, and dropped. There is no merge with earlier cycles; the
//! destination file tree is the only record of what was already downloaded.

mod error;
mod source;

pub use error::CatalogError;
pub use source::{CatalogSource, decode_catalog};

use serde::Deserialize;

/// Which product variant a catalog (and its items) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// Single streamed video file per item.
    Episode,
    /// Ordered page images per item, bundled into a PDF.
    Chapter,
}

impl ItemKind {
    /// Returns the stable lowercase label used in log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Episode => "episode",
            Self::Chapter => "chapter",
        }
    }
}

/// A narrative grouping; determines the destination subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoryArc {
    pub id: i64,
    pub name: String,
}

/// Variant-specific item fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemExtra {
    Episode {
        /// Subtitle language tag (e.g. `de`), empty when unknown.
        lang_sub: String,
        /// Dub language tag, empty when unknown.
        lang_dub: String,
        is_available: bool,
    },
    Chapter {
        /// Number of pages announced by the listing.
        pages: u32,
    },
}

/// A single downloadable unit belonging to exactly one arc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub number: u32,
    pub name: String,
    /// Owning arc; `None` when the listing omits it.
    pub arc_id: Option<i64>,
    /// Absolute URL of the item's page; empty when the source lists the item
    /// without a page yet.
    pub href: String,
    pub extra: ItemExtra,
}

impl Item {
    /// Returns the product variant this item belongs to.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self.extra {
            ItemExtra::Episode { .. } => ItemKind::Episode,
            ItemExtra::Chapter { .. } => ItemKind::Chapter,
        }
    }

    /// Returns true if the item has a page that can be resolved.
    ///
    /// Chapters announced with zero pages are not published yet.
    #[must_use]
    pub fn has_resolvable_href(&self) -> bool {
        if self.href.trim().is_empty() {
            return false;
        }
        match self.extra {
            ItemExtra::Episode { .. } => true,
            ItemExtra::Chapter { pages } => pages > 0,
        }
    }

    /// Uppercased subtitle language tag for episodes, if any.
    #[must_use]
    pub fn language_tag(&self) -> Option<String> {
        match &self.extra {
            ItemExtra::Episode { lang_sub, .. } if !lang_sub.trim().is_empty() => {
                Some(lang_sub.trim().to_uppercase())
            }
            _ => None,
        }
    }
}

/// The full set of arcs and items discovered in one refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    /// Arcs in source order (newest first on the reference site).
    pub arcs: Vec<StoryArc>,
    /// Items in source order; the scheduler processes them in this order.
    pub items: Vec<Item>,
}

impl Catalog {
    /// Looks up an arc by id, returning its storage position alongside it.
    #[must_use]
    pub fn arc(&self, id: i64) -> Option<(usize, &StoryArc)> {
        self.arcs.iter().enumerate().find(|(_, arc)| arc.id == id)
    }

    /// Maps a storage position to its display index (`len - position`), so the
    /// oldest arc of a newest-first listing gets index 1.
    #[must_use]
    pub fn display_index(&self, storage_index: usize) -> usize {
        self.arcs.len().saturating_sub(storage_index)
    }

    /// Number of items that have a resolvable page.
    #[must_use]
    pub fn resolvable_count(&self) -> usize {
        self.items.iter().filter(|i| i.has_resolvable_href()).count()
    }
}
