//! Catalog fetch-and-decode: listing page → `window.__data` JSON → [`Catalog`].

use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{Catalog, CatalogError, Item, ItemExtra, ItemKind, StoryArc};
use crate::fetch::Fetcher;
use crate::html::{absolutize_url, window_data_payload};

const EPISODE_LISTING_PATH: &str = "/anime/episoden-streams";
const CHAPTER_LISTING_PATH: &str = "/manga/kapitel-mangaliste";

#[derive(Debug, Deserialize)]
struct EpisodeListing {
    #[serde(default)]
    arcs: Vec<StoryArc>,
    #[serde(default)]
    entries: Vec<EpisodeEntry>,
}

#[derive(Debug, Deserialize)]
struct EpisodeEntry {
    #[serde(default)]
    number: Option<u32>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arc_id: Option<i64>,
    #[serde(default)]
    lang_sub: Option<String>,
    #[serde(default)]
    lang_dub: Option<String>,
    #[serde(default)]
    is_available: Option<bool>,
    #[serde(default)]
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChapterListing {
    #[serde(default)]
    arcs: Vec<StoryArc>,
    #[serde(default, alias = "entries")]
    chapters: Vec<ChapterEntry>,
}

#[derive(Debug, Deserialize)]
struct ChapterEntry {
    #[serde(default)]
    number: Option<u32>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arc_id: Option<i64>,
    #[serde(default)]
    pages: Option<u32>,
    #[serde(default)]
    href: Option<String>,
}

/// Remote catalog listing for one product variant.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    origin: String,
    kind: ItemKind,
}

impl CatalogSource {
    /// Creates a source for `kind` rooted at `origin` (e.g. `https://onepiece-tube.com`).
    #[must_use]
    pub fn new(origin: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            kind,
        }
    }

    /// Returns the product variant served by this source.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Returns the absolute URL of the listing page.
    #[must_use]
    pub fn listing_url(&self) -> String {
        let path = match self.kind {
            ItemKind::Episode => EPISODE_LISTING_PATH,
            ItemKind::Chapter => CHAPTER_LISTING_PATH,
        };
        format!("{}{path}", self.origin)
    }

    /// Fetches and decodes a fresh catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the listing cannot be fetched, carries no
    /// payload, or the payload does not decode.
    #[instrument(skip(self, fetcher), fields(kind = self.kind.as_str()))]
    pub async fn fetch_catalog(&self, fetcher: &dyn Fetcher) -> Result<Catalog, CatalogError> {
        let url = self.listing_url();
        debug!(url = %url, "fetching catalog listing");

        let page = fetcher
            .get_text(&url)
            .await
            .map_err(|e| CatalogError::fetch(&url, e))?;

        let payload =
            window_data_payload(&page.body).ok_or_else(|| CatalogError::missing_payload(&url))?;
        let catalog = decode_catalog(&payload, self.kind, &page.url)
            .map_err(|e| CatalogError::decode(&url, e))?;

        info!(
            arcs = catalog.arcs.len(),
            items = catalog.items.len(),
            resolvable = catalog.resolvable_count(),
            "catalog fetched"
        );
        Ok(catalog)
    }
}

/// Decodes a `window.__data` JSON payload into a [`Catalog`].
///
/// Relative item links are resolved against `base_url`.
///
/// # Errors
///
/// Returns the JSON error when the payload does not match the listing shape.
pub fn decode_catalog(
    payload: &str,
    kind: ItemKind,
    base_url: &str,
) -> Result<Catalog, serde_json::Error> {
    let absolute = |href: Option<String>| {
        href.and_then(|h| absolutize_url(&h, base_url))
            .unwrap_or_default()
    };

    match kind {
        ItemKind::Episode => {
            let listing: EpisodeListing = serde_json::from_str(payload)?;
            let items = listing
                .entries
                .into_iter()
                .map(|entry| Item {
                    number: entry.number.unwrap_or_default(),
                    name: entry.name.unwrap_or_default(),
                    arc_id: entry.arc_id,
                    href: absolute(entry.href),
                    extra: ItemExtra::Episode {
                        lang_sub: entry.lang_sub.unwrap_or_default(),
                        lang_dub: entry.lang_dub.unwrap_or_default(),
                        is_available: entry.is_available.unwrap_or_default(),
                    },
                })
                .collect();
            Ok(Catalog {
                arcs: listing.arcs,
                items,
            })
        }
        ItemKind::Chapter => {
            let listing: ChapterListing = serde_json::from_str(payload)?;
            let items = listing
                .chapters
                .into_iter()
                .map(|entry| Item {
                    number: entry.number.unwrap_or_default(),
                    name: entry.name.unwrap_or_default(),
                    arc_id: entry.arc_id,
                    href: absolute(entry.href),
                    extra: ItemExtra::Chapter {
                        pages: entry.pages.unwrap_or_default(),
                    },
                })
                .collect();
            Ok(Catalog {
                arcs: listing.arcs,
                items,
            })
        }
    }
}
