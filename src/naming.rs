//! Deterministic destination naming for catalog items.
//!
//! Layout under the destination root:
//!
//! ```text
//! <root>/<NNN> <arc name>/<NNNN> <item name> (<LANG>_SUB).mp4   episodes
//! <root>/<NNN> <arc name>/<NNNN> <item name>/01.jpg ...         chapter pages
//! <root>/<NNN> <arc name>/<NNNN> <item name>.pdf                chapter artifact
//! ```
//!
//! `NNN` is the arc's display index: the catalog lists arcs newest first, so
//! the arc at storage position `i` of `N` gets `N - i` and the oldest arc
//! sorts first on disk. Nothing here touches the filesystem.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::catalog::{Catalog, Item, ItemKind};

/// Extension of the single streamed file written for episodes.
pub const EPISODE_EXTENSION: &str = "mp4";

/// Extension of the converted document written for chapters.
pub const CHAPTER_EXTENSION: &str = "pdf";

/// Naming failures; always scoped to a single item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamingError {
    /// The item references an arc that is not in the catalog.
    #[error("arc {arc_id} for item {number} ({name}) not found in catalog")]
    ArcNotFound {
        /// The dangling arc id.
        arc_id: i64,
        /// Item number.
        number: u32,
        /// Item name.
        name: String,
    },

    /// The listing gave the item no arc id.
    #[error("item {number} ({name}) has no arc")]
    MissingArc {
        /// Item number.
        number: u32,
        /// Item name.
        name: String,
    },
}

/// Where one item lands on disk, relative to the destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub kind: ItemKind,
    /// Arc directory name, e.g. `001 East Blue`.
    pub dir_name: String,
    /// Episode file name with extension, or chapter page-directory name.
    pub file_name: String,
}

impl Destination {
    /// Arc directory that holds the item's artifact.
    #[must_use]
    pub fn arc_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.dir_name)
    }

    /// Directory that must exist before the item is written.
    ///
    /// Episodes are written straight into the arc directory; chapters get a
    /// per-chapter page directory inside it.
    #[must_use]
    pub fn work_dir(&self, root: &Path) -> PathBuf {
        match self.kind {
            ItemKind::Episode => root.join(&self.dir_name),
            ItemKind::Chapter => root.join(&self.dir_name).join(&self.file_name),
        }
    }

    /// Path whose existence marks the item as done.
    #[must_use]
    pub fn artifact_path(&self, root: &Path) -> PathBuf {
        match self.kind {
            ItemKind::Episode => root.join(&self.dir_name).join(&self.file_name),
            ItemKind::Chapter => root
                .join(&self.dir_name)
                .join(format!("{}.{CHAPTER_EXTENSION}", self.file_name)),
        }
    }

    /// Base path handed to the document converter (artifact without `.pdf`).
    #[must_use]
    pub fn document_base(&self, root: &Path) -> PathBuf {
        root.join(&self.dir_name).join(&self.file_name)
    }
}

/// Computes the destination for `item` within `catalog`.
///
/// # Errors
///
/// Returns [`NamingError::MissingArc`] when the item has no arc id and
/// [`NamingError::ArcNotFound`] when its arc is not in the catalog.
pub fn destination_for(catalog: &Catalog, item: &Item) -> Result<Destination, NamingError> {
    let arc_id = item.arc_id.ok_or_else(|| NamingError::MissingArc {
        number: item.number,
        name: item.name.clone(),
    })?;
    let (storage_index, arc) = catalog
        .arc(arc_id)
        .ok_or_else(|| NamingError::ArcNotFound {
            arc_id,
            number: item.number,
            name: item.name.clone(),
        })?;

    let dir_name = format!(
        "{:03} {}",
        catalog.display_index(storage_index),
        sanitize_component(&arc.name)
    );

    let stem = format!("{:04} {}", item.number, sanitize_component(&item.name));
    let kind = item.kind();
    let file_name = match kind {
        ItemKind::Episode => match item.language_tag() {
            Some(tag) => format!("{stem} ({tag}_SUB).{EPISODE_EXTENSION}"),
            None => format!("{stem}.{EPISODE_EXTENSION}"),
        },
        ItemKind::Chapter => stem,
    };

    Ok(Destination {
        kind,
        dir_name,
        file_name,
    })
}

/// Makes a catalog-provided name safe as a single path component.
///
/// Only separators and control characters are replaced so names stay
/// identical to what earlier runs wrote on disk.
pub(crate) fn sanitize_component(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match sanitized.as_str() {
        "" => "_".to_string(),
        "." | ".." => sanitized.replace('.', "_"),
        _ => sanitized,
    }
}
