//! Media writing: turns a [`Resolution`] into the item's artifact on disk.
//!
//! - [`Resolution::Single`] streams one body straight to the artifact path.
//! - [`Resolution::Pages`] writes `01.<ext>`, `02.<ext>`, … into the chapter's
//!   page directory, then hands them to a [`DocumentConverter`].
//!
//! An existing artifact is never overwritten, and the artifact path only
//! appears once it is complete: both variants write to a `.part` sibling
//! and rename it at the end.

mod convert;
mod error;
mod pages;
mod single;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

pub use convert::{DocumentConverter, ImageMagick, MAGICK_PROGRAM, document_path};
pub use error::{ConvertError, WriteError};
pub use pages::page_extension;

use crate::catalog::ItemKind;
use crate::fetch::Fetcher;
use crate::naming::Destination;
use crate::resolver::Resolution;

/// What a write call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The artifact was produced by this call.
    Written {
        /// Artifact path.
        path: PathBuf,
        /// Media bytes fetched for it.
        bytes: u64,
    },
    /// The artifact was already on disk; nothing was fetched.
    AlreadyPresent {
        /// Artifact path.
        path: PathBuf,
    },
}

/// Writes resolved media below a destination root.
#[derive(Clone)]
pub struct MediaWriter {
    converter: Arc<dyn DocumentConverter>,
}

impl std::fmt::Debug for MediaWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaWriter").finish_non_exhaustive()
    }
}

impl MediaWriter {
    /// Creates a writer that bundles chapter pages with `converter`.
    #[must_use]
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self { converter }
    }

    /// Writes `resolution` for the item at `dest` under `root`.
    ///
    /// The item's work directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] on fetch, IO or conversion failure. Partial
    /// single-file artifacts and failed documents are removed first.
    #[instrument(skip(self, fetcher, dest, resolution), fields(file = %dest.file_name))]
    pub async fn write(
        &self,
        fetcher: &dyn Fetcher,
        dest: &Destination,
        root: &Path,
        resolution: Resolution,
    ) -> Result<WriteOutcome, WriteError> {
        let artifact = dest.artifact_path(root);
        let present = tokio::fs::try_exists(&artifact)
            .await
            .map_err(|e| WriteError::io(&artifact, e))?;
        if present {
            debug!(path = %artifact.display(), "artifact already present");
            return Ok(WriteOutcome::AlreadyPresent { path: artifact });
        }

        match (dest.kind, resolution) {
            (ItemKind::Episode, Resolution::Single(media)) => {
                let bytes = single::write_single(fetcher, &media, &artifact).await?;
                Ok(WriteOutcome::Written {
                    path: artifact,
                    bytes,
                })
            }
            (ItemKind::Chapter, Resolution::Pages(pages)) => {
                let page_dir = dest.work_dir(root);
                let (paths, bytes) = pages::write_pages(fetcher, &pages, &page_dir).await?;
                let path =
                    pages::bundle(self.converter.as_ref(), &paths, &dest.document_base(root))
                        .await?;
                Ok(WriteOutcome::Written { path, bytes })
            }
            (kind, _) => Err(WriteError::ShapeMismatch {
                kind: kind.as_str(),
            }),
        }
    }
}
