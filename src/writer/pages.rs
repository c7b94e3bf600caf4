//! Multi-page variant: numbered page images plus document conversion.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{DocumentConverter, WriteError, document_path};
use crate::fetch::{Fetcher, partial_path};
use crate::resolver::MediaRef;

/// File extension for an accepted page media type.
#[must_use]
pub fn page_extension(media_type: &str) -> Option<&'static str> {
    match media_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Fetches every page in order and writes `NN.<ext>` into `page_dir`.
///
/// Returns the written paths in page order and the total byte count.
pub(super) async fn write_pages(
    fetcher: &dyn Fetcher,
    pages: &[MediaRef],
    page_dir: &Path,
) -> Result<(Vec<PathBuf>, u64), WriteError> {
    let mut paths = Vec::with_capacity(pages.len());
    let mut total = 0u64;

    for (index, page) in pages.iter().enumerate() {
        let ext =
            page_extension(&page.media_type).ok_or_else(|| WriteError::UnsupportedPageType {
                url: page.url.clone(),
                media_type: page.media_type.clone(),
            })?;
        let path = page_dir.join(format!("{:02}.{ext}", index + 1));

        let bytes = fetcher.get_bytes(&page.url).await?;
        if bytes.is_empty() {
            return Err(WriteError::EmptyPage {
                url: page.url.clone(),
            });
        }
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| WriteError::io(&path, e))?;

        total += bytes.len() as u64;
        debug!(page = index + 1, path = %path.display(), bytes = bytes.len(), "page written");
        paths.push(path);
    }

    Ok((paths, total))
}

/// Converts `paths` into `<base>.pdf`.
///
/// The converter writes `<base>.part.pdf`, which is renamed into place on
/// success and removed on failure.
pub(super) async fn bundle(
    converter: &dyn DocumentConverter,
    paths: &[PathBuf],
    base: &Path,
) -> Result<PathBuf, WriteError> {
    let partial_base = partial_path(base);
    let document = document_path(base);

    let result = match converter.convert(paths, &partial_base).await {
        Ok(converted) => tokio::fs::rename(&converted, &document)
            .await
            .map_err(|e| WriteError::io(&document, e)),
        Err(error) => Err(WriteError::Convert(error)),
    };

    if let Err(error) = result {
        let partial = document_path(&partial_base);
        match tokio::fs::remove_file(&partial).await {
            Ok(()) => debug!(path = %partial.display(), "removed partial document"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %partial.display(), error = %e, "failed to remove partial document"),
        }
        return Err(error);
    }

    info!(path = %document.display(), pages = paths.len(), "chapter written");
    Ok(document)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::writer::ConvertError;

    /// Writes the requested document, optionally failing afterwards.
    struct FileConverter {
        fail: bool,
    }

    #[async_trait]
    impl DocumentConverter for FileConverter {
        async fn convert(&self, _: &[PathBuf], base: &Path) -> Result<PathBuf, ConvertError> {
            let target = document_path(base);
            std::fs::write(&target, b"%PDF").unwrap();
            if self.fail {
                return Err(ConvertError::Failed {
                    program: "magick".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: String::new(),
                });
            }
            Ok(target)
        }
    }

    #[tokio::test]
    async fn test_bundle_renames_finished_document_into_place() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("1044 Warrior of Liberation");
        let pages = [temp.path().join("01.jpg")];

        let document = bundle(&FileConverter { fail: false }, &pages, &base)
            .await
            .unwrap();

        assert_eq!(document, temp.path().join("1044 Warrior of Liberation.pdf"));
        assert!(document.exists());
        assert!(!temp.path().join("1044 Warrior of Liberation.part.pdf").exists());
    }

    #[tokio::test]
    async fn test_bundle_failure_leaves_no_document() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("1044 Warrior of Liberation");
        let pages = [temp.path().join("01.jpg")];

        let err = bundle(&FileConverter { fail: true }, &pages, &base)
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Convert(_)));
        assert!(!document_path(&base).exists());
        assert!(!temp.path().join("1044 Warrior of Liberation.part.pdf").exists());
    }

    #[test]
    fn test_page_extension_per_type() {
        assert_eq!(page_extension("image/jpeg"), Some("jpg"));
        assert_eq!(page_extension("image/png"), Some("png"));
        assert_eq!(page_extension("image/gif"), None);
    }
}
