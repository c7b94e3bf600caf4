//! Single-file variant: stream one media body to its artifact path.

use std::path::Path;

use tracing::info;

use super::WriteError;
use crate::fetch::Fetcher;
use crate::resolver::MediaRef;

/// Streams `media` to `artifact`; the fetcher removes partial files on error.
pub(super) async fn write_single(
    fetcher: &dyn Fetcher,
    media: &MediaRef,
    artifact: &Path,
) -> Result<u64, WriteError> {
    let bytes = fetcher.download_to_file(&media.url, artifact).await?;
    info!(path = %artifact.display(), bytes, "episode written");
    Ok(bytes)
}
