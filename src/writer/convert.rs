//! External document conversion (page images → PDF).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::ConvertError;
use crate::naming::CHAPTER_EXTENSION;

/// Default converter program.
pub const MAGICK_PROGRAM: &str = "magick";

/// Bundles ordered page images into one document.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Converts `pages` (in order) into `<base>.pdf` and returns that path.
    async fn convert(&self, pages: &[PathBuf], base: &Path) -> Result<PathBuf, ConvertError>;
}

/// ImageMagick-backed converter.
#[derive(Debug, Clone)]
pub struct ImageMagick {
    program: String,
}

impl Default for ImageMagick {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageMagick {
    /// Uses `magick` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(MAGICK_PROGRAM)
    }

    /// Uses a specific program name or path.
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Verifies the program runs and identifies as ImageMagick.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError`] if it cannot be started or is something else.
    pub async fn check_available(&self) -> Result<(), ConvertError> {
        let output = Command::new(&self.program)
            .arg("-version")
            .output()
            .await
            .map_err(|source| ConvertError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.contains("ImageMagick") {
            debug!(version = stdout.lines().next().unwrap_or(""), "converter available");
            return Ok(());
        }
        Err(ConvertError::Unrecognized {
            program: self.program.clone(),
            output: stdout.lines().next().unwrap_or("").trim().to_string(),
        })
    }
}

/// Returns `<base>.pdf`.
#[must_use]
pub fn document_path(base: &Path) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(CHAPTER_EXTENSION);
    PathBuf::from(name)
}

#[async_trait]
impl DocumentConverter for ImageMagick {
    #[instrument(skip(self, pages), fields(pages = pages.len(), base = %base.display()))]
    async fn convert(&self, pages: &[PathBuf], base: &Path) -> Result<PathBuf, ConvertError> {
        if pages.is_empty() {
            return Err(ConvertError::NoPages);
        }
        let target = document_path(base);

        let output = Command::new(&self.program)
            .args(pages)
            .args(["-quality", "100", "-density", "150"])
            .arg(&target)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ConvertError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConvertError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!(target = %target.display(), "document converted");
        Ok(target)
    }
}
