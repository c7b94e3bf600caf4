//! Error types for media writing and document conversion.

use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::FetchError;

/// Failures turning a resolution into files on disk.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Fetching a media body failed.
    #[error("failed to fetch media: {0}")]
    Fetch(#[from] FetchError),

    /// A page body was empty.
    #[error("empty page body from {url}")]
    EmptyPage {
        /// The page URL.
        url: String,
    },

    /// The resolution shape does not fit the item kind.
    #[error("unexpected resolution for {kind} item")]
    ShapeMismatch {
        /// Item kind label.
        kind: &'static str,
    },

    /// A page media type has no known file extension.
    #[error("unsupported page media type '{media_type}' for {url}")]
    UnsupportedPageType {
        /// The page URL.
        url: String,
        /// The declared media type.
        media_type: String,
    },

    /// Local filesystem failure.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The path being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Page images were written but could not be bundled.
    #[error("document conversion failed: {0}")]
    Convert(#[from] ConvertError),
}

impl WriteError {
    /// Creates an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures of the external document converter.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The converter binary could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        /// Program name.
        program: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The converter ran but reported failure.
    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        /// Program name.
        program: String,
        /// Exit status as text.
        status: String,
        /// Trimmed stderr output.
        stderr: String,
    },

    /// The converter is installed but is not the expected tool.
    #[error("'{program}' is not ImageMagick (version output: {output})")]
    Unrecognized {
        /// Program name.
        program: String,
        /// First line of the version output.
        output: String,
    },

    /// No pages were given.
    #[error("no pages to convert")]
    NoPages,
}
