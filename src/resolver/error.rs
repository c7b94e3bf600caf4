//! Error types for link resolution.
//!
//! Every variant is terminal for the item within the current cycle; the
//! scheduler logs it and moves on.

use thiserror::Error;

use super::ResolveStage;
use crate::fetch::FetchError;

/// Why an item's media location could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A page or container fetch failed.
    #[error("fetch failed while {stage} ({url}): {source}")]
    Fetch {
        /// The URL that failed.
        url: String,
        /// Stage the machine was leaving when the fetch failed.
        stage: ResolveStage,
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The item page has no embedded player frame or data script.
    #[error("no media container on page {url}")]
    NoContainer {
        /// The item page URL.
        url: String,
    },

    /// The container was found but its contents are unusable.
    #[error("invalid media container at {url}: {reason}")]
    InvalidContainer {
        /// The container URL.
        url: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The container holds no media-source element.
    #[error("no media source in container {url}")]
    NoMedia {
        /// The container URL.
        url: String,
    },

    /// A media element declares a type outside the accepted whitelist.
    #[error("media at {url} declares type '{found}', expected one of: {accepted}")]
    TypeMismatch {
        /// The container URL.
        url: String,
        /// The declared type (`<none>` when missing).
        found: String,
        /// Comma-separated accepted types.
        accepted: String,
    },

    /// More than one acceptable media element where exactly one is required.
    #[error("{count} acceptable media sources in container {url}, expected exactly one")]
    AmbiguousMedia {
        /// The container URL.
        url: String,
        /// Number of distinct acceptable sources.
        count: usize,
    },
}

impl ResolveError {
    /// Creates a fetch error for `stage`.
    pub fn fetch(url: impl Into<String>, stage: ResolveStage, source: FetchError) -> Self {
        Self::Fetch {
            url: url.into(),
            stage,
            source,
        }
    }

    /// Creates a missing-container error.
    pub fn no_container(url: impl Into<String>) -> Self {
        Self::NoContainer { url: url.into() }
    }

    /// Creates an invalid-container error.
    pub fn invalid_container(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidContainer {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing-media error.
    pub fn no_media(url: impl Into<String>) -> Self {
        Self::NoMedia { url: url.into() }
    }

    /// Creates a type-mismatch error.
    pub fn type_mismatch(url: impl Into<String>, found: Option<&str>, accepted: &[&str]) -> Self {
        Self::TypeMismatch {
            url: url.into(),
            found: found.unwrap_or("<none>").to_string(),
            accepted: accepted.join(", "),
        }
    }

    /// Creates an ambiguous-media error.
    pub fn ambiguous(url: impl Into<String>, count: usize) -> Self {
        Self::AmbiguousMedia {
            url: url.into(),
            count,
        }
    }

    /// Short stable label for structured log fields.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::NoContainer { .. } => "no_container",
            Self::InvalidContainer { .. } => "invalid_container",
            Self::NoMedia { .. } => "no_media",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::AmbiguousMedia { .. } => "ambiguous_media",
        }
    }
}
