//! Error types for catalog fetching and decoding.

use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that abort a whole refresh cycle.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The listing page could not be fetched.
    #[error("failed to fetch catalog listing {url}: {source}")]
    Fetch {
        /// The listing URL.
        url: String,
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The listing page has no `window.__data` payload.
    #[error("catalog listing {url} has no embedded data payload")]
    MissingPayload {
        /// The listing URL.
        url: String,
    },

    /// The embedded payload is not valid catalog JSON.
    #[error("failed to decode catalog payload from {url}: {source}")]
    Decode {
        /// The listing URL.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl CatalogError {
    /// Creates a fetch error.
    pub fn fetch(url: impl Into<String>, source: FetchError) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    /// Creates a missing-payload error.
    pub fn missing_payload(url: impl Into<String>) -> Self {
        Self::MissingPayload { url: url.into() }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }
}
