//! HTTP fetching for catalog pages, nested containers, and raw media.
//!
//! The [`Fetcher`] trait is the single network seam used by the catalog
//! source, the link resolver, and the media writer. [`HttpClient`] is the
//! production implementation on top of `reqwest`.
//!
//! # Example
//!
//! ```no_run
//! use catalog_dl_core::fetch::{Fetcher, HttpClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let page = client.get_text("https://example.com/episode/1").await?;
//! println!("{} bytes from {}", page.body.len(), page.url);
//! # Ok(())
//! # }
//! ```

mod client;
mod constants;
mod error;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use client::HttpClient;
pub use constants::{CONNECT_TIMEOUT_SECS, PARTIAL_SUFFIX, READ_TIMEOUT_SECS};
pub use error::FetchError;

/// A fetched text document together with its final (post-redirect) URL.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL the body was served from; relative links resolve against it.
    pub url: String,
    /// Decoded response body.
    pub body: String,
}

/// Network collaborator used identically for top-level pages, nested
/// containers, and media bodies.
///
/// # Object Safety
///
/// Uses `async_trait` so the scheduler can hold a `&dyn Fetcher`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns its body as text.
    async fn get_text(&self, url: &str) -> Result<FetchedPage, FetchError>;

    /// Fetches `url` and buffers its body in memory.
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;

    /// Streams the body of `url` into `dest`, returning the number of bytes
    /// written.
    ///
    /// `dest` only ever appears complete: the body is written to
    /// [`partial_path`] and renamed once flushed. A failed or dropped call
    /// never leaves a file at `dest`.
    async fn download_to_file(&self, url: &str, dest: &Path) -> Result<u64, FetchError>;
}

/// Sibling path a download streams into before it is renamed to `dest`.
#[must_use]
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}
