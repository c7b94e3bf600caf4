//! Catalog downloader core library.
//!
//! Keeps a local copy of a remote, arc-grouped media catalog (episodes or
//! chapters) up to date: each refresh fetches the catalog, resolves every
//! missing item through its page and embedded container to the raw media,
//! writes the artifact under a deterministic path, and paces downloads
//! under a daily quota.
//!
//! # Architecture
//!
//! - [`catalog`] - Catalog model and listing fetch/decode
//! - [`fetch`] - HTTP fetching behind the [`Fetcher`] seam
//! - [`resolver`] - Item page → container → media state machine
//! - [`naming`] - Deterministic destination paths
//! - [`writer`] - Artifact writing and PDF conversion
//! - [`scheduler`] - Per-cycle pass with quota and pacing
//! - [`clock`] - Daily refresh wake-up

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod clock;
pub mod fetch;
pub mod html;
pub mod naming;
pub mod resolver;
pub mod scheduler;
mod user_agent;
pub mod writer;

#[cfg(test)]
pub mod test_support;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, CatalogSource, Item, ItemExtra, ItemKind, StoryArc};
pub use clock::{UpdateClock, next_update, weekday_from_index};
pub use fetch::{FetchError, Fetcher, HttpClient};
pub use naming::{Destination, NamingError, destination_for};
pub use resolver::{LinkResolver, MediaRef, Resolution, ResolveError};
pub use scheduler::{
    CycleReport, DownloadScheduler, ItemError, Pacer, PauseKind, QuotaPolicy, QuotaState,
    SchedulerConfig, TokioPacer,
};
pub use writer::{ConvertError, DocumentConverter, ImageMagick, MediaWriter, WriteError};
