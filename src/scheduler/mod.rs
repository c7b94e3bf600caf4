//! Download scheduler: one sequential pass over a freshly fetched catalog.
//!
//! For every item, in catalog order:
//!
//! 1. skip it if it has no resolvable page (not counted against the quota);
//! 2. name its destination and create the arc directory;
//! 3. skip it without any network activity if the artifact already exists;
//! 4. resolve its media and write it;
//! 5. on success, pause for `delay`, or for `long_delay` when the quota is
//!    reached (the counter then resets).
//!
//! Per-item failures are logged and never abort the pass. The quota counter
//! lives only as long as one [`DownloadScheduler::run_cycle`] call.

mod pacer;
mod quota;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use pacer::{Pacer, TokioPacer};
pub use quota::{PauseKind, QuotaPolicy, QuotaState};

use crate::catalog::{Catalog, Item};
use crate::fetch::Fetcher;
use crate::naming::{NamingError, destination_for};
use crate::resolver::{LinkResolver, ResolveError};
use crate::writer::{MediaWriter, WriteError, WriteOutcome};

/// Inputs for one scheduling pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Pause after each successful download.
    pub delay: Duration,
    /// Pause after the download that reaches `daily_limit`.
    pub long_delay: Duration,
    /// Successes per long pause.
    pub daily_limit: u32,
    /// Root of the destination tree.
    pub dest_root: PathBuf,
}

impl SchedulerConfig {
    /// Quota policy derived from this config.
    #[must_use]
    pub fn quota_policy(&self) -> QuotaPolicy {
        QuotaPolicy {
            delay: self.delay,
            long_delay: self.long_delay,
            daily_limit: self.daily_limit,
        }
    }
}

/// Why a single item could not be downloaded this cycle.
#[derive(Debug, Error)]
pub enum ItemError {
    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to check for existing artifact {path}: {source}")]
    CheckExisting {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

impl ItemError {
    /// Short label for log fields.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Naming(_) => "naming",
            Self::CreateDir { .. } => "create_dir",
            Self::CheckExisting { .. } => "check_existing",
            Self::Resolve(_) => "resolve",
            Self::Write(_) => "write",
        }
    }
}

/// Per-cycle counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    downloaded: usize,
    skipped_existing: usize,
    skipped_unavailable: usize,
    failed: usize,
}

impl CycleReport {
    /// Items downloaded in this cycle.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded
    }

    /// Items skipped because their artifact was already present.
    #[must_use]
    pub fn skipped_existing(&self) -> usize {
        self.skipped_existing
    }

    /// Items skipped because they had no resolvable page.
    #[must_use]
    pub fn skipped_unavailable(&self) -> usize {
        self.skipped_unavailable
    }

    /// Items that failed naming, resolution or writing.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// All items seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped_existing + self.skipped_unavailable + self.failed
    }
}

enum ItemOutcome {
    Downloaded { path: PathBuf, bytes: u64 },
    AlreadyPresent { path: PathBuf },
}

/// Drives resolution and writing for one catalog at a time.
pub struct DownloadScheduler {
    config: SchedulerConfig,
    resolver: LinkResolver,
    writer: MediaWriter,
    pacer: Arc<dyn Pacer>,
}

impl std::fmt::Debug for DownloadScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadScheduler")
            .field("config", &self.config)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl DownloadScheduler {
    /// Creates a scheduler.
    #[must_use]
    pub fn new(
        config: SchedulerConfig,
        resolver: LinkResolver,
        writer: MediaWriter,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            config,
            resolver,
            writer,
            pacer,
        }
    }

    /// Runs one pass over `catalog`.
    ///
    /// Never fails: every per-item error is logged and counted.
    #[instrument(skip(self, catalog, fetcher), fields(items = catalog.items.len(), root = %self.config.dest_root.display()))]
    pub async fn run_cycle(&self, catalog: &Catalog, fetcher: &dyn Fetcher) -> CycleReport {
        let policy = self.config.quota_policy();
        let mut quota = QuotaState::new();
        let mut report = CycleReport::default();

        for item in &catalog.items {
            if !item.has_resolvable_href() {
                debug!(number = item.number, name = %item.name, "item has no page yet, skipping");
                report.skipped_unavailable += 1;
                continue;
            }

            match self.process_item(catalog, item, fetcher).await {
                Ok(ItemOutcome::AlreadyPresent { path }) => {
                    debug!(path = %path.display(), "already downloaded, skipping");
                    report.skipped_existing += 1;
                }
                Ok(ItemOutcome::Downloaded { path, bytes }) => {
                    report.downloaded += 1;
                    let (kind, pause) = quota.record_success(&policy);
                    info!(
                        number = item.number,
                        path = %path.display(),
                        bytes,
                        quota = quota.count(),
                        "item downloaded"
                    );
                    self.pacer.pause(kind, pause).await;
                }
                Err(error) => {
                    report.failed += 1;
                    warn!(
                        number = item.number,
                        name = %item.name,
                        stage = error.stage(),
                        error = %error,
                        "item skipped"
                    );
                }
            }
        }

        info!(
            downloaded = report.downloaded(),
            skipped_existing = report.skipped_existing(),
            skipped_unavailable = report.skipped_unavailable(),
            failed = report.failed(),
            "cycle complete"
        );
        report
    }

    async fn process_item(
        &self,
        catalog: &Catalog,
        item: &Item,
        fetcher: &dyn Fetcher,
    ) -> Result<ItemOutcome, ItemError> {
        let root = self.config.dest_root.as_path();
        let dest = destination_for(catalog, item)?;
        create_dir(&dest.arc_dir(root)).await?;

        let artifact = dest.artifact_path(root);
        let present = tokio::fs::try_exists(&artifact)
            .await
            .map_err(|source| ItemError::CheckExisting {
                path: artifact.clone(),
                source,
            })?;
        if present {
            return Ok(ItemOutcome::AlreadyPresent { path: artifact });
        }

        let resolution = self.resolver.resolve(fetcher, item).await?;
        create_dir(&dest.work_dir(root)).await?;

        match self.writer.write(fetcher, &dest, root, resolution).await? {
            WriteOutcome::Written { path, bytes } => Ok(ItemOutcome::Downloaded { path, bytes }),
            WriteOutcome::AlreadyPresent { path } => Ok(ItemOutcome::AlreadyPresent { path }),
        }
    }
}

async fn create_dir(path: &Path) -> Result<(), ItemError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| ItemError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}
