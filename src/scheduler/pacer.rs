//! Injectable sleep seam for download pacing.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::PauseKind;

/// Suspends the scheduler between downloads.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits for `duration`.
    async fn pause(&self, kind: PauseKind, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, kind: PauseKind, duration: Duration) {
        info!(kind = kind.as_str(), secs = duration.as_secs(), "pausing");
        tokio::time::sleep(duration).await;
    }
}
