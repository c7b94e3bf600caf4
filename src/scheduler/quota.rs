//! Per-cycle download quota and backoff policy.
//!
//! Every successful download is followed by a pause. The success that brings
//! the counter to `daily_limit` gets the long pause and resets the counter, so
//! with limit 2 the pauses run `delay, long, delay, long, ...`.

use std::time::Duration;

/// Pause lengths and the count that triggers the long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    pub delay: Duration,
    pub long_delay: Duration,
    pub daily_limit: u32,
}

/// Which pause the quota picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseKind {
    /// Regular spacing between downloads.
    Delay,
    /// Quota reached; counter was reset.
    LongDelay,
}

impl PauseKind {
    /// Label for log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delay => "delay",
            Self::LongDelay => "long_delay",
        }
    }
}

/// Success counter local to one scheduling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuotaState {
    count: u32,
}

impl QuotaState {
    /// Starts a fresh cycle at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Successes since the last reset.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Records one success and returns the pause that must follow it.
    pub fn record_success(&mut self, policy: &QuotaPolicy) -> (PauseKind, Duration) {
        self.count = self.count.saturating_add(1);
        if self.count >= policy.daily_limit {
            self.count = 0;
            (PauseKind::LongDelay, policy.long_delay)
        } else {
            (PauseKind::Delay, policy.delay)
        }
    }
}
