//! Constants for the fetch module (timeouts, partial files).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (30 minutes between reads, not per transfer).
pub const READ_TIMEOUT_SECS: u64 = 1800;

/// Suffix of the file a download streams into until it completes.
pub const PARTIAL_SUFFIX: &str = ".part";
