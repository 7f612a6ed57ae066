//! Lock-free per-node failure tracking.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Rolling failure counter for a single node.
///
/// Shared by every connection that dials through the node. The count and
/// the last-failure timestamp are independent atomics; there is no
/// cross-field invariant, so no lock is needed.
#[derive(Debug, Default)]
pub struct FailMarker {
    fail_count: AtomicU32,
    /// Unix time of the most recent failure in milliseconds, 0 = never.
    fail_time: AtomicU64,
}

impl FailMarker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure now.
    pub fn mark(&self) {
        self.fail_count.fetch_add(1, Ordering::Relaxed);
        self.fail_time.store(now_millis(), Ordering::Relaxed);
    }

    /// Clear the failure count after a success.
    ///
    /// The last failure time is kept; it only matters while the count is
    /// non-zero.
    pub fn reset(&self) {
        self.fail_count.store(0, Ordering::Relaxed);
    }

    pub fn fail_count(&self) -> u32 {
        self.fail_count.load(Ordering::Relaxed)
    }

    /// Unix time of the last failure in milliseconds, `None` if never failed.
    pub fn fail_time(&self) -> Option<u64> {
        match self.fail_time.load(Ordering::Relaxed) {
            0 => None,
            t => Some(t),
        }
    }

    /// Time elapsed since the last failure, `None` if never failed.
    pub fn since_last_failure(&self) -> Option<Duration> {
        self.fail_time()
            .map(|t| Duration::from_millis(now_millis().saturating_sub(t)))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
