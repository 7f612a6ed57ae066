//! Candidate filters applied before a strategy picks.

use std::time::Duration;

use hopchain_core::defaults::{DEFAULT_FAIL_TIMEOUT_SECS, DEFAULT_MAX_FAILS};

use crate::Selectable;

/// Narrows a candidate set. Filters run in order before the strategy.
pub trait Filter<T>: Send + Sync {
    fn filter(&self, items: Vec<T>) -> Vec<T>;
}

/// Drops candidates that report themselves invalid.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidFilter;

impl<T: Selectable> Filter<T> for InvalidFilter {
    fn filter(&self, mut items: Vec<T>) -> Vec<T> {
        items.retain(|item| item.is_valid());
        items
    }
}

/// Drops candidates that failed too often, too recently.
///
/// A candidate is excluded while its fail count is at least `max_fails` and
/// its last failure is younger than `fail_timeout`. Once the window elapses
/// it is eligible again without an explicit reset. A set of one or fewer
/// candidates passes through untouched.
#[derive(Debug, Clone)]
pub struct FailFilter {
    max_fails: Option<u32>,
    fail_timeout: Duration,
}

impl FailFilter {
    /// Zero values fall back to the crate defaults.
    pub fn new(max_fails: u32, fail_timeout: Duration) -> Self {
        let max_fails = if max_fails == 0 {
            DEFAULT_MAX_FAILS
        } else {
            max_fails
        };
        let fail_timeout = if fail_timeout.is_zero() {
            Duration::from_secs(DEFAULT_FAIL_TIMEOUT_SECS)
        } else {
            fail_timeout
        };
        Self {
            max_fails: Some(max_fails),
            fail_timeout,
        }
    }

    /// A filter that never excludes anything.
    pub fn disabled() -> Self {
        Self {
            max_fails: None,
            fail_timeout: Duration::ZERO,
        }
    }

    pub fn max_fails(&self) -> Option<u32> {
        self.max_fails
    }

    pub fn fail_timeout(&self) -> Duration {
        self.fail_timeout
    }
}

impl Default for FailFilter {
    fn default() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl<T: Selectable> Filter<T> for FailFilter {
    fn filter(&self, mut items: Vec<T>) -> Vec<T> {
        let Some(max_fails) = self.max_fails else {
            return items;
        };
        if items.len() <= 1 {
            return items;
        }
        items.retain(|item| match item.marker() {
            None => true,
            Some(marker) => {
                marker.fail_count() < max_fails
                    || marker
                        .since_last_failure()
                        .map_or(true, |elapsed| elapsed >= self.fail_timeout)
            }
        });
        items
    }
}
