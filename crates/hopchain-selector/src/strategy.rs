//! Selection strategies.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SelectorError;
use crate::SelectContext;

/// Picks one index out of a non-empty, already-filtered candidate set.
pub trait Strategy: Send + Sync {
    /// Returns `None` only when `len == 0`.
    fn apply(&self, ctx: &SelectContext<'_>, len: usize) -> Option<usize>;

    fn name(&self) -> &'static str;
}

/// Strategy identifier, used in configuration files.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    #[serde(alias = "round", alias = "rr")]
    RoundRobin,
    #[serde(alias = "rand")]
    Random,
    /// First healthy candidate ("ha").
    #[serde(alias = "ha")]
    Fifo,
    Hash,
}

impl StrategyKind {
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::RoundRobin => Box::new(RoundRobin::new()),
            StrategyKind::Random => Box::new(Random),
            StrategyKind::Fifo => Box::new(Fifo),
            StrategyKind::Hash => Box::new(HashKey),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "round" | "rr" | "round_robin" => Ok(StrategyKind::RoundRobin),
            "random" | "rand" => Ok(StrategyKind::Random),
            "fifo" | "ha" => Ok(StrategyKind::Fifo),
            "hash" => Ok(StrategyKind::Hash),
            other => Err(SelectorError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Cycles through candidates with a shared atomic counter.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self {
            counter: AtomicUsize::new(0),
        }
    }
}

impl Strategy for RoundRobin {
    fn apply(&self, _ctx: &SelectContext<'_>, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.counter.fetch_add(1, Ordering::Relaxed) % len)
    }

    fn name(&self) -> &'static str {
        "round"
    }
}

/// Uniform random pick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Random;

impl Strategy for Random {
    fn apply(&self, _ctx: &SelectContext<'_>, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(rand::thread_rng().gen_range(0..len))
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Always the first candidate of the filtered set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fifo;

impl Strategy for Fifo {
    fn apply(&self, _ctx: &SelectContext<'_>, len: usize) -> Option<usize> {
        (len > 0).then_some(0)
    }

    fn name(&self) -> &'static str {
        "fifo"
    }
}

/// Deterministic pick keyed by the selection context.
///
/// The same key maps to the same position for a given candidate count.
/// Without a key it behaves like [`Fifo`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HashKey;

impl Strategy for HashKey {
    fn apply(&self, ctx: &SelectContext<'_>, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let Some(key) = ctx.key else {
            return Some(0);
        };
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        Some((hasher.finish() as usize) % len)
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}
