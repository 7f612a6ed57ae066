//! Failure-aware selection for hopchain.
//!
//! A [`Selector`] composes zero or more [`Filter`]s with exactly one
//! [`Strategy`]. Filters narrow the candidate set (dropping invalid or
//! recently failing candidates); the strategy then picks one survivor.
//!
//! Built-in strategies: round-robin, random, FIFO ("ha") and key hash.
//!
//! The [`Selector`] is `Send + Sync` and designed to be shared across async
//! tasks via `Arc<Selector<T>>`.

pub mod error;
pub mod filter;
pub mod marker;
pub mod strategy;

use std::sync::Arc;
use std::time::Duration;

pub use error::SelectorError;
pub use filter::{FailFilter, Filter, InvalidFilter};
pub use marker::FailMarker;
pub use strategy::{Fifo, HashKey, Random, RoundRobin, Strategy, StrategyKind};

/// Something a [`Selector`] can choose between.
pub trait Selectable {
    /// Health tracker consulted by [`FailFilter`]. Candidates without one
    /// are always considered healthy.
    fn marker(&self) -> Option<&FailMarker> {
        None
    }

    /// Whether the candidate is usable at all (consulted by [`InvalidFilter`]).
    fn is_valid(&self) -> bool {
        true
    }
}

impl<T: Selectable + ?Sized> Selectable for Arc<T> {
    fn marker(&self) -> Option<&FailMarker> {
        (**self).marker()
    }

    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }
}

/// Per-call selection input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectContext<'a> {
    /// Affinity key for [`HashKey`], typically the destination host.
    pub key: Option<&'a str>,
}

/// Filters plus one strategy.
pub struct Selector<T> {
    filters: Vec<Box<dyn Filter<T>>>,
    strategy: Box<dyn Strategy>,
}

impl<T: Clone> Selector<T> {
    /// A selector with no filters.
    pub fn new(strategy: Box<dyn Strategy>) -> Self {
        Self {
            filters: Vec::new(),
            strategy,
        }
    }

    /// Append a filter. Filters run in insertion order.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Filter<T> + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Pick one candidate, or `None` when every candidate was filtered out.
    pub fn select(&self, ctx: &SelectContext<'_>, items: &[T]) -> Option<T> {
        let mut candidates = items.to_vec();
        for filter in &self.filters {
            candidates = filter.filter(candidates);
        }
        let idx = self.strategy.apply(ctx, candidates.len())?;
        candidates.into_iter().nth(idx)
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }
}

impl<T: Selectable + Clone + 'static> Selector<T> {
    /// Strategy plus the invalid and fail filters.
    pub fn with_fail_filter(kind: StrategyKind, max_fails: u32, fail_timeout: Duration) -> Self {
        Self::new(kind.build())
            .with_filter(InvalidFilter)
            .with_filter(FailFilter::new(max_fails, fail_timeout))
    }

    /// The selector used when a hop configures none explicitly.
    pub fn default_for_nodes() -> Self {
        Self::with_fail_filter(StrategyKind::default(), 0, Duration::ZERO)
    }
}

impl<T> std::fmt::Debug for Selector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("strategy", &self.strategy.name())
            .field("filters", &self.filters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Node {
        name: &'static str,
        marker: Arc<FailMarker>,
    }

    impl Selectable for Node {
        fn marker(&self) -> Option<&FailMarker> {
            Some(&self.marker)
        }

        fn is_valid(&self) -> bool {
            !self.name.is_empty()
        }
    }

    fn nodes(names: &[&'static str]) -> Vec<Arc<Node>> {
        names
            .iter()
            .map(|name| {
                Arc::new(Node {
                    name,
                    marker: Arc::new(FailMarker::new()),
                })
            })
            .collect()
    }

    const CTX: SelectContext<'static> = SelectContext { key: None };

    #[test]
    fn round_robin_visits_each_node_once() {
        let set = nodes(&["a", "b", "c", "d"]);
        let selector = Selector::default_for_nodes();
        let mut seen: Vec<&str> = (0..set.len())
            .map(|_| selector.select(&CTX, &set).unwrap().name)
            .collect();
        seen.sort();
        assert_eq!(seen, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn fifo_returns_first_healthy() {
        let set = nodes(&["a", "b", "c"]);
        let selector = Selector::with_fail_filter(StrategyKind::Fifo, 1, Duration::from_secs(60));
        assert_eq!(selector.select(&CTX, &set).unwrap().name, "a");

        set[0].marker.mark();
        assert_eq!(selector.select(&CTX, &set).unwrap().name, "b");

        set[1].marker.mark();
        assert_eq!(selector.select(&CTX, &set).unwrap().name, "c");
    }

    #[test]
    fn fifo_recovers_after_window() {
        let set = nodes(&["a", "b"]);
        let selector =
            Selector::with_fail_filter(StrategyKind::Fifo, 1, Duration::from_millis(50));
        set[0].marker.mark();
        assert_eq!(selector.select(&CTX, &set).unwrap().name, "b");

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(selector.select(&CTX, &set).unwrap().name, "a");
    }

    #[test]
    fn all_failed_yields_none() {
        let set = nodes(&["a", "b"]);
        for n in &set {
            n.marker.mark();
        }
        let selector = Selector::with_fail_filter(StrategyKind::RoundRobin, 1, Duration::from_secs(60));
        assert!(selector.select(&CTX, &set).is_none());
    }

    #[test]
    fn invalid_nodes_skipped() {
        let set = nodes(&["", "b"]);
        let selector = Selector::with_fail_filter(StrategyKind::Fifo, 1, Duration::from_secs(60));
        assert_eq!(selector.select(&CTX, &set).unwrap().name, "b");
    }

    #[test]
    fn empty_input_yields_none() {
        let selector: Selector<Arc<Node>> = Selector::default_for_nodes();
        assert!(selector.select(&CTX, &[]).is_none());
    }

    #[test]
    fn unfiltered_selector() {
        let set = nodes(&["a", "b"]);
        set[0].marker.mark();
        let selector = Selector::new(StrategyKind::Fifo.build());
        assert_eq!(selector.filter_count(), 0);
        assert_eq!(selector.select(&CTX, &set).unwrap().name, "a");
    }

    #[test]
    fn debug_shows_strategy() {
        let selector: Selector<Arc<Node>> = Selector::default_for_nodes();
        let dbg = format!("{selector:?}");
        assert!(dbg.contains("round"));
        assert_eq!(selector.filter_count(), 2);
    }

    #[test]
    fn send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Selector<Arc<Node>>>();
        assert_send_sync::<FailMarker>();
    }
}
