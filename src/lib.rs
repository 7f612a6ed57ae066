//! # hopchain
//!
//! A chain routing engine for multi-hop proxy tunnels.
//!
//! ## Crates
//!
//! - [`hopchain_core`] - Shared defaults and error labels
//! - [`hopchain_bypass`] - Address matchers, bypass and admission lists
//! - [`hopchain_selector`] - Fail markers, filters and selection strategies
//! - [`hopchain_chain`] - Nodes, chains, routes and the retrying router
//! - [`hopchain_dns`] - DNS resolver and static hosts table

pub mod cli;
pub mod config;

pub use hopchain_bypass as bypass;
pub use hopchain_chain as chain;
pub use hopchain_core as core;
pub use hopchain_dns as dns;
pub use hopchain_selector as selector;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::{build_router, load_config, validate_config, Config};
    pub use hopchain_bypass::{Admission, Bypass};
    pub use hopchain_chain::{
        Chain, ChainError, Chainer, Conn, HotChain, Node, NodeGroup, Registry, Route, Router,
        Transport,
    };
    pub use hopchain_selector::{FailMarker, Selector, StrategyKind};
}
