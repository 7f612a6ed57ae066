//! Configuration structures for routers and chains.
//!
//! A chain config lists hops in order; each hop lists candidate nodes and
//! optionally a selector. Node adapters are named (`dialer`, `connector`)
//! and looked up in a [`Registry`](crate::Registry) when the chain is built.

use std::collections::HashSet;
use std::path::PathBuf;

use hopchain_core::defaults::{
    DEFAULT_DIAL_TIMEOUT_SECS, DEFAULT_FAIL_TIMEOUT_SECS, DEFAULT_MAX_FAILS, DEFAULT_RETRIES,
};
use hopchain_selector::StrategyKind;
use serde::{Deserialize, Serialize};

use crate::error::ChainError;
use crate::metadata::Metadata;

// ── Router ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Extra attempts after the first.
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Per-attempt dial timeout in seconds; 0 disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the chain to route through. None means direct.
    #[serde(default)]
    pub chain: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            timeout_secs: default_timeout_secs(),
            chain: None,
        }
    }
}

// ── Chain ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,

    /// Ordered hops. Empty means direct connection.
    #[serde(default)]
    pub hops: Vec<HopConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopConfig {
    #[serde(default)]
    pub name: String,

    /// Selector for this hop. Absent means the default selector
    /// (round-robin with invalid and fail filters).
    #[serde(default)]
    pub selector: Option<SelectorConfig>,

    /// Applied to nodes of this hop that have no bypass of their own.
    #[serde(default)]
    pub bypass: Option<BypassConfig>,

    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub name: String,

    /// Node address (host:port).
    pub addr: String,

    #[serde(default = "default_dialer")]
    pub dialer: String,

    #[serde(default = "default_connector")]
    pub connector: String,

    #[serde(default)]
    pub bypass: Option<BypassConfig>,

    /// Adapter options passed to dialer and connector init.
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Failures before a node is skipped. Zero means the default; a
    /// negative value disables failure filtering for the hop.
    #[serde(default = "default_max_fails")]
    pub max_fails: i32,

    #[serde(default = "default_fail_timeout_secs")]
    pub fail_timeout_secs: u64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            max_fails: default_max_fails(),
            fail_timeout_secs: default_fail_timeout_secs(),
        }
    }
}

/// Inline patterns, a pattern file, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BypassConfig {
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Pattern file in the line format accepted by `Bypass::parse`.
    #[serde(default)]
    pub file: Option<PathBuf>,

    #[serde(default)]
    pub reverse: bool,
}

fn default_retries() -> usize {
    DEFAULT_RETRIES
}
fn default_timeout_secs() -> u64 {
    DEFAULT_DIAL_TIMEOUT_SECS
}
fn default_dialer() -> String {
    "tcp".to_string()
}
fn default_connector() -> String {
    "forward".to_string()
}
fn default_max_fails() -> i32 {
    DEFAULT_MAX_FAILS as i32
}
fn default_fail_timeout_secs() -> u64 {
    DEFAULT_FAIL_TIMEOUT_SECS
}

/// Reject configs that would build a broken chain set.
pub fn validate_chains(chains: &[ChainConfig]) -> Result<(), ChainError> {
    let mut names = HashSet::new();
    for chain in chains {
        if chain.name.is_empty() {
            return Err(ChainError::Config("chain name must not be empty".into()));
        }
        if !names.insert(chain.name.as_str()) {
            return Err(ChainError::Config(format!(
                "duplicate chain name: {}",
                chain.name
            )));
        }
        for (i, hop) in chain.hops.iter().enumerate() {
            if hop.nodes.is_empty() {
                return Err(ChainError::Config(format!(
                    "chain {}: hop {} has no nodes",
                    chain.name, i
                )));
            }
            if let Some(node) = hop.nodes.iter().find(|n| n.addr.trim().is_empty()) {
                return Err(ChainError::Config(format!(
                    "chain {}: hop {}: node '{}' has no address",
                    chain.name, i, node.name
                )));
            }
        }
    }
    Ok(())
}

/// Check that the router references an existing chain.
pub fn validate_router(router: &RouterConfig, chains: &[ChainConfig]) -> Result<(), ChainError> {
    if let Some(name) = &router.chain {
        if !chains.iter().any(|c| &c.name == name) {
            return Err(ChainError::Config(format!("unknown chain: {name}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Doc {
        #[serde(default)]
        router: RouterConfig,
        #[serde(default)]
        chains: Vec<ChainConfig>,
    }

    const SAMPLE: &str = r#"
[router]
retries = 2
chain = "main"

[[chains]]
name = "main"

[[chains.hops]]
name = "hop-0"
selector = { strategy = "ha", max_fails = 3 }

[[chains.hops.nodes]]
name = "a"
addr = "10.0.0.1:1080"
bypass = { patterns = ["10.0.0.0/8", ".internal"] }
metadata = { timeout = 5, mux = "true" }

[[chains.hops.nodes]]
name = "b"
addr = "10.0.0.2:1080"
dialer = "tcp"
connector = "forward"

[[chains]]
name = "direct"
"#;

    #[test]
    fn parse_sample() {
        let doc: Doc = toml::from_str(SAMPLE).unwrap();
        assert_eq!(doc.router.retries, 2);
        assert_eq!(doc.router.timeout_secs, DEFAULT_DIAL_TIMEOUT_SECS);
        assert_eq!(doc.router.chain.as_deref(), Some("main"));
        assert_eq!(doc.chains.len(), 2);

        let hop = &doc.chains[0].hops[0];
        let selector = hop.selector.as_ref().unwrap();
        assert_eq!(selector.strategy, StrategyKind::Fifo);
        assert_eq!(selector.max_fails, 3);
        assert_eq!(selector.fail_timeout_secs, DEFAULT_FAIL_TIMEOUT_SECS);

        let a = &hop.nodes[0];
        assert_eq!(a.dialer, "tcp");
        assert_eq!(a.connector, "forward");
        assert_eq!(a.bypass.as_ref().unwrap().patterns.len(), 2);
        assert!(!a.bypass.as_ref().unwrap().reverse);
        assert_eq!(a.metadata.get_u64("timeout"), Some(5));
        assert_eq!(a.metadata.get_bool("mux"), Some(true));

        assert!(doc.chains[1].hops.is_empty());
        validate_chains(&doc.chains).unwrap();
        validate_router(&doc.router, &doc.chains).unwrap();
    }

    #[test]
    fn rejects_duplicate_names() {
        let chains = vec![
            ChainConfig { name: "x".into(), hops: vec![] },
            ChainConfig { name: "x".into(), hops: vec![] },
        ];
        assert!(validate_chains(&chains).is_err());
    }

    #[test]
    fn rejects_empty_hop_and_address() {
        let empty_hop = ChainConfig {
            name: "x".into(),
            hops: vec![HopConfig {
                name: String::new(),
                selector: None,
                bypass: None,
                nodes: vec![],
            }],
        };
        assert!(validate_chains(&[empty_hop]).is_err());

        let doc: Doc = toml::from_str(
            r#"
[[chains]]
name = "x"
[[chains.hops]]
nodes = [{ name = "n", addr = " " }]
"#,
        )
        .unwrap();
        let err = validate_chains(&doc.chains).unwrap_err();
        assert!(err.to_string().contains("'n'"));
    }

    #[test]
    fn rejects_unknown_router_chain() {
        let router = RouterConfig {
            chain: Some("missing".into()),
            ..Default::default()
        };
        assert!(validate_router(&router, &[]).is_err());
        assert!(validate_router(&RouterConfig::default(), &[]).is_ok());
    }
}
