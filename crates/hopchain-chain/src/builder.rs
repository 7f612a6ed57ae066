//! Turn configuration into live chains.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use hopchain_bypass::Bypass;
use hopchain_selector::{FailFilter, InvalidFilter, Selector};
use tracing::debug;

use crate::chain::Chain;
use crate::config::{BypassConfig, ChainConfig, HopConfig, NodeConfig, SelectorConfig};
use crate::error::ChainError;
use crate::node::{Node, NodeGroup};
use crate::registry::Registry;
use crate::transport::Transport;

/// Build one chain. Adapter names must be known to `registry`.
pub fn build_chain(config: &ChainConfig, registry: &Registry) -> Result<Chain, ChainError> {
    let mut chain = Chain::new(&config.name);
    for (i, hop) in config.hops.iter().enumerate() {
        chain.add_group(build_hop(&config.name, i, hop, registry)?);
    }
    debug!(chain = %config.name, hops = config.hops.len(), "chain built");
    Ok(chain)
}

/// Build every chain, keyed by name.
pub fn build_chains(
    configs: &[ChainConfig],
    registry: &Registry,
) -> Result<HashMap<String, Arc<Chain>>, ChainError> {
    configs
        .iter()
        .map(|c| Ok((c.name.clone(), Arc::new(build_chain(c, registry)?))))
        .collect()
}

/// A negative `max_fails` keeps the invalid filter but disables the fail
/// filter.
pub fn build_selector(config: &SelectorConfig) -> Selector<Arc<Node>> {
    let fail_timeout = Duration::from_secs(config.fail_timeout_secs);
    match u32::try_from(config.max_fails) {
        Ok(max_fails) => Selector::with_fail_filter(config.strategy, max_fails, fail_timeout),
        Err(_) => Selector::new(config.strategy.build())
            .with_filter(InvalidFilter)
            .with_filter(FailFilter::disabled()),
    }
}

pub fn build_bypass(config: &BypassConfig) -> Result<Bypass, ChainError> {
    let mut bypass = Bypass::from_patterns(&config.patterns, config.reverse)?;
    if let Some(path) = &config.file {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ChainError::Config(format!("bypass file {}: {e}", path.display())))?;
        let from_file = Bypass::parse(&text)?;
        let mut matchers = bypass.matchers().to_vec();
        matchers.extend_from_slice(from_file.matchers());
        bypass = Bypass::new(matchers, config.reverse || from_file.is_reversed());
    }
    Ok(bypass)
}

fn build_hop(
    chain: &str,
    index: usize,
    hop: &HopConfig,
    registry: &Registry,
) -> Result<NodeGroup, ChainError> {
    let label = if hop.name.is_empty() {
        format!("chain {chain}: hop {index}")
    } else {
        format!("chain {chain}: hop {index} ({})", hop.name)
    };
    let in_hop = |e: ChainError| match e {
        ChainError::Config(msg) => ChainError::Config(format!("{label}: {msg}")),
        other => other,
    };

    let hop_bypass = hop
        .bypass
        .as_ref()
        .map(build_bypass)
        .transpose()
        .map_err(in_hop)?
        .map(Arc::new);

    let mut group = NodeGroup::default();
    for (i, node) in hop.nodes.iter().enumerate() {
        let built = build_node(node, i, registry).map_err(in_hop)?;
        let built = match (built.bypass().is_some(), &hop_bypass) {
            (false, Some(b)) => built.with_bypass(b.clone()),
            _ => built,
        };
        group.push(built);
    }

    let selector = match &hop.selector {
        Some(cfg) => build_selector(cfg),
        None => Selector::default_for_nodes(),
    };
    Ok(group.with_selector(Arc::new(selector)))
}

fn build_node(config: &NodeConfig, index: usize, registry: &Registry) -> Result<Node, ChainError> {
    let name = if config.name.is_empty() {
        format!("node-{index}")
    } else {
        config.name.clone()
    };
    let dialer = registry.dialer(&config.dialer, &config.metadata)?;
    let connector = registry.connector(&config.connector, &config.metadata)?;
    let transport = Transport::new(&config.addr, dialer, connector);

    let mut node = Node::new(name, &config.addr, transport);
    if let Some(bypass) = &config.bypass {
        node = node.with_bypass(Arc::new(build_bypass(bypass)?));
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Chainer;
    use crate::metadata::Metadata;
    use hopchain_selector::StrategyKind;
    use std::io::Write;

    fn node(name: &str, addr: &str) -> NodeConfig {
        NodeConfig {
            name: name.into(),
            addr: addr.into(),
            dialer: "tcp".into(),
            connector: "forward".into(),
            bypass: None,
            metadata: Metadata::new(),
        }
    }

    fn hop(nodes: Vec<NodeConfig>) -> HopConfig {
        HopConfig {
            name: String::new(),
            selector: None,
            bypass: None,
            nodes,
        }
    }

    #[test]
    fn builds_groups_with_selectors() {
        let config = ChainConfig {
            name: "main".into(),
            hops: vec![
                hop(vec![node("a", "10.0.0.1:1080"), node("", "10.0.0.2:1080")]),
                HopConfig {
                    selector: Some(SelectorConfig {
                        strategy: StrategyKind::Fifo,
                        ..Default::default()
                    }),
                    ..hop(vec![node("c", "10.0.0.3:1080")])
                },
            ],
        };
        let chain = build_chain(&config, &Registry::with_builtins()).unwrap();
        assert_eq!(chain.name(), "main");
        assert_eq!(chain.groups().len(), 2);
        assert_eq!(chain.groups()[0].nodes()[1].name(), "node-1");
        assert_eq!(chain.groups()[0].selector().unwrap().strategy_name(), "round");
        assert_eq!(chain.groups()[1].selector().unwrap().strategy_name(), "fifo");
        assert_eq!(chain.route("tcp", "example.com:80").len(), 2);
    }

    #[test]
    fn unknown_adapter_is_config_error() {
        let mut bad = node("a", "10.0.0.1:1080");
        bad.connector = "socks5".into();
        let config = ChainConfig {
            name: "main".into(),
            hops: vec![hop(vec![bad])],
        };
        let err = build_chain(&config, &Registry::with_builtins()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("chain main: hop 0"), "{msg}");
        assert!(msg.contains("socks5"), "{msg}");
    }

    #[test]
    fn hop_name_appears_in_errors() {
        let mut bad = node("a", "10.0.0.1:1080");
        bad.dialer = "quic".into();
        let config = ChainConfig {
            name: "main".into(),
            hops: vec![
                hop(vec![node("ok", "10.0.0.2:1080")]),
                HopConfig {
                    name: "egress".into(),
                    ..hop(vec![bad])
                },
            ],
        };
        let msg = build_chain(&config, &Registry::with_builtins())
            .unwrap_err()
            .to_string();
        assert!(msg.contains("chain main: hop 1 (egress)"), "{msg}");
        assert!(msg.contains("quic"), "{msg}");
    }

    #[test]
    fn hop_bypass_fills_missing_node_bypass() {
        let mut own = node("own", "10.0.0.1:1080");
        own.bypass = Some(BypassConfig {
            patterns: vec!["own.example".into()],
            ..Default::default()
        });
        let config = ChainConfig {
            name: "bp".into(),
            hops: vec![HopConfig {
                bypass: Some(BypassConfig {
                    patterns: vec!["*.internal".into()],
                    ..Default::default()
                }),
                ..hop(vec![own, node("inherit", "10.0.0.2:1080")])
            }],
        };
        let chain = build_chain(&config, &Registry::with_builtins()).unwrap();
        let nodes = chain.groups()[0].nodes();
        assert!(nodes[0].bypass().unwrap().contains("own.example:80"));
        assert!(!nodes[0].bypass().unwrap().contains("db.internal:80"));
        assert!(nodes[1].bypass().unwrap().contains("db.internal:80"));
    }

    #[test]
    fn bypass_file_is_merged() {
        let path = std::env::temp_dir().join(format!("hopchain-bypass-{}.txt", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# private").unwrap();
        writeln!(file, "192.168.0.0/16").unwrap();
        drop(file);

        let bypass = build_bypass(&BypassConfig {
            patterns: vec!["example.org".into()],
            file: Some(path.clone()),
            reverse: false,
        })
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(bypass.len(), 2);
        assert!(bypass.contains("192.168.1.1:22"));
        assert!(bypass.contains("example.org:443"));

        let missing = build_bypass(&BypassConfig {
            file: Some("/nonexistent/hopchain/bypass.txt".into()),
            ..Default::default()
        });
        assert!(matches!(missing, Err(ChainError::Config(_))));
    }

    #[test]
    fn negative_max_fails_disables_fail_filter() {
        let chain_with = |max_fails: i32| {
            let config = ChainConfig {
                name: "ha".into(),
                hops: vec![HopConfig {
                    selector: Some(SelectorConfig {
                        strategy: StrategyKind::Fifo,
                        max_fails,
                        fail_timeout_secs: 60,
                    }),
                    ..hop(vec![node("a", "10.0.0.1:1080"), node("b", "10.0.0.2:1080")])
                }],
            };
            build_chain(&config, &Registry::with_builtins()).unwrap()
        };

        let filtered = chain_with(1);
        filtered.groups()[0].nodes()[0].fail_marker().mark();
        assert_eq!(filtered.route("tcp", "example.com:80").nodes()[0].name(), "b");

        let unfiltered = chain_with(-1);
        unfiltered.groups()[0].nodes()[0].fail_marker().mark();
        unfiltered.groups()[0].nodes()[0].fail_marker().mark();
        assert_eq!(unfiltered.route("tcp", "example.com:80").nodes()[0].name(), "a");
        assert_eq!(unfiltered.groups()[0].selector().unwrap().filter_count(), 2);
    }

    #[test]
    fn build_chains_keys_by_name() {
        let configs = vec![
            ChainConfig { name: "a".into(), hops: vec![] },
            ChainConfig { name: "b".into(), hops: vec![hop(vec![node("n", "10.0.0.1:1")])] },
        ];
        let chains = build_chains(&configs, &Registry::with_builtins()).unwrap();
        assert!(chains["a"].is_empty());
        assert_eq!(chains["b"].groups().len(), 1);
    }
}
