//! Chains: ordered hops composed into a route per destination.

use std::sync::Arc;

use arc_swap::ArcSwap;
use hopchain_selector::SelectContext;
use tracing::debug;

use crate::node::NodeGroup;
use crate::resolve::split_host_port;
use crate::route::Route;

/// Anything that can produce a route for a destination.
pub trait Chainer: Send + Sync {
    fn route(&self, network: &str, address: &str) -> Route;
}

/// A named, ordered list of hops.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    name: String,
    groups: Vec<NodeGroup>,
}

impl Chain {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: NodeGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn add_group(&mut self, group: NodeGroup) {
        self.groups.push(group);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn groups(&self) -> &[NodeGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl Chainer for Chain {
    /// Pick one node per hop.
    ///
    /// Composition stops early, keeping the nodes chosen so far, when a hop
    /// has no eligible node or the chosen node's bypass covers `address`.
    /// A multiplexing node absorbs the route built so far as its upstream
    /// and restarts the route from itself.
    fn route(&self, _network: &str, address: &str) -> Route {
        let mut route = Route::new();
        if self.groups.is_empty() {
            return route;
        }

        let host = split_host_port(address).map_or(address, |(host, _)| host);
        let ctx = SelectContext { key: Some(host) };

        for (hop, group) in self.groups.iter().enumerate() {
            let Some(node) = group.next(&ctx) else {
                debug!(chain = %self.name, hop, "no eligible node, route truncated");
                break;
            };

            if node.bypass().is_some_and(|b| b.contains(address)) {
                debug!(chain = %self.name, node = %node.name(), address, "bypass");
                break;
            }

            if node.transport().is_multiplex() {
                let upstream = std::mem::take(&mut route);
                let transport = node.transport().with_route(upstream);
                route.push(Arc::new(node.with_transport(transport)));
                continue;
            }

            route.push(node);
        }

        route
    }
}

/// A chain that can be replaced atomically while routes are being built.
pub struct HotChain {
    inner: ArcSwap<Chain>,
}

impl HotChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            inner: ArcSwap::from_pointee(chain),
        }
    }

    /// Current chain snapshot.
    pub fn load(&self) -> Arc<Chain> {
        self.inner.load_full()
    }

    /// Swap in a new chain; routes already built keep the old nodes.
    pub fn store(&self, chain: Chain) {
        debug!(chain = %chain.name(), hops = chain.groups().len(), "chain replaced");
        self.inner.store(Arc::new(chain));
    }
}

impl Chainer for HotChain {
    fn route(&self, network: &str, address: &str) -> Route {
        self.inner.load().route(network, address)
    }
}
