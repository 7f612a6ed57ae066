//! Nodes and the hop groups they are selected from.

use std::sync::Arc;

use hopchain_bypass::Bypass;
use hopchain_selector::{FailMarker, SelectContext, Selectable, Selector};

use crate::transport::Transport;

/// One proxy in a chain.
///
/// The [`FailMarker`] is shared by clones, so copies made while composing a
/// route keep reporting health to the same tracker.
#[derive(Clone)]
pub struct Node {
    name: String,
    addr: String,
    transport: Arc<Transport>,
    bypass: Option<Arc<Bypass>>,
    marker: Arc<FailMarker>,
}

impl Node {
    pub fn new(name: impl Into<String>, addr: impl Into<String>, transport: Transport) -> Self {
        Self {
            name: name.into(),
            addr: addr.into(),
            transport: Arc::new(transport),
            bypass: None,
            marker: Arc::new(FailMarker::new()),
        }
    }

    pub fn with_bypass(mut self, bypass: Arc<Bypass>) -> Self {
        self.bypass = Some(bypass);
        self
    }

    /// A copy of this node using `transport`, sharing the same marker.
    pub fn with_transport(&self, transport: Transport) -> Self {
        Self {
            transport: Arc::new(transport),
            ..self.clone()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn bypass(&self) -> Option<&Bypass> {
        self.bypass.as_deref()
    }

    pub fn fail_marker(&self) -> &FailMarker {
        &self.marker
    }
}

impl Selectable for Node {
    fn marker(&self) -> Option<&FailMarker> {
        Some(&self.marker)
    }

    fn is_valid(&self) -> bool {
        !self.addr.is_empty()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("addr", &self.addr)
            .field("fail_count", &self.marker.fail_count())
            .finish()
    }
}

/// One hop: candidate nodes plus the selector that picks among them.
#[derive(Debug, Clone, Default)]
pub struct NodeGroup {
    nodes: Vec<Arc<Node>>,
    selector: Option<Arc<Selector<Arc<Node>>>>,
}

impl NodeGroup {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self {
            nodes: nodes.into_iter().map(Arc::new).collect(),
            selector: None,
        }
    }

    pub fn with_selector(mut self, selector: Arc<Selector<Arc<Node>>>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn push(&mut self, node: Node) {
        self.nodes.push(Arc::new(node));
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn selector(&self) -> Option<&Selector<Arc<Node>>> {
        self.selector.as_deref()
    }

    /// Pick the node for the next route.
    ///
    /// Without a selector the first node is returned unfiltered. With one,
    /// `None` means every node was filtered out.
    pub fn next(&self, ctx: &SelectContext<'_>) -> Option<Arc<Node>> {
        if self.nodes.is_empty() {
            return None;
        }
        match &self.selector {
            None => Some(self.nodes[0].clone()),
            Some(selector) => selector.select(ctx, &self.nodes),
        }
    }
}
