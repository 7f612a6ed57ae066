//! Chain routing engine for hopchain.
//!
//! Decides, for each destination, which sequence of proxy nodes a
//! connection traverses and builds that path hop by hop:
//! `caller → node[0] → node[1] → ... → destination`.
//!
//! # Architecture
//!
//! - **Chain**: ordered hops ([`NodeGroup`]s). [`Chainer::route`] picks one
//!   node per hop through its [`Selector`](hopchain_selector::Selector),
//!   honouring bypass lists and folding the prefix into multiplexing nodes.
//! - **Route**: the concrete node list for one attempt. `connect` dials the
//!   first node and asks each node to connect to the next, marking or
//!   resetting per-node [`FailMarker`](hopchain_selector::FailMarker)s.
//! - **Router**: retries whole routes, applies per-attempt timeouts and
//!   resolves destination names through [`HostMapper`] and [`Resolver`].
//! - **Transport**: a node's [`Dialer`] and [`Connector`] pair; protocol
//!   adapters plug in through these traits and the [`Registry`].

pub mod builder;
pub mod chain;
pub mod config;
pub mod conn;
pub mod dialer;
pub mod error;
pub mod metadata;
pub mod node;
pub mod plain;
pub mod registry;
pub mod resolve;
pub mod route;
pub mod router;
pub mod transport;

pub use builder::{build_chain, build_chains};
pub use chain::{Chain, Chainer, HotChain};
pub use config::{ChainConfig, RouterConfig};
pub use conn::{BoxPacketConn, BoxStream, Conn, PacketConn, Stream, StreamPacketConn};
pub use dialer::{
    BindOptions, Binder, BoxListener, Connector, DialOptions, Dialer, HandshakeOptions,
    Handshaker, Listener, Multiplexer, NetDialer,
};
pub use error::ChainError;
pub use metadata::Metadata;
pub use node::{Node, NodeGroup};
pub use plain::{ForwardConnector, TcpDialer};
pub use registry::Registry;
pub use resolve::{HostMapper, ResolveError, Resolver};
pub use route::Route;
pub use router::{Router, RouterBuilder};
pub use transport::Transport;
