//! A concrete path of nodes and the hop-by-hop connection procedure.

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use hopchain_core::defaults::DEFAULT_TCP_NO_DELAY;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tracing::debug;

use crate::conn::{BoxStream, Conn};
use crate::dialer::{BindOptions, BoxListener};
use crate::error::ChainError;
use crate::node::Node;

/// An ordered list of nodes; an empty route means a direct connection.
#[derive(Clone, Default)]
pub struct Route {
    nodes: Vec<Arc<Node>>,
    timeout: Option<Duration>,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<Arc<Node>>) -> Self {
        Self {
            nodes,
            timeout: None,
        }
    }

    /// Bound every step of the route (each hop's dial, handshake and
    /// connect, and the final connect) by `timeout`.
    ///
    /// A hop that does not answer in time is marked failed like any other
    /// hop failure.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn push(&mut self, node: Arc<Node>) {
        self.nodes.push(node);
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Establish a stream that is past the last node's handshake.
    ///
    /// Each node's marker is reset once the node is reached and handshaken,
    /// and marked when reaching it fails or times out.
    pub async fn connect(&self) -> Result<BoxStream, ChainError> {
        let Some(first) = self.nodes.first() else {
            return Err(ChainError::EmptyRoute);
        };

        let stream = match within(self.timeout, first.transport().dial(first.addr())).await {
            Ok(s) => s,
            Err(source) => {
                first.fail_marker().mark();
                debug!(node = %first.name(), addr = %first.addr(), error = %source, "dial failed");
                return Err(ChainError::Dial {
                    node: first.name().to_string(),
                    source,
                });
            }
        };
        let mut stream = handshake(first, stream, self.timeout).await?;
        first.fail_marker().reset();

        for pair in self.nodes.windows(2) {
            let (prev, node) = (&pair[0], &pair[1]);
            let connect = prev.transport().connect(stream, "tcp", node.addr());
            let conn = match within(self.timeout, connect).await {
                Ok(c) => c,
                Err(source) => {
                    node.fail_marker().mark();
                    debug!(node = %node.name(), via = %prev.name(), error = %source, "connect failed");
                    return Err(ChainError::Connect {
                        target: node.addr().to_string(),
                        source,
                    });
                }
            };
            let next_stream = match conn.into_stream() {
                Ok(s) => s,
                Err(e) => {
                    node.fail_marker().mark();
                    return Err(e);
                }
            };
            stream = handshake(node, next_stream, self.timeout).await?;
            node.fail_marker().reset();
        }

        Ok(stream)
    }

    /// Reach `address` over `network` through the route, or directly when
    /// the route is empty. A failure of the final connect is not counted
    /// against the last node.
    pub async fn dial(&self, network: &str, address: &str) -> Result<Conn, ChainError> {
        let Some(last) = self.nodes.last() else {
            return self.bounded(address, dial_direct(network, address)).await;
        };
        let stream = self.connect().await?;
        let connect = async {
            last.transport()
                .connect(stream, network, address)
                .await
                .map_err(|source| ChainError::Connect {
                    target: address.to_string(),
                    source,
                })
        };
        self.bounded(address, connect).await
    }

    /// Listen on `address`: locally for an empty route, otherwise at the
    /// last node through its binder.
    pub async fn bind(
        &self,
        network: &str,
        address: &str,
        opts: &BindOptions,
    ) -> Result<BoxListener, ChainError> {
        let Some(last) = self.nodes.last() else {
            return bind_local(network, address).await;
        };
        let stream = self.connect().await?;
        self.bounded(address, last.transport().bind(stream, network, address, opts))
            .await
    }

    async fn bounded<T, F>(&self, address: &str, fut: F) -> Result<T, ChainError>
    where
        F: Future<Output = Result<T, ChainError>>,
    {
        match self.timeout {
            Some(t) => tokio::time::timeout(t, fut)
                .await
                .unwrap_or_else(|_| Err(ChainError::Timeout(address.to_string()))),
            None => fut.await,
        }
    }

    /// Every node the traffic actually traverses, nested routes of
    /// multiplexing nodes expanded in place.
    pub fn path(&self) -> Vec<Arc<Node>> {
        let mut out = Vec::new();
        for node in &self.nodes {
            if let Some(upstream) = node.transport().route() {
                out.extend(upstream.path());
            }
            out.push(node.clone());
        }
        out
    }

    /// `name@addr > name@addr > address`, for debug logs.
    pub fn describe(&self, address: &str) -> String {
        let mut out = String::new();
        for node in self.path() {
            out.push_str(node.name());
            out.push('@');
            out.push_str(node.addr());
            out.push_str(" > ");
        }
        out.push_str(address);
        out
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.nodes.iter().map(|n| n.name()))
            .finish()
    }
}

/// Per-hop deadline; elapsing surfaces as a `TimedOut` I/O error so the
/// caller marks the hop like any other failure.
async fn within<T, F>(timeout: Option<Duration>, fut: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match timeout {
        Some(t) => tokio::time::timeout(t, fut)
            .await
            .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::TimedOut, "hop timed out"))),
        None => fut.await,
    }
}

async fn handshake(
    node: &Node,
    stream: BoxStream,
    timeout: Option<Duration>,
) -> Result<BoxStream, ChainError> {
    within(timeout, node.transport().handshake(stream)).await.map_err(|source| {
        node.fail_marker().mark();
        debug!(node = %node.name(), error = %source, "handshake failed");
        ChainError::Handshake {
            node: node.name().to_string(),
            source,
        }
    })
}

async fn dial_direct(network: &str, address: &str) -> Result<Conn, ChainError> {
    match network {
        "udp" | "udp4" | "udp6" => {
            let socket = UdpSocket::bind(unspecified_for(network, address)).await?;
            if !address.is_empty() {
                socket.connect(address).await.map_err(|source| ChainError::Connect {
                    target: address.to_string(),
                    source,
                })?;
            }
            Ok(Conn::Packet(Box::new(socket)))
        }
        "" | "tcp" | "tcp4" | "tcp6" => {
            let stream = TcpStream::connect(address)
                .await
                .map_err(|source| ChainError::Connect {
                    target: address.to_string(),
                    source,
                })?;
            stream.set_nodelay(DEFAULT_TCP_NO_DELAY)?;
            Ok(Conn::Stream(Box::new(stream)))
        }
        other => Err(ChainError::UnsupportedNetwork(other.to_string())),
    }
}

async fn bind_local(network: &str, address: &str) -> Result<BoxListener, ChainError> {
    match network {
        "" | "tcp" | "tcp4" | "tcp6" => {
            let listener = TcpListener::bind(address).await?;
            Ok(Box::new(listener))
        }
        _ => Err(ChainError::BindUnsupported),
    }
}

fn unspecified_for(network: &str, address: &str) -> SocketAddr {
    let v6 = network == "udp6"
        || (network == "udp"
            && address
                .parse::<SocketAddr>()
                .is_ok_and(|a| a.is_ipv6()));
    if v6 {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    }
}
