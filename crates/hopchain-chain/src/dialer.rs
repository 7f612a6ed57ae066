//! Adapter seams: the capabilities a node's transport is built from.
//!
//! A [`Dialer`] opens the raw connection to a node; a [`Connector`] speaks
//! the node's proxy protocol over it to reach the next address. Optional
//! capabilities ([`Handshaker`], [`Multiplexer`], [`Binder`]) are exposed
//! through accessor methods returning `None` by default.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hopchain_core::defaults::{
    DEFAULT_BIND_BACKLOG, DEFAULT_TCP_NO_DELAY, DEFAULT_UDP_CONN_TTL_SECS,
    DEFAULT_UDP_DATA_BUFFER_SIZE, DEFAULT_UDP_DATA_QUEUE_SIZE,
};
use tokio::net::TcpStream;

use crate::conn::{BoxStream, Conn};
use crate::metadata::Metadata;
use crate::route::Route;

/// Opens the underlying connection to a node address.
#[async_trait]
pub trait Dialer: Send + Sync {
    /// Apply per-node options before first use.
    fn init(&mut self, _md: &Metadata) -> io::Result<()> {
        Ok(())
    }

    async fn dial(&self, addr: &str, opts: &DialOptions) -> io::Result<BoxStream>;

    fn handshaker(&self) -> Option<&dyn Handshaker> {
        None
    }

    fn multiplexer(&self) -> Option<&dyn Multiplexer> {
        None
    }
}

/// Speaks a node's proxy protocol over an established stream.
#[async_trait]
pub trait Connector: Send + Sync {
    fn init(&mut self, _md: &Metadata) -> io::Result<()> {
        Ok(())
    }

    /// Ask the node to connect to `address` over `network`.
    async fn connect(&self, stream: BoxStream, network: &str, address: &str) -> io::Result<Conn>;

    fn handshaker(&self) -> Option<&dyn Handshaker> {
        None
    }

    fn binder(&self) -> Option<&dyn Binder> {
        None
    }
}

/// Post-dial negotiation (TLS, authentication, ...).
#[async_trait]
pub trait Handshaker: Send + Sync {
    async fn handshake(&self, stream: BoxStream, opts: &HandshakeOptions)
        -> io::Result<BoxStream>;
}

/// Marks a dialer whose connections carry many logical streams.
pub trait Multiplexer: Send + Sync {
    fn multiplex(&self) -> bool;
}

/// Asks the last node of a route to listen on the caller's behalf.
#[async_trait]
pub trait Binder: Send + Sync {
    async fn bind(
        &self,
        stream: BoxStream,
        network: &str,
        address: &str,
        opts: &BindOptions,
    ) -> io::Result<BoxListener>;
}

/// Accepts inbound connections from a local or remote listener.
#[async_trait]
pub trait Listener: Send {
    async fn accept(&mut self) -> io::Result<(BoxStream, Option<SocketAddr>)>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

pub type BoxListener = Box<dyn Listener>;

/// Options handed to [`Dialer::dial`].
#[derive(Debug, Clone, Default)]
pub struct DialOptions {
    /// The node address, for dialers that need it for SNI or Host headers.
    pub host: String,
    /// Where raw connections should come from.
    pub net_dialer: NetDialer,
}

#[derive(Debug, Clone, Default)]
pub struct HandshakeOptions {
    pub addr: String,
}

#[derive(Debug, Clone)]
pub struct BindOptions {
    pub backlog: usize,
    pub mux: bool,
    pub udp_data_queue_size: usize,
    pub udp_data_buffer_size: usize,
    pub udp_conn_ttl: Duration,
}

impl Default for BindOptions {
    fn default() -> Self {
        Self {
            backlog: DEFAULT_BIND_BACKLOG,
            mux: false,
            udp_data_queue_size: DEFAULT_UDP_DATA_QUEUE_SIZE,
            udp_data_buffer_size: DEFAULT_UDP_DATA_BUFFER_SIZE,
            udp_conn_ttl: Duration::from_secs(DEFAULT_UDP_CONN_TTL_SECS),
        }
    }
}

/// Raw connection source for dialers.
///
/// Without a route it opens a TCP connection directly; with one (a
/// multiplexing node's upstream prefix) the connection is dialed through
/// that route instead.
#[derive(Debug, Clone, Default)]
pub struct NetDialer {
    pub route: Option<Arc<Route>>,
    pub timeout: Option<Duration>,
}

impl NetDialer {
    pub async fn dial(&self, network: &str, addr: &str) -> io::Result<BoxStream> {
        if let Some(route) = &self.route {
            let dial = route.dial(network, addr);
            let conn = match self.timeout {
                Some(t) => tokio::time::timeout(t, dial)
                    .await
                    .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "dial timed out"))?,
                None => dial.await,
            };
            return conn
                .and_then(Conn::into_stream)
                .map_err(io::Error::other);
        }

        match network {
            "" | "tcp" | "tcp4" | "tcp6" => {}
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("unsupported network: {other}"),
                ))
            }
        }

        let stream = match self.timeout {
            Some(t) => tokio::time::timeout(t, TcpStream::connect(addr))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "dial timed out"))??,
            None => TcpStream::connect(addr).await?,
        };
        stream.set_nodelay(DEFAULT_TCP_NO_DELAY)?;
        Ok(Box::new(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn net_dialer_direct_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut s, _) = listener.accept().await.unwrap();
            s.write_all(b"hi").await.unwrap();
        });

        let mut stream = NetDialer::default().dial("tcp", &addr).await.unwrap();
        let mut buf = [0u8; 2];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hi");
    }

    #[tokio::test]
    async fn net_dialer_rejects_datagram_networks() {
        let err = NetDialer::default()
            .dial("udp", "127.0.0.1:53")
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn bind_options_defaults() {
        let opts = BindOptions::default();
        assert_eq!(opts.backlog, DEFAULT_BIND_BACKLOG);
        assert!(!opts.mux);
        assert_eq!(opts.udp_conn_ttl, Duration::from_secs(DEFAULT_UDP_CONN_TTL_SECS));
    }
}
