//! Built-in plain TCP adapters.
//!
//! `tcp` dials the node over TCP (or through the upstream route when the
//! node is preceded by a multiplexing hop). `forward` performs no protocol
//! exchange: the node is expected to forward everything it receives to a
//! fixed target, so the stream is handed back as is.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tracing::debug;

use crate::conn::{BoxStream, Conn};
use crate::dialer::{Connector, DialOptions, Dialer, Listener};
use crate::metadata::Metadata;

/// Plain TCP dialer.
#[derive(Debug, Clone, Default)]
pub struct TcpDialer {
    timeout: Option<Duration>,
}

impl TcpDialer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

#[async_trait]
impl Dialer for TcpDialer {
    fn init(&mut self, md: &Metadata) -> io::Result<()> {
        if let Some(timeout) = md.get_duration_secs("timeout") {
            self.timeout = Some(timeout);
        }
        Ok(())
    }

    async fn dial(&self, addr: &str, opts: &DialOptions) -> io::Result<BoxStream> {
        let mut net_dialer = opts.net_dialer.clone();
        if net_dialer.timeout.is_none() {
            net_dialer.timeout = self.timeout;
        }
        debug!(addr, via_route = net_dialer.route.is_some(), "tcp dial");
        net_dialer.dial("tcp", addr).await
    }
}

/// Pass-through connector for port-forwarding nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardConnector;

#[async_trait]
impl Connector for ForwardConnector {
    async fn connect(&self, stream: BoxStream, network: &str, address: &str) -> io::Result<Conn> {
        debug!(network, address, "forward");
        Ok(Conn::Stream(stream))
    }
}

#[async_trait]
impl Listener for TcpListener {
    async fn accept(&mut self) -> io::Result<(BoxStream, Option<SocketAddr>)> {
        let (stream, peer) = TcpListener::accept(self).await?;
        Ok((Box::new(stream), Some(peer)))
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpListener::local_addr(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_dialer_reads_timeout() {
        let mut dialer = TcpDialer::new();
        dialer
            .init(&Metadata::new().with("timeout", "7"))
            .unwrap();
        assert_eq!(dialer.timeout, Some(Duration::from_secs(7)));
        assert!(dialer.multiplexer().is_none());
        assert!(dialer.handshaker().is_none());
    }

    #[tokio::test]
    async fn forward_returns_same_stream() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (client, mut server) = tokio::io::duplex(64);
        let conn = ForwardConnector
            .connect(Box::new(client), "tcp", "example.com:80")
            .await
            .unwrap();
        let mut stream = conn.into_stream().unwrap();
        stream.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
        assert!(ForwardConnector.binder().is_none());
    }
}
