//! Connection types handed between dialers, connectors and callers.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UdpSocket;
use tracing::debug;

use crate::error::ChainError;

/// Marker trait for byte streams carried through a chain.
pub trait Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + 'static> Stream for T {}

pub type BoxStream = Box<dyn Stream>;

/// Datagram-oriented connection.
#[async_trait]
pub trait PacketConn: Send {
    async fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    async fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> io::Result<usize>;

    fn local_addr(&self) -> io::Result<SocketAddr>;
}

pub type BoxPacketConn = Box<dyn PacketConn>;

#[async_trait]
impl PacketConn for UdpSocket {
    async fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }

    async fn send_to(&mut self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, target).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}

/// Result of dialing a destination: a stream, or a datagram endpoint for
/// UDP destinations whose last hop speaks datagrams natively.
pub enum Conn {
    Stream(BoxStream),
    Packet(BoxPacketConn),
}

impl Conn {
    pub fn is_packet(&self) -> bool {
        matches!(self, Conn::Packet(_))
    }

    /// Unwrap the stream, failing for datagram connections.
    pub fn into_stream(self) -> Result<BoxStream, ChainError> {
        match self {
            Conn::Stream(s) => Ok(s),
            Conn::Packet(_) => Err(ChainError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "expected a stream connection, got a packet connection",
            ))),
        }
    }

    /// Convert into a datagram endpoint, wrapping streams in
    /// [`StreamPacketConn`] bound to `peer`.
    pub fn into_packet(self, peer: SocketAddr) -> BoxPacketConn {
        match self {
            Conn::Packet(p) => p,
            Conn::Stream(s) => Box::new(StreamPacketConn::new(s, peer)),
        }
    }
}

impl std::fmt::Debug for Conn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Conn::Stream(_) => f.write_str("Conn::Stream"),
            Conn::Packet(_) => f.write_str("Conn::Packet"),
        }
    }
}

/// Datagram view over a stream that reaches a single peer.
///
/// `recv_from` reads from the stream and reports `peer` as the source;
/// `send_to` ignores the target and writes the whole datagram to the stream.
/// When the destination name could not be resolved, `peer` is `0.0.0.0:0`.
pub struct StreamPacketConn {
    stream: BoxStream,
    peer: SocketAddr,
}

impl StreamPacketConn {
    pub fn new(stream: BoxStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn into_inner(self) -> BoxStream {
        self.stream
    }
}

#[async_trait]
impl PacketConn for StreamPacketConn {
    async fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let n = self.stream.read(buf).await?;
        Ok((n, self.peer))
    }

    async fn send_to(&mut self, buf: &[u8], _target: SocketAddr) -> io::Result<usize> {
        self.stream.write_all(buf).await?;
        self.stream.flush().await?;
        Ok(buf.len())
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "stream-backed packet connection has no local socket",
        ))
    }
}

/// Peer address for a datagram wrapper; unresolved names map to `0.0.0.0:0`.
pub(crate) fn peer_of(address: &str) -> SocketAddr {
    address
        .parse()
        .unwrap_or_else(|_| SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
}

/// Like [`peer_of`], but looks a `host:port` name up with the system
/// resolver first. Only the reported source address depends on it.
pub(crate) async fn resolve_peer(address: &str) -> SocketAddr {
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return addr;
    }
    match tokio::net::lookup_host(address).await {
        Ok(mut addrs) => addrs.next().unwrap_or_else(|| peer_of(address)),
        Err(e) => {
            debug!(address, error = %e, "peer lookup failed");
            peer_of(address)
        }
    }
}
