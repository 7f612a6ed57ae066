//! A node's dialer and connector bound together.

use std::io;
use std::sync::Arc;

use crate::conn::{BoxStream, Conn};
use crate::dialer::{
    BindOptions, BoxListener, Connector, DialOptions, Dialer, HandshakeOptions, NetDialer,
};
use crate::error::ChainError;
use crate::route::Route;

/// Dialer + connector for one node, optionally carrying the upstream route
/// its raw connections are dialed through.
#[derive(Clone)]
pub struct Transport {
    addr: String,
    dialer: Arc<dyn Dialer>,
    connector: Arc<dyn Connector>,
    route: Option<Arc<Route>>,
}

impl Transport {
    pub fn new(
        addr: impl Into<String>,
        dialer: Arc<dyn Dialer>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            addr: addr.into(),
            dialer,
            connector,
            route: None,
        }
    }

    /// A copy of this transport whose dials go through `route`.
    pub fn with_route(&self, route: Route) -> Self {
        Self {
            route: Some(Arc::new(route)),
            ..self.clone()
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_deref()
    }

    pub fn dialer(&self) -> &Arc<dyn Dialer> {
        &self.dialer
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    pub fn is_multiplex(&self) -> bool {
        self.dialer
            .multiplexer()
            .is_some_and(|m| m.multiplex())
    }

    pub async fn dial(&self, addr: &str) -> io::Result<BoxStream> {
        let opts = DialOptions {
            host: self.addr.clone(),
            net_dialer: NetDialer {
                route: self.route.clone(),
                timeout: None,
            },
        };
        self.dialer.dial(addr, &opts).await
    }

    /// Run the dialer's then the connector's handshake, when present.
    pub async fn handshake(&self, stream: BoxStream) -> io::Result<BoxStream> {
        let opts = HandshakeOptions {
            addr: self.addr.clone(),
        };
        let mut stream = stream;
        if let Some(h) = self.dialer.handshaker() {
            stream = h.handshake(stream, &opts).await?;
        }
        if let Some(h) = self.connector.handshaker() {
            stream = h.handshake(stream, &opts).await?;
        }
        Ok(stream)
    }

    pub async fn connect(&self, stream: BoxStream, network: &str, address: &str) -> io::Result<Conn> {
        self.connector.connect(stream, network, address).await
    }

    pub async fn bind(
        &self,
        stream: BoxStream,
        network: &str,
        address: &str,
        opts: &BindOptions,
    ) -> Result<BoxListener, ChainError> {
        let binder = self.connector.binder().ok_or(ChainError::BindUnsupported)?;
        binder
            .bind(stream, network, address, opts)
            .await
            .map_err(|source| ChainError::Connect {
                target: address.to_string(),
                source,
            })
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("addr", &self.addr)
            .field("multiplex", &self.is_multiplex())
            .field("route", &self.route)
            .finish()
    }
}
