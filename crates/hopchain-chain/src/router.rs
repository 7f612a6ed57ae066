//! The top-level dialing façade: retries, timeouts and name resolution
//! around routes produced by a chain.

use std::sync::Arc;
use std::time::Duration;

use hopchain_core::defaults::DEFAULT_RETRIES;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Level};

use crate::chain::Chainer;
use crate::conn::{resolve_peer, BoxPacketConn, Conn};
use crate::dialer::{BindOptions, BoxListener};
use crate::error::ChainError;
use crate::resolve::{resolve_address, HostMapper, Resolver};
use crate::route::Route;

/// Dials destinations through a chain, retrying on failure.
///
/// Each attempt asks the chain for a fresh route, so fail markers set by a
/// previous attempt (including hops that timed out) steer the next one away
/// from broken nodes.
#[derive(Clone)]
pub struct Router {
    retries: usize,
    timeout: Option<Duration>,
    chain: Option<Arc<dyn Chainer>>,
    resolver: Option<Arc<dyn Resolver>>,
    hosts: Option<Arc<dyn HostMapper>>,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    pub fn retries(&self) -> usize {
        self.retries
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The route the next attempt would take, carrying the router's
    /// per-step timeout. Empty without a chain.
    pub fn route(&self, network: &str, address: &str) -> Route {
        let route = match &self.chain {
            Some(chain) => chain.route(network, address),
            None => Route::new(),
        };
        route.with_timeout(self.timeout)
    }

    pub async fn dial(&self, network: &str, address: &str) -> Result<Conn, ChainError> {
        self.dial_resolved(network, address).await.map(|(conn, _)| conn)
    }

    /// Like [`Router::dial`], yielding a datagram endpoint. Stream results
    /// are wrapped so that the destination is the single peer; a name left
    /// unresolved by the router's resolver is looked up to report it.
    pub async fn dial_packet(
        &self,
        network: &str,
        address: &str,
    ) -> Result<BoxPacketConn, ChainError> {
        let (conn, target) = self.dial_resolved(network, address).await?;
        Ok(conn.into_packet(resolve_peer(&target).await))
    }

    /// [`Router::dial`] that gives up as soon as `cancel` fires.
    pub async fn dial_with_cancel(
        &self,
        cancel: &CancellationToken,
        network: &str,
        address: &str,
    ) -> Result<Conn, ChainError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(network, address, "dial canceled");
                Err(ChainError::Canceled)
            }
            res = self.dial(network, address) => res,
        }
    }

    pub async fn bind(
        &self,
        network: &str,
        address: &str,
        opts: &BindOptions,
    ) -> Result<BoxListener, ChainError> {
        let mut attempt = 0;
        loop {
            let route = self.route(network, address);
            log_route(attempt, &route, address);

            match route.bind(network, address, opts).await {
                Ok(listener) => return Ok(listener),
                Err(e) if attempt < self.retries && retryable(&e) => {
                    warn!(retry = attempt, address, error = %e, error_type = e.error_type(), "bind failed");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn dial_resolved(
        &self,
        network: &str,
        address: &str,
    ) -> Result<(Conn, String), ChainError> {
        let mut attempt = 0;
        loop {
            let route = self.route(network, address);
            log_route(attempt, &route, address);

            let target = resolve_address(
                network,
                address,
                self.resolver.as_deref(),
                self.hosts.as_deref(),
            )
            .await?;

            match route.dial(network, &target).await {
                Ok(conn) => return Ok((conn, target)),
                Err(e) if attempt < self.retries && retryable(&e) => {
                    warn!(retry = attempt, address, error = %e, error_type = e.error_type(), "dial failed");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("retries", &self.retries)
            .field("timeout", &self.timeout)
            .field("chain", &self.chain.is_some())
            .field("resolver", &self.resolver.is_some())
            .field("hosts", &self.hosts.is_some())
            .finish()
    }
}

fn log_route(attempt: usize, route: &Route, address: &str) {
    if tracing::enabled!(Level::DEBUG) {
        debug!(retry = attempt, route = %route.describe(address), "route");
    }
}

/// Configuration errors will not get better by trying again.
fn retryable(err: &ChainError) -> bool {
    !matches!(
        err,
        ChainError::InvalidAddress(_) | ChainError::UnsupportedNetwork(_) | ChainError::BindUnsupported
    )
}

#[derive(Default)]
pub struct RouterBuilder {
    retries: Option<usize>,
    timeout: Option<Duration>,
    chain: Option<Arc<dyn Chainer>>,
    resolver: Option<Arc<dyn Resolver>>,
    hosts: Option<Arc<dyn HostMapper>>,
}

impl RouterBuilder {
    /// Extra attempts after the first; total attempts are `retries + 1`.
    pub fn retries(mut self, retries: usize) -> Self {
        self.retries = Some(retries);
        self
    }

    /// Deadline for each step of an attempt: every hop's dial, handshake and
    /// connect, and the final connect. Zero disables it.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn chain(mut self, chain: Arc<dyn Chainer>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn hosts(mut self, hosts: Arc<dyn HostMapper>) -> Self {
        self.hosts = Some(hosts);
        self
    }

    pub fn build(self) -> Router {
        Router {
            retries: self.retries.unwrap_or(DEFAULT_RETRIES),
            timeout: self.timeout,
            chain: self.chain,
            resolver: self.resolver,
            hosts: self.hosts,
        }
    }
}
