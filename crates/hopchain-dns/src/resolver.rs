//! Async DNS resolver backed by hickory-resolver.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use async_trait::async_trait;
use hickory_proto::xfer::Protocol;
use hickory_resolver::config::{
    NameServerConfig, NameServerConfigGroup, ResolverConfig, ResolverOpts,
};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::Resolver;
use hopchain_chain::{ResolveError, Resolver as ChainResolver};
use tracing::debug;

use crate::config::{DnsConfig, DnsStrategy};
use crate::error::DnsError;

/// Shared async DNS resolver.
///
/// Cheaply cloneable; caching and nameserver selection are handled by
/// hickory. Answers are filtered by the requested family (`ip4`, `ip6`)
/// and, with `prefer_ipv4`, IPv4 answers come first.
#[derive(Clone)]
pub struct DnsResolver {
    inner: Arc<Inner>,
}

struct Inner {
    resolver: Resolver<TokioConnectionProvider>,
    prefer_ipv4: bool,
}

impl std::fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsResolver")
            .field("prefer_ipv4", &self.inner.prefer_ipv4)
            .finish()
    }
}

impl DnsResolver {
    /// Build a resolver from configuration. Call once at startup and share.
    pub fn new(config: &DnsConfig) -> Result<Self, DnsError> {
        let resolver = match config.strategy {
            DnsStrategy::System => {
                let mut builder = Resolver::builder_tokio()
                    .map_err(|e| DnsError::InvalidServer(format!("system config: {e}")))?;
                let opts = builder.options_mut();
                opts.cache_size = config.cache_size;
                opts.preserve_intermediates = true;
                builder.build()
            }
            DnsStrategy::Custom => {
                let name_servers = parse_server_urls(&config.servers)?;
                let resolver_config = ResolverConfig::from_parts(None, vec![], name_servers);
                let mut opts = ResolverOpts::default();
                opts.cache_size = config.cache_size;
                opts.preserve_intermediates = true;
                let mut builder = Resolver::builder_with_config(
                    resolver_config,
                    TokioConnectionProvider::default(),
                );
                *builder.options_mut() = opts;
                builder.build()
            }
        };

        Ok(Self {
            inner: Arc::new(Inner {
                resolver,
                prefer_ipv4: config.prefer_ipv4,
            }),
        })
    }

    /// Look up `host` for `network` (`ip`, `ip4` or `ip6`).
    ///
    /// IP literals are returned without a query.
    pub async fn lookup(&self, network: &str, host: &str) -> Result<Vec<IpAddr>, DnsError> {
        if host.is_empty() {
            return Err(DnsError::InvalidQuery("empty host".to_string()));
        }
        let family = Family::parse(network)?;

        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let response = self.inner.resolver.lookup_ip(host).await?;
        let mut ips: Vec<IpAddr> = response.iter().filter(|ip| family.accepts(ip)).collect();
        if self.inner.prefer_ipv4 {
            ips.sort_by_key(|ip| !ip.is_ipv4());
        }
        if ips.is_empty() {
            return Err(DnsError::NoResults(host.to_string()));
        }
        debug!(host, network, count = ips.len(), first = %ips[0], "dns resolved");
        Ok(ips)
    }
}

#[async_trait]
impl ChainResolver for DnsResolver {
    async fn resolve(&self, network: &str, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        self.lookup(network, host).await.map_err(ResolveError::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Any,
    V4,
    V6,
}

impl Family {
    pub(crate) fn parse(network: &str) -> Result<Self, DnsError> {
        match network {
            "" | "ip" => Ok(Family::Any),
            "ip4" => Ok(Family::V4),
            "ip6" => Ok(Family::V6),
            other => Err(DnsError::InvalidQuery(format!("unknown network: {other}"))),
        }
    }

    pub(crate) fn accepts(self, ip: &IpAddr) -> bool {
        match self {
            Family::Any => true,
            Family::V4 => ip.is_ipv4(),
            Family::V6 => ip.is_ipv6(),
        }
    }
}

/// Parse server URL strings into a hickory `NameServerConfigGroup`.
fn parse_server_urls(urls: &[String]) -> Result<NameServerConfigGroup, DnsError> {
    let mut configs = Vec::with_capacity(urls.len());

    for url in urls {
        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| DnsError::InvalidServer(format!("missing scheme: {url}")))?;

        let config = match scheme {
            "udp" | "tcp" => {
                if rest.contains('/') {
                    return Err(DnsError::InvalidServer(format!(
                        "unexpected path for {scheme} server: {url}"
                    )));
                }
                let protocol = if scheme == "udp" {
                    Protocol::Udp
                } else {
                    Protocol::Tcp
                };
                let (host, port) = parse_host_port(rest, 53)?;
                name_server(resolve_server_addr(host, port)?, protocol, None, None)
            }
            "tls" => {
                if rest.contains('/') {
                    return Err(DnsError::InvalidServer(format!(
                        "unexpected path for tls server: {url}"
                    )));
                }
                let (host, port) = parse_host_port(rest, 853)?;
                name_server(
                    resolve_server_addr(host, port)?,
                    Protocol::Tls,
                    Some(host.to_string()),
                    None,
                )
            }
            "https" => {
                let (authority, path) = match rest.split_once('/') {
                    Some((authority, path)) => (authority, format!("/{path}")),
                    None => (rest, "/dns-query".to_string()),
                };
                let (host, port) = parse_host_port(authority, 443)?;
                name_server(
                    resolve_server_addr(host, port)?,
                    Protocol::Https,
                    Some(host.to_string()),
                    Some(path),
                )
            }
            _ => {
                return Err(DnsError::InvalidServer(format!(
                    "unsupported protocol: {scheme}"
                )));
            }
        };
        configs.push(config);
    }

    if configs.is_empty() {
        return Err(DnsError::InvalidServer(
            "no dns servers configured".to_string(),
        ));
    }

    Ok(NameServerConfigGroup::from(configs))
}

fn name_server(
    socket_addr: SocketAddr,
    protocol: Protocol,
    tls_dns_name: Option<String>,
    http_endpoint: Option<String>,
) -> NameServerConfig {
    NameServerConfig {
        socket_addr,
        protocol,
        tls_dns_name,
        http_endpoint,
        trust_negative_responses: false,
        bind_addr: None,
    }
}

/// Parse `host:port`, `[v6]:port`, `host` or `[v6]` with a default port.
fn parse_host_port(s: &str, default_port: u16) -> Result<(&str, u16), DnsError> {
    if let Some(rest) = s.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| DnsError::InvalidServer(format!("invalid IPv6 host in: {s}")))?;
        if host.is_empty() {
            return Err(DnsError::InvalidServer(format!("empty host in: {s}")));
        }
        if tail.is_empty() {
            return Ok((host, default_port));
        }
        let port = tail
            .strip_prefix(':')
            .and_then(|p| p.parse::<u16>().ok())
            .ok_or_else(|| DnsError::InvalidServer(format!("invalid port in: {s}")))?;
        return Ok((host, port));
    }

    if let Some((host, port)) = s.rsplit_once(':') {
        if host.contains(':') {
            return Err(DnsError::InvalidServer(format!(
                "ipv6 host must be bracketed in server url: {s}"
            )));
        }
        if host.is_empty() {
            return Err(DnsError::InvalidServer(format!("empty host in: {s}")));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| DnsError::InvalidServer(format!("invalid port in: {s}")))?;
        return Ok((host, port));
    }

    if s.is_empty() {
        return Err(DnsError::InvalidServer("empty host".to_string()));
    }
    Ok((s, default_port))
}

/// Nameserver hostnames are resolved once, at startup, by the system.
fn resolve_server_addr(host: &str, port: u16) -> Result<SocketAddr, DnsError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    (host, port)
        .to_socket_addrs()
        .map_err(|e| DnsError::InvalidServer(format!("failed to resolve dns server '{host}': {e}")))?
        .next()
        .ok_or_else(|| DnsError::InvalidServer(format!("dns server has no addresses: {host}")))
}
