//! Name resolution hooks used by the router before dialing.

use std::net::IpAddr;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};

use crate::error::ChainError;

#[derive(Error, Debug)]
pub enum ResolveError {
    /// The name cannot be resolved here; dial it unresolved.
    #[error("invalid resolver input: {0}")]
    Invalid(String),

    #[error("lookup failed: {0}")]
    Lookup(String),
}

/// DNS-style resolver.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// `network` is `ip`, `ip4` or `ip6`.
    async fn resolve(&self, network: &str, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Static host table consulted before the resolver.
pub trait HostMapper: Send + Sync {
    fn lookup(&self, network: &str, host: &str) -> Option<Vec<IpAddr>>;
}

/// Split `host:port`, accepting `[v6]:port`. Returns `None` when there is no
/// numeric port.
pub fn split_host_port(addr: &str) -> Option<(&str, u16)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        let port = tail.strip_prefix(':')?.parse().ok()?;
        return Some((host, port));
    }
    let (host, port) = addr.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some((host, port.parse().ok()?))
}

pub fn join_host_port(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// Address family for a dial network.
pub fn ip_network(network: &str) -> &'static str {
    match network {
        "tcp4" | "udp4" => "ip4",
        "tcp6" | "udp6" => "ip6",
        _ => "ip",
    }
}

/// Replace the host part of `address` with its first resolved IP.
///
/// Hosts are consulted first, then the resolver. With neither configured,
/// empty addresses and IP literals are returned unchanged.
pub async fn resolve_address(
    network: &str,
    address: &str,
    resolver: Option<&dyn Resolver>,
    hosts: Option<&dyn HostMapper>,
) -> Result<String, ChainError> {
    if address.is_empty() || (resolver.is_none() && hosts.is_none()) {
        return Ok(address.to_string());
    }
    let (host, port) =
        split_host_port(address).ok_or_else(|| ChainError::InvalidAddress(address.to_string()))?;
    if host.is_empty() || host.parse::<IpAddr>().is_ok() {
        return Ok(address.to_string());
    }

    let family = ip_network(network);
    if let Some(ips) = hosts.and_then(|h| h.lookup(family, host)) {
        if let Some(ip) = ips.first() {
            debug!(host, %ip, "hit hosts");
            return Ok(join_host_port(&ip.to_string(), port));
        }
    }

    let Some(resolver) = resolver else {
        return Ok(address.to_string());
    };
    let ips = match resolver.resolve(family, host).await {
        Ok(ips) => ips,
        Err(ResolveError::Invalid(_)) => return Ok(address.to_string()),
        Err(e) => {
            error!(host, error = %e, "resolve");
            Vec::new()
        }
    };
    match ips.first() {
        Some(ip) => Ok(join_host_port(&ip.to_string(), port)),
        None => Err(ChainError::ResolveFailed(host.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::net::Ipv4Addr;

    struct Table(HashMap<&'static str, Vec<IpAddr>>);

    impl HostMapper for Table {
        fn lookup(&self, _network: &str, host: &str) -> Option<Vec<IpAddr>> {
            self.0.get(host).cloned()
        }
    }

    struct Fixed(Result<Vec<IpAddr>, &'static str>);

    #[async_trait]
    impl Resolver for Fixed {
        async fn resolve(&self, _network: &str, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
            match self.0 {
                Ok(ref ips) => Ok(ips.clone()),
                Err("invalid") => Err(ResolveError::Invalid(host.to_string())),
                Err(msg) => Err(ResolveError::Lookup(msg.to_string())),
            }
        }
    }

    fn ip(a: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, a))
    }

    #[test]
    fn split_and_join() {
        assert_eq!(split_host_port("example.com:443"), Some(("example.com", 443)));
        assert_eq!(split_host_port("[::1]:53"), Some(("::1", 53)));
        assert_eq!(split_host_port("::1"), None);
        assert_eq!(split_host_port("example.com"), None);
        assert_eq!(split_host_port("example.com:http"), None);
        assert_eq!(join_host_port("::1", 53), "[::1]:53");
        assert_eq!(join_host_port("10.0.0.1", 80), "10.0.0.1:80");
    }

    #[test]
    fn network_families() {
        assert_eq!(ip_network("tcp4"), "ip4");
        assert_eq!(ip_network("udp6"), "ip6");
        assert_eq!(ip_network("tcp"), "ip");
    }

    #[tokio::test]
    async fn passthrough_without_resolvers() {
        let out = resolve_address("tcp", "example.com", None, None).await.unwrap();
        assert_eq!(out, "example.com");
    }

    #[tokio::test]
    async fn hosts_take_precedence() {
        let hosts = Table(HashMap::from([("db.local", vec![ip(7)])]));
        let resolver = Fixed(Ok(vec![ip(9)]));
        let out = resolve_address("tcp", "db.local:5432", Some(&resolver), Some(&hosts))
            .await
            .unwrap();
        assert_eq!(out, "10.0.0.7:5432");

        let out = resolve_address("tcp", "other.local:80", Some(&resolver), Some(&hosts))
            .await
            .unwrap();
        assert_eq!(out, "10.0.0.9:80");
    }

    #[tokio::test]
    async fn ip_literal_skips_lookup() {
        let resolver = Fixed(Err("boom"));
        let out = resolve_address("tcp", "[::1]:22", Some(&resolver), None).await.unwrap();
        assert_eq!(out, "[::1]:22");
    }

    #[tokio::test]
    async fn invalid_keeps_address() {
        let resolver = Fixed(Err("invalid"));
        let out = resolve_address("tcp", "svc.mesh:80", Some(&resolver), None)
            .await
            .unwrap();
        assert_eq!(out, "svc.mesh:80");
    }

    #[tokio::test]
    async fn failure_or_empty_is_resolve_failed() {
        let resolver = Fixed(Err("servfail"));
        let err = resolve_address("tcp", "gone.example:80", Some(&resolver), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::ResolveFailed(ref h) if h == "gone.example"));

        let resolver = Fixed(Ok(Vec::new()));
        let err = resolve_address("tcp", "gone.example:80", Some(&resolver), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::ResolveFailed(_)));
    }

    #[tokio::test]
    async fn missing_port_is_invalid() {
        let hosts = Table(HashMap::new());
        let err = resolve_address("tcp", "example.com", None, Some(&hosts))
            .await
            .unwrap_err();
        assert!(matches!(err, ChainError::InvalidAddress(_)));
    }
}
