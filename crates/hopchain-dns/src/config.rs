//! Resolver and hosts configuration.

use std::net::IpAddr;

use hopchain_core::defaults::DEFAULT_DNS_CACHE_SIZE;
use serde::{Deserialize, Serialize};

/// DNS resolver configuration. Omitted fields fall back to the system
/// resolver with caching enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(default)]
    pub strategy: DnsStrategy,

    /// Nameserver URLs, used when `strategy = "custom"`.
    ///
    /// - `udp://8.8.8.8` or `udp://8.8.8.8:53`
    /// - `tcp://8.8.8.8:53`
    /// - `tls://1.1.1.1` or `tls://dns.name:853`
    /// - `https://dns.google/dns-query`
    ///
    /// Omitted ports default to 53, 853 and 443 respectively.
    #[serde(default)]
    pub servers: Vec<String>,

    /// Order IPv4 answers first when both families are returned.
    #[serde(default)]
    pub prefer_ipv4: bool,

    /// Cache capacity in entries; 0 disables caching.
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            strategy: DnsStrategy::default(),
            servers: Vec::new(),
            prefer_ipv4: false,
            cache_size: default_cache_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DnsStrategy {
    /// `/etc/resolv.conf` on Unix, system settings on Windows.
    #[default]
    System,
    /// The nameservers in `servers`.
    Custom,
}

/// One static host mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEntry {
    pub host: String,
    pub ips: Vec<IpAddr>,
}

fn default_cache_size() -> usize {
    DEFAULT_DNS_CACHE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let config: DnsConfig = toml::from_str("").unwrap();
        assert_eq!(config.strategy, DnsStrategy::System);
        assert_eq!(config.cache_size, DEFAULT_DNS_CACHE_SIZE);
        assert!(config.servers.is_empty());
    }

    #[test]
    fn parse_custom() {
        let config: DnsConfig = toml::from_str(
            r#"
strategy = "custom"
servers = ["udp://9.9.9.9", "https://dns.google/dns-query"]
prefer_ipv4 = true
cache_size = 0
"#,
        )
        .unwrap();
        assert_eq!(config.strategy, DnsStrategy::Custom);
        assert_eq!(config.servers.len(), 2);
        assert!(config.prefer_ipv4);
        assert_eq!(config.cache_size, 0);
    }

    #[test]
    fn parse_host_entry() {
        let entry: HostEntry =
            serde_json::from_str(r#"{"host": "db.internal", "ips": ["10.0.0.5", "fd00::5"]}"#)
                .unwrap();
        assert_eq!(entry.host, "db.internal");
        assert_eq!(entry.ips.len(), 2);
    }
}
