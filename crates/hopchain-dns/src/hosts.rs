//! Static host table.

use std::net::IpAddr;

use hopchain_chain::HostMapper;
use rustc_hash::FxHashMap;

use crate::config::HostEntry;
use crate::resolver::Family;

/// Case-insensitive `host → IPs` map, consulted before DNS.
#[derive(Debug, Clone, Default)]
pub struct Hosts {
    map: FxHashMap<String, Vec<IpAddr>>,
}

impl Hosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: &[HostEntry]) -> Self {
        let mut hosts = Self::new();
        for entry in entries {
            hosts.insert(&entry.host, entry.ips.iter().copied());
        }
        hosts
    }

    /// Add addresses for `host`, appending to any existing mapping.
    pub fn insert(&mut self, host: &str, ips: impl IntoIterator<Item = IpAddr>) {
        let key = normalize(host);
        if key.is_empty() {
            return;
        }
        let slot = self.map.entry(key).or_default();
        for ip in ips {
            if !slot.contains(&ip) {
                slot.push(ip);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl HostMapper for Hosts {
    fn lookup(&self, network: &str, host: &str) -> Option<Vec<IpAddr>> {
        let family = Family::parse(network).ok()?;
        let ips: Vec<IpAddr> = self
            .map
            .get(&normalize(host))?
            .iter()
            .filter(|ip| family.accepts(ip))
            .copied()
            .collect();
        (!ips.is_empty()).then_some(ips)
    }
}

fn normalize(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}
