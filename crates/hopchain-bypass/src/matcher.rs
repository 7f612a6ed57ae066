//! Pattern matchers.
//!
//! - `Matcher::Ip`: exact IP literal
//! - `Matcher::Cidr`: network containment (v4 or v6)
//! - `Matcher::Domain`: exact domain or glob (`*` any run, `?` one char)

use std::net::IpAddr;

use ipnet::IpNet;
use regex::Regex;

use crate::error::BypassError;

/// A single compiled address pattern.
///
/// Built once from a pattern string at configuration time and never mutated.
#[derive(Debug, Clone)]
pub enum Matcher {
    Ip(IpAddr),
    Cidr(IpNet),
    Domain(DomainMatcher),
}

impl Matcher {
    /// Classify and compile `pattern`.
    ///
    /// A literal IP becomes [`Matcher::Ip`], a CIDR block becomes
    /// [`Matcher::Cidr`], anything else is treated as a domain pattern.
    pub fn new(pattern: &str) -> Result<Self, BypassError> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Err(BypassError::EmptyPattern);
        }
        if let Ok(ip) = pattern.parse::<IpAddr>() {
            return Ok(Matcher::Ip(ip));
        }
        if let Ok(net) = pattern.parse::<IpNet>() {
            return Ok(Matcher::Cidr(net.trunc()));
        }
        DomainMatcher::new(pattern).map(Matcher::Domain)
    }

    /// Check whether `value` (a bare host, no port) matches this pattern.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Matcher::Ip(ip) => value.parse::<IpAddr>().is_ok_and(|v| v == *ip),
            Matcher::Cidr(net) => value.parse::<IpAddr>().is_ok_and(|v| net.contains(&v)),
            Matcher::Domain(domain) => domain.matches(value),
        }
    }
}

impl std::fmt::Display for Matcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Matcher::Ip(ip) => write!(f, "{ip}"),
            Matcher::Cidr(net) => write!(f, "{net}"),
            Matcher::Domain(domain) => write!(f, "{}", domain.source),
        }
    }
}

/// Domain pattern matcher.
///
/// A leading dot (`.example.com`) matches the domain itself and every
/// subdomain: the exact form is stored without the dot and the glob becomes
/// `*.example.com`. A bare pattern matches by equality or by glob.
#[derive(Debug, Clone)]
pub struct DomainMatcher {
    source: String,
    exact: String,
    glob: Regex,
}

impl DomainMatcher {
    pub fn new(pattern: &str) -> Result<Self, BypassError> {
        let lower = pattern.to_ascii_lowercase();
        let (exact, glob) = match lower.strip_prefix('.') {
            Some(rest) => (rest.to_string(), format!("*.{rest}")),
            None => (lower.clone(), lower),
        };
        let glob = compile_glob(&glob).map_err(|e| BypassError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            exact,
            glob,
        })
    }

    /// Check if `domain` matches. Comparison is ASCII case-insensitive.
    pub fn matches(&self, domain: &str) -> bool {
        if domain.eq_ignore_ascii_case(&self.exact) {
            return true;
        }
        self.glob.is_match(&domain.to_ascii_lowercase())
    }

    /// The pattern as written in configuration.
    pub fn pattern(&self) -> &str {
        &self.source
    }
}

/// Translate a shell-style glob into an anchored regex.
fn compile_glob(glob: &str) -> Result<Regex, regex::Error> {
    let mut re = String::with_capacity(glob.len() * 2 + 2);
    re.push('^');
    let mut buf = [0u8; 4];
    for ch in glob.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            _ => re.push_str(&regex::escape(ch.encode_utf8(&mut buf))),
        }
    }
    re.push('$');
    Regex::new(&re)
}
