//! Bypass and admission filters.
//!
//! A [`Bypass`] is consulted with an outgoing destination when a node is
//! selected: if it contains the destination, the node refuses to carry it.
//! An [`Admission`] has identical semantics and is consulted with the peer
//! address of an incoming connection.

use crate::error::BypassError;
use crate::matcher::Matcher;

/// A reversible list of [`Matcher`]s.
///
/// Immutable after construction; share it through `Arc`.
#[derive(Debug, Clone, Default)]
pub struct Bypass {
    matchers: Vec<Matcher>,
    reversed: bool,
}

impl Bypass {
    pub fn new(matchers: Vec<Matcher>, reversed: bool) -> Self {
        Self { matchers, reversed }
    }

    /// Compile a list of patterns. Blank entries are skipped.
    pub fn from_patterns<I, S>(patterns: I, reversed: bool) -> Result<Self, BypassError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matchers = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            matchers.push(Matcher::new(pattern)?);
        }
        Ok(Self::new(matchers, reversed))
    }

    /// Parse a line-oriented pattern list.
    ///
    /// ```text
    /// # private ranges
    /// 10.0.0.0/8 172.16.0.0/12
    /// .internal
    /// reverse true
    /// ```
    pub fn parse(text: &str) -> Result<Self, BypassError> {
        let mut matchers = Vec::new();
        let mut reversed = false;

        for (idx, raw) in text.lines().enumerate() {
            let line = match raw.find('#') {
                Some(pos) => &raw[..pos],
                None => raw,
            };
            let mut fields = line.split_whitespace();
            let Some(first) = fields.next() else {
                continue;
            };

            if first.eq_ignore_ascii_case("reverse") {
                reversed = match fields.next().map(str::to_ascii_lowercase).as_deref() {
                    Some("true") | None => true,
                    Some("false") => false,
                    Some(_) => {
                        return Err(BypassError::InvalidDirective {
                            line: idx + 1,
                            text: raw.trim().to_string(),
                        });
                    }
                };
                continue;
            }

            matchers.push(Matcher::new(first)?);
            for pattern in fields {
                matchers.push(Matcher::new(pattern)?);
            }
        }

        Ok(Self::new(matchers, reversed))
    }

    /// Report whether `addr` is contained in this bypass.
    ///
    /// A numeric port suffix is stripped before matching; anything else
    /// after the last colon is treated as part of the host. An empty list
    /// never contains anything, whatever `reversed` says.
    pub fn contains(&self, addr: &str) -> bool {
        if addr.is_empty() || self.matchers.is_empty() {
            return false;
        }
        let host = strip_port(addr);
        let matched = self.matchers.iter().any(|m| m.matches(host));
        matched != self.reversed
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }
}

/// Admission filter for incoming peers.
///
/// Same matching rules as [`Bypass`]; [`Admission::admit`] is the negation of
/// [`Admission::contains`].
#[derive(Debug, Clone, Default)]
pub struct Admission(Bypass);

impl Admission {
    pub fn new(matchers: Vec<Matcher>, reversed: bool) -> Self {
        Self(Bypass::new(matchers, reversed))
    }

    pub fn from_patterns<I, S>(patterns: I, reversed: bool) -> Result<Self, BypassError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Bypass::from_patterns(patterns, reversed).map(Self)
    }

    pub fn parse(text: &str) -> Result<Self, BypassError> {
        Bypass::parse(text).map(Self)
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.0.contains(addr)
    }

    /// Whether a peer at `addr` may connect.
    pub fn admit(&self, addr: &str) -> bool {
        !self.0.contains(addr)
    }

    pub fn matchers(&self) -> &[Matcher] {
        self.0.matchers()
    }

    pub fn is_reversed(&self) -> bool {
        self.0.is_reversed()
    }
}

impl From<Bypass> for Admission {
    fn from(bypass: Bypass) -> Self {
        Self(bypass)
    }
}

/// Strip a `:port` suffix when the port is a positive integer.
///
/// Handles `[v6]:port`; an unbracketed IPv6 literal is returned unchanged.
fn strip_port(addr: &str) -> &str {
    if let Some(rest) = addr.strip_prefix('[') {
        if let Some((host, port)) = rest.split_once("]:") {
            if !host.is_empty() && valid_port(port) {
                return host;
            }
        }
        return addr;
    }

    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && !host.contains(':') && valid_port(port) => host,
        _ => addr,
    }
}

fn valid_port(port: &str) -> bool {
    port.parse::<u16>().is_ok_and(|p| p > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bypass(patterns: &[&str], reversed: bool) -> Bypass {
        Bypass::from_patterns(patterns.iter().copied(), reversed).unwrap()
    }

    #[test]
    fn strip_port_variants() {
        assert_eq!(strip_port("example.com:443"), "example.com");
        assert_eq!(strip_port("10.0.0.1:80"), "10.0.0.1");
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("example.com"), "example.com");
        assert_eq!(strip_port("example.com:http"), "example.com:http");
        assert_eq!(strip_port("example.com:0"), "example.com:0");
        assert_eq!(strip_port(":443"), ":443");
    }

    #[test]
    fn contains_strips_numeric_port() {
        let b = bypass(&["192.168.1.0/24", ".example.com"], false);
        assert!(b.contains("192.168.1.17:443"));
        assert!(b.contains("192.168.1.17"));
        assert!(b.contains("a.example.com:8080"));
        assert!(!b.contains("8.8.8.8:53"));
    }

    #[test]
    fn non_numeric_port_is_part_of_host() {
        let b = bypass(&["example.com"], false);
        assert!(!b.contains("example.com:http"));
        let glob = bypass(&["example.com:*"], false);
        assert!(glob.contains("example.com:http"));
    }

    #[test]
    fn reversed_inverts_result() {
        let b = bypass(&["10.0.0.0/8"], true);
        assert!(!b.contains("10.1.1.1:80"));
        assert!(b.contains("8.8.8.8:80"));
    }

    #[test]
    fn empty_bypass_matches_nothing() {
        for reversed in [false, true] {
            let b = Bypass::new(vec![], reversed);
            assert!(!b.contains("example.com:443"));
            assert!(!b.contains("10.0.0.1"));
        }
    }

    #[test]
    fn empty_address_never_contained() {
        let b = bypass(&["*"], true);
        assert!(!b.contains(""));
    }

    #[test]
    fn parse_with_comments_and_directive() {
        let b = Bypass::parse(
            r#"
# private
10.0.0.0/8 172.16.0.0/12   # two on one line
.internal

reverse true
"#,
        )
        .unwrap();
        assert_eq!(b.len(), 3);
        assert!(b.is_reversed());
        assert!(!b.contains("10.2.3.4:22"));
        assert!(b.contains("example.com:443"));
    }

    #[test]
    fn parse_rejects_bad_directive() {
        let err = Bypass::parse("reverse maybe").unwrap_err();
        assert!(matches!(err, BypassError::InvalidDirective { line: 1, .. }));
    }

    #[test]
    fn admission_mirrors_bypass() {
        let a = Admission::from_patterns(["127.0.0.1", "::1"], true).unwrap();
        assert!(a.admit("127.0.0.1:50000"));
        assert!(a.admit("[::1]:50000"));
        assert!(!a.admit("203.0.113.9:50000"));
        assert_eq!(a.contains("203.0.113.9:50000"), !a.admit("203.0.113.9:50000"));
    }

    #[test]
    fn send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Bypass>();
        assert_send_sync::<Admission>();
    }
}
