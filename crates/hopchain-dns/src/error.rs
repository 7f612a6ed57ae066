//! DNS resolver errors.

use hopchain_chain::ResolveError;

#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    #[error("dns lookup returned no results for {0}")]
    NoResults(String),

    #[error("dns lookup failed: {0}")]
    Lookup(#[from] hickory_resolver::ResolveError),

    /// Not something DNS can answer (empty host, unknown network).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("invalid dns server url: {0}")]
    InvalidServer(String),
}

impl From<DnsError> for ResolveError {
    fn from(err: DnsError) -> Self {
        match err {
            DnsError::InvalidQuery(q) => ResolveError::Invalid(q),
            other => ResolveError::Lookup(other.to_string()),
        }
    }
}
