//! Error types for the chain engine.

use std::io;

use hopchain_core::{
    ERROR_BIND_UNSUPPORTED, ERROR_CANCELED, ERROR_CONFIG, ERROR_CONNECT, ERROR_DIAL,
    ERROR_EMPTY_ROUTE, ERROR_HANDSHAKE, ERROR_IO, ERROR_RESOLVE, ERROR_TIMEOUT,
};
use thiserror::Error;

/// Errors produced while routing, dialing or binding through a chain.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("route is empty")]
    EmptyRoute,

    #[error("bind unsupported")]
    BindUnsupported,

    #[error("dial {node}: {source}")]
    Dial {
        node: String,
        #[source]
        source: io::Error,
    },

    #[error("handshake {node}: {source}")]
    Handshake {
        node: String,
        #[source]
        source: io::Error,
    },

    #[error("connect {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("resolve {0}: no usable address")]
    ResolveFailed(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("dial {0}: timed out")]
    Timeout(String),

    #[error("canceled")]
    Canceled,

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("config: {0}")]
    Config(String),
}

impl ChainError {
    /// Error type label for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            ChainError::EmptyRoute => ERROR_EMPTY_ROUTE,
            ChainError::BindUnsupported => ERROR_BIND_UNSUPPORTED,
            ChainError::Dial { .. } => ERROR_DIAL,
            ChainError::Handshake { .. } => ERROR_HANDSHAKE,
            ChainError::Connect { .. } => ERROR_CONNECT,
            ChainError::ResolveFailed(_) | ChainError::InvalidAddress(_) => ERROR_RESOLVE,
            ChainError::UnsupportedNetwork(_) => ERROR_CONNECT,
            ChainError::Timeout(_) => ERROR_TIMEOUT,
            ChainError::Canceled => ERROR_CANCELED,
            ChainError::Io(_) => ERROR_IO,
            ChainError::Config(_) => ERROR_CONFIG,
        }
    }
}

impl From<hopchain_bypass::BypassError> for ChainError {
    fn from(err: hopchain_bypass::BypassError) -> Self {
        ChainError::Config(err.to_string())
    }
}

impl From<hopchain_selector::SelectorError> for ChainError {
    fn from(err: hopchain_selector::SelectorError) -> Self {
        ChainError::Config(err.to_string())
    }
}
