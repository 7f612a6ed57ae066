//! Error type labels for logging.
//!
//! These constants provide consistent error classification across all crates.

/// A route with no nodes was asked to connect.
pub const ERROR_EMPTY_ROUTE: &str = "empty_route";
/// The terminal connector cannot bind.
pub const ERROR_BIND_UNSUPPORTED: &str = "bind_unsupported";
/// Reaching a node failed.
pub const ERROR_DIAL: &str = "dial";
/// Transport or protocol handshake with a node failed.
pub const ERROR_HANDSHAKE: &str = "handshake";
/// Opening a logical stream over an established hop failed.
pub const ERROR_CONNECT: &str = "connect";
/// DNS/address resolution error.
pub const ERROR_RESOLVE: &str = "resolve";
/// Timeout error.
pub const ERROR_TIMEOUT: &str = "timeout";
/// The caller canceled the operation.
pub const ERROR_CANCELED: &str = "canceled";
/// I/O error.
pub const ERROR_IO: &str = "io";
/// Configuration error.
pub const ERROR_CONFIG: &str = "config";
