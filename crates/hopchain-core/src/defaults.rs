//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Selection Defaults
// ============================================================================

/// Failures within the fail window before a node is filtered out.
pub const DEFAULT_MAX_FAILS: u32 = 1;
/// Window (seconds) after the last failure during which a node stays excluded.
pub const DEFAULT_FAIL_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Router Defaults
// ============================================================================

/// Additional attempts after the first failed dial.
pub const DEFAULT_RETRIES: usize = 0;
/// Per-attempt dial timeout in seconds (0 = unbounded).
pub const DEFAULT_DIAL_TIMEOUT_SECS: u64 = 15;

// ============================================================================
// Bind Defaults
// ============================================================================

/// Default listen backlog for remote binds.
pub const DEFAULT_BIND_BACKLOG: usize = 128;
/// Default queue length for datagrams on a UDP bind.
pub const DEFAULT_UDP_DATA_QUEUE_SIZE: usize = 128;
/// Default datagram buffer size (bytes) on a UDP bind.
pub const DEFAULT_UDP_DATA_BUFFER_SIZE: usize = 4096;
/// Default idle TTL (seconds) of a per-peer UDP binding.
pub const DEFAULT_UDP_CONN_TTL_SECS: u64 = 5;

// ============================================================================
// Resolver Defaults
// ============================================================================

/// Default DNS cache capacity (entries).
pub const DEFAULT_DNS_CACHE_SIZE: usize = 256;

// ============================================================================
// TCP Socket Defaults
// ============================================================================

/// Default TCP_NODELAY (disable Nagle's algorithm for lower latency).
pub const DEFAULT_TCP_NO_DELAY: bool = true;
