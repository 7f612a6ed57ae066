//! Name resolution backends for hopchain routers.
//!
//! - [`DnsResolver`]: caching resolver backed by
//!   [`hickory-resolver`](https://crates.io/crates/hickory-resolver), using
//!   the system configuration or custom UDP/TCP/TLS/HTTPS nameservers.
//! - [`Hosts`]: static host table consulted before DNS.
//!
//! Both plug into a router through the `Resolver` and `HostMapper` traits
//! of `hopchain-chain`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hopchain_chain::Router;
//! use hopchain_dns::{DnsConfig, DnsResolver, Hosts};
//!
//! # fn example() -> Result<(), hopchain_dns::DnsError> {
//! let resolver = DnsResolver::new(&DnsConfig::default())?;
//! let mut hosts = Hosts::new();
//! hosts.insert("db.internal", ["10.0.0.5".parse().unwrap()]);
//!
//! let router = Router::builder()
//!     .resolver(Arc::new(resolver))
//!     .hosts(Arc::new(hosts))
//!     .build();
//! # let _ = router;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hosts;
pub mod resolver;

pub use config::{DnsConfig, DnsStrategy, HostEntry};
pub use error::DnsError;
pub use hosts::Hosts;
pub use resolver::DnsResolver;
