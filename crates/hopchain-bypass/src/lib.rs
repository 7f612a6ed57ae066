//! Address matching for hopchain.
//!
//! Classifies patterns as IP literals, CIDR blocks or domain globs and
//! answers containment questions for `host` or `host:port` addresses.
//!
//! - [`Matcher`]: a single compiled pattern
//! - [`Bypass`]: a reversible list of matchers consulted at dial time
//! - [`Admission`]: the same filter consulted at accept time
//!
//! # Example
//!
//! ```
//! use hopchain_bypass::Bypass;
//!
//! let bypass = Bypass::from_patterns(["10.0.0.0/8", ".internal"], false).unwrap();
//! assert!(bypass.contains("10.1.2.3:443"));
//! assert!(bypass.contains("db.internal"));
//! assert!(!bypass.contains("example.com:443"));
//! ```

pub mod bypass;
pub mod error;
pub mod matcher;

pub use bypass::{Admission, Bypass};
pub use error::BypassError;
pub use matcher::{DomainMatcher, Matcher};
