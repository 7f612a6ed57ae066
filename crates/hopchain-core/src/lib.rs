//! Core constants shared across hopchain crates.
//!
//! This crate provides:
//! - Default values for selection, retry and timeout behaviour
//! - Error type labels for logging
//! - Common project metadata

pub mod defaults;
pub mod errors;

// Re-export commonly used items at crate root
pub use defaults::*;
pub use errors::*;

/// Project name.
pub const PROJECT_NAME: &str = "hopchain";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
