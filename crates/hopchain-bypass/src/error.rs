//! Error types for matcher and bypass construction.

use thiserror::Error;

/// Errors that can occur while building matchers or bypass lists.
#[derive(Error, Debug)]
pub enum BypassError {
    #[error("empty pattern")]
    EmptyPattern,

    #[error("invalid pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("invalid directive on line {line}: {text}")]
    InvalidDirective { line: usize, text: String },
}
