//! Selector errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("unknown selection strategy: {0}")]
    UnknownStrategy(String),
}
