//! Base error type.
//!
//! Sub-crates define their own error enums and wrap `RailError` as one
//! variant via `#[from]`.

use thiserror::Error;

/// The error type for `rt-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum RailError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `rt-core`.
pub type RailResult<T> = Result<T, RailError>;
