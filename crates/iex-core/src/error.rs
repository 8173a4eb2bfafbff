//! Error types for the core value types.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid symbol
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
