//! Error types for reqsift.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SiftError {
    /// The borrowed Query capability refused or failed a call.
    #[error("query capability error: {0}")]
    Capability(String),
}

impl SiftError {
    /// Create a capability error from any underlying failure.
    pub fn capability(message: impl Into<String>) -> Self {
        Self::Capability(message.into())
    }
}

/// Result type alias for reqsift operations.
pub type SiftResult<T> = Result<T, SiftError>;
