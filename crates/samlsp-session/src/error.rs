//! Session error types.

use thiserror::Error;

/// Errors that can occur during session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Storage backend failure.
    #[error("Session storage error: {0}")]
    Storage(String),

    /// A value could not be converted to or from JSON.
    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
