//! Store error types.

use thiserror::Error;

/// Errors returned by the control plane.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Object with the same name already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Control plane could not be reached.
    #[error("transport: {0}")]
    Transport(String),

    /// Control plane answered with an unexpected status.
    #[error("api error {status}: {message}")]
    Api { status: u16, message: String },

    /// Object could not be decoded.
    #[error("decode: {0}")]
    Decode(String),

    /// Internal error.
    #[error("internal: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Treat a missing object as success.
pub fn ignore_not_found(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}
