//! Error types for tutorgate-core

use thiserror::Error;

/// Main error type for the tutorgate-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed request (missing messages, last message not from the user, ...)
    #[error("invalid request: {0}")]
    Validation(String),

    /// A backend adapter failed (network, auth, quota or parsing)
    #[error("{backend} backend error: {message}")]
    Backend { backend: String, message: String },

    /// A backend adapter did not answer within its time budget
    #[error("{backend} backend timed out after {timeout:?}")]
    Timeout {
        backend: String,
        timeout: std::time::Duration,
    },

    /// A turn is already in flight for this session
    #[error("session {0} already has a turn in flight")]
    SessionBusy(String),

    /// Session not found
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Knowledge base record not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a backend error for the named adapter.
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// True for failures the router recovers from by moving to the next adapter.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Error::Backend { .. } | Error::Timeout { .. } | Error::Json(_)
        )
    }
}

/// Result type alias for tutorgate-core
pub type Result<T> = std::result::Result<T, Error>;
