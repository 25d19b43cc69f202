//! Error types for the directory adapter.
//!
//! These errors never cross the synchronizer boundary: the synchronizer
//! converts them into a failed `SyncOutcome` so the orchestration can make
//! a clean commit/rollback decision.

use thiserror::Error;

/// Failure while talking to the legacy directory keeper.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The keeper call itself failed (connectivity, protocol, timeout).
    #[error("directory call failed: {message}")]
    CallFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The entity payload could not be encoded.
    #[error("payload encoding failed: {0}")]
    Payload(String),
}

impl DirectoryError {
    /// Create a call-failed error.
    pub fn call_failed(message: impl Into<String>) -> Self {
        DirectoryError::CallFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a call-failed error with source.
    pub fn call_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        DirectoryError::CallFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<sqlx::Error> for DirectoryError {
    fn from(err: sqlx::Error) -> Self {
        DirectoryError::CallFailed {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Result type for directory transport operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;
