//! Storage error types.

use thiserror::Error;

/// Errors that can occur while appending to the audit log.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error opening or writing the log file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error while rendering a payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
