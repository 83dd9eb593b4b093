//! Error types for payload extraction.

use thiserror::Error;

/// Errors raised while turning a request body into structured content.
///
/// None of these reach the proxy: the responder still answers `204` and
/// simply skips the audit entry.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The payload contains no `{` to start a JSON object.
    #[error("no valid json data found")]
    NoJsonObject,

    /// The candidate region is not a JSON object.
    #[error("failed to parse json: {0}")]
    Json(#[from] serde_json::Error),

    /// The form body has a broken percent escape or a `;` separator.
    #[error("failed to parse form payload: {0}")]
    Form(String),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
