//! Error types for the responder.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

/// Server error type.
///
/// Every variant ends the connection it occurred on without a reply; none of
/// them stop the accept loop.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Read or write failure other than a peer-initiated close.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The `Encapsulated` header does not list `req-hdr`.
    #[error("req-hdr not found in encapsulated header")]
    MissingReqHdr,

    /// The peer sent more bytes than the per-connection ceiling allows.
    #[error("connection buffer exceeded {limit} bytes")]
    BufferLimit { limit: usize },

    /// The peer went quiet before completing its message.
    #[error("no data received for {0:?}")]
    IdleTimeout(Duration),

    /// Failed to bind the listening socket.
    #[error("failed to bind to {0}: {1}")]
    BindError(SocketAddr, std::io::Error),

    /// Storage error while opening the payload sink.
    #[error("storage error: {0}")]
    Storage(#[from] icapture_storage::StorageError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
