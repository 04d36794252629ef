//! Error types for the sync layer.

use cfjson_crdt::CrdtError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The document rejected an edit.
    #[error("document error: {0}")]
    Crdt(#[from] CrdtError),

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,

    /// Protocol error (an operation that no well-behaved replica could send).
    #[error("protocol error: {0}")]
    Protocol(String),
}
