//! Error types for the document engine.

use crate::vector_clock::ClockInvariantError;
use cfjson_types::ItemId;
use thiserror::Error;

/// Result type for document operations.
pub type CrdtResult<T> = Result<T, CrdtError>;

/// Errors raised while applying an operation to a document.
///
/// Every variant is a deterministic function of the document state and the
/// operation, so all replicas reject the same operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CrdtError {
    /// The operation does not fit the addressed node.
    #[error("structural error: {0}")]
    Structural(String),

    /// A cursor names a list item that does not exist.
    #[error("unknown list item: {0}")]
    UnknownItem(ItemId),

    /// An insert reuses an item id that is already present.
    #[error("duplicate list item: {0}")]
    DuplicateItem(ItemId),

    /// An operation could not be decoded from its wire form.
    #[error("malformed operation: {0}")]
    Malformed(String),

    /// Two compared clocks were equal.
    #[error(transparent)]
    ClockInvariant(#[from] ClockInvariantError),
}
