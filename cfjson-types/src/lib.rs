//! Core type definitions for cfjson.
//!
//! This crate defines the identifiers shared by the document engine and the
//! sync layer:
//! - Replica identifiers (UUID v7)
//! - Stable list item identifiers
//!
//! Causal timestamps and the document model itself live in `cfjson-crdt`.

mod ids;
mod item;

pub use ids::ReplicaId;
pub use item::ItemId;

/// Errors that can occur when parsing identifiers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid item id: {0}")]
    InvalidItemId(String),
}
