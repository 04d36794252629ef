//! Conflict-free replicated JSON documents.
//!
//! This crate provides the causal core shared by every replica:
//!
//! - [`VectorClock`]: causal timestamps and the [`ActionId`]s derived from them
//! - [`Cursor`]: structural (key / item id) addressing of document nodes
//! - [`Value`]: typed descriptors of the subtrees that edits build
//! - [`Operation`]: timestamped assign / insert / delete edits and their wire form
//! - [`Document`]: the composite CRDT (multi-value registers, lists, maps)
//!
//! Removal is done with presence sets rather than physical deletion: a node
//! exists while some edit it has not yet been deleted by keeps it alive. A
//! delete only removes the edits its clock has observed, so a write
//! concurrent with a delete survives it.
//!
//! Given the same set of operations, delivered in any causally consistent
//! order, every replica's document reaches the same state.

mod cursor;
mod document;
mod error;
mod list;
mod map;
mod node;
mod operation;
mod presence;
mod register;
mod snapshot;
mod value;
mod vector_clock;

pub use cursor::{Cursor, PathSegment};
pub use document::Document;
pub use error::{CrdtError, CrdtResult};
pub use list::{Item, List};
pub use map::Map;
pub use node::{Node, NodeKind, NodeView};
pub use operation::{Mutation, Operation};
pub use presence::Presence;
pub use register::Register;
pub use snapshot::Snapshot;
pub use value::{ListEntry, Value};
pub use vector_clock::{ActionId, Causality, ClockInvariantError, VectorClock};

pub use cfjson_types::{ItemId, ReplicaId};
