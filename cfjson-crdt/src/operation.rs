//! Operations: cursor-addressed edits stamped with a vector clock.
//!
//! Wire shape (JSON):
//!
//! ```text
//! { "replica": "<uuid>",
//!   "cursor": [{"key": "todos"}, "head"],
//!   "timestamp": {"<uuid>": 3},
//!   "kind": "insert",
//!   "id": "3:<uuid>:0",
//!   "value": {"type": "register", "value": "milk"} }
//! ```

use crate::cursor::Cursor;
use crate::error::CrdtError;
use crate::value::Value;
use crate::vector_clock::{ActionId, VectorClock};
use cfjson_types::{ItemId, ReplicaId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What an operation does at its cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Mutation {
    /// Replace the addressed node's contents.
    Assign {
        /// New contents.
        value: Value,
    },
    /// Insert a list item after the anchor named by the cursor's last segment.
    Insert {
        /// Id of the new item.
        id: ItemId,
        /// Contents of the new item.
        value: Value,
    },
    /// Tombstone the addressed node.
    Delete,
}

/// A timestamped edit, as exchanged between replicas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireOperation", try_from = "WireOperation")]
pub struct Operation {
    /// Where the edit applies.
    pub cursor: Cursor,
    /// The issuing replica's clock right after it advanced for this edit.
    pub timestamp: VectorClock,
    /// The edit itself.
    pub mutation: Mutation,
}

impl Operation {
    /// An assign operation.
    #[must_use]
    pub fn assign(cursor: Cursor, timestamp: VectorClock, value: Value) -> Self {
        Self {
            cursor,
            timestamp,
            mutation: Mutation::Assign { value },
        }
    }

    /// An insert operation. The cursor's last segment is the anchor.
    #[must_use]
    pub fn insert(cursor: Cursor, id: ItemId, timestamp: VectorClock, value: Value) -> Self {
        Self {
            cursor,
            timestamp,
            mutation: Mutation::Insert { id, value },
        }
    }

    /// A delete operation.
    #[must_use]
    pub fn delete(cursor: Cursor, timestamp: VectorClock) -> Self {
        Self {
            cursor,
            timestamp,
            mutation: Mutation::Delete,
        }
    }

    /// The replica that issued this operation.
    #[must_use]
    pub fn sender(&self) -> ReplicaId {
        self.timestamp.replica()
    }

    /// The causal event this operation represents.
    #[must_use]
    pub fn action_id(&self) -> ActionId {
        self.timestamp.action_id()
    }

    /// Short name of the mutation, for logging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self.mutation {
            Mutation::Assign { .. } => "assign",
            Mutation::Insert { .. } => "insert",
            Mutation::Delete => "delete",
        }
    }

    /// Encodes the operation as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes an operation from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Flat wire form. The timestamp travels as a plain mapping and is turned
/// back into an owned [`VectorClock`] on decode.
#[derive(Serialize, Deserialize)]
struct WireOperation {
    replica: ReplicaId,
    cursor: Cursor,
    timestamp: BTreeMap<ReplicaId, u64>,
    #[serde(flatten)]
    mutation: Mutation,
}

impl From<Operation> for WireOperation {
    fn from(op: Operation) -> Self {
        Self {
            replica: op.timestamp.replica(),
            cursor: op.cursor,
            timestamp: op.timestamp.iter().map(|(r, n)| (*r, *n)).collect(),
            mutation: op.mutation,
        }
    }
}

impl TryFrom<WireOperation> for Operation {
    type Error = CrdtError;

    fn try_from(wire: WireOperation) -> Result<Self, Self::Error> {
        let timestamp = VectorClock::from_counts(wire.replica, wire.timestamp);
        if timestamp.get(&wire.replica) == 0 {
            return Err(CrdtError::Malformed(format!(
                "timestamp {timestamp} records no event for sender {}",
                wire.replica
            )));
        }
        Ok(Self {
            cursor: wire.cursor,
            timestamp,
            mutation: wire.mutation,
        })
    }
}
