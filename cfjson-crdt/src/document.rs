//! The replicated JSON document.
//!
//! Exposes the three structural operations (assign, insert, delete). Each one
//! resolves its cursor and checks every failure condition before touching
//! the tree, so a rejected operation leaves the document exactly as it was.

use crate::cursor::{Cursor, PathSegment};
use crate::error::{CrdtError, CrdtResult};
use crate::node::Node;
use crate::operation::{Mutation, Operation};
use crate::snapshot::Snapshot;
use crate::value::Value;
use crate::vector_clock::{ActionId, VectorClock};
use cfjson_types::ItemId;
use std::collections::{BTreeMap, BTreeSet};

/// A conflict-free JSON document held by one replica.
#[derive(Debug, Clone, Default)]
pub struct Document {
    root: Node,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Applies a timestamped operation.
    pub fn apply(&mut self, op: &Operation) -> CrdtResult<()> {
        match &op.mutation {
            Mutation::Assign { value } => self.assign(&op.cursor, &op.timestamp, value),
            Mutation::Insert { id, value } => self.insert(&op.cursor, *id, &op.timestamp, value),
            Mutation::Delete => self.delete(&op.cursor, &op.timestamp),
        }
    }

    /// Replaces the node at `cursor` with a fresh subtree built from `value`.
    ///
    /// The old subtree is tombstoned with `now`; anything written
    /// concurrently with `now` survives next to the new contents.
    pub fn assign(&mut self, cursor: &Cursor, now: &VectorClock, value: &Value) -> CrdtResult<()> {
        let path = cursor.segments();
        self.root.locate(path)?;

        let node = self.root.descend_mut(path, now)?;
        node.clear(now);
        node.build(value, now);
        Ok(())
    }

    /// Inserts a list item `id` after the anchor named by the cursor's last
    /// segment (`Head` for the front of the list).
    pub fn insert(
        &mut self,
        cursor: &Cursor,
        id: ItemId,
        now: &VectorClock,
        value: &Value,
    ) -> CrdtResult<()> {
        let (anchor, path) = cursor.split_last().ok_or_else(|| {
            CrdtError::Structural("insert requires an anchor segment".into())
        })?;
        if let PathSegment::Key(_) = anchor {
            return Err(CrdtError::Structural(
                "map does not support insert; use assign".into(),
            ));
        }

        let target = self.root.locate(path)?;
        let index = match target.and_then(Node::list) {
            Some(list) => list.insertion_index(anchor, &id, now)?,
            None => match anchor {
                PathSegment::Item(anchor_id) => return Err(CrdtError::UnknownItem(*anchor_id)),
                _ => 0,
            },
        };

        let node = self.root.descend_mut(path, now)?;
        node.list_mut().insert_at(index, id, now).build(value, now);
        Ok(())
    }

    /// Tombstones the node at `cursor`: removes every action observed by `now`
    /// from its subtree. Deleting a key that was never written is a no-op.
    pub fn delete(&mut self, cursor: &Cursor, now: &VectorClock) -> CrdtResult<()> {
        let path = cursor.segments();
        if self.root.locate(path)?.is_none() {
            return Ok(());
        }
        if let Some(node) = self.root.locate_mut(path) {
            node.clear(now);
        }
        Ok(())
    }

    /// Visible state of the whole document. An empty document is an empty map.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.root
            .snapshot()
            .unwrap_or_else(|| Snapshot::Map(BTreeMap::new()))
    }

    /// Visible state of the node at `cursor`, if it exists.
    #[must_use]
    pub fn get(&self, cursor: &Cursor) -> Option<Snapshot> {
        self.node(cursor)?.snapshot()
    }

    /// Returns true if the node at `cursor` exists.
    #[must_use]
    pub fn exists(&self, cursor: &Cursor) -> bool {
        self.node(cursor).is_some_and(Node::exists)
    }

    /// Presence set of the node at `cursor` (empty if never materialized).
    #[must_use]
    pub fn presence(&self, cursor: &Cursor) -> BTreeSet<ActionId> {
        self.node(cursor).map(Node::presence).unwrap_or_default()
    }

    /// Every live register value at `cursor`, whatever the node resolves to.
    #[must_use]
    pub fn register_values(&self, cursor: &Cursor) -> Vec<(ActionId, serde_json::Value)> {
        self.node(cursor)
            .and_then(Node::register)
            .map(|register| {
                register
                    .values()
                    .map(|(action, value)| (*action, value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ids of the visible items of the list at `cursor`.
    #[must_use]
    pub fn item_ids(&self, cursor: &Cursor) -> Vec<ItemId> {
        self.node(cursor)
            .and_then(Node::list)
            .map(|list| list.visible().map(|item| item.id()).collect())
            .unwrap_or_default()
    }

    /// Plain JSON rendering of the document.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.snapshot().to_json()
    }

    fn node(&self, cursor: &Cursor) -> Option<&Node> {
        self.root.locate(cursor.segments()).ok().flatten()
    }
}
