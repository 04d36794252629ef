//! Replica state machine, without I/O.
//!
//! A replica owns one document. Local edits are applied immediately and
//! returned as operations for the caller to broadcast; remote operations go
//! through the [`CausalBuffer`] and are applied once causally ready. The
//! async driver in [`crate::SyncedReplica`] wires this to a transport.

use crate::config::ReplicaConfig;
use crate::delivery::CausalBuffer;
use crate::error::{SyncError, SyncResult};
use cfjson_crdt::{
    ActionId, CrdtError, Cursor, Document, ItemId, NodeKind, Operation, ReplicaId, Snapshot,
    Value, VectorClock,
};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Outcome of handing one remote operation to a replica.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Operations applied to the document, in delivery order.
    pub delivered: Vec<ActionId>,
    /// Operations that were causally ready but rejected by the document.
    /// Their timestamps are still merged into the local clock.
    pub rejected: Vec<(ActionId, CrdtError)>,
}

impl DeliveryReport {
    /// Returns true if nothing was delivered or rejected.
    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.rejected.is_empty()
    }
}

/// One replica of a shared document.
pub struct Replica {
    id: ReplicaId,
    config: ReplicaConfig,
    buffer: CausalBuffer,
    document: Document,
    snapshots: watch::Sender<Snapshot>,
}

impl Replica {
    /// Creates a replica with a fresh id.
    pub fn new(config: ReplicaConfig) -> Self {
        Self::with_id(ReplicaId::new(), config)
    }

    /// Creates a replica with the given id.
    pub fn with_id(id: ReplicaId, config: ReplicaConfig) -> Self {
        let document = Document::new();
        let (snapshots, _) = watch::channel(document.snapshot());
        Self {
            id,
            config,
            buffer: CausalBuffer::new(id),
            document,
            snapshots,
        }
    }

    /// This replica's id.
    pub fn id(&self) -> ReplicaId {
        self.id
    }

    /// Configuration.
    pub fn config(&self) -> &ReplicaConfig {
        &self.config
    }

    /// The local vector clock.
    pub fn clock(&self) -> &VectorClock {
        self.buffer.clock()
    }

    /// The local document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Visible state of the local document.
    pub fn snapshot(&self) -> Snapshot {
        self.document.snapshot()
    }

    /// Plain JSON rendering of the local document.
    pub fn to_json(&self) -> serde_json::Value {
        self.document.to_json()
    }

    /// Number of remote operations waiting for their dependencies.
    pub fn pending_len(&self) -> usize {
        self.buffer.pending_len()
    }

    /// Subscribes to document changes. The receiver starts at the current
    /// snapshot and sees a new one after every local edit and every
    /// delivery that changed the document.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    // ── Local edits ──────────────────────────────────────────────

    /// Replaces the node at `cursor` with `value`.
    pub fn assign(&mut self, cursor: Cursor, value: Value) -> SyncResult<Operation> {
        self.commit(|timestamp| Operation::assign(cursor, timestamp, value))
    }

    /// Replaces the node at `cursor` with plain JSON, giving every array
    /// element a fresh item id.
    pub fn assign_json(&mut self, cursor: Cursor, json: &serde_json::Value) -> SyncResult<Operation> {
        self.commit(|timestamp| {
            let value = Value::from_json(json, &mut item_ids(&timestamp, 0));
            Operation::assign(cursor, timestamp, value)
        })
    }

    /// Inserts `value` as a new list item after the anchor named by the
    /// cursor's last segment. Returns the new item's id with the operation.
    pub fn insert(&mut self, cursor: Cursor, value: Value) -> SyncResult<(ItemId, Operation)> {
        self.check_insert_target(&cursor)?;
        let id = self.next_item_id();
        let op = self.commit(|timestamp| Operation::insert(cursor, id, timestamp, value))?;
        Ok((id, op))
    }

    /// Inserts plain JSON as a new list item. Nested array elements get
    /// fresh item ids after the new item's own.
    pub fn insert_json(
        &mut self,
        cursor: Cursor,
        json: &serde_json::Value,
    ) -> SyncResult<(ItemId, Operation)> {
        self.check_insert_target(&cursor)?;
        let id = self.next_item_id();
        let op = self.commit(|timestamp| {
            let value = Value::from_json(json, &mut item_ids(&timestamp, 1));
            Operation::insert(cursor, id, timestamp, value)
        })?;
        Ok((id, op))
    }

    /// Tombstones the node at `cursor`.
    pub fn delete(&mut self, cursor: Cursor) -> SyncResult<Operation> {
        self.commit(|timestamp| Operation::delete(cursor, timestamp))
    }

    /// Stamps an edit with the next clock value and applies it. The clock
    /// only moves forward if the document accepted the edit.
    fn commit<F>(&mut self, build: F) -> SyncResult<Operation>
    where
        F: FnOnce(VectorClock) -> Operation,
    {
        let op = build(self.buffer.clock().advanced());
        self.document.apply(&op)?;
        self.buffer.record_local(&op.timestamp);
        debug!(
            replica = %self.config.name,
            action = %op.action_id(),
            kind = op.kind(),
            cursor = %op.cursor,
            "applied local edit"
        );
        self.publish_snapshot();
        Ok(op)
    }

    /// Rejects a local insert whose parent is currently a map. The document
    /// would accept it as a hidden list facet, so remote copies still apply;
    /// only the local caller is refused.
    fn check_insert_target(&self, cursor: &Cursor) -> SyncResult<()> {
        let Some((_, parent)) = cursor.split_last() else {
            return Ok(());
        };
        match self.document.root().locate(parent) {
            Ok(Some(node)) if node.kind() == Some(NodeKind::Map) => Err(CrdtError::Structural(
                "map does not support insert; use assign".into(),
            )
            .into()),
            _ => Ok(()),
        }
    }

    /// Id for an item created by the next local edit.
    fn next_item_id(&self) -> ItemId {
        ItemId::new(self.buffer.clock().total() + 1, self.id, 0)
    }

    // ── Remote operations ────────────────────────────────────────

    /// Hands a remote operation to the causal buffer and applies everything
    /// that became deliverable.
    ///
    /// Operations the document rejects do not stop delivery: their clocks
    /// are merged so later operations from the same sender are not blocked,
    /// and they are listed in the report. The replica's own operations are
    /// ignored.
    pub fn receive(&mut self, op: Operation) -> SyncResult<DeliveryReport> {
        if op.sender() == self.id {
            debug!(replica = %self.config.name, action = %op.action_id(), "ignoring own operation");
            return Ok(DeliveryReport::default());
        }
        let issued = self.buffer.clock().get(&self.id);
        if op.timestamp.get(&self.id) > issued {
            return Err(SyncError::Protocol(format!(
                "operation {} depends on {} local events, only {issued} were issued",
                op.action_id(),
                op.timestamp.get(&self.id),
            )));
        }

        let mut report = DeliveryReport::default();
        let name = &self.config.name;
        let document = &mut self.document;
        self.buffer.receive(op, |op| match document.apply(&op) {
            Ok(()) => {
                debug!(replica = %name, action = %op.action_id(), kind = op.kind(), "delivered");
                report.delivered.push(op.action_id());
            }
            Err(err) => {
                warn!(
                    replica = %name,
                    action = %op.action_id(),
                    cursor = %op.cursor,
                    error = %err,
                    "rejected remote operation"
                );
                report.rejected.push((op.action_id(), err));
            }
        });

        if !report.delivered.is_empty() {
            self.publish_snapshot();
        }
        let pending = self.buffer.pending_len();
        if pending > self.config.pending_warn_threshold {
            warn!(replica = %self.config.name, pending, "causal buffer is growing");
        }
        Ok(report)
    }

    /// Decodes a wire-format operation and receives it.
    pub fn receive_json(&mut self, json: &str) -> SyncResult<DeliveryReport> {
        let op = Operation::from_json(json)?;
        self.receive(op)
    }

    fn publish_snapshot(&self) {
        self.snapshots.send_replace(self.document.snapshot());
    }
}

/// Item ids for the arrays of one edit: `(clock total, replica, seq)` with
/// `seq` counting up from `first`.
fn item_ids(timestamp: &VectorClock, first: u32) -> impl FnMut() -> ItemId + use<> {
    let clock = timestamp.total();
    let replica = timestamp.replica();
    let mut seq = first;
    move || {
        let id = ItemId::new(clock, replica, seq);
        seq += 1;
        id
    }
}
