//! Causal delivery buffer.
//!
//! Remote operations may arrive before the operations they depend on (the
//! transport is only FIFO per sender). The buffer holds them back until the
//! local clock has seen everything the operation's timestamp had seen.

use cfjson_crdt::{Operation, ReplicaId, VectorClock};
use tracing::debug;

/// Local clock plus the operations not yet deliverable against it.
#[derive(Debug, Clone)]
pub struct CausalBuffer {
    clock: VectorClock,
    pending: Vec<Operation>,
}

impl CausalBuffer {
    /// Creates an empty buffer for `replica`.
    pub fn new(replica: ReplicaId) -> Self {
        Self {
            clock: VectorClock::new(replica),
            pending: Vec::new(),
        }
    }

    /// The local clock: every delivered remote operation and every local edit.
    pub fn clock(&self) -> &VectorClock {
        &self.clock
    }

    /// Number of operations waiting for their dependencies.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Operations waiting for their dependencies, in arrival order.
    pub fn pending(&self) -> &[Operation] {
        &self.pending
    }

    /// Returns true if `op` is the sender's next operation and every
    /// operation it depends on from other replicas has been delivered.
    pub fn is_deliverable(&self, op: &Operation) -> bool {
        let sender = op.sender();
        op.timestamp.get(&sender) == self.clock.get(&sender) + 1
            && op
                .timestamp
                .iter()
                .filter(|(replica, _)| **replica != sender)
                .all(|(replica, count)| *count <= self.clock.get(replica))
    }

    /// Returns true if `op` has already been delivered (or superseded), so it
    /// can never become deliverable.
    pub fn is_stale(&self, op: &Operation) -> bool {
        op.timestamp.get(&op.sender()) <= self.clock.get(&op.sender())
    }

    /// Records a local edit stamped with `timestamp`.
    pub fn record_local(&mut self, timestamp: &VectorClock) {
        self.clock.merge(timestamp);
    }

    /// Buffers `op`, then delivers every operation that became deliverable,
    /// in causal order. `deliver` is called after the clock has merged the
    /// operation's timestamp. Returns the number of operations delivered.
    pub fn receive<F>(&mut self, op: Operation, mut deliver: F) -> usize
    where
        F: FnMut(Operation),
    {
        if self.is_stale(&op) {
            debug!(action = %op.action_id(), "dropping already delivered operation");
            return 0;
        }
        self.pending.push(op);

        let mut delivered = 0;
        while let Some(index) = self.pending.iter().position(|op| self.is_deliverable(op)) {
            let op = self.pending.remove(index);
            self.clock.merge(&op.timestamp);
            delivered += 1;
            deliver(op);
        }

        // Duplicates that were waiting alongside their original.
        let clock = &self.clock;
        self.pending
            .retain(|op| op.timestamp.get(&op.sender()) > clock.get(&op.sender()));
        delivered
    }
}
