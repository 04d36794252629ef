//! Multi-value register facet.
//!
//! Stores one value per live write. A write first drops every value its
//! clock has observed, so concurrent writes coexist until a causally later
//! write or delete subsumes them.

use crate::vector_clock::{ActionId, VectorClock};
use std::collections::BTreeMap;

/// A register holding the concurrently-live values of a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Register {
    /// Live values keyed by the write that produced them.
    values: BTreeMap<ActionId, serde_json::Value>,
}

impl Register {
    /// Returns true if at least one value is live.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.values.is_empty()
    }

    /// Writes `value` at `now`, replacing every value `now` has observed.
    pub fn assign(&mut self, value: serde_json::Value, now: &VectorClock) {
        self.clear(now);
        self.values.insert(now.action_id(), value);
    }

    /// Drops every value written by an action observed by `now`.
    pub fn clear(&mut self, now: &VectorClock) {
        self.values.retain(|action, _| !now.depends_on(action));
    }

    /// The writes keeping this register alive.
    pub fn actions(&self) -> impl Iterator<Item = ActionId> + '_ {
        self.values.keys().copied()
    }

    /// Live values in ActionId order.
    pub fn values(&self) -> impl Iterator<Item = (&ActionId, &serde_json::Value)> {
        self.values.iter()
    }

    /// Number of live values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no value is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
