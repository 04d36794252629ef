//! Presence sets.
//!
//! A presence set holds the [`ActionId`]s that currently justify a facet's
//! existence, much like the tags of an observed-remove set: every write adds
//! its own tag, and a delete removes only the tags its clock has observed.

use crate::vector_clock::{ActionId, VectorClock};
use std::collections::BTreeSet;

/// The set of edits keeping a facet alive. Empty means tombstoned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence {
    actions: BTreeSet<ActionId>,
}

impl Presence {
    /// Creates an empty (tombstoned) presence set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if at least one edit justifies existence.
    #[must_use]
    pub fn exists(&self) -> bool {
        !self.actions.is_empty()
    }

    /// Records the edit timestamped `now`.
    pub fn access(&mut self, now: &VectorClock) {
        self.actions.insert(now.action_id());
    }

    /// Removes every action causally observed by `now`.
    pub fn clear(&mut self, now: &VectorClock) {
        self.actions.retain(|action| !now.depends_on(action));
    }

    /// Adds actions that survived in a descendant.
    pub fn extend<I: IntoIterator<Item = ActionId>>(&mut self, actions: I) {
        self.actions.extend(actions);
    }

    /// Returns true if `action` is in the set.
    #[must_use]
    pub fn contains(&self, action: &ActionId) -> bool {
        self.actions.contains(action)
    }

    /// Iterates the actions in ActionId order.
    pub fn iter(&self) -> impl Iterator<Item = &ActionId> {
        self.actions.iter()
    }

    /// Number of live actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
