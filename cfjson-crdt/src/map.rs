//! Map facet: string keys to child nodes.

use crate::node::Node;
use crate::presence::Presence;
use crate::value::Value;
use crate::vector_clock::VectorClock;
use std::collections::BTreeMap;

/// Children keyed by string. Children are materialized on first lookup and
/// never removed; a deleted child just loses its presence.
#[derive(Debug, Clone, Default)]
pub struct Map {
    pub(crate) presence: Presence,
    children: BTreeMap<String, Node>,
}

impl Map {
    /// Returns true if the map facet has presence.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.presence.exists()
    }

    /// The map facet's presence set.
    #[must_use]
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    /// Looks up a child without creating it.
    #[must_use]
    pub fn child(&self, key: &str) -> Option<&Node> {
        self.children.get(key)
    }

    pub(crate) fn child_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.children.get_mut(key)
    }

    /// Looks up a child, materializing an empty node if the key is new.
    pub(crate) fn child_or_create(&mut self, key: &str) -> &mut Node {
        self.children.entry(key.to_string()).or_default()
    }

    /// All children, including tombstoned ones, in key order.
    pub fn children(&self) -> impl Iterator<Item = (&String, &Node)> {
        self.children.iter()
    }

    pub(crate) fn build(&mut self, entries: &BTreeMap<String, Value>, now: &VectorClock) {
        self.presence.access(now);
        for (key, value) in entries {
            self.child_or_create(key).build(value, now);
        }
    }

    pub(crate) fn clear(&mut self, now: &VectorClock) {
        self.presence.clear(now);
        for child in self.children.values_mut() {
            child.clear(now);
            self.presence.extend(child.actions());
        }
    }
}
