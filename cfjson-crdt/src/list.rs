//! List facet: an ordered sequence of items with stable ids.
//!
//! Items are never removed. A deleted item keeps its id and creation clock so
//! it can still anchor inserts and take part in tie-breaks; only views skip
//! items without presence.

use crate::cursor::PathSegment;
use crate::error::{CrdtError, CrdtResult};
use crate::node::Node;
use crate::presence::Presence;
use crate::value::ListEntry;
use crate::vector_clock::{Causality, ClockInvariantError, VectorClock};
use cfjson_types::ItemId;

/// An element of a [`List`].
#[derive(Debug, Clone)]
pub struct Item {
    id: ItemId,
    created_at: VectorClock,
    pub(crate) node: Node,
}

impl Item {
    fn new(id: ItemId, created_at: &VectorClock) -> Self {
        Self {
            id,
            created_at: created_at.clone(),
            node: Node::default(),
        }
    }

    /// The item's stable id.
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Clock of the operation that created the item.
    #[must_use]
    pub fn created_at(&self) -> &VectorClock {
        &self.created_at
    }

    /// The item's contents.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Whether this item sorts ahead of a new item `new_id` stamped `timestamp`
    /// inserted at the same anchor.
    ///
    /// True if this item was created causally after `timestamp`, or
    /// concurrently with a greater id.
    pub fn created_after(
        &self,
        timestamp: &VectorClock,
        new_id: &ItemId,
    ) -> Result<bool, ClockInvariantError> {
        Ok(match self.created_at.compare(timestamp)? {
            Causality::After => true,
            Causality::Concurrent => self.id > *new_id,
            Causality::Before => false,
        })
    }

    /// Like [`Item::created_after`], for placement while one operation builds
    /// several items. Those items share the operation's clock, so equal
    /// clocks fall back to the id order.
    fn sorts_ahead(&self, timestamp: &VectorClock, new_id: &ItemId) -> bool {
        match self.created_at.compare(timestamp) {
            Ok(Causality::After) => true,
            Ok(Causality::Before) => false,
            Ok(Causality::Concurrent) | Err(_) => self.id > *new_id,
        }
    }
}

/// A replicated list.
#[derive(Debug, Clone, Default)]
pub struct List {
    pub(crate) presence: Presence,
    items: Vec<Item>,
}

impl List {
    /// Returns true if the list facet has presence.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.presence.exists()
    }

    /// The list facet's presence set.
    #[must_use]
    pub fn presence(&self) -> &Presence {
        &self.presence
    }

    /// All items, including tombstoned ones, in list order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Items whose contents still exist, in list order.
    pub fn visible(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.node.exists())
    }

    /// Position of an item among all items (tombstones included).
    #[must_use]
    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id == *id)
    }

    /// Looks up an item by id.
    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == *id)
    }

    pub(crate) fn item_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id == *id)
    }

    /// Computes where a new item `id` stamped `now` lands when inserted after
    /// `anchor`.
    ///
    /// Starts right after the anchor and skips every item that sorts ahead of
    /// the new one (see [`Item::created_after`]). The result depends only on
    /// items already present, never on arrival order.
    pub fn insertion_index(
        &self,
        anchor: &PathSegment,
        id: &ItemId,
        now: &VectorClock,
    ) -> CrdtResult<usize> {
        if self.position(id).is_some() {
            return Err(CrdtError::DuplicateItem(*id));
        }

        let mut index = match anchor {
            PathSegment::Head => 0,
            PathSegment::Item(anchor_id) => {
                self.position(anchor_id)
                    .ok_or(CrdtError::UnknownItem(*anchor_id))?
                    + 1
            }
            PathSegment::Key(_) => {
                return Err(CrdtError::Structural(
                    "map does not support insert; use assign".into(),
                ));
            }
        };

        while index < self.items.len() && self.items[index].created_after(now, id)? {
            index += 1;
        }
        Ok(index)
    }

    /// Inserts a new, still empty item at `index` and returns its node.
    pub(crate) fn insert_at(&mut self, index: usize, id: ItemId, now: &VectorClock) -> &mut Node {
        self.presence.access(now);
        self.items.insert(index, Item::new(id, now));
        &mut self.items[index].node
    }

    /// Builds the items of a list value.
    ///
    /// Each new entry is placed as if inserted right after the previous entry
    /// of the value (the first one at the head), so two lists assigned
    /// concurrently to the same node interleave identically on every replica.
    /// Entries whose id is already present are rebuilt in place.
    pub(crate) fn build(&mut self, entries: &[ListEntry], now: &VectorClock) {
        self.presence.access(now);
        let mut next = 0;
        for entry in entries {
            let index = match self.position(&entry.id) {
                Some(index) => index,
                None => {
                    let mut index = next;
                    while index < self.items.len() && self.items[index].sorts_ahead(now, &entry.id)
                    {
                        index += 1;
                    }
                    self.items.insert(index, Item::new(entry.id, now));
                    index
                }
            };
            self.items[index].node.build(&entry.value, now);
            next = index + 1;
        }
    }

    pub(crate) fn clear(&mut self, now: &VectorClock) {
        self.presence.clear(now);
        for item in &mut self.items {
            item.node.clear(now);
            self.presence.extend(item.node.actions());
        }
    }

    /// Number of visible items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.visible().count()
    }

    /// Returns true if no item is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
