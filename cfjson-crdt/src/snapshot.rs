//! Externally visible document state.

use crate::vector_clock::ActionId;
use cfjson_types::ItemId;
use std::collections::BTreeMap;

/// A read-only copy of the visible part of a (sub)document.
///
/// Tombstoned nodes are omitted. Registers expose every concurrently-live
/// value in ActionId order; [`Snapshot::to_json`] collapses them.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Existing children by key.
    Map(BTreeMap<String, Snapshot>),
    /// Existing items with their ids, in list order.
    List(Vec<(ItemId, Snapshot)>),
    /// Live values, ordered by the ActionId that wrote them.
    Register(Vec<(ActionId, serde_json::Value)>),
}

impl Snapshot {
    /// Renders plain JSON.
    ///
    /// A register with several live values renders the value written by the
    /// greatest ActionId. Use [`Snapshot::values`] to see all of them.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Map(children) => serde_json::Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_json()))
                    .collect(),
            ),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(|(_, item)| item.to_json()).collect())
            }
            Self::Register(values) => values
                .last()
                .map(|(_, value)| value.clone())
                .unwrap_or(serde_json::Value::Null),
        }
    }

    /// All live values of a register snapshot, in ActionId order.
    #[must_use]
    pub fn values(&self) -> Option<Vec<&serde_json::Value>> {
        match self {
            Self::Register(values) => Some(values.iter().map(|(_, value)| value).collect()),
            _ => None,
        }
    }

    /// Returns true if a register snapshot holds more than one live value.
    #[must_use]
    pub fn is_conflicted(&self) -> bool {
        matches!(self, Self::Register(values) if values.len() > 1)
    }

    /// Ids of the visible items of a list snapshot.
    #[must_use]
    pub fn item_ids(&self) -> Option<Vec<ItemId>> {
        match self {
            Self::List(items) => Some(items.iter().map(|(id, _)| *id).collect()),
            _ => None,
        }
    }

    /// Child snapshot under `key` of a map snapshot.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Snapshot> {
        match self {
            Self::Map(children) => children.get(key),
            _ => None,
        }
    }
}
