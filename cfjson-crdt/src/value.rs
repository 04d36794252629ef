//! Typed value descriptors carried by assign and insert operations.

use cfjson_types::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The shape of a subtree to build under a node.
///
/// Plain JSON is ambiguous for a replicated list (array elements need stable
/// ids), so operations carry this explicit descriptor instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Value {
    /// A primitive payload stored in a register.
    Register {
        /// The payload.
        value: serde_json::Value,
    },
    /// A list whose items already carry their ids.
    List {
        /// Items in order.
        items: Vec<ListEntry>,
    },
    /// A map from string keys to nested values.
    Map {
        /// Entries by key.
        entries: BTreeMap<String, Value>,
    },
}

/// One item of a [`Value::List`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEntry {
    /// Stable id of the item.
    pub id: ItemId,
    /// Contents of the item.
    pub value: Value,
}

impl Value {
    /// A register holding `value`.
    #[must_use]
    pub fn register(value: impl Into<serde_json::Value>) -> Self {
        Self::Register {
            value: value.into(),
        }
    }

    /// A list built from `(id, value)` pairs.
    #[must_use]
    pub fn list<I: IntoIterator<Item = (ItemId, Value)>>(items: I) -> Self {
        Self::List {
            items: items
                .into_iter()
                .map(|(id, value)| ListEntry { id, value })
                .collect(),
        }
    }

    /// A map built from `(key, value)` pairs.
    #[must_use]
    pub fn map<K: Into<String>, I: IntoIterator<Item = (K, Value)>>(entries: I) -> Self {
        Self::Map {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// An empty map.
    #[must_use]
    pub fn empty_map() -> Self {
        Self::Map {
            entries: BTreeMap::new(),
        }
    }

    /// An empty list.
    #[must_use]
    pub fn empty_list() -> Self {
        Self::List { items: Vec::new() }
    }

    /// Converts plain JSON into a descriptor.
    ///
    /// Objects become maps, arrays become lists (each element gets an id from
    /// `next_id`, in document order), everything else becomes a register.
    pub fn from_json<F>(json: &serde_json::Value, next_id: &mut F) -> Self
    where
        F: FnMut() -> ItemId,
    {
        match json {
            serde_json::Value::Object(object) => Self::Map {
                entries: object
                    .iter()
                    .map(|(key, value)| (key.clone(), Self::from_json(value, next_id)))
                    .collect(),
            },
            serde_json::Value::Array(array) => Self::List {
                items: array
                    .iter()
                    .map(|value| {
                        let id = next_id();
                        ListEntry {
                            id,
                            value: Self::from_json(value, next_id),
                        }
                    })
                    .collect(),
            },
            primitive => Self::Register {
                value: primitive.clone(),
            },
        }
    }
}
