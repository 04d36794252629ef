//! Structural addressing of document nodes.
//!
//! A cursor is a path from the document root. Segments name children by map
//! key or by stable list item id, never by index, so concurrent edits
//! elsewhere in the tree never invalidate a cursor.

use cfjson_types::ItemId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a [`Cursor`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathSegment {
    /// Descend into the map child stored under this key.
    Key(String),
    /// Descend into the list item with this id.
    Item(ItemId),
    /// The position before the first list item. Only valid as an insert anchor.
    Head,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, ".{key}"),
            Self::Item(id) => write!(f, "[{id}]"),
            Self::Head => write!(f, "[^]"),
        }
    }
}

/// A path from the document root to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Vec<PathSegment>);

impl Cursor {
    /// The cursor addressing the document root.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Extends the path with a map key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(PathSegment::Key(key.into()));
        self
    }

    /// Extends the path with a list item.
    #[must_use]
    pub fn item(mut self, id: ItemId) -> Self {
        self.0.push(PathSegment::Item(id));
        self
    }

    /// Ends the path with the front-of-list anchor.
    #[must_use]
    pub fn head(mut self) -> Self {
        self.0.push(PathSegment::Head);
        self
    }

    /// The path segments, root first.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root cursor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits off the last segment (the anchor of an insert).
    #[must_use]
    pub fn split_last(&self) -> Option<(&PathSegment, &[PathSegment])> {
        self.0.split_last()
    }
}

impl From<Vec<PathSegment>> for Cursor {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl FromIterator<PathSegment> for Cursor {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.0 {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}
