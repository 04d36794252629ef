//! Stable identifiers for list items.

use crate::{Error, ReplicaId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Unique identifier for an item in a replicated list.
///
/// Combines a logical clock reading, the issuing replica and a sequence
/// number for items created by the same operation. Replicas use the sum of
/// the issuing operation's vector clock as `clock`, so an item created after
/// another (causally) always carries a greater id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId {
    /// Logical time of the creating operation.
    pub clock: u64,
    /// Which replica created this item.
    pub replica: ReplicaId,
    /// Sequence number among items created by the same operation.
    pub seq: u32,
}

impl ItemId {
    /// Creates a new item ID.
    #[must_use]
    pub const fn new(clock: u64, replica: ReplicaId, seq: u32) -> Self {
        Self {
            clock,
            replica,
            seq,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.clock, self.replica, self.seq)
    }
}

impl FromStr for ItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 {
            return Err(Error::InvalidItemId(s.to_string()));
        }

        let clock: u64 = parts[0]
            .parse()
            .map_err(|_| Error::InvalidItemId(format!("invalid clock in '{s}'")))?;
        let replica = ReplicaId::parse(parts[1])?;
        let seq: u32 = parts[2]
            .parse()
            .map_err(|_| Error::InvalidItemId(format!("invalid seq in '{s}'")))?;

        Ok(Self::new(clock, replica, seq))
    }
}

impl TryFrom<String> for ItemId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.to_string()
    }
}

impl PartialOrd for ItemId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ItemId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.clock
            .cmp(&other.clock)
            .then_with(|| self.replica.cmp(&other.replica))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}
