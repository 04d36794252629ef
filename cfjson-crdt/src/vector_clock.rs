//! Vector Clock for causality tracking.
//!
//! A vector clock counts the events each replica has issued or observed.
//! Comparing two clocks tells whether one operation causally precedes the
//! other or whether they were issued concurrently.
//!
//! Use cases:
//! - Timestamping every issued operation
//! - Deciding when a remote operation is causally ready (see `cfjson-sync`)
//! - Tombstoning: a delete removes exactly the edits its clock has observed

use cfjson_types::ReplicaId;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Causality relationship between two distinct vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Causality {
    /// First clock happened before second.
    Before,
    /// First clock happened after second.
    After,
    /// Neither clock happened before the other.
    Concurrent,
}

/// Two compared clocks were identical.
///
/// Distinct operations never carry equal clocks, so this signals a duplicate
/// causal origin (replica id collision, a replayed or miscounted event).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("vector clock invariant violated: two events share timestamp {clock}")]
pub struct ClockInvariantError {
    /// Rendering of the offending clock.
    pub clock: String,
}

/// Identifies one causal event: the `counter`-th operation issued by `replica`.
///
/// Ordered by replica, then counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ActionId {
    /// Replica that issued the event.
    pub replica: ReplicaId,
    /// The issuing replica's own counter at that event.
    pub counter: u64,
}

impl ActionId {
    /// Creates a new action ID.
    #[must_use]
    pub const fn new(replica: ReplicaId, counter: u64) -> Self {
        Self { replica, counter }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.replica, self.counter)
    }
}

/// A Vector Clock owned by one replica.
///
/// The owner's counter advances once per locally issued operation; counters
/// of other replicas only grow through [`VectorClock::merge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorClock {
    /// The replica this clock belongs to.
    replica: ReplicaId,
    /// Map from replica ID to the number of its events observed.
    counts: BTreeMap<ReplicaId, u64>,
}

impl VectorClock {
    /// Creates an empty clock owned by `replica`.
    #[must_use]
    pub fn new(replica: ReplicaId) -> Self {
        Self {
            replica,
            counts: BTreeMap::new(),
        }
    }

    /// Rebuilds a clock from a parsed replica → count mapping.
    ///
    /// Zero entries carry no information and are dropped.
    #[must_use]
    pub fn from_counts(replica: ReplicaId, counts: BTreeMap<ReplicaId, u64>) -> Self {
        let counts = counts.into_iter().filter(|(_, n)| *n > 0).collect();
        Self { replica, counts }
    }

    /// Returns the owning replica.
    #[must_use]
    pub fn replica(&self) -> ReplicaId {
        self.replica
    }

    /// Returns the event count for a replica (0 if not present).
    #[must_use]
    pub fn get(&self, replica: &ReplicaId) -> u64 {
        self.counts.get(replica).copied().unwrap_or(0)
    }

    /// Returns all replicas and their counts, ordered by replica ID.
    pub fn iter(&self) -> impl Iterator<Item = (&ReplicaId, &u64)> {
        self.counts.iter()
    }

    /// Returns the number of replicas with a non-zero count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns true if no event has been counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    ///
    /// Strictly increases along every causal chain, which makes it usable as
    /// a Lamport-style logical time.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Increments the owner's counter and returns the new count.
    ///
    /// Called exactly once per locally issued operation.
    pub fn advance(&mut self) -> u64 {
        let entry = self.counts.entry(self.replica).or_insert(0);
        *entry += 1;
        *entry
    }

    /// Returns a copy of this clock advanced by one local event.
    #[must_use]
    pub fn advanced(&self) -> Self {
        let mut next = self.clone();
        next.advance();
        next
    }

    /// Merges another clock into this one, taking the pointwise maximum.
    ///
    /// The owner does not change. Commutative, associative and idempotent.
    pub fn merge(&mut self, other: &Self) {
        for (replica, &count) in &other.counts {
            let entry = self.counts.entry(*replica).or_insert(0);
            if count > *entry {
                *entry = count;
            }
        }
    }

    /// Creates a new clock that is the merge of this and another.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// Compares this clock with another to determine causal ordering.
    ///
    /// Uses pointwise dominance over the union of known replicas. Equal
    /// clocks are an invariant violation and are reported as an error.
    pub fn compare(&self, other: &Self) -> Result<Causality, ClockInvariantError> {
        let mut self_ge = true; // self >= other for all replicas
        let mut other_ge = true; // other >= self for all replicas

        let replicas: BTreeSet<&ReplicaId> =
            self.counts.keys().chain(other.counts.keys()).collect();

        for replica in replicas {
            let mine = self.get(replica);
            let theirs = other.get(replica);

            if mine < theirs {
                self_ge = false;
            }
            if theirs < mine {
                other_ge = false;
            }
        }

        match (self_ge, other_ge) {
            (true, true) => Err(ClockInvariantError {
                clock: self.to_string(),
            }),
            (true, false) => Ok(Causality::After),
            (false, true) => Ok(Causality::Before),
            (false, false) => Ok(Causality::Concurrent),
        }
    }

    /// Returns the owner's `(replica, counter)` pair as of this clock.
    #[must_use]
    pub fn action_id(&self) -> ActionId {
        ActionId::new(self.replica, self.get(&self.replica))
    }

    /// Returns true if the event named by `action` is causally included in
    /// this clock.
    #[must_use]
    pub fn depends_on(&self, action: &ActionId) -> bool {
        action.counter <= self.get(&action.replica)
    }
}

impl fmt::Display for VectorClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (replica, count)) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{replica}: {count}")?;
        }
        write!(f, "}}")
    }
}

/// Serializes as a plain `{ replica: count }` mapping.
///
/// There is no `Deserialize`: the owner is not part of the mapping, so
/// clocks are rebuilt with [`VectorClock::from_counts`] by whoever knows it.
impl Serialize for VectorClock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.counts.serialize(serializer)
    }
}
