use cfjson_crdt::{ActionId, Causality, ReplicaId, VectorClock};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn replica(n: u128) -> ReplicaId {
    ReplicaId::from_uuid(uuid::Uuid::from_u128(n))
}

fn clock(owner: u128, counts: &[(u128, u64)]) -> VectorClock {
    VectorClock::from_counts(
        replica(owner),
        counts.iter().map(|&(r, n)| (replica(r), n)).collect(),
    )
}

fn counts(clock: &VectorClock) -> BTreeMap<ReplicaId, u64> {
    clock.iter().map(|(r, n)| (*r, *n)).collect()
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn new_clock_is_empty() {
    let clock = VectorClock::new(replica(1));
    assert!(clock.is_empty());
    assert_eq!(clock.len(), 0);
    assert_eq!(clock.replica(), replica(1));
}

#[test]
fn get_unknown_replica_returns_zero() {
    let clock = VectorClock::new(replica(1));
    assert_eq!(clock.get(&replica(2)), 0);
}

#[test]
fn from_counts_drops_zero_entries() {
    let clock = clock(1, &[(1, 2), (2, 0)]);
    assert_eq!(clock.len(), 1);
    assert_eq!(clock.get(&replica(1)), 2);
    assert_eq!(clock.get(&replica(2)), 0);
}

// ── Advance ──────────────────────────────────────────────────────

#[test]
fn advance_increments_own_counter_by_one() {
    let mut clock = VectorClock::new(replica(1));
    assert_eq!(clock.advance(), 1);
    assert_eq!(clock.advance(), 2);
    assert_eq!(clock.get(&replica(1)), 2);
    assert_eq!(clock.len(), 1);
}

#[test]
fn advance_leaves_other_replicas_untouched() {
    let mut clock = clock(1, &[(2, 5)]);
    clock.advance();
    assert_eq!(clock.get(&replica(1)), 1);
    assert_eq!(clock.get(&replica(2)), 5);
}

#[test]
fn advanced_returns_new_clock() {
    let clock = clock(1, &[(1, 1)]);
    let next = clock.advanced();
    assert_eq!(next.get(&replica(1)), 2);
    assert_eq!(clock.get(&replica(1)), 1);
}

#[test]
fn total_sums_all_counts() {
    assert_eq!(clock(1, &[(1, 2), (2, 3), (3, 4)]).total(), 9);
    assert_eq!(VectorClock::new(replica(1)).total(), 0);
}

// ── Merge ────────────────────────────────────────────────────────

#[test]
fn merge_takes_pointwise_maximum() {
    let mut a = clock(1, &[(1, 2), (2, 1)]);
    let b = clock(2, &[(1, 1), (2, 3), (3, 1)]);
    a.merge(&b);
    assert_eq!(a.get(&replica(1)), 2);
    assert_eq!(a.get(&replica(2)), 3);
    assert_eq!(a.get(&replica(3)), 1);
}

#[test]
fn merge_keeps_owner() {
    let a = clock(1, &[(1, 1)]);
    let b = clock(2, &[(2, 4)]);
    assert_eq!(a.merged(&b).replica(), replica(1));
}

#[test]
fn merge_is_commutative_on_counts() {
    let a = clock(1, &[(1, 2)]);
    let b = clock(2, &[(2, 1)]);
    assert_eq!(counts(&a.merged(&b)), counts(&b.merged(&a)));
}

#[test]
fn merge_is_idempotent() {
    let clock = clock(1, &[(1, 2), (2, 7)]);
    assert_eq!(clock.merged(&clock), clock);
}

// ── Compare ──────────────────────────────────────────────────────

#[test]
fn compare_before_after() {
    let a = clock(1, &[(1, 1)]);
    let b = clock(2, &[(1, 1), (2, 1)]);
    assert_eq!(a.compare(&b).unwrap(), Causality::Before);
    assert_eq!(b.compare(&a).unwrap(), Causality::After);
}

#[test]
fn compare_concurrent() {
    let a = clock(1, &[(1, 1)]);
    let b = clock(2, &[(2, 1)]);
    assert_eq!(a.compare(&b).unwrap(), Causality::Concurrent);
    assert_eq!(b.compare(&a).unwrap(), Causality::Concurrent);
}

#[test]
fn compare_uses_union_of_replicas() {
    // b knows about replica 3, a does not; a is ahead on replica 1.
    let a = clock(1, &[(1, 3)]);
    let b = clock(2, &[(1, 2), (3, 1)]);
    assert_eq!(a.compare(&b).unwrap(), Causality::Concurrent);
}

#[test]
fn compare_equal_clocks_is_an_invariant_violation() {
    let a = clock(1, &[(1, 2), (2, 1)]);
    let b = clock(2, &[(1, 2), (2, 1)]);
    let err = a.compare(&b).unwrap_err();
    assert!(err.to_string().contains("invariant"));
}

#[test]
fn compare_empty_clocks_is_an_invariant_violation() {
    let a = VectorClock::new(replica(1));
    let b = VectorClock::new(replica(2));
    assert!(a.compare(&b).is_err());
}

// ── ActionId / depends_on ────────────────────────────────────────

#[test]
fn action_id_is_owner_and_own_counter() {
    let clock = clock(1, &[(1, 4), (2, 9)]);
    assert_eq!(clock.action_id(), ActionId::new(replica(1), 4));
}

#[test]
fn depends_on_included_events() {
    let clock = clock(1, &[(1, 2), (2, 3)]);
    assert!(clock.depends_on(&ActionId::new(replica(1), 1)));
    assert!(clock.depends_on(&ActionId::new(replica(1), 2)));
    assert!(clock.depends_on(&ActionId::new(replica(2), 3)));
    assert!(!clock.depends_on(&ActionId::new(replica(1), 3)));
    assert!(!clock.depends_on(&ActionId::new(replica(3), 1)));
}

#[test]
fn action_ids_order_by_replica_then_counter() {
    let a = ActionId::new(replica(1), 9);
    let b = ActionId::new(replica(2), 1);
    let c = ActionId::new(replica(2), 2);
    assert!(a < b);
    assert!(b < c);
}

// ── Serde / Display ──────────────────────────────────────────────

#[test]
fn serializes_as_plain_mapping() {
    let clock = clock(1, &[(1, 2), (2, 1)]);
    let json = serde_json::to_value(&clock).unwrap();
    let expected = serde_json::json!({
        replica(1).to_string(): 2,
        replica(2).to_string(): 1,
    });
    assert_eq!(json, expected);
}

#[test]
fn rebuilt_clock_compares_like_the_original() {
    let original = clock(1, &[(1, 2), (2, 1)]);
    let json = serde_json::to_string(&original).unwrap();
    let parsed: BTreeMap<ReplicaId, u64> = serde_json::from_str(&json).unwrap();
    let rebuilt = VectorClock::from_counts(replica(1), parsed);

    assert_eq!(rebuilt, original);
    let later = clock(2, &[(1, 2), (2, 2)]);
    assert_eq!(rebuilt.compare(&later).unwrap(), Causality::Before);
}

#[test]
fn display_lists_counts() {
    let clock = clock(1, &[(1, 2)]);
    assert_eq!(clock.to_string(), format!("{{{}: 2}}", replica(1)));
}

// ── Properties ───────────────────────────────────────────────────

fn counts_strategy() -> impl Strategy<Value = Vec<(u128, u64)>> {
    prop::collection::vec((0u128..4, 0u64..6), 0..6)
}

proptest! {
    #[test]
    fn compare_is_antisymmetric(a in counts_strategy(), b in counts_strategy()) {
        let a = clock(1, &a);
        let b = clock(2, &b);
        match (a.compare(&b), b.compare(&a)) {
            (Ok(Causality::Before), Ok(other)) => prop_assert_eq!(other, Causality::After),
            (Ok(Causality::After), Ok(other)) => prop_assert_eq!(other, Causality::Before),
            (Ok(Causality::Concurrent), Ok(other)) => prop_assert_eq!(other, Causality::Concurrent),
            (Err(_), Err(_)) => prop_assert_eq!(counts(&a), counts(&b)),
            (left, right) => prop_assert!(false, "asymmetric: {:?} / {:?}", left, right),
        }
    }

    #[test]
    fn merge_dominates_both_inputs(a in counts_strategy(), b in counts_strategy()) {
        let a = clock(1, &a);
        let b = clock(2, &b);
        let merged = a.merged(&b);
        for (replica, count) in a.iter().chain(b.iter()) {
            prop_assert!(merged.get(replica) >= *count);
        }
    }

    #[test]
    fn advanced_clock_is_after(a in counts_strategy()) {
        let a = clock(1, &a);
        prop_assert_eq!(a.advanced().compare(&a).unwrap(), Causality::After);
        prop_assert!(a.advanced().total() > a.total());
    }
}
