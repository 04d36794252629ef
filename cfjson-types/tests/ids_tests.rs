use cfjson_types::{Error, ItemId, ReplicaId};
use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;

fn replica(n: u128) -> ReplicaId {
    ReplicaId::from_uuid(uuid::Uuid::from_u128(n))
}

// ── ReplicaId ─────────────────────────────────────────────────────

#[test]
fn replica_id_new_is_unique() {
    let a = ReplicaId::new();
    let b = ReplicaId::new();
    assert_ne!(a, b);
}

#[test]
fn replica_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    let id = ReplicaId::from_uuid(uuid);
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn replica_id_display_and_parse() {
    let id = ReplicaId::new();
    let parsed = ReplicaId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn replica_id_parse_invalid() {
    assert!(ReplicaId::parse("not-a-uuid").is_err());
    assert!(ReplicaId::from_str("garbage").is_err());
}

#[test]
fn replica_id_order_matches_string_order() {
    let ids: Vec<ReplicaId> = [0x0a_u128, 0xff, 0x1_0000, 0x9].map(replica).to_vec();
    let mut by_id = ids.clone();
    by_id.sort();
    let mut by_str = ids.clone();
    by_str.sort_by_key(|id| id.to_string());
    assert_eq!(by_id, by_str);
}

#[test]
fn replica_id_serializes_as_plain_string() {
    let id = replica(7);
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
    let back: ReplicaId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn replica_id_hash_and_eq() {
    let id = ReplicaId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

// ── ItemId ────────────────────────────────────────────────────────

#[test]
fn item_id_display_format() {
    let id = ItemId::new(12, replica(1), 3);
    assert_eq!(id.to_string(), format!("12:{}:3", replica(1)));
}

#[test]
fn item_id_display_and_parse() {
    let id = ItemId::new(42, ReplicaId::new(), 0);
    let parsed: ItemId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn item_id_parse_rejects_malformed_input() {
    assert!(ItemId::from_str("").is_err());
    assert!(ItemId::from_str("1:2").is_err());
    assert!(ItemId::from_str("x:00000000-0000-0000-0000-000000000001:0").is_err());
    assert!(ItemId::from_str("1:not-a-uuid:0").is_err());
    assert!(ItemId::from_str("1:00000000-0000-0000-0000-000000000001:-1").is_err());
}

#[test]
fn item_id_parse_errors_name_the_bad_part() {
    assert!(matches!(
        ItemId::from_str("1:2"),
        Err(Error::InvalidItemId(_))
    ));
    assert!(matches!(
        ItemId::from_str("x:00000000-0000-0000-0000-000000000001:0"),
        Err(Error::InvalidItemId(msg)) if msg.contains("clock")
    ));
    assert!(matches!(
        ItemId::from_str("1:not-a-uuid:0"),
        Err(Error::InvalidUuid(_))
    ));
}

#[test]
fn item_id_orders_by_clock_then_replica_then_seq() {
    let a = ItemId::new(1, replica(9), 9);
    let b = ItemId::new(2, replica(1), 0);
    let c = ItemId::new(2, replica(2), 0);
    let d = ItemId::new(2, replica(2), 1);
    assert!(a < b);
    assert!(b < c);
    assert!(c < d);
}

#[test]
fn item_id_serializes_as_string() {
    let id = ItemId::new(5, replica(3), 1);
    let json = serde_json::to_value(id).unwrap();
    assert_eq!(json, serde_json::Value::String(id.to_string()));
    let back: ItemId = serde_json::from_value(json).unwrap();
    assert_eq!(back, id);
}

#[test]
fn item_id_deserialize_invalid_string_fails() {
    let result: Result<ItemId, _> = serde_json::from_str("\"nope\"");
    assert!(result.is_err());
}

proptest! {
    #[test]
    fn item_id_order_is_total_and_antisymmetric(
        c1 in 0u64..100, r1 in 0u128..4, s1 in 0u32..4,
        c2 in 0u64..100, r2 in 0u128..4, s2 in 0u32..4,
    ) {
        let a = ItemId::new(c1, replica(r1), s1);
        let b = ItemId::new(c2, replica(r2), s2);
        prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        prop_assert_eq!(a == b, a.cmp(&b) == std::cmp::Ordering::Equal);
    }
}
