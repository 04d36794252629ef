use cfjson_crdt::{Cursor, Operation, ReplicaId, Value, VectorClock};
use cfjson_sync::CausalBuffer;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn replica(n: u128) -> ReplicaId {
    ReplicaId::from_uuid(uuid::Uuid::from_u128(n))
}

fn clock(owner: u128, counts: &[(u128, u64)]) -> VectorClock {
    VectorClock::from_counts(
        replica(owner),
        counts.iter().map(|&(r, n)| (replica(r), n)).collect(),
    )
}

fn op(owner: u128, counts: &[(u128, u64)]) -> Operation {
    Operation::assign(
        Cursor::root().key("k"),
        clock(owner, counts),
        Value::register(owner as u64),
    )
}

/// Receives `op` and returns the `(sender, counter)` pairs delivered.
fn receive(buffer: &mut CausalBuffer, op: Operation) -> Vec<(ReplicaId, u64)> {
    let mut delivered = Vec::new();
    buffer.receive(op, |op| {
        let action = op.action_id();
        delivered.push((action.replica, action.counter));
    });
    delivered
}

// ── Deliverability ───────────────────────────────────────────────

#[test]
fn new_buffer_is_empty() {
    let buffer = CausalBuffer::new(replica(9));
    assert_eq!(buffer.pending_len(), 0);
    assert!(buffer.clock().is_empty());
    assert_eq!(buffer.clock().replica(), replica(9));
}

#[test]
fn first_operation_of_a_sender_is_deliverable() {
    let buffer = CausalBuffer::new(replica(9));
    assert!(buffer.is_deliverable(&op(1, &[(1, 1)])));
}

#[test]
fn gap_in_sender_sequence_is_not_deliverable() {
    let buffer = CausalBuffer::new(replica(9));
    assert!(!buffer.is_deliverable(&op(1, &[(1, 2)])));
}

#[test]
fn missing_foreign_dependency_is_not_deliverable() {
    let buffer = CausalBuffer::new(replica(9));
    assert!(!buffer.is_deliverable(&op(2, &[(1, 1), (2, 1)])));
}

#[test]
fn immediate_delivery_merges_clock() {
    let mut buffer = CausalBuffer::new(replica(9));
    let delivered = receive(&mut buffer, op(1, &[(1, 1)]));
    assert_eq!(delivered, vec![(replica(1), 1)]);
    assert_eq!(buffer.clock().get(&replica(1)), 1);
    assert_eq!(buffer.pending_len(), 0);
}

#[test]
fn delivered_operation_is_no_longer_deliverable() {
    let mut buffer = CausalBuffer::new(replica(9));
    let mut seen = 0;
    buffer.receive(op(1, &[(1, 1)]), |_| seen += 1);
    assert_eq!(seen, 1);
    assert!(!buffer.is_deliverable(&op(1, &[(1, 1)])));
}

// ── Scenario D: out-of-order arrival ─────────────────────────────

#[test]
fn dependent_operation_waits_then_cascades() {
    let mut buffer = CausalBuffer::new(replica(3));
    let first = op(1, &[(1, 1)]);
    let second = op(2, &[(1, 1), (2, 1)]);

    assert!(receive(&mut buffer, second).is_empty());
    assert_eq!(buffer.pending_len(), 1);
    assert_eq!(buffer.clock().get(&replica(2)), 0);

    let delivered = receive(&mut buffer, first);
    assert_eq!(delivered, vec![(replica(1), 1), (replica(2), 1)]);
    assert_eq!(buffer.pending_len(), 0);
    assert_eq!(buffer.clock().get(&replica(2)), 1);
}

#[test]
fn long_chain_delivers_in_causal_order() {
    let mut buffer = CausalBuffer::new(replica(9));
    let chain = vec![
        op(1, &[(1, 1)]),
        op(2, &[(1, 1), (2, 1)]),
        op(3, &[(1, 1), (2, 1), (3, 1)]),
        op(1, &[(1, 2), (2, 1), (3, 1)]),
    ];
    for op in chain.iter().skip(1).rev() {
        assert!(receive(&mut buffer, op.clone()).is_empty());
    }
    assert_eq!(buffer.pending_len(), 3);

    let delivered = receive(&mut buffer, chain[0].clone());
    assert_eq!(
        delivered,
        vec![
            (replica(1), 1),
            (replica(2), 1),
            (replica(3), 1),
            (replica(1), 2),
        ]
    );
}

#[test]
fn unrelated_pending_operation_stays_buffered() {
    let mut buffer = CausalBuffer::new(replica(9));
    receive(&mut buffer, op(2, &[(2, 2)]));
    let delivered = receive(&mut buffer, op(1, &[(1, 1)]));
    assert_eq!(delivered, vec![(replica(1), 1)]);
    assert_eq!(buffer.pending_len(), 1);
    assert_eq!(buffer.pending()[0].action_id().counter, 2);
}

// ── Duplicates and local edits ───────────────────────────────────

#[test]
fn already_delivered_operation_is_dropped() {
    let mut buffer = CausalBuffer::new(replica(9));
    receive(&mut buffer, op(1, &[(1, 1)]));
    assert!(buffer.is_stale(&op(1, &[(1, 1)])));
    assert!(receive(&mut buffer, op(1, &[(1, 1)])).is_empty());
    assert_eq!(buffer.pending_len(), 0);
}

#[test]
fn pending_duplicate_is_discarded_after_original_delivers() {
    let mut buffer = CausalBuffer::new(replica(9));
    let waiting = op(2, &[(1, 1), (2, 1)]);
    receive(&mut buffer, waiting.clone());
    receive(&mut buffer, waiting);
    assert_eq!(buffer.pending_len(), 2);

    let delivered = receive(&mut buffer, op(1, &[(1, 1)]));
    assert_eq!(delivered, vec![(replica(1), 1), (replica(2), 1)]);
    assert_eq!(buffer.pending_len(), 0);
}

#[test]
fn local_edits_satisfy_remote_dependencies() {
    let mut buffer = CausalBuffer::new(replica(1));
    let local = buffer.clock().advanced();
    buffer.record_local(&local);
    assert_eq!(buffer.clock().get(&replica(1)), 1);

    let delivered = receive(&mut buffer, op(2, &[(1, 1), (2, 1)]));
    assert_eq!(delivered, vec![(replica(2), 1)]);
}

// ── Random arrival orders ────────────────────────────────────────

/// A causally consistent history: each writer issues `per_writer` operations,
/// each depending on everything issued before it by anyone.
fn history(writers: u128, per_writer: u64) -> Vec<Operation> {
    let mut seen: Vec<(u128, u64)> = (1..=writers).map(|w| (w, 0)).collect();
    let mut ops = Vec::new();
    for _ in 0..per_writer {
        for w in 1..=writers {
            seen[(w - 1) as usize].1 += 1;
            ops.push(op(w, &seen));
        }
    }
    ops
}

proptest! {
    #[test]
    fn every_arrival_order_delivers_the_same_sequence(
        order in Just((0..12usize).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let ops = history(3, 4);
        let mut buffer = CausalBuffer::new(replica(9));
        let mut delivered = Vec::new();
        for i in order {
            delivered.extend(receive(&mut buffer, ops[i].clone()));
        }
        let expected: Vec<_> = ops
            .iter()
            .map(|op| (op.action_id().replica, op.action_id().counter))
            .collect();
        prop_assert_eq!(delivered, expected);
        prop_assert_eq!(buffer.pending_len(), 0);
    }
}
