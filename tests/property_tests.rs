//! Property-based tests using proptest
//!
//! These tests generate random sequences of operations and verify that the
//! shape, order and last-node invariants hold after every step.

#![cfg(feature = "arena-storage")]

use intrusive_spf_heap::storage::{NodeKey, NodeSlab};
use intrusive_spf_heap::LinkedBinaryHeap;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Insert(i32),
    ExtractMin,
    /// Lower the key of the n-th live node (modulo live count) by the amount
    Decrease(usize, u16),
    /// Extract the minimum and insert it again with a new key
    Reinsert(i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i32>().prop_map(|k| Op::Insert(k / 2)),
        2 => Just(Op::ExtractMin),
        3 => (any::<usize>(), any::<u16>()).prop_map(|(i, d)| Op::Decrease(i, d)),
        1 => any::<i32>().prop_map(|k| Op::Reinsert(k / 2)),
    ]
}

/// Runs `ops` against the heap and a plain list of live handles
fn run_ops(ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut slab = NodeSlab::new();
    let mut heap = LinkedBinaryHeap::new();
    let mut live: Vec<NodeKey> = Vec::new();
    let mut inserted = 0usize;
    let mut extracted = 0usize;

    for op in ops {
        match op {
            Op::Insert(key) => {
                let id = slab.insert(key);
                heap.insert(&mut slab, id).unwrap();
                live.push(id);
                inserted += 1;
            }
            Op::ExtractMin => {
                let expected = live.iter().map(|&id| *slab.key(id).unwrap()).min();
                let popped = heap.extract_min(&mut slab);
                prop_assert_eq!(popped.map(|id| *slab.key(id).unwrap()), expected);
                if let Some(id) = popped {
                    prop_assert!(!heap.is_linked(&slab, id));
                    live.retain(|&other| other != id);
                    extracted += 1;
                }
            }
            Op::Decrease(index, amount) => {
                if !live.is_empty() {
                    let id = live[index % live.len()];
                    let key = slab.key_mut(id).unwrap();
                    *key = key.saturating_sub(i32::from(amount));
                    heap.decrease_key(&mut slab, id).unwrap();
                }
            }
            Op::Reinsert(key) => {
                if let Some(id) = heap.extract_min(&mut slab) {
                    *slab.key_mut(id).unwrap() = key;
                    heap.insert(&mut slab, id).unwrap();
                }
            }
        }

        prop_assert!(heap.verify_structure(&slab));
        prop_assert_eq!(heap.len(), live.len());
        prop_assert_eq!(heap.len(), inserted - extracted);

        let min_key = live.iter().map(|&id| *slab.key(id).unwrap()).min();
        prop_assert_eq!(heap.peek_min().map(|id| *slab.key(id).unwrap()), min_key);
    }

    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_random_operations_keep_invariants(ops in prop::collection::vec(op_strategy(), 0..200)) {
        run_ops(ops)?;
    }

    #[test]
    fn prop_heap_sort(values in prop::collection::vec(any::<i64>(), 0..300)) {
        let mut slab = NodeSlab::new();
        let mut heap = LinkedBinaryHeap::new();
        for &v in &values {
            let id = slab.insert(v);
            heap.insert(&mut slab, id).unwrap();
        }

        let sorted: Vec<i64> = heap
            .drain_sorted(&mut slab)
            .into_iter()
            .map(|id| *slab.key(id).unwrap())
            .collect();

        let mut expected = values.clone();
        expected.sort_unstable();
        prop_assert_eq!(sorted, expected);
        prop_assert!(heap.is_empty());
    }

    #[test]
    fn prop_decrease_key_preserves_count(
        values in prop::collection::vec(0i32..10_000, 1..100),
        target in any::<usize>(),
        new_key in -10_000i32..0,
    ) {
        let mut slab = NodeSlab::new();
        let mut heap = LinkedBinaryHeap::new();
        let ids: Vec<NodeKey> = values.iter().map(|&v| slab.insert(v)).collect();
        for &id in &ids {
            heap.insert(&mut slab, id).unwrap();
        }

        let id = ids[target % ids.len()];
        *slab.key_mut(id).unwrap() = new_key;
        heap.decrease_key(&mut slab, id).unwrap();

        prop_assert_eq!(heap.len(), values.len());
        prop_assert!(heap.verify_structure(&slab));
        // new_key is below every inserted value, so the node is now the root.
        prop_assert_eq!(heap.peek_min(), Some(id));
    }

    #[test]
    fn prop_shape_matches_count(n in 0usize..512, extract in 0usize..512) {
        let mut slab = NodeSlab::new();
        let mut heap = LinkedBinaryHeap::new();
        for i in 0..n {
            let id = slab.insert(n - i);
            heap.insert(&mut slab, id).unwrap();
        }
        for _ in 0..extract.min(n) {
            heap.extract_min(&mut slab);
        }

        prop_assert_eq!(heap.len(), n - extract.min(n));
        prop_assert!(heap.verify_structure(&slab));
    }
}
