//! Stress tests that push the linked heap through long operation sequences
//!
//! The records here embed their own linkage, the way a routing table entry
//! would, and are shared between several heaps.

use intrusive_spf_heap::{HeapError, LinkedBinaryHeap, Links, NodeStore};

/// A caller record with an embedded heap position
struct Route {
    metric: u64,
    hops: u32,
    queue: Links<usize>,
}

struct RouteTable(Vec<Route>);

impl RouteTable {
    fn with_metrics(metrics: impl IntoIterator<Item = u64>) -> Self {
        RouteTable(
            metrics
                .into_iter()
                .map(|metric| Route {
                    metric,
                    hops: 0,
                    queue: Links::new(),
                })
                .collect(),
        )
    }
}

impl NodeStore for RouteTable {
    type Id = usize;
    type Key = Route;

    fn links(&self, id: usize) -> &Links<usize> {
        &self.0[id].queue
    }

    fn links_mut(&mut self, id: usize) -> &mut Links<usize> {
        &mut self.0[id].queue
    }

    fn key(&self, id: usize) -> &Route {
        &self.0[id]
    }
}

/// Orders by metric, then by hop count
fn by_metric_then_hops(a: &Route, b: &Route) -> std::cmp::Ordering {
    a.metric.cmp(&b.metric).then(a.hops.cmp(&b.hops))
}

fn new_heap() -> LinkedBinaryHeap<RouteTable> {
    LinkedBinaryHeap::with_comparator(by_metric_then_hops)
}

fn drain_metrics(table: &mut RouteTable, heap: &mut LinkedBinaryHeap<RouteTable>) -> Vec<u64> {
    heap.drain_sorted(table)
        .into_iter()
        .map(|id| table.0[id].metric)
        .collect()
}

#[test]
fn test_massive_operations() {
    let mut table = RouteTable::with_metrics(0..2000);
    let mut heap = new_heap();

    for id in (0..2000).rev() {
        heap.insert(&mut table, id).unwrap();
    }
    assert_eq!(heap.len(), 2000);
    assert!(heap.verify_structure(&table));

    for expected in 0..2000 {
        assert_eq!(heap.extract_min(&mut table), Some(expected as usize));
        if expected % 97 == 0 {
            assert!(heap.verify_structure(&table));
        }
    }
    assert!(heap.is_empty());
}

#[test]
fn test_many_decrease_keys() {
    let mut table = RouteTable::with_metrics((0..500).map(|i| 10_000 + i));
    let mut heap = new_heap();
    for id in 0..500 {
        heap.insert(&mut table, id).unwrap();
    }

    // Lower every key below all others, last inserted first.
    for id in (0..500).rev() {
        table.0[id].metric = id as u64;
        heap.decrease_key(&mut table, id).unwrap();
        assert_eq!(heap.peek_min(), Some(id));
    }
    assert!(heap.verify_structure(&table));

    assert_eq!(drain_metrics(&mut table, &mut heap), (0..500).collect::<Vec<u64>>());
}

#[test]
fn test_alternating_ops() {
    let mut table = RouteTable::with_metrics((0..400).map(|i| (i * 7919) % 401));
    let mut heap = new_heap();
    let mut popped = Vec::new();

    for id in 0..400 {
        heap.insert(&mut table, id).unwrap();
        if id % 3 == 2 {
            popped.push(heap.extract_min(&mut table).unwrap());
        }
        assert!(heap.verify_structure(&table));
    }
    assert_eq!(heap.len(), 400 - popped.len());

    let rest = drain_metrics(&mut table, &mut heap);
    assert!(rest.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_secondary_ordering_via_comparator() {
    let mut table = RouteTable::with_metrics([5, 5, 5, 1]);
    table.0[0].hops = 3;
    table.0[1].hops = 1;
    table.0[2].hops = 2;
    let mut heap = new_heap();
    for id in 0..4 {
        heap.insert(&mut table, id).unwrap();
    }

    assert_eq!(heap.drain_sorted(&mut table), vec![3, 1, 2, 0]);
}

#[test]
fn test_nodes_migrate_between_heaps() {
    let mut table = RouteTable::with_metrics((0..64).map(|i| 64 - i));
    let mut even = new_heap();
    let mut odd = new_heap();

    for id in 0..64 {
        let heap = if id % 2 == 0 { &mut even } else { &mut odd };
        heap.insert(&mut table, id).unwrap();
    }

    // Move everything from `even` into `odd`, one minimum at a time.
    while let Some(id) = even.extract_min(&mut table) {
        assert!(!odd.is_linked(&table, id));
        odd.insert(&mut table, id).unwrap();
        assert!(even.verify_structure(&table));
        assert!(odd.verify_structure(&table));
    }

    assert!(even.is_empty());
    assert_eq!(odd.len(), 64);
    assert_eq!(drain_metrics(&mut table, &mut odd), (1..=64).collect::<Vec<u64>>());
}

#[test]
fn test_double_insert_is_rejected() {
    let mut table = RouteTable::with_metrics([3, 2, 1]);
    let mut heap = new_heap();
    for id in 0..3 {
        heap.insert(&mut table, id).unwrap();
    }

    for id in 0..3 {
        assert_eq!(heap.insert(&mut table, id), Err(HeapError::AlreadyLinked));
    }
    assert_eq!(heap.len(), 3);
    assert!(heap.verify_structure(&table));
}

#[test]
fn test_clear_then_reuse() {
    let mut table = RouteTable::with_metrics((0..100).rev());
    let mut heap = new_heap();
    for id in 0..100 {
        heap.insert(&mut table, id).unwrap();
    }

    heap.clear(&mut table);
    assert!(heap.is_empty());
    assert!((0..100).all(|id| table.0[id].queue.is_detached()));

    for id in 0..50 {
        heap.insert(&mut table, id).unwrap();
    }
    assert_eq!(drain_metrics(&mut table, &mut heap), (50..100).collect::<Vec<u64>>());
}

#[test]
fn test_every_size_up_to_130() {
    for n in 0..130 {
        let mut table = RouteTable::with_metrics((0..n).map(|i| (i * 37) % 13));
        let mut heap = new_heap();
        for id in 0..n as usize {
            heap.insert(&mut table, id).unwrap();
        }
        assert!(heap.verify_structure(&table), "shape broken at size {}", n);

        while heap.extract_min(&mut table).is_some() {
            assert!(heap.verify_structure(&table), "shape broken draining size {}", n);
        }
    }
}
