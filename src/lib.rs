//! Intrusive Binary Heap for Incremental Shortest Paths
//!
//! This crate provides the priority queue behind incremental single-source
//! shortest-path recomputation in a link-state router, together with the
//! Ramalingam-Reps driver that consumes it.
//!
//! # Features
//!
//! - **Linked Binary Heap**: a complete binary tree of intrusively linked
//!   nodes. O(log n) insert, decrease_key and extract_min; nodes are moved as
//!   a whole so caller handles stay valid across every reordering
//! - **Node Stores**: the heap reaches caller-owned records through the
//!   [`NodeStore`] trait; [`NodeSlab`](storage::NodeSlab) is a ready-made
//!   `slotmap` arena (feature `arena-storage`, on by default)
//! - **Incremental Routing**: [`Topology`](routing::Topology) keeps a
//!   shortest-path tree current while edges are added, removed or re-costed
//!
//! # Example
//!
//! ```rust
//! use intrusive_spf_heap::LinkedBinaryHeap;
//! use intrusive_spf_heap::storage::NodeSlab;
//!
//! let mut slab = NodeSlab::new();
//! let mut heap = LinkedBinaryHeap::new();
//!
//! let ten = slab.insert(10);
//! let twenty = slab.insert(20);
//! heap.insert(&mut slab, ten).unwrap();
//! heap.insert(&mut slab, twenty).unwrap();
//!
//! // Lower the key in place, then tell the heap.
//! *slab.key_mut(twenty).unwrap() = 5;
//! heap.decrease_key(&mut slab, twenty).unwrap();
//! assert_eq!(heap.peek_min(), Some(twenty));
//! ```

pub mod error;
pub mod linked_heap;
pub mod routing;
pub mod storage;

// Re-export the main types for convenience
pub use error::{HeapError, RoutingError};
pub use linked_heap::LinkedBinaryHeap;
pub use storage::{Links, NodeStore};
