//! Node storage for the intrusive heap
//!
//! The heap never allocates. Nodes live in caller-owned records, and the heap
//! reaches them through the [`NodeStore`] trait:
//!
//! - [`Links`]: the parent/left/right linkage embedded inside each record
//! - [`NodeStore`]: maps a handle to its [`Links`] and to its comparable key
//! - [`NodeSlab`]: a ready-made arena backed by `slotmap` (feature `arena-storage`)
//!
//! # Design
//!
//! Handles are plain `Copy` values (indices or generational keys), so a
//! handle keeps naming the same logical node while the heap rotates it around
//! the tree. Keys are never moved between nodes.
//!
//! # Example
//!
//! ```rust
//! use intrusive_spf_heap::storage::{Links, NodeStore};
//!
//! struct Router {
//!     metric: u32,
//!     queue_links: Links<usize>,
//! }
//!
//! struct Routers(Vec<Router>);
//!
//! impl NodeStore for Routers {
//!     type Id = usize;
//!     type Key = u32;
//!
//!     fn links(&self, id: usize) -> &Links<usize> {
//!         &self.0[id].queue_links
//!     }
//!
//!     fn links_mut(&mut self, id: usize) -> &mut Links<usize> {
//!         &mut self.0[id].queue_links
//!     }
//!
//!     fn key(&self, id: usize) -> &u32 {
//!         &self.0[id].metric
//!     }
//! }
//! ```

use std::fmt;

#[cfg(feature = "arena-storage")]
use slotmap::{new_key_type, SlotMap};

/// Intrusive tree linkage for one heap node
///
/// Embed one of these in every record that can sit in a
/// [`LinkedBinaryHeap`](crate::linked_heap::LinkedBinaryHeap). A fresh value
/// is detached; the heap marks it as queued on insertion and resets it to
/// detached again when the node is extracted, so the record can be
/// reinserted later.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Links<Id> {
    pub(crate) parent: Option<Id>,
    pub(crate) left: Option<Id>,
    pub(crate) right: Option<Id>,
    /// Set while the node belongs to a heap, including as a lone root
    pub(crate) queued: bool,
}

impl<Id> Links<Id> {
    /// Creates detached linkage
    pub const fn new() -> Self {
        Links {
            parent: None,
            left: None,
            right: None,
            queued: false,
        }
    }

    /// Returns true if the node belongs to no heap
    ///
    /// A detached node never holds structural references.
    #[inline]
    pub fn is_detached(&self) -> bool {
        !self.queued
    }

    /// Linkage of a node that has just joined a heap, with no neighbours yet
    #[inline]
    pub(crate) fn attach(&mut self) {
        self.reset();
        self.queued = true;
    }

    #[inline]
    pub(crate) fn reset(&mut self) {
        self.parent = None;
        self.left = None;
        self.right = None;
        self.queued = false;
    }
}

impl<Id: Copy> Links<Id> {
    /// Parent node, `None` for the root or a detached node
    #[inline]
    pub fn parent(&self) -> Option<Id> {
        self.parent
    }

    /// Left child, if any
    #[inline]
    pub fn left(&self) -> Option<Id> {
        self.left
    }

    /// Right child, if any
    #[inline]
    pub fn right(&self) -> Option<Id> {
        self.right
    }
}

impl<Id> Default for Links<Id> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: fmt::Debug> fmt::Debug for Links<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Links")
            .field("parent", &self.parent)
            .field("left", &self.left)
            .field("right", &self.right)
            .field("queued", &self.queued)
            .finish()
    }
}

/// Access to the records a heap links together
///
/// # Contract
///
/// - `links` and `links_mut` must return the linkage of the same record for
///   the same `id`, and `key` must return that record's key.
/// - Handles passed by the heap are always handles the caller inserted.
///   Passing a handle the store does not know is a caller error and the store
///   may panic.
/// - The caller may change a key between heap operations. After lowering a
///   key the caller must call
///   [`decrease_key`](crate::linked_heap::LinkedBinaryHeap::decrease_key).
pub trait NodeStore {
    /// Stable handle naming one record
    type Id: Copy + Eq + fmt::Debug;

    /// Value the heap comparator orders
    type Key;

    /// Linkage of the record named by `id`
    fn links(&self, id: Self::Id) -> &Links<Self::Id>;

    /// Mutable linkage of the record named by `id`
    fn links_mut(&mut self, id: Self::Id) -> &mut Links<Self::Id>;

    /// Key of the record named by `id`
    fn key(&self, id: Self::Id) -> &Self::Key;
}

// ============================================================================
// NodeSlab - arena-backed store
// ============================================================================

#[cfg(feature = "arena-storage")]
new_key_type! {
    /// Generational handle into a [`NodeSlab`]
    pub struct NodeKey;
}

#[cfg(feature = "arena-storage")]
#[derive(Debug, Clone)]
struct SlabEntry<K> {
    key: K,
    links: Links<NodeKey>,
}

/// Arena of heap nodes backed by `slotmap`
///
/// Useful when the caller has no record type of its own to embed [`Links`]
/// into. Every entry owns its key; the heap only rewires the links.
///
/// # Characteristics
/// - Contiguous storage, 8-byte generational handles
/// - Stale handles are detected by [`key`](Self::key) and
///   [`contains`](Self::contains); the [`NodeStore`] accessors panic on them
/// - A node still linked into a heap cannot be removed
///
/// # Example
///
/// ```rust
/// use intrusive_spf_heap::linked_heap::LinkedBinaryHeap;
/// use intrusive_spf_heap::storage::NodeSlab;
///
/// let mut slab = NodeSlab::new();
/// let mut heap = LinkedBinaryHeap::new();
///
/// let a = slab.insert(10u32);
/// let b = slab.insert(20u32);
/// heap.insert(&mut slab, a).unwrap();
/// heap.insert(&mut slab, b).unwrap();
///
/// *slab.key_mut(b).unwrap() = 5;
/// heap.decrease_key(&mut slab, b).unwrap();
/// assert_eq!(heap.peek_min(), Some(b));
/// ```
#[cfg(feature = "arena-storage")]
#[derive(Debug, Clone)]
pub struct NodeSlab<K> {
    nodes: SlotMap<NodeKey, SlabEntry<K>>,
}

#[cfg(feature = "arena-storage")]
impl<K> NodeSlab<K> {
    /// Creates an empty slab
    pub fn new() -> Self {
        NodeSlab {
            nodes: SlotMap::with_key(),
        }
    }

    /// Creates an empty slab with room for `capacity` nodes
    pub fn with_capacity(capacity: usize) -> Self {
        NodeSlab {
            nodes: SlotMap::with_capacity_and_key(capacity),
        }
    }

    /// Stores a detached node holding `key`
    pub fn insert(&mut self, key: K) -> NodeKey {
        self.nodes.insert(SlabEntry {
            key,
            links: Links::new(),
        })
    }

    /// Removes a node and returns its key
    ///
    /// Returns `None` if the handle is stale, or if the node still belongs
    /// to a heap (a lone root included); extract it first.
    pub fn remove(&mut self, id: NodeKey) -> Option<K> {
        if !self.nodes.get(id)?.links.is_detached() {
            return None;
        }
        self.nodes.remove(id).map(|entry| entry.key)
    }

    /// Key of a node, `None` for a stale handle
    pub fn key(&self, id: NodeKey) -> Option<&K> {
        self.nodes.get(id).map(|entry| &entry.key)
    }

    /// Mutable key of a node, `None` for a stale handle
    ///
    /// After lowering the key of a linked node, call
    /// [`decrease_key`](crate::linked_heap::LinkedBinaryHeap::decrease_key).
    pub fn key_mut(&mut self, id: NodeKey) -> Option<&mut K> {
        self.nodes.get_mut(id).map(|entry| &mut entry.key)
    }

    /// Returns true if the handle names a live node
    pub fn contains(&self, id: NodeKey) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of stored nodes, linked or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the slab holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(feature = "arena-storage")]
impl<K> Default for NodeSlab<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "arena-storage")]
impl<K> NodeStore for NodeSlab<K> {
    type Id = NodeKey;
    type Key = K;

    #[inline]
    fn links(&self, id: NodeKey) -> &Links<NodeKey> {
        &self.nodes[id].links
    }

    #[inline]
    fn links_mut(&mut self, id: NodeKey) -> &mut Links<NodeKey> {
        &mut self.nodes[id].links
    }

    #[inline]
    fn key(&self, id: NodeKey) -> &K {
        &self.nodes[id].key
    }
}
