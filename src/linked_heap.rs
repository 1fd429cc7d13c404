//! Intrusive pointer-linked binary min-heap
//!
//! A complete binary tree whose nodes live in caller-owned records and are
//! linked through parent/left/right handles instead of array slots. Reordering
//! moves whole nodes, never keys, so a handle held by the caller keeps naming
//! the same logical item for as long as it stays in the heap.
//!
//! The heap itself holds only the node count, the root, the last node
//! (rightmost node of the deepest level) and the comparator. Every operation
//! borrows the [`NodeStore`] that owns the records.
//!
//! # Time Complexity
//!
//! | Operation      | Complexity |
//! |----------------|------------|
//! | `insert`       | O(log n)   |
//! | `decrease_key` | O(log n)   |
//! | `extract_min`  | O(log n)   |
//! | `peek_min`     | O(1)       |
//! | `is_linked`    | O(1)       |
//!
//! # Example
//!
//! ```rust
//! use intrusive_spf_heap::linked_heap::LinkedBinaryHeap;
//! use intrusive_spf_heap::storage::NodeSlab;
//!
//! let mut slab = NodeSlab::new();
//! let mut heap = LinkedBinaryHeap::new();
//!
//! for key in [5, 3, 8, 1, 4] {
//!     let id = slab.insert(key);
//!     heap.insert(&mut slab, id).unwrap();
//! }
//!
//! let mut order = Vec::new();
//! while let Some(id) = heap.extract_min(&mut slab) {
//!     order.push(*slab.key(id).unwrap());
//! }
//! assert_eq!(order, vec![1, 3, 4, 5, 8]);
//! ```

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;

use crate::error::HeapError;
use crate::storage::{Links, NodeStore};

/// Total order over keys: `Less`, `Equal` or `Greater`
pub type Comparator<K> = fn(&K, &K) -> Ordering;

/// Intrusive binary min-heap over the records of a [`NodeStore`]
///
/// The heap owns the linkage between nodes, never the nodes or their keys.
/// Keys may be changed by the caller between operations; after lowering a
/// key, call [`decrease_key`](Self::decrease_key) to restore the order.
pub struct LinkedBinaryHeap<S: NodeStore> {
    count: usize,
    root: Option<S::Id>,
    /// Rightmost node of the deepest level
    last: Option<S::Id>,
    comparator: Comparator<S::Key>,
}

impl<S: NodeStore> LinkedBinaryHeap<S> {
    /// Creates an empty heap ordered by the key's `Ord` implementation
    pub fn new() -> Self
    where
        S::Key: Ord,
    {
        Self::with_comparator(<S::Key as Ord>::cmp)
    }

    /// Creates an empty heap ordered by `comparator`
    ///
    /// The comparator is fixed for the lifetime of the heap.
    pub fn with_comparator(comparator: Comparator<S::Key>) -> Self {
        LinkedBinaryHeap {
            count: 0,
            root: None,
            last: None,
            comparator,
        }
    }

    /// Forgets every node and keeps the comparator
    ///
    /// Node links are not touched; use [`clear`](Self::clear) to detach the
    /// nodes of a non-empty heap.
    pub fn reset(&mut self) {
        self.count = 0;
        self.root = None;
        self.last = None;
    }

    /// Number of linked nodes
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no node is linked
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The node with the minimum key, without removing it
    #[inline]
    pub fn peek_min(&self) -> Option<S::Id> {
        self.root
    }

    /// Returns true if the node is currently linked into a heap
    ///
    /// Membership is recorded in the node's [`Links`], so a lone root counts
    /// as linked, and so does a node owned by another heap over the same
    /// store.
    pub fn is_linked(&self, store: &S, id: S::Id) -> bool {
        !store.links(id).is_detached()
    }

    /// Inserts a detached node whose key is already set
    ///
    /// # Errors
    /// Returns [`HeapError::AlreadyLinked`] if the node is already linked.
    pub fn insert(&mut self, store: &mut S, id: S::Id) -> Result<(), HeapError> {
        if self.is_linked(store, id) {
            return Err(HeapError::AlreadyLinked);
        }
        store.links_mut(id).attach();

        let (Some(root), Some(last)) = (self.root, self.last) else {
            self.root = Some(id);
            self.last = Some(id);
            self.count = 1;
            return Ok(());
        };

        let parent = self.insertion_parent(store, root, last);
        let parent_links = store.links_mut(parent);
        if parent_links.left.is_none() {
            parent_links.left = Some(id);
        } else {
            parent_links.right = Some(id);
        }
        store.links_mut(id).parent = Some(parent);
        self.count += 1;
        self.last = Some(id);

        self.sift_up(store, id);
        Ok(())
    }

    /// Restores heap order after the node's key was lowered
    ///
    /// Moves the node toward the root while its parent compares greater.
    /// Calling this on a node whose key did not improve is a no-op.
    ///
    /// # Errors
    /// Returns [`HeapError::NotLinked`] if the node is not in the heap.
    pub fn decrease_key(&mut self, store: &mut S, id: S::Id) -> Result<(), HeapError> {
        if !self.is_linked(store, id) {
            return Err(HeapError::NotLinked);
        }
        self.sift_up(store, id);
        Ok(())
    }

    /// Removes and returns the node with the minimum key
    ///
    /// The returned node is detached and may be inserted again.
    pub fn extract_min(&mut self, store: &mut S) -> Option<S::Id> {
        let min = self.root?;
        let replacement = self.last?;
        self.count -= 1;

        match self.count {
            0 => {
                self.root = None;
                self.last = None;
            }
            1 => {
                store.links_mut(replacement).parent = None;
                self.root = Some(replacement);
                self.last = Some(replacement);
            }
            _ => {
                if let Some(parent) = store.links(replacement).parent {
                    self.unlink_last(store, min, parent, replacement);
                }
                self.transplant_root(store, min, replacement);
                self.sift_down(store, replacement);
            }
        }

        store.links_mut(min).reset();
        Some(min)
    }

    /// Detaches every node and empties the heap
    pub fn clear(&mut self, store: &mut S) {
        let mut pending: Vec<S::Id> = self.root.into_iter().collect();
        while let Some(id) = pending.pop() {
            let links = store.links_mut(id);
            pending.extend(links.left.into_iter().chain(links.right));
            links.reset();
        }
        self.reset();
    }

    /// Extracts every node, returning them in non-decreasing key order
    pub fn drain_sorted(&mut self, store: &mut S) -> Vec<S::Id> {
        let mut drained = Vec::with_capacity(self.count);
        while let Some(id) = self.extract_min(store) {
            drained.push(id);
        }
        drained
    }

    /// Audits every heap invariant
    ///
    /// Checks that the tree is complete, that no parent compares greater than
    /// its child, that every child points back to its parent and is marked
    /// queued, that `last` is the final node in level order, and that the
    /// node count matches.
    pub fn verify_structure(&self, store: &S) -> bool {
        let Some(root) = self.root else {
            return self.count == 0 && self.last.is_none();
        };
        let root_links = store.links(root);
        if self.count == 0 || root_links.is_detached() || root_links.parent.is_some() {
            return false;
        }

        let mut queue = VecDeque::from([root]);
        let mut seen = 0;
        let mut gap = false;
        let mut final_node = root;

        while let Some(id) = queue.pop_front() {
            seen += 1;
            if seen > self.count {
                return false;
            }
            final_node = id;

            let links = *store.links(id);
            for child in [links.left, links.right] {
                match child {
                    Some(child) => {
                        let child_links = store.links(child);
                        if gap
                            || child_links.is_detached()
                            || child_links.parent != Some(id)
                            || self.compare(store, id, child) == Ordering::Greater
                        {
                            return false;
                        }
                        queue.push_back(child);
                    }
                    None => gap = true,
                }
            }
        }

        seen == self.count && self.last == Some(final_node)
    }

    #[inline]
    fn compare(&self, store: &S, a: S::Id, b: S::Id) -> Ordering {
        (self.comparator)(store.key(a), store.key(b))
    }

    /// Parent of the next free slot, i.e. slot `count + 1` in level order
    fn insertion_parent(&self, store: &S, root: S::Id, last: S::Id) -> S::Id {
        let slot = self.count + 1;

        // A full tree starts a new level below its leftmost leaf.
        if slot.is_power_of_two() {
            return Self::leftmost(store, root);
        }

        // Odd slots are right children: the sibling of `last`.
        if slot % 2 == 1 {
            return store.links(last).parent.unwrap_or(root);
        }

        // Even slots open the next subtree: climb out of the right spine
        // above `last`, then descend the left spine of the next subtree.
        let mut node = last;
        while let Some(parent) = store.links(node).parent {
            match store.links(parent).right {
                Some(right) if right == node => node = parent,
                Some(right) => return Self::leftmost(store, right),
                None => return parent,
            }
        }
        node
    }

    /// New last node after removing a left child from slot `count + 1`
    fn last_after_removal(&self, store: &S, root: S::Id, parent: S::Id) -> S::Id {
        let removed_slot = self.count + 1;

        // The removed node opened its level; the level above is now last.
        if removed_slot.is_power_of_two() {
            return Self::rightmost(store, root);
        }

        let mut node = parent;
        while let Some(up) = store.links(node).parent {
            match store.links(up).left {
                Some(left) if left == node => node = up,
                Some(left) => return Self::rightmost(store, left),
                None => return up,
            }
        }
        node
    }

    fn leftmost(store: &S, mut node: S::Id) -> S::Id {
        while let Some(left) = store.links(node).left {
            node = left;
        }
        node
    }

    fn rightmost(store: &S, mut node: S::Id) -> S::Id {
        while let Some(right) = store.links(node).right {
            node = right;
        }
        node
    }

    /// Cuts `last` away from its parent and records the new last node
    fn unlink_last(&mut self, store: &mut S, root: S::Id, parent: S::Id, last: S::Id) {
        let parent_links = store.links_mut(parent);
        if parent_links.left == Some(last) {
            parent_links.left = None;
            self.last = Some(self.last_after_removal(store, root, parent));
        } else {
            parent_links.right = None;
            self.last = parent_links.left;
        }
    }

    /// Moves `replacement` into the root slot vacated by `old_root`
    fn transplant_root(&mut self, store: &mut S, old_root: S::Id, replacement: S::Id) {
        let Links { left, right, .. } = *store.links(old_root);

        let links = store.links_mut(replacement);
        links.parent = None;
        links.left = left;
        links.right = right;
        for child in [left, right].into_iter().flatten() {
            store.links_mut(child).parent = Some(replacement);
        }
        self.root = Some(replacement);
    }

    fn sift_up(&mut self, store: &mut S, id: S::Id) {
        while let Some(parent) = store.links(id).parent {
            if self.compare(store, parent, id) != Ordering::Greater {
                break;
            }
            self.promote(store, id);
        }
    }

    fn sift_down(&mut self, store: &mut S, id: S::Id) {
        loop {
            let links = *store.links(id);
            let left = self.violating_child(store, id, links.left);
            let right = self.violating_child(store, id, links.right);

            let target = match (left, right) {
                (Some(left), Some(right)) => {
                    if self.compare(store, left, right) == Ordering::Less {
                        left
                    } else {
                        right
                    }
                }
                (Some(left), None) => left,
                (None, Some(right)) => right,
                (None, None) => break,
            };
            self.promote(store, target);
        }
    }

    #[inline]
    fn violating_child(&self, store: &S, id: S::Id, child: Option<S::Id>) -> Option<S::Id> {
        child.filter(|&child| self.compare(store, id, child) == Ordering::Greater)
    }

    /// Rotates `id` one level up, swapping tree positions with its parent
    ///
    /// Only links change. The sibling subtree moves under `id`, the parent
    /// takes over the children of `id`, and `last` follows the slot.
    fn promote(&mut self, store: &mut S, id: S::Id) {
        let Some(parent) = store.links(id).parent else {
            return;
        };
        let Links {
            left: child_left,
            right: child_right,
            ..
        } = *store.links(id);
        let Links {
            parent: grandparent,
            left: parent_left,
            right: parent_right,
            ..
        } = *store.links(parent);

        let (sibling, links) = if parent_left == Some(id) {
            let links = Links {
                parent: grandparent,
                left: Some(parent),
                right: parent_right,
                queued: true,
            };
            (parent_right, links)
        } else {
            let links = Links {
                parent: grandparent,
                left: parent_left,
                right: Some(parent),
                queued: true,
            };
            (parent_left, links)
        };
        *store.links_mut(id) = links;
        if let Some(sibling) = sibling {
            store.links_mut(sibling).parent = Some(id);
        }

        match grandparent {
            Some(grandparent) => {
                let links = store.links_mut(grandparent);
                if links.left == Some(parent) {
                    links.left = Some(id);
                } else {
                    links.right = Some(id);
                }
            }
            None => self.root = Some(id),
        }

        *store.links_mut(parent) = Links {
            parent: Some(id),
            left: child_left,
            right: child_right,
            queued: true,
        };
        for child in [child_left, child_right].into_iter().flatten() {
            store.links_mut(child).parent = Some(parent);
        }

        if self.last == Some(id) {
            self.last = Some(parent);
        }
    }
}

impl<S: NodeStore> Default for LinkedBinaryHeap<S>
where
    S::Key: Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S: NodeStore> fmt::Debug for LinkedBinaryHeap<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedBinaryHeap")
            .field("count", &self.count)
            .field("root", &self.root)
            .field("last", &self.last)
            .finish()
    }
}
