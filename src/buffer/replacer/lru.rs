//! LRU (Least-Recently-Used) replacement policy.
//!
//! Tracks resident page handles in recency order so the page store can
//! pick the coldest page to evict.

use std::collections::HashMap;

use crate::common::BlockHandle;

/// Link in the recency list. Slots are recycled through `free_slots`.
#[derive(Debug, Clone, Copy)]
struct Node {
    handle: BlockHandle,
    prev: Option<usize>,
    next: Option<usize>,
}

/// An O(1) LRU list of resident handles.
///
/// # Structure
/// ```text
///   head (most recent)                       tail (least recent)
///      ┌────┐    ┌────┐    ┌────┐    ┌────┐
///      │ h7 │ ⇄ │ h2 │ ⇄ │ h9 │ ⇄ │ h4 │
///      └────┘    └────┘    └────┘    └────┘
///   index: { h7 → 0, h2 → 3, h9 → 1, h4 → 2 }   (slot in `nodes`)
/// ```
///
/// The list is threaded through a slab (`nodes`) by slot index instead of
/// pointers, and `index` maps a handle to its slot. Every operation is a
/// constant number of slab and map accesses; none scans the list.
#[derive(Debug, Default)]
pub struct LruReplacer {
    nodes: Vec<Node>,
    free_slots: Vec<usize>,
    index: HashMap<BlockHandle, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl LruReplacer {
    /// Create an empty replacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `handle` as the most recently used entry.
    ///
    /// # Panics
    /// Panics if `handle` is already tracked.
    pub fn admit(&mut self, handle: BlockHandle) {
        assert!(
            !self.index.contains_key(&handle),
            "{} admitted twice",
            handle
        );

        let node = Node {
            handle,
            prev: None,
            next: None,
        };
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };
        self.index.insert(handle, slot);
        self.push_front(slot);
    }

    /// Mark `handle` as most recently used.
    ///
    /// Returns false if the handle is not tracked.
    pub fn touch(&mut self, handle: BlockHandle) -> bool {
        let Some(&slot) = self.index.get(&handle) else {
            return false;
        };
        if self.head != Some(slot) {
            self.unlink(slot);
            self.push_front(slot);
        }
        true
    }

    /// The eviction candidate, if any.
    pub fn least_recently_used(&self) -> Option<BlockHandle> {
        self.tail.map(|slot| self.nodes[slot].handle)
    }

    /// Stop tracking `handle`.
    ///
    /// Returns false if the handle was not tracked.
    pub fn evict(&mut self, handle: BlockHandle) -> bool {
        let Some(slot) = self.index.remove(&handle) else {
            return false;
        };
        self.unlink(slot);
        self.free_slots.push(slot);
        true
    }

    /// Check whether `handle` is tracked.
    #[inline]
    pub fn contains(&self, handle: BlockHandle) -> bool {
        self.index.contains_key(&handle)
    }

    /// Number of tracked handles.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn push_front(&mut self, slot: usize) {
        self.nodes[slot].prev = None;
        self.nodes[slot].next = self.head;
        match self.head {
            Some(old_head) => self.nodes[old_head].prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn unlink(&mut self, slot: usize) {
        let Node { prev, next, .. } = self.nodes[slot];
        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[slot].prev = None;
        self.nodes[slot].next = None;
    }
}
