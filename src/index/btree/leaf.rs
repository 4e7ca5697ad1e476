//! Leaf blocks: sorted key/value pairs threaded into a doubly linked chain.

use crate::common::{BlockHandle, Error, Result};
use crate::index::btree::block::{Key, Value};
use crate::index::btree::sequence::OrderedSequence;
use crate::storage::codec::{ByteReader, ByteWriter};

/// A leaf of the tree.
///
/// # Layout on disk
/// ```text
/// ┌──────┬──────┬─────────────────────┬─────────────────────┐
/// │ prev │ next │ keys: count + Order │ vals: count + Order │
/// │ u32  │ u32  │ slots of K          │ slots of V          │
/// └──────┴──────┴─────────────────────┴─────────────────────┘
/// ```
/// `keys[i]` pairs with `values[i]`; keys are strictly ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafBlock<K, V> {
    pub(crate) handle: BlockHandle,
    pub(crate) prev: BlockHandle,
    pub(crate) next: BlockHandle,
    pub(crate) keys: OrderedSequence<K>,
    pub(crate) values: OrderedSequence<V>,
}

impl<K: Key, V: Value> LeafBlock<K, V> {
    /// An unlinked, unregistered leaf with room for `order` keys.
    pub fn new(order: usize) -> Self {
        Self {
            handle: BlockHandle::NULL,
            prev: BlockHandle::NULL,
            next: BlockHandle::NULL,
            keys: OrderedSequence::new(order),
            values: OrderedSequence::new(order),
        }
    }

    #[inline]
    pub fn handle(&self) -> BlockHandle {
        self.handle
    }

    #[inline]
    pub fn prev(&self) -> BlockHandle {
        self.prev
    }

    #[inline]
    pub fn next(&self) -> BlockHandle {
        self.next
    }

    #[inline]
    pub fn keys(&self) -> &OrderedSequence<K> {
        &self.keys
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn query(&self, key: &K) -> Option<&V> {
        self.keys.position(key).map(|pos| &self.values[pos])
    }

    pub fn contains(&self, key: &K) -> bool {
        self.keys.position(key).is_some()
    }

    /// The pair at `pos`, if in range.
    pub fn entry(&self, pos: usize) -> Option<(&K, &V)> {
        if pos < self.keys.len() {
            Some((&self.keys[pos], &self.values[pos]))
        } else {
            None
        }
    }

    /// Insert a new pair. Returns false, leaving the leaf untouched, if the
    /// key is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let pos = self.keys.lower_bound(&key);
        if pos < self.keys.len() && self.keys[pos] == key {
            return false;
        }
        self.keys.insert_at(pos, key);
        self.values.insert_at(pos, value);
        true
    }

    pub fn remove(&mut self, key: &K) -> bool {
        match self.keys.position(key) {
            Some(pos) => {
                self.keys.remove_at(pos);
                self.values.remove_at(pos);
                true
            }
            None => false,
        }
    }

    /// Move the upper half into a new leaf linked after this one.
    ///
    /// The new leaf is unregistered: the caller assigns its handle, points
    /// `self.next` at it and repairs the old successor's `prev`.
    ///
    /// # Panics
    /// Panics unless the leaf is full.
    pub fn split_off(&mut self) -> Self {
        assert!(self.keys.is_full(), "split of non-full {}", self.handle);
        let at = self.keys.capacity() / 2;
        Self {
            handle: BlockHandle::NULL,
            prev: self.handle,
            next: self.next,
            keys: self.keys.split_off(at),
            values: self.values.split_off(at),
        }
    }

    /// Take the last pair of `left`. Returns the new separator between the
    /// two leaves.
    pub fn borrow_from_left(&mut self, left: &mut Self) -> K {
        debug_assert_eq!(self.prev, left.handle, "borrow from non-adjacent leaf");
        let key = left.keys.pop_last();
        let value = left.values.pop_last();
        self.keys.insert_at(0, key);
        self.values.insert_at(0, value);
        self.keys[0].clone()
    }

    /// Take the first pair of `right`. Returns the new separator between
    /// the two leaves.
    pub fn borrow_from_right(&mut self, right: &mut Self) -> K {
        debug_assert_eq!(self.next, right.handle, "borrow from non-adjacent leaf");
        let key = right.keys.remove_at(0);
        let value = right.values.remove_at(0);
        self.keys.push(key);
        self.values.push(value);
        right.keys[0].clone()
    }

    /// Absorb every pair of `left` and take over its `prev` link.
    ///
    /// The caller repairs the predecessor's `next` and deregisters `left`.
    pub fn merge_with_left(&mut self, left: &mut Self) {
        debug_assert_eq!(self.prev, left.handle, "merge with non-adjacent leaf");
        self.keys.prepend(&mut left.keys);
        self.values.prepend(&mut left.values);
        self.prev = left.prev;
    }

    /// Absorb every pair of `right` and take over its `next` link.
    ///
    /// The caller repairs the successor's `prev` and deregisters `right`.
    pub fn merge_with_right(&mut self, right: &mut Self) {
        debug_assert_eq!(self.next, right.handle, "merge with non-adjacent leaf");
        self.keys.append(&mut right.keys);
        self.values.append(&mut right.values);
        self.next = right.next;
    }

    pub fn storage_size(order: usize) -> usize {
        4 + 4 + OrderedSequence::<K>::encoded_len(order) + OrderedSequence::<V>::encoded_len(order)
    }

    pub(crate) fn encode(&self, writer: &mut ByteWriter<'_>) {
        writer.put(&self.prev);
        writer.put(&self.next);
        self.keys.encode_into(writer);
        self.values.encode_into(writer);
    }

    pub(crate) fn decode(handle: BlockHandle, order: usize, reader: &mut ByteReader<'_>) -> Result<Self> {
        let prev = reader.get();
        let next = reader.get();
        let keys = OrderedSequence::decode_from(reader, order)?;
        let values = OrderedSequence::decode_from(reader, order)?;
        if keys.len() != values.len() {
            return Err(Error::Corrupted(format!(
                "{} has {} keys but {} values",
                handle,
                keys.len(),
                values.len()
            )));
        }
        Ok(Self {
            handle,
            prev,
            next,
            keys,
            values,
        })
    }
}
