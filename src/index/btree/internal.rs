//! Index blocks: separator keys over child handles.

use crate::common::{BlockHandle, Error, Result};
use crate::index::btree::block::Key;
use crate::index::btree::sequence::OrderedSequence;
use crate::storage::codec::{ByteReader, ByteWriter};

/// An interior node of the tree.
///
/// `children` always holds one more handle than `keys`. Every key in
/// `children[i]` is `>= keys[i - 1]` and `< keys[i]`:
/// ```text
///            ┌──────┬──────┬──────┐
///   keys     │  10  │  20  │  30  │
///            └──────┴──────┴──────┘
///   children ↓     ↓      ↓      ↓
///          [<10] [10..20) [20..30) [>=30]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct IndexBlock<K> {
    pub(crate) handle: BlockHandle,
    pub(crate) keys: OrderedSequence<K>,
    pub(crate) children: OrderedSequence<BlockHandle>,
}

impl<K: Key> IndexBlock<K> {
    pub fn new(order: usize) -> Self {
        Self {
            handle: BlockHandle::NULL,
            keys: OrderedSequence::new(order),
            children: OrderedSequence::new(order + 1),
        }
    }

    /// A new root over two halves of a split.
    pub fn with_children(order: usize, left: BlockHandle, separator: K, right: BlockHandle) -> Self {
        let mut index = Self::new(order);
        index.children.push(left);
        index.keys.push(separator);
        index.children.push(right);
        index
    }

    #[inline]
    pub fn handle(&self) -> BlockHandle {
        self.handle
    }

    #[inline]
    pub fn keys(&self) -> &OrderedSequence<K> {
        &self.keys
    }

    #[inline]
    pub fn children(&self) -> &OrderedSequence<BlockHandle> {
        &self.children
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Position of the child whose range contains `key`.
    #[inline]
    pub fn child_position(&self, key: &K) -> usize {
        self.keys.upper_bound(key)
    }

    #[inline]
    pub fn child(&self, pos: usize) -> BlockHandle {
        self.children[pos]
    }

    /// Record that `children[pos]` split at `separator` into itself and
    /// `right`.
    pub fn insert_child(&mut self, pos: usize, separator: K, right: BlockHandle) {
        self.keys.insert_at(pos, separator);
        self.children.insert_at(pos + 1, right);
    }

    /// Move the upper half into a new index block.
    ///
    /// Returns the middle key, which moves up to the parent and stays in
    /// neither half. The new block is unregistered.
    ///
    /// # Panics
    /// Panics unless the block is full.
    pub fn split_off(&mut self) -> (K, Self) {
        assert!(self.keys.is_full(), "split of non-full {}", self.handle);
        let at = self.keys.capacity() / 2;
        let right = Self {
            handle: BlockHandle::NULL,
            keys: self.keys.split_off(at),
            children: self.children.split_off(at),
        };
        let separator = self.keys.pop_last();
        (separator, right)
    }

    /// Rotate the last child of `left` through the parent separator.
    /// Returns the separator that replaces `separator` in the parent.
    pub fn borrow_from_left(&mut self, left: &mut Self, separator: K) -> K {
        self.keys.insert_at(0, separator);
        let last = left.children.len() - 1;
        self.children.splice(&mut left.children, last, 1, 0);
        left.keys.pop_last()
    }

    /// Rotate the first child of `right` through the parent separator.
    /// Returns the separator that replaces `separator` in the parent.
    pub fn borrow_from_right(&mut self, right: &mut Self, separator: K) -> K {
        self.keys.push(separator);
        let end = self.children.len();
        self.children.splice(&mut right.children, 0, 1, end);
        right.keys.remove_at(0)
    }

    /// Absorb `left` with the parent separator pulled down between them.
    pub fn merge_with_left(&mut self, left: &mut Self, separator: K) {
        self.keys.insert_at(0, separator);
        self.keys.prepend(&mut left.keys);
        self.children.prepend(&mut left.children);
    }

    /// Absorb `right` with the parent separator pulled down between them.
    pub fn merge_with_right(&mut self, right: &mut Self, separator: K) {
        self.keys.push(separator);
        self.keys.append(&mut right.keys);
        self.children.append(&mut right.children);
    }

    pub fn storage_size(order: usize) -> usize {
        OrderedSequence::<K>::encoded_len(order) + OrderedSequence::<BlockHandle>::encoded_len(order + 1)
    }

    pub(crate) fn encode(&self, writer: &mut ByteWriter<'_>) {
        self.keys.encode_into(writer);
        self.children.encode_into(writer);
    }

    pub(crate) fn decode(handle: BlockHandle, order: usize, reader: &mut ByteReader<'_>) -> Result<Self> {
        let keys = OrderedSequence::decode_from(reader, order)?;
        let children = OrderedSequence::decode_from(reader, order + 1)?;
        if children.len() != keys.len() + 1 {
            return Err(Error::Corrupted(format!(
                "{} has {} keys but {} children",
                handle,
                keys.len(),
                children.len()
            )));
        }
        Ok(Self {
            handle,
            keys,
            children,
        })
    }
}
