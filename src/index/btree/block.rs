//! The tree node sum type and its page encoding.

use std::fmt;

use crate::buffer::StoredPage;
use crate::common::{BlockHandle, Error, Result};
use crate::index::btree::internal::IndexBlock;
use crate::index::btree::leaf::LeafBlock;
use crate::index::btree::sequence::OrderedSequence;
use crate::storage::codec::{ByteReader, ByteWriter, FixedCodec};
use crate::storage::PageKind;

/// Requirements on tree keys: fixed-size and totally ordered.
pub trait Key: FixedCodec + Ord + Clone + fmt::Debug {}

impl<T: FixedCodec + Ord + Clone + fmt::Debug> Key for T {}

/// Requirements on tree values: fixed-size.
pub trait Value: FixedCodec + Clone {}

impl<T: FixedCodec + Clone> Value for T {}

/// A tree node, addressed by its [`BlockHandle`].
///
/// # Occupancy
/// With `Order` the key capacity:
/// - `should_split`: `len == Order`
/// - `should_merge`: `len * 2 < Order`
/// - `may_borrow`: `len * 2 > Order` (can lend one and stay balanced)
#[derive(Debug, Clone, PartialEq)]
pub enum Block<K, V> {
    Leaf(LeafBlock<K, V>),
    Index(IndexBlock<K>),
}

impl<K: Key, V: Value> Block<K, V> {
    #[inline]
    pub fn handle(&self) -> BlockHandle {
        match self {
            Block::Leaf(leaf) => leaf.handle,
            Block::Index(index) => index.handle,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Block::Leaf(_))
    }

    #[inline]
    pub fn keys(&self) -> &OrderedSequence<K> {
        match self {
            Block::Leaf(leaf) => &leaf.keys,
            Block::Index(index) => &index.keys,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keys().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.keys().capacity()
    }

    #[inline]
    pub fn should_split(&self) -> bool {
        self.len() == self.order()
    }

    #[inline]
    pub fn should_merge(&self) -> bool {
        self.len() * 2 < self.order()
    }

    #[inline]
    pub fn may_borrow(&self) -> bool {
        self.len() * 2 > self.order()
    }

    /// # Panics
    /// Panics if this is an index block.
    pub fn as_leaf(&self) -> &LeafBlock<K, V> {
        match self {
            Block::Leaf(leaf) => leaf,
            Block::Index(index) => panic!("{} is an index block, expected a leaf", index.handle),
        }
    }

    /// # Panics
    /// Panics if this is an index block.
    pub fn as_leaf_mut(&mut self) -> &mut LeafBlock<K, V> {
        match self {
            Block::Leaf(leaf) => leaf,
            Block::Index(index) => panic!("{} is an index block, expected a leaf", index.handle),
        }
    }

    /// # Panics
    /// Panics if this is a leaf.
    pub fn as_index(&self) -> &IndexBlock<K> {
        match self {
            Block::Index(index) => index,
            Block::Leaf(leaf) => panic!("{} is a leaf, expected an index block", leaf.handle),
        }
    }

    /// # Panics
    /// Panics if this is a leaf.
    pub fn as_index_mut(&mut self) -> &mut IndexBlock<K> {
        match self {
            Block::Index(index) => index,
            Block::Leaf(leaf) => panic!("{} is a leaf, expected an index block", leaf.handle),
        }
    }

    // ========================================================================
    // Sibling operations
    //
    // Siblings under one parent are always the same kind. `separator` is the
    // parent key between the two blocks; leaves ignore it.
    // ========================================================================

    pub fn borrow_from_left(&mut self, left: &mut Self, separator: K) -> K {
        match (self, left) {
            (Block::Leaf(this), Block::Leaf(left)) => this.borrow_from_left(left),
            (Block::Index(this), Block::Index(left)) => this.borrow_from_left(left, separator),
            (this, left) => mismatched_siblings(this.handle(), left.handle()),
        }
    }

    pub fn borrow_from_right(&mut self, right: &mut Self, separator: K) -> K {
        match (self, right) {
            (Block::Leaf(this), Block::Leaf(right)) => this.borrow_from_right(right),
            (Block::Index(this), Block::Index(right)) => this.borrow_from_right(right, separator),
            (this, right) => mismatched_siblings(this.handle(), right.handle()),
        }
    }

    pub fn merge_with_left(&mut self, left: &mut Self, separator: K) {
        match (self, left) {
            (Block::Leaf(this), Block::Leaf(left)) => this.merge_with_left(left),
            (Block::Index(this), Block::Index(left)) => this.merge_with_left(left, separator),
            (this, left) => mismatched_siblings(this.handle(), left.handle()),
        }
    }

    pub fn merge_with_right(&mut self, right: &mut Self, separator: K) {
        match (self, right) {
            (Block::Leaf(this), Block::Leaf(right)) => this.merge_with_right(right),
            (Block::Index(this), Block::Index(right)) => this.merge_with_right(right, separator),
            (this, right) => mismatched_siblings(this.handle(), right.handle()),
        }
    }
}

fn mismatched_siblings(a: BlockHandle, b: BlockHandle) -> ! {
    panic!("siblings {} and {} are of different kinds", a, b)
}

impl<K: Key, V: Value> StoredPage for Block<K, V> {
    fn kind(&self) -> PageKind {
        match self {
            Block::Leaf(_) => PageKind::Leaf,
            Block::Index(_) => PageKind::Index,
        }
    }

    fn assign_handle(&mut self, handle: BlockHandle) {
        match self {
            Block::Leaf(leaf) => leaf.handle = handle,
            Block::Index(index) => index.handle = handle,
        }
    }

    fn storage_size(kind: PageKind, order: usize) -> usize {
        match kind {
            PageKind::Leaf => LeafBlock::<K, V>::storage_size(order),
            PageKind::Index => IndexBlock::<K>::storage_size(order),
            PageKind::Free => 0,
        }
    }

    fn serialize(&self, out: &mut [u8]) {
        let mut writer = ByteWriter::new(out);
        match self {
            Block::Leaf(leaf) => leaf.encode(&mut writer),
            Block::Index(index) => index.encode(&mut writer),
        }
    }

    fn deserialize(handle: BlockHandle, kind: PageKind, order: usize, bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        match kind {
            PageKind::Leaf => Ok(Block::Leaf(LeafBlock::decode(handle, order, &mut reader)?)),
            PageKind::Index => Ok(Block::Index(IndexBlock::decode(handle, order, &mut reader)?)),
            PageKind::Free => Err(Error::Corrupted(format!("{} is a free slot", handle))),
        }
    }
}
