//! Positions in the leaf chain and iteration over them.

use std::fmt;
use std::iter::FusedIterator;

use crate::common::{BlockHandle, Error, Result};
use crate::index::btree::block::{Key, Value};
use crate::index::btree::leaf::LeafBlock;
use crate::index::btree::tree::BTree;

/// A position in the tree: a leaf handle and a slot within it.
///
/// A cursor holds no block reference, only the handle, so it stays valid
/// while the leaf is evicted and reloaded. The past-the-end position is
/// one past the last slot of the rightmost leaf; every other position
/// points at a key.
pub struct Cursor<'t, K: Key, V: Value> {
    tree: &'t BTree<K, V>,
    leaf: BlockHandle,
    position: usize,
}

impl<'t, K: Key, V: Value> Cursor<'t, K, V> {
    pub(crate) fn new(tree: &'t BTree<K, V>, leaf: BlockHandle, position: usize) -> Self {
        Self {
            tree,
            leaf,
            position,
        }
    }

    #[inline]
    pub fn leaf(&self) -> BlockHandle {
        self.leaf
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Run `f` on a leaf, then trim the cache.
    fn with_leaf<R>(&self, handle: BlockHandle, f: impl FnOnce(&LeafBlock<K, V>) -> R) -> Result<R> {
        let mut store = self.tree.store();
        let result = f(store.read(handle)?.as_leaf());
        store.evict_if_over_capacity()?;
        Ok(result)
    }

    pub fn is_end(&self) -> Result<bool> {
        if self.leaf.is_null() {
            return Ok(true);
        }
        let position = self.position;
        self.with_leaf(self.leaf, |leaf| position >= leaf.len() && leaf.next().is_null())
    }

    /// The pair under the cursor, or None at the end.
    pub fn entry(&self) -> Result<Option<(K, V)>> {
        if self.leaf.is_null() {
            return Ok(None);
        }
        let position = self.position;
        self.with_leaf(self.leaf, |leaf| {
            leaf.entry(position)
                .map(|(key, value)| (key.clone(), value.clone()))
        })
    }

    pub fn key(&self) -> Result<Option<K>> {
        Ok(self.entry()?.map(|(key, _)| key))
    }

    pub fn value(&self) -> Result<Option<V>> {
        Ok(self.entry()?.map(|(_, value)| value))
    }

    /// Step to the next key. Returns false, staying put, at the end.
    pub fn advance(&mut self) -> Result<bool> {
        if self.leaf.is_null() {
            return Ok(false);
        }
        let (len, next) = self.with_leaf(self.leaf, |leaf| (leaf.len(), leaf.next()))?;
        if self.position >= len {
            return Ok(false);
        }

        self.position += 1;
        if self.position == len && !next.is_null() {
            self.leaf = next;
            self.position = 0;
        }
        Ok(true)
    }

    /// Step to the previous key. Returns false, staying put, at the first
    /// key.
    pub fn retreat(&mut self) -> Result<bool> {
        if self.leaf.is_null() {
            return Ok(false);
        }
        if self.position > 0 {
            self.position -= 1;
            return Ok(true);
        }

        let prev = self.with_leaf(self.leaf, |leaf| leaf.prev())?;
        if prev.is_null() {
            return Ok(false);
        }
        let len = self.with_leaf(prev, |leaf| leaf.len())?;
        self.leaf = prev;
        self.position = len.saturating_sub(1);
        Ok(true)
    }
}

impl<K: Key, V: Value> Clone for Cursor<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            leaf: self.leaf,
            position: self.position,
        }
    }
}

impl<K: Key, V: Value> PartialEq for Cursor<'_, K, V> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree)
            && self.leaf == other.leaf
            && self.position == other.position
    }
}

impl<K: Key, V: Value> Eq for Cursor<'_, K, V> {}

impl<K: Key, V: Value> fmt::Debug for Cursor<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("leaf", &self.leaf)
            .field("position", &self.position)
            .finish()
    }
}

/// Double-ended iterator over the pairs between two cursors.
///
/// Yields `Result` items because a step may need to load a page. After an
/// error the iterator is exhausted.
pub struct Iter<'t, K: Key, V: Value> {
    front: Cursor<'t, K, V>,
    back: Cursor<'t, K, V>,
    done: bool,
}

impl<'t, K: Key, V: Value> Iter<'t, K, V> {
    pub(crate) fn new(front: Cursor<'t, K, V>, back: Cursor<'t, K, V>) -> Self {
        Self {
            front,
            back,
            done: false,
        }
    }

    fn exhausted(&self) -> bool {
        self.done || self.front == self.back
    }

    fn fail<T>(&mut self, error: Error) -> Option<Result<T>> {
        self.done = true;
        Some(Err(error))
    }
}

impl<K: Key, V: Value> Iterator for Iter<'_, K, V> {
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted() {
            return None;
        }
        let pair = match self.front.entry() {
            Ok(Some(pair)) => pair,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => return self.fail(e),
        };
        if let Err(e) = self.front.advance() {
            return self.fail(e);
        }
        Some(Ok(pair))
    }
}

impl<K: Key, V: Value> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.exhausted() {
            return None;
        }
        match self.back.retreat() {
            Ok(true) => {}
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => return self.fail(e),
        }
        match self.back.entry() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => self.fail(e),
        }
    }
}

impl<K: Key, V: Value> FusedIterator for Iter<'_, K, V> {}
