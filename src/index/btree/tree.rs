//! The public B+Tree handle.

use std::ops::{Bound, RangeBounds};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error};

use crate::buffer::{PageStore, StatsSnapshot};
use crate::common::{BlockHandle, Result, StoreConfig};
use crate::index::btree::block::{Block, Key, Value};
use crate::index::btree::cursor::{Cursor, Iter};
use crate::index::btree::internal::IndexBlock;
use crate::index::btree::leaf::LeafBlock;
use crate::index::btree::ops::{self, BlockStore};
use crate::index::btree::verify::{self, TreeShape};
use crate::storage::PersistentHeader;

/// Result of [`BTree::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The pair was added.
    Success,
    /// The key was already present; nothing changed.
    Duplicate,
}

impl InsertOutcome {
    #[inline]
    pub fn is_success(self) -> bool {
        self == InsertOutcome::Success
    }
}

/// A disk-backed B+Tree map with fixed-size keys and values.
///
/// # Architecture
/// ```text
///   BTree ──lock──► PageStore ──► resident blocks ◄── LruReplacer
///     │                 │
///     │                 └──► backing file (header, pages, page table)
///     └── Cursor / Iter hold (leaf handle, position), never a block
/// ```
///
/// Lookups and cursors take `&self`; mutations take `&mut self`, so the
/// borrow checker rules out a cursor surviving a structural change.
///
/// # Example
/// ```
/// use bptree_store::{BTree, InsertOutcome, StoreConfig};
///
/// let mut tree: BTree<u32, u64> = BTree::in_memory(StoreConfig::default().with_order(4)).unwrap();
/// assert_eq!(tree.insert(1, 10).unwrap(), InsertOutcome::Success);
/// assert_eq!(tree.insert(1, 11).unwrap(), InsertOutcome::Duplicate);
/// assert_eq!(tree.find(&1).unwrap(), Some(10));
/// assert!(tree.remove(&1).unwrap());
/// assert!(tree.is_empty());
/// ```
pub struct BTree<K: Key, V: Value> {
    store: Mutex<BlockStore<K, V>>,
    path: Option<PathBuf>,
}

impl<K: Key, V: Value> BTree<K, V> {
    /// Open the tree stored at `path`, creating it if the file is new.
    ///
    /// # Errors
    /// Fails if the file was written with different key/value sizes, a
    /// different order or another format version, or cannot be read.
    pub fn open<P: AsRef<Path>>(path: P, config: StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        let store = PageStore::open(path, config, Self::format_magic(&config))?;
        debug!(
            path = ?path,
            order = config.order,
            keys = store.live_key_count(),
            "btree.open"
        );
        Ok(Self {
            store: Mutex::new(store),
            path: Some(path.to_path_buf()),
        })
    }

    /// A tree with no backing file. Nothing is persisted or evicted.
    pub fn in_memory(config: StoreConfig) -> Result<Self> {
        let store = PageStore::in_memory(config, Self::format_magic(&config))?;
        Ok(Self {
            store: Mutex::new(store),
            path: None,
        })
    }

    fn format_magic(config: &StoreConfig) -> u32 {
        PersistentHeader::compute_magic(K::ENCODED_LEN, V::ENCODED_LEN, config.order)
    }

    pub(crate) fn store(&self) -> MutexGuard<'_, BlockStore<K, V>> {
        self.store.lock()
    }

    // ========================================================================
    // Point operations
    // ========================================================================

    pub fn find(&self, key: &K) -> Result<Option<V>> {
        let mut store = self.store.lock();
        let root = store.root();
        if store.try_read(root)?.is_none() {
            return Ok(None);
        }
        let found = ops::find(&mut store, root, key)?;
        store.evict_if_over_capacity()?;
        Ok(found)
    }

    pub fn contains_key(&self, key: &K) -> Result<bool> {
        Ok(self.find(key)?.is_some())
    }

    /// Insert a new pair. An existing key is left untouched and reported as
    /// [`InsertOutcome::Duplicate`].
    pub fn insert(&mut self, key: K, value: V) -> Result<InsertOutcome> {
        let store = self.store.get_mut();
        let order = store.config().order;

        let mut root = store.root();
        if store.try_read(root)?.is_none() {
            root = store.allocate_and_register(Block::Leaf(LeafBlock::new(order)))?;
            store.set_root(root);
        }

        let outcome = if ops::insert(store, root, key, value)? {
            store.set_live_key_count(store.live_key_count() + 1);
            if store.read(root)?.should_split() {
                let (separator, right) = ops::split_block(store, root)?;
                let new_root = store.allocate_and_register(Block::Index(
                    IndexBlock::with_children(order, root, separator, right),
                ))?;
                store.set_root(new_root);
            }
            InsertOutcome::Success
        } else {
            InsertOutcome::Duplicate
        };

        store.evict_if_over_capacity()?;
        Ok(outcome)
    }

    /// Remove `key`. Returns false if it was absent.
    pub fn remove(&mut self, key: &K) -> Result<bool> {
        let store = self.store.get_mut();
        let root = store.root();
        if store.try_read(root)?.is_none() {
            return Ok(false);
        }

        let removed = ops::remove(store, root, key)?;
        if removed {
            store.set_live_key_count(store.live_key_count().saturating_sub(1));

            // An index root left with a single child hands the tree to it
            let collapse_to = match store.read(root)? {
                Block::Index(index) if index.is_empty() => Some(index.child(0)),
                _ => None,
            };
            if let Some(child) = collapse_to {
                store.deregister(root);
                store.set_root(child);
            }
        }

        store.evict_if_over_capacity()?;
        Ok(removed)
    }

    /// Number of keys in the tree.
    pub fn len(&self) -> usize {
        self.store.lock().live_key_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // Cursors
    // ========================================================================

    /// Cursor at the smallest key.
    pub fn begin(&self) -> Result<Cursor<'_, K, V>> {
        self.edge_cursor(false)
    }

    /// Cursor one past the largest key.
    pub fn end(&self) -> Result<Cursor<'_, K, V>> {
        self.edge_cursor(true)
    }

    fn edge_cursor(&self, rightmost: bool) -> Result<Cursor<'_, K, V>> {
        let mut store = self.store.lock();
        let root = store.root();
        if store.try_read(root)?.is_none() {
            return Ok(Cursor::new(self, BlockHandle::NULL, 0));
        }
        let leaf = ops::edge_leaf(&mut store, root, rightmost)?;
        let position = if rightmost {
            store.read(leaf)?.len()
        } else {
            0
        };
        store.evict_if_over_capacity()?;
        Ok(Cursor::new(self, leaf, position))
    }

    /// Cursor at the first key `>= key`.
    pub fn lower_bound(&self, key: &K) -> Result<Cursor<'_, K, V>> {
        self.seek(key, false)
    }

    /// Cursor at the first key `> key`.
    pub fn upper_bound(&self, key: &K) -> Result<Cursor<'_, K, V>> {
        self.seek(key, true)
    }

    fn seek(&self, key: &K, past_equal: bool) -> Result<Cursor<'_, K, V>> {
        let mut store = self.store.lock();
        let root = store.root();
        if store.try_read(root)?.is_none() {
            return Ok(Cursor::new(self, BlockHandle::NULL, 0));
        }

        let leaf = ops::find_leaf(&mut store, root, key)?;
        let (len, next, position) = {
            let block = store.read(leaf)?.as_leaf();
            let position = if past_equal {
                block.keys().upper_bound(key)
            } else {
                block.keys().lower_bound(key)
            };
            (block.len(), block.next(), position)
        };
        store.evict_if_over_capacity()?;

        // Past the last key of a leaf is the start of the next one
        if position == len && !next.is_null() {
            Ok(Cursor::new(self, next, 0))
        } else {
            Ok(Cursor::new(self, leaf, position))
        }
    }

    /// Iterate every pair in ascending key order.
    pub fn iter(&self) -> Result<Iter<'_, K, V>> {
        Ok(Iter::new(self.begin()?, self.end()?))
    }

    /// Iterate the pairs whose keys fall in `range`. An inverted range is
    /// empty.
    ///
    /// # Example
    /// ```
    /// use bptree_store::{BTree, StoreConfig};
    ///
    /// let mut tree: BTree<u32, u32> = BTree::in_memory(StoreConfig::default()).unwrap();
    /// for k in 0..10 {
    ///     tree.insert(k, k * k).unwrap();
    /// }
    /// let keys: Vec<u32> = tree
    ///     .range(3..6)
    ///     .unwrap()
    ///     .map(|entry| entry.unwrap().0)
    ///     .collect();
    /// assert_eq!(keys, vec![3, 4, 5]);
    /// ```
    pub fn range<R: RangeBounds<K>>(&self, range: R) -> Result<Iter<'_, K, V>> {
        let front = match range.start_bound() {
            Bound::Included(key) => self.lower_bound(key)?,
            Bound::Excluded(key) => self.upper_bound(key)?,
            Bound::Unbounded => self.begin()?,
        };
        if is_inverted(range.start_bound(), range.end_bound()) {
            return Ok(Iter::new(front.clone(), front));
        }
        let back = match range.end_bound() {
            Bound::Included(key) => self.upper_bound(key)?,
            Bound::Excluded(key) => self.lower_bound(key)?,
            Bound::Unbounded => self.end()?,
        };
        Ok(Iter::new(front, back))
    }

    // ========================================================================
    // Persistence and residency
    // ========================================================================

    /// Write every dirty page, the page table and the header.
    pub fn flush(&self) -> Result<()> {
        self.store.lock().flush_all()
    }

    /// Write `handle` back if dirty and drop it from memory. Returns false
    /// if it was not resident or the tree is in memory only.
    pub fn offload(&self, handle: BlockHandle) -> Result<bool> {
        self.store.lock().offload(handle)
    }

    pub fn is_resident(&self, handle: BlockHandle) -> bool {
        self.store.lock().is_resident(handle)
    }

    /// Handle of the root block; null for a tree that never held a key.
    pub fn root_handle(&self) -> BlockHandle {
        self.store.lock().root()
    }

    /// Number of blocks currently deserialized in memory.
    pub fn resident_pages(&self) -> usize {
        self.store.lock().resident_count()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.store.lock().stats().snapshot()
    }

    pub fn config(&self) -> StoreConfig {
        *self.store.lock().config()
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of levels, 0 for a tree that never held a key.
    pub fn height(&self) -> Result<usize> {
        let mut store = self.store.lock();
        let mut handle = store.root();
        let mut height = 0;
        while let Some(block) = store.try_read(handle)? {
            height += 1;
            match block {
                Block::Leaf(_) => break,
                Block::Index(index) => handle = index.child(0),
            }
        }
        store.evict_if_over_capacity()?;
        Ok(height)
    }

    /// Walk the whole tree and check its structural invariants.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` describing the first violation found.
    pub fn verify(&self) -> Result<TreeShape> {
        let mut store = self.store.lock();
        let shape = verify::check(&mut store)?;
        store.evict_if_over_capacity()?;
        Ok(shape)
    }

    /// Render the tree one block per line, children indented.
    pub fn dump(&self) -> Result<String> {
        let mut store = self.store.lock();
        let text = verify::render(&mut store)?;
        store.evict_if_over_capacity()?;
        Ok(text)
    }
}

fn is_inverted<K: Ord>(start: Bound<&K>, end: Bound<&K>) -> bool {
    match (start, end) {
        (Bound::Included(s), Bound::Included(e)) => s > e,
        (Bound::Included(s) | Bound::Excluded(s), Bound::Included(e) | Bound::Excluded(e)) => s >= e,
        _ => false,
    }
}

impl<K: Key, V: Value> Drop for BTree<K, V> {
    fn drop(&mut self) {
        if let Err(e) = self.store.get_mut().flush_all() {
            error!(path = ?self.path, error = %e, "btree.drop.flush_failed");
        }
    }
}

impl<K: Key, V: Value> std::fmt::Debug for BTree<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BTree")
            .field("path", &self.path)
            .field("len", &self.len())
            .field("root", &self.root_handle())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use tempfile::tempdir;

    fn small() -> StoreConfig {
        StoreConfig::default()
            .with_order(4)
            .with_cache_capacity(4)
            .with_sync_on_flush(false)
    }

    #[test]
    fn test_empty_tree() {
        let tree: BTree<u32, u32> = BTree::in_memory(small()).unwrap();
        assert_eq!(tree.find(&1).unwrap(), None);
        assert!(tree.is_empty());
        assert!(tree.root_handle().is_null());
        assert_eq!(tree.height().unwrap(), 0);
        assert_eq!(tree.iter().unwrap().count(), 0);
        assert_eq!(tree.begin().unwrap(), tree.end().unwrap());
    }

    #[test]
    fn test_root_leaf_is_lazy() {
        let mut tree: BTree<u32, u32> = BTree::in_memory(small()).unwrap();
        assert!(!tree.remove(&1).unwrap());
        assert!(tree.root_handle().is_null());

        tree.insert(1, 1).unwrap();
        assert!(!tree.root_handle().is_null());
        assert_eq!(tree.height().unwrap(), 1);
    }

    #[test]
    fn test_root_split_and_collapse() {
        let mut tree: BTree<u32, u32> = BTree::in_memory(small()).unwrap();
        for k in 0..4 {
            tree.insert(k, k).unwrap();
        }
        assert_eq!(tree.height().unwrap(), 2);
        let index_root = tree.root_handle();

        for k in 0..3 {
            assert!(tree.remove(&k).unwrap());
        }
        assert_eq!(tree.height().unwrap(), 1);
        assert_ne!(tree.root_handle(), index_root);
        assert_eq!(tree.find(&3).unwrap(), Some(3));
        tree.verify().unwrap();
    }

    #[test]
    fn test_empty_root_leaf_stays() {
        let mut tree: BTree<u32, u32> = BTree::in_memory(small()).unwrap();
        tree.insert(5, 5).unwrap();
        let root = tree.root_handle();
        assert!(tree.remove(&5).unwrap());

        assert_eq!(tree.root_handle(), root);
        assert_eq!(tree.resident_pages(), 1);
        assert_eq!(tree.height().unwrap(), 1);
        assert!(tree.is_empty());

        tree.insert(6, 6).unwrap();
        assert_eq!(tree.root_handle(), root);
    }

    #[test]
    fn test_seek_normalizes_leaf_end() {
        let mut tree: BTree<u32, u32> = BTree::in_memory(small()).unwrap();
        for k in [10, 20, 30, 40] {
            tree.insert(k, k).unwrap();
        }
        // Leaves are now [10, 20] and [30, 40]
        let cursor = tree.lower_bound(&25).unwrap();
        assert_eq!(cursor.key().unwrap(), Some(30));
        assert_eq!(cursor.position(), 0);

        assert_eq!(tree.upper_bound(&40).unwrap(), tree.end().unwrap());
        assert_eq!(tree.lower_bound(&0).unwrap(), tree.begin().unwrap());
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let mut tree: BTree<u32, u32> = BTree::in_memory(small()).unwrap();
        for k in 0..10 {
            tree.insert(k, k).unwrap();
        }
        assert_eq!(tree.range(6..3).unwrap().count(), 0);
        assert_eq!(tree.range(4..4).unwrap().count(), 0);
        assert_eq!(tree.range(4..=4).unwrap().count(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result: Result<BTree<u32, u32>> = BTree::in_memory(small().with_order(2));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_reopen_with_other_order_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.db");
        {
            let mut tree: BTree<u32, u32> = BTree::open(&path, small()).unwrap();
            tree.insert(1, 1).unwrap();
        }
        let result: Result<BTree<u32, u32>> = BTree::open(&path, small().with_order(6));
        assert!(matches!(result, Err(Error::MagicMismatch { .. })));

        let result: Result<BTree<u64, u32>> = BTree::open(&path, small());
        assert!(matches!(result, Err(Error::MagicMismatch { .. })));
    }

    #[test]
    fn test_drop_flushes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tree.db");
        {
            let mut tree: BTree<u32, u32> = BTree::open(&path, small()).unwrap();
            for k in 0..32 {
                tree.insert(k, k + 1).unwrap();
            }
            assert_eq!(tree.path(), Some(path.as_path()));
        }
        let tree: BTree<u32, u32> = BTree::open(&path, small()).unwrap();
        assert_eq!(tree.len(), 32);
        assert_eq!(tree.find(&31).unwrap(), Some(32));
    }
}
