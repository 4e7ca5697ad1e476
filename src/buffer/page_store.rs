//! Page Store - the resident-page arena between the tree and the disk.
//!
//! The [`PageStore`] provides:
//! - Handle-addressed access to deserialized pages (load on miss)
//! - Slot assignment and free-slot reuse through the [`PageTable`]
//! - Dirty tracking and write-back on eviction or flush
//! - A bound on resident pages enforced through the [`LruReplacer`]

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, trace, warn};

use crate::buffer::replacer::LruReplacer;
use crate::buffer::StoreStats;
use crate::common::config::align_up;
use crate::common::{BlockHandle, Error, Result, StoreConfig};
use crate::storage::codec::FixedCodec;
use crate::storage::{DiskManager, PageKind, PageTable, PersistentHeader};

/// Bytes appended to every serialized page for its CRC32.
pub const PAGE_CHECKSUM_LEN: usize = 4;

/// A value the page store can keep resident and write to disk.
///
/// The encoded size depends only on the kind and the store order, so a
/// page always fits the slot it was first allocated with.
pub trait StoredPage: Sized {
    /// Kind recorded in the page table.
    fn kind(&self) -> PageKind;

    /// Record the handle the store assigned on registration.
    fn assign_handle(&mut self, handle: BlockHandle);

    /// Encoded size in bytes of a page of `kind` (checksum excluded).
    fn storage_size(kind: PageKind, order: usize) -> usize;

    /// Write the page into `out`, which is exactly `storage_size` bytes.
    fn serialize(&self, out: &mut [u8]);

    /// Rebuild a page previously written by [`serialize`](Self::serialize).
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the bytes are not a valid page.
    fn deserialize(handle: BlockHandle, kind: PageKind, order: usize, bytes: &[u8])
        -> Result<Self>;
}

/// A deserialized page plus its write-back state.
struct Resident<P> {
    page: P,
    dirty: bool,
}

/// Owns every resident page and the backing file.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                         PageStore                           │
/// │  ┌──────────────┐  ┌───────────────────────────────────┐   │
/// │  │  page_table  │  │   resident: Handle → (P, dirty)    │   │
/// │  │ Handle → slot│  │  [h1: Leaf] [h4: Index] [h9: Leaf] │   │
/// │  └──────────────┘  └───────────────────────────────────┘   │
/// │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐      │
/// │  │    header    │  │     lru      │  │ disk_manager │      │
/// │  │ root, count  │  │ LruReplacer  │  │   Option     │      │
/// │  └──────────────┘  └──────────────┘  └──────────────┘      │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// # Borrowing Model
/// Callers never hold a page across a call that may load or evict: every
/// accessor borrows `&mut self`, so the borrow checker enforces that a
/// reference into `resident` dies before the next store operation.
///
/// # Eviction
/// Loads never evict. The resident set may exceed `cache_capacity` during
/// one structural mutation and is trimmed by
/// [`evict_if_over_capacity`](Self::evict_if_over_capacity) afterwards.
/// A store without a backing file never evicts.
pub struct PageStore<P: StoredPage> {
    /// Handles all disk I/O; None for an in-memory store.
    disk: Option<DiskManager>,

    /// Root handle, key count and format fingerprint.
    header: PersistentHeader,

    /// Maps handles to file slots.
    page_table: PageTable,

    /// Deserialized pages.
    resident: HashMap<BlockHandle, Resident<P>>,

    /// Recency order of `resident`.
    replacer: LruReplacer,

    /// Performance statistics.
    stats: StoreStats,

    config: StoreConfig,
}

impl<P: StoredPage> PageStore<P> {
    /// Open the store at `path`, creating a fresh one if the file is new or
    /// empty.
    ///
    /// # Errors
    /// - `Error::VersionMismatch` / `Error::MagicMismatch` if the file was
    ///   written with another format or parameter set
    /// - `Error::Corrupted` if the header is truncated or the header or page
    ///   table fails validation
    /// - I/O errors from the file system
    pub fn open<Q: AsRef<Path>>(path: Q, config: StoreConfig, format_magic: u32) -> Result<Self> {
        config.validate()?;
        let path = path.as_ref();
        let mut disk = DiskManager::open_or_create(path)?;
        let file_size = disk.file_size()?;

        let (header, page_table) = if file_size == 0 {
            debug!(path = ?path, "page_store.create");
            Self::fresh(format_magic)
        } else if file_size < PersistentHeader::SIZE as u64 {
            warn!(path = ?path, file_size, "page_store.open.header_truncated");
            return Err(Error::Corrupted(format!(
                "header truncated: file holds {} bytes, header needs {}",
                file_size,
                PersistentHeader::SIZE
            )));
        } else {
            let mut buf = [0u8; PersistentHeader::SIZE];
            disk.read_at(0, &mut buf)?;
            let header = PersistentHeader::from_bytes(&buf)?;
            header.check_compatible(format_magic)?;

            let page_table = if header.page_table_len == 0 {
                PageTable::new(header.next_free_offset)
            } else {
                let len = header.page_table_len as usize;
                let mut bytes = vec![0u8; PageTable::encoded_len(len)];
                disk.read_at(header.page_table_offset, &mut bytes)?;
                PageTable::decode(&bytes, len, header.next_free_offset)?
            };
            debug!(
                path = ?path,
                root = %header.root_handle,
                keys = header.live_key_count,
                pages = page_table.live_count(),
                "page_store.open"
            );
            (header, page_table)
        };

        Ok(Self::assemble(Some(disk), header, page_table, config))
    }

    /// Create a store with no backing file. Pages are never evicted.
    pub fn in_memory(config: StoreConfig, format_magic: u32) -> Result<Self> {
        config.validate()?;
        let (header, page_table) = Self::fresh(format_magic);
        Ok(Self::assemble(None, header, page_table, config))
    }

    fn fresh(format_magic: u32) -> (PersistentHeader, PageTable) {
        let header = PersistentHeader::new(format_magic);
        let page_table = PageTable::new(header.next_free_offset);
        (header, page_table)
    }

    fn assemble(
        disk: Option<DiskManager>,
        header: PersistentHeader,
        page_table: PageTable,
        config: StoreConfig,
    ) -> Self {
        Self {
            disk,
            header,
            page_table,
            resident: HashMap::new(),
            replacer: LruReplacer::new(),
            stats: StoreStats::new(),
            config,
        }
    }

    // ========================================================================
    // Header state
    // ========================================================================

    #[inline]
    pub fn root(&self) -> BlockHandle {
        self.header.root_handle
    }

    pub fn set_root(&mut self, root: BlockHandle) {
        if root != self.header.root_handle {
            debug!(old = %self.header.root_handle, new = %root, "page_store.set_root");
            self.header.root_handle = root;
        }
    }

    #[inline]
    pub fn live_key_count(&self) -> u32 {
        self.header.live_key_count
    }

    pub fn set_live_key_count(&mut self, count: u32) {
        self.header.live_key_count = count;
    }

    #[inline]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    #[inline]
    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    /// Whether pages are persisted to a backing file.
    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.disk.is_some()
    }

    // ========================================================================
    // Page access
    // ========================================================================

    /// Resolve a page without marking it dirty.
    ///
    /// Returns `Ok(None)` if the handle has no live page (for example the
    /// null root of an empty tree).
    pub fn try_read(&mut self, handle: BlockHandle) -> Result<Option<&P>> {
        if !self.load(handle)? {
            return Ok(None);
        }
        Ok(self.resident.get(&handle).map(|slot| &slot.page))
    }

    /// Resolve a page without marking it dirty.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the handle has no live page.
    pub fn read(&mut self, handle: BlockHandle) -> Result<&P> {
        self.try_read(handle)?.ok_or(Error::PageNotFound(handle))
    }

    /// Resolve a page for mutation and mark it dirty.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the handle has no live page.
    pub fn get_mut(&mut self, handle: BlockHandle) -> Result<&mut P> {
        if !self.load(handle)? {
            return Err(Error::PageNotFound(handle));
        }
        let slot = self
            .resident
            .get_mut(&handle)
            .ok_or(Error::PageNotFound(handle))?;
        slot.dirty = true;
        Ok(&mut slot.page)
    }

    /// Run `f` with two distinct pages borrowed mutably; both become dirty.
    ///
    /// # Panics
    /// Panics if `first == second`.
    pub fn with_pair_mut<R>(
        &mut self,
        first: BlockHandle,
        second: BlockHandle,
        f: impl FnOnce(&mut P, &mut P) -> R,
    ) -> Result<R> {
        assert_ne!(first, second, "pair access to the same page {}", first);
        self.get_mut(first)?;
        self.get_mut(second)?;

        let mut detached = self
            .resident
            .remove(&second)
            .ok_or(Error::PageNotFound(second))?;
        let result = match self.resident.get_mut(&first) {
            Some(slot) => Ok(f(&mut slot.page, &mut detached.page)),
            None => Err(Error::PageNotFound(first)),
        };
        self.resident.insert(second, detached);
        result
    }

    /// Ensure `handle` is resident and mark it most recently used.
    ///
    /// Returns false if the handle has no live page.
    fn load(&mut self, handle: BlockHandle) -> Result<bool> {
        if self.resident.contains_key(&handle) {
            self.replacer.touch(handle);
            StoreStats::bump(&self.stats.cache_hits);
            return Ok(true);
        }

        let Some(entry) = self.page_table.entry(handle).filter(|e| e.is_live()).copied() else {
            return Ok(false);
        };
        let Some(disk) = self.disk.as_mut() else {
            // In-memory pages are never evicted, so a live page is resident
            return Ok(false);
        };

        let size = P::storage_size(entry.kind, self.config.order);
        let mut buf = vec![0u8; size + PAGE_CHECKSUM_LEN];
        disk.read_at(entry.offset, &mut buf)?;

        let stored = u32::decode(&buf[size..]);
        let computed = crc32fast::hash(&buf[..size]);
        if stored != computed {
            return Err(Error::Corrupted(format!(
                "{} checksum mismatch at offset {}",
                handle, entry.offset
            )));
        }

        let page = P::deserialize(handle, entry.kind, self.config.order, &buf[..size])?;
        self.resident.insert(handle, Resident { page, dirty: false });
        self.replacer.admit(handle);
        StoreStats::bump(&self.stats.cache_misses);
        trace!(handle = %handle, offset = entry.offset, "page_store.load");
        Ok(true)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Give `page` a handle and slot and make it resident and dirty.
    ///
    /// Reuses a freed slot of sufficient size when one is queued, else
    /// appends at the 4KB-aligned tail of the file.
    pub fn allocate_and_register(&mut self, mut page: P) -> Result<BlockHandle> {
        let kind = page.kind();
        let size = P::storage_size(kind, self.config.order) + PAGE_CHECKSUM_LEN;
        let handle = self.page_table.allocate(size as u64, kind)?;
        page.assign_handle(handle);

        self.resident.insert(handle, Resident { page, dirty: true });
        self.replacer.admit(handle);
        StoreStats::bump(&self.stats.pages_created);
        trace!(handle = %handle, kind = ?kind, "page_store.register");
        Ok(handle)
    }

    /// Free a live page's slot for reuse and drop it from memory.
    ///
    /// The slot's bytes on disk are left as they are.
    ///
    /// # Panics
    /// Panics if `handle` is not a live page.
    pub fn deregister(&mut self, handle: BlockHandle) {
        self.resident.remove(&handle);
        self.replacer.evict(handle);
        self.page_table.free(handle);
        StoreStats::bump(&self.stats.pages_destroyed);
        trace!(handle = %handle, "page_store.deregister");
    }

    // ========================================================================
    // Eviction and flushing
    // ========================================================================

    /// Write `handle` back if dirty and drop it from memory.
    ///
    /// Returns false if the page was not resident or the store has no
    /// backing file.
    pub fn offload(&mut self, handle: BlockHandle) -> Result<bool> {
        if self.disk.is_none() || !self.resident.contains_key(&handle) {
            return Ok(false);
        }
        self.write_back(handle)?;
        self.resident.remove(&handle);
        self.replacer.evict(handle);
        trace!(handle = %handle, "page_store.offload");
        Ok(true)
    }

    /// Evict least-recently-used pages until the resident count is within
    /// `cache_capacity`. Returns how many pages were evicted.
    pub fn evict_if_over_capacity(&mut self) -> Result<usize> {
        if self.disk.is_none() {
            return Ok(0);
        }

        let mut evicted = 0;
        while self.replacer.len() > self.config.cache_capacity {
            let Some(victim) = self.replacer.least_recently_used() else {
                break;
            };
            self.offload(victim)?;
            StoreStats::bump(&self.stats.evictions);
            evicted += 1;
        }
        Ok(evicted)
    }

    /// Write every dirty page, the page table and the header.
    ///
    /// Pages stay resident. No-op for an in-memory store.
    pub fn flush_all(&mut self) -> Result<()> {
        if self.disk.is_none() {
            return Ok(());
        }

        let dirty: Vec<BlockHandle> = self
            .resident
            .iter()
            .filter(|(_, slot)| slot.dirty)
            .map(|(&handle, _)| handle)
            .collect();
        for handle in &dirty {
            self.write_back(*handle)?;
        }

        let table_bytes = self.page_table.encode();
        let table_offset = align_up(self.page_table.next_free_offset());
        self.header.next_free_offset = self.page_table.next_free_offset();
        self.header.page_table_offset = table_offset;
        self.header.page_table_len =
            u32::try_from(self.page_table.len()).map_err(|_| Error::HandleSpaceExhausted)?;
        let header_bytes = self.header.to_bytes();

        let sync = self.config.sync_on_flush;
        if let Some(disk) = self.disk.as_mut() {
            disk.write_at(table_offset, &table_bytes)?;
            disk.write_at(0, &header_bytes)?;
            if sync {
                disk.sync()?;
            }
        }
        debug!(
            dirty_pages = dirty.len(),
            root = %self.header.root_handle,
            keys = self.header.live_key_count,
            "page_store.flush_all"
        );
        Ok(())
    }

    /// Serialize a resident page to its slot if it is dirty.
    fn write_back(&mut self, handle: BlockHandle) -> Result<()> {
        let Some(slot) = self.resident.get_mut(&handle) else {
            return Ok(());
        };
        if !slot.dirty {
            return Ok(());
        }
        let Some(disk) = self.disk.as_mut() else {
            return Ok(());
        };
        let entry = self
            .page_table
            .entry(handle)
            .copied()
            .ok_or(Error::PageNotFound(handle))?;

        let size = P::storage_size(entry.kind, self.config.order);
        let mut buf = vec![0u8; size + PAGE_CHECKSUM_LEN];
        slot.page.serialize(&mut buf[..size]);
        let checksum = crc32fast::hash(&buf[..size]);
        checksum.encode(&mut buf[size..]);

        disk.write_at(entry.offset, &buf)?;
        slot.dirty = false;
        StoreStats::bump(&self.stats.dirty_writes);
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of pages currently deserialized in memory.
    #[inline]
    pub fn resident_count(&self) -> usize {
        self.resident.len()
    }

    #[inline]
    pub fn is_resident(&self, handle: BlockHandle) -> bool {
        self.resident.contains_key(&handle)
    }

    pub fn is_dirty(&self, handle: BlockHandle) -> bool {
        self.resident.get(&handle).is_some_and(|slot| slot.dirty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::codec::{ByteReader, ByteWriter};
    use tempfile::tempdir;

    const MAGIC: u32 = 0x5EED;

    /// Minimal page: a handle and one payload word per order slot.
    #[derive(Debug, Clone, PartialEq)]
    struct TestPage {
        handle: BlockHandle,
        kind: PageKind,
        payload: u64,
    }

    impl TestPage {
        fn leaf(payload: u64) -> Self {
            Self {
                handle: BlockHandle::NULL,
                kind: PageKind::Leaf,
                payload,
            }
        }
    }

    impl StoredPage for TestPage {
        fn kind(&self) -> PageKind {
            self.kind
        }

        fn assign_handle(&mut self, handle: BlockHandle) {
            self.handle = handle;
        }

        fn storage_size(_kind: PageKind, order: usize) -> usize {
            8 * order
        }

        fn serialize(&self, out: &mut [u8]) {
            ByteWriter::new(out).put(&self.payload);
        }

        fn deserialize(
            handle: BlockHandle,
            kind: PageKind,
            _order: usize,
            bytes: &[u8],
        ) -> Result<Self> {
            Ok(Self {
                handle,
                kind,
                payload: ByteReader::new(bytes).get(),
            })
        }
    }

    fn config(capacity: usize) -> StoreConfig {
        StoreConfig::default()
            .with_order(4)
            .with_cache_capacity(capacity)
            .with_sync_on_flush(false)
    }

    fn create_test_store(capacity: usize) -> (PageStore<TestPage>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        (PageStore::open(&path, config(capacity), MAGIC).unwrap(), dir)
    }

    #[test]
    fn test_register_assigns_handles() {
        let (mut store, _dir) = create_test_store(10);

        let a = store.allocate_and_register(TestPage::leaf(1)).unwrap();
        let b = store.allocate_and_register(TestPage::leaf(2)).unwrap();
        assert_eq!(a, BlockHandle::new(1));
        assert_eq!(b, BlockHandle::new(2));
        assert_eq!(store.read(a).unwrap().handle, a);
        assert!(store.is_dirty(a));
        assert_eq!(store.resident_count(), 2);
    }

    #[test]
    fn test_read_does_not_mark_dirty() {
        let (mut store, _dir) = create_test_store(10);
        let a = store.allocate_and_register(TestPage::leaf(1)).unwrap();
        store.flush_all().unwrap();
        assert!(!store.is_dirty(a));

        store.read(a).unwrap();
        assert!(!store.is_dirty(a));

        store.get_mut(a).unwrap().payload = 9;
        assert!(store.is_dirty(a));
    }

    #[test]
    fn test_missing_handle() {
        let (mut store, _dir) = create_test_store(10);
        assert!(store.try_read(BlockHandle::NULL).unwrap().is_none());
        assert!(matches!(
            store.read(BlockHandle::new(7)),
            Err(Error::PageNotFound(_))
        ));
        assert!(store.get_mut(BlockHandle::new(7)).is_err());
    }

    #[test]
    fn test_eviction_writes_dirty_pages() {
        let (mut store, _dir) = create_test_store(2);

        let handles: Vec<BlockHandle> = (0..5)
            .map(|i| store.allocate_and_register(TestPage::leaf(i)).unwrap())
            .collect();
        assert_eq!(store.resident_count(), 5);

        assert_eq!(store.evict_if_over_capacity().unwrap(), 3);
        assert_eq!(store.resident_count(), 2);

        // Oldest pages went first
        assert!(!store.is_resident(handles[0]));
        assert!(store.is_resident(handles[4]));

        let snapshot = store.stats().snapshot();
        assert_eq!(snapshot.evictions, 3);
        assert_eq!(snapshot.dirty_writes, 3);

        // Evicted pages load back with their data
        for (i, &handle) in handles.iter().enumerate() {
            assert_eq!(store.read(handle).unwrap().payload, i as u64);
        }
        assert!(store.stats().snapshot().cache_misses >= 3);
    }

    #[test]
    fn test_touch_protects_from_eviction() {
        let (mut store, _dir) = create_test_store(2);
        let a = store.allocate_and_register(TestPage::leaf(1)).unwrap();
        let b = store.allocate_and_register(TestPage::leaf(2)).unwrap();
        let c = store.allocate_and_register(TestPage::leaf(3)).unwrap();

        store.read(a).unwrap();
        store.evict_if_over_capacity().unwrap();

        assert!(store.is_resident(a));
        assert!(!store.is_resident(b));
        assert!(store.is_resident(c));
    }

    #[test]
    fn test_clean_eviction_skips_write() {
        let (mut store, _dir) = create_test_store(1);
        let a = store.allocate_and_register(TestPage::leaf(1)).unwrap();
        store.flush_all().unwrap();
        let written = store.stats().snapshot().dirty_writes;

        let _b = store.allocate_and_register(TestPage::leaf(2)).unwrap();
        store.read(BlockHandle::new(2)).unwrap();
        store.evict_if_over_capacity().unwrap();

        assert!(!store.is_resident(a));
        assert_eq!(store.stats().snapshot().dirty_writes, written);
    }

    #[test]
    fn test_deregister_frees_slot_for_reuse() {
        let (mut store, _dir) = create_test_store(10);
        let a = store.allocate_and_register(TestPage::leaf(1)).unwrap();
        let _b = store.allocate_and_register(TestPage::leaf(2)).unwrap();

        store.deregister(a);
        assert!(!store.is_resident(a));
        assert!(store.try_read(a).unwrap().is_none());
        assert_eq!(store.page_table().free_count(), 1);

        let c = store.allocate_and_register(TestPage::leaf(3)).unwrap();
        assert_eq!(c, a);
        assert_eq!(store.read(c).unwrap().payload, 3);
        assert_eq!(store.stats().snapshot().pages_destroyed, 1);
    }

    #[test]
    fn test_with_pair_mut() {
        let (mut store, _dir) = create_test_store(10);
        let a = store.allocate_and_register(TestPage::leaf(1)).unwrap();
        let b = store.allocate_and_register(TestPage::leaf(2)).unwrap();
        store.flush_all().unwrap();

        store
            .with_pair_mut(a, b, |x, y| std::mem::swap(&mut x.payload, &mut y.payload))
            .unwrap();

        assert_eq!(store.read(a).unwrap().payload, 2);
        assert_eq!(store.read(b).unwrap().payload, 1);
        assert!(store.is_dirty(a));
        assert!(store.is_dirty(b));
        assert_eq!(store.resident_count(), 2);
    }

    #[test]
    fn test_flush_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let (a, b) = {
            let mut store: PageStore<TestPage> = PageStore::open(&path, config(10), MAGIC).unwrap();
            let a = store.allocate_and_register(TestPage::leaf(11)).unwrap();
            let b = store.allocate_and_register(TestPage::leaf(22)).unwrap();
            store.set_root(b);
            store.set_live_key_count(5);
            store.flush_all().unwrap();
            (a, b)
        };

        let mut store: PageStore<TestPage> = PageStore::open(&path, config(10), MAGIC).unwrap();
        assert_eq!(store.root(), b);
        assert_eq!(store.live_key_count(), 5);
        assert_eq!(store.resident_count(), 0);
        assert_eq!(store.read(a).unwrap().payload, 11);
        assert_eq!(store.read(b).unwrap().payload, 22);
    }

    #[test]
    fn test_magic_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        {
            let mut store: PageStore<TestPage> = PageStore::open(&path, config(10), MAGIC).unwrap();
            store.flush_all().unwrap();
        }

        let result: Result<PageStore<TestPage>> = PageStore::open(&path, config(10), MAGIC + 1);
        assert!(matches!(result, Err(Error::MagicMismatch { .. })));
    }

    #[test]
    fn test_corrupted_page_detected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let a = {
            let mut store: PageStore<TestPage> = PageStore::open(&path, config(10), MAGIC).unwrap();
            let a = store.allocate_and_register(TestPage::leaf(7)).unwrap();
            store.flush_all().unwrap();
            a
        };

        let offset = {
            let store: PageStore<TestPage> = PageStore::open(&path, config(10), MAGIC).unwrap();
            store.page_table().entry(a).unwrap().offset
        };
        {
            let mut dm = DiskManager::open(&path).unwrap();
            dm.write_at(offset, &[0xFF]).unwrap();
        }

        let mut store: PageStore<TestPage> = PageStore::open(&path, config(10), MAGIC).unwrap();
        assert!(matches!(store.read(a), Err(Error::Corrupted(_))));
    }

    #[test]
    fn test_in_memory_never_evicts() {
        let mut store: PageStore<TestPage> = PageStore::in_memory(config(1), MAGIC).unwrap();
        let a = store.allocate_and_register(TestPage::leaf(1)).unwrap();
        store.allocate_and_register(TestPage::leaf(2)).unwrap();

        assert_eq!(store.evict_if_over_capacity().unwrap(), 0);
        assert!(!store.offload(a).unwrap());
        assert_eq!(store.resident_count(), 2);
        assert!(store.flush_all().is_ok());
        assert!(!store.is_persistent());
    }

    #[test]
    fn test_offload() {
        let (mut store, _dir) = create_test_store(10);
        let a = store.allocate_and_register(TestPage::leaf(5)).unwrap();

        assert!(store.offload(a).unwrap());
        assert!(!store.is_resident(a));
        assert!(!store.offload(a).unwrap());
        assert_eq!(store.read(a).unwrap().payload, 5);
    }
}
