//! Page table - maps block handles to file slots.
//!
//! Each live handle owns a slot `{offset, size}` in the page region. Freed
//! slots keep their offset and size and are queued by size class so a
//! later allocation of the same or smaller size can reuse them.

use std::collections::BTreeMap;

use crate::common::config::align_up;
use crate::common::{BlockHandle, Error, Result};
use crate::storage::codec::{ByteReader, ByteWriter, FixedCodec};

/// Kind of block stored in a slot.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// B+Tree index (interior) block.
    Index = 0,
    /// B+Tree leaf block.
    Leaf = 1,
    /// Released slot available for reuse (or never allocated).
    #[default]
    Free = 2,
}

impl PageKind {
    /// Convert from u8, returning None for unknown values.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(PageKind::Index),
            1 => Some(PageKind::Leaf),
            2 => Some(PageKind::Free),
            _ => None,
        }
    }
}

/// One row of the page table.
///
/// `offset == 0` marks a handle that was never allocated; offset 0 is the
/// header, so no page can live there.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    pub offset: u64,
    pub size: u64,
    pub kind: PageKind,
}

impl PageTableEntry {
    /// Bytes per serialized entry: offset, size, kind.
    pub const ENCODED_LEN: usize = 8 + 8 + 1;

    #[inline]
    pub fn is_allocated(&self) -> bool {
        self.offset != 0
    }

    #[inline]
    pub fn is_live(&self) -> bool {
        self.is_allocated() && self.kind != PageKind::Free
    }
}

/// Growable handle → slot mapping with a per-size-class free list.
///
/// # Free-List Reuse
/// ```text
/// free: { 76 → [h3, h9], 120 → [h4] }
///
/// allocate(76)  → pops h9 (exact class, LIFO)
/// allocate(100) → pops h4 (smallest class >= 100)
/// allocate(200) → appends a new slot at the aligned tail
/// ```
///
/// Entry 0 is reserved for the null handle and never handed out.
#[derive(Debug, Clone)]
pub struct PageTable {
    entries: Vec<PageTableEntry>,
    free: BTreeMap<u64, Vec<BlockHandle>>,
    next_free_offset: u64,
}

impl PageTable {
    /// Create an empty table whose first slot starts at `next_free_offset`.
    pub fn new(next_free_offset: u64) -> Self {
        Self {
            entries: vec![PageTableEntry::default()],
            free: BTreeMap::new(),
            next_free_offset,
        }
    }

    /// Look up the entry for `handle`, if it was ever allocated.
    pub fn entry(&self, handle: BlockHandle) -> Option<&PageTableEntry> {
        self.entries
            .get(handle.index())
            .filter(|entry| entry.is_allocated())
    }

    /// The kind of a live page, or None for null, free or unknown handles.
    pub fn live_kind(&self, handle: BlockHandle) -> Option<PageKind> {
        self.entry(handle)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.kind)
    }

    /// Assign a slot of at least `size` bytes to a new page of `kind`.
    ///
    /// Reuses the smallest queued free slot that fits, else appends at the
    /// 4KB-aligned tail of the page region.
    ///
    /// # Errors
    /// Returns `Error::HandleSpaceExhausted` if no `u32` handle is left.
    pub fn allocate(&mut self, size: u64, kind: PageKind) -> Result<BlockHandle> {
        debug_assert_ne!(kind, PageKind::Free);

        if let Some(handle) = self.pop_free(size) {
            let entry = &mut self.entries[handle.index()];
            entry.kind = kind;
            return Ok(handle);
        }

        let id = u32::try_from(self.entries.len()).map_err(|_| Error::HandleSpaceExhausted)?;
        let offset = align_up(self.next_free_offset);
        self.next_free_offset = offset + size;
        self.entries.push(PageTableEntry { offset, size, kind });
        Ok(BlockHandle::new(id))
    }

    /// Release the slot of a live page for reuse.
    ///
    /// The slot keeps its offset and size; its old bytes stay on disk.
    ///
    /// # Panics
    /// Panics if `handle` is not live.
    pub fn free(&mut self, handle: BlockHandle) {
        let entry = self
            .entries
            .get_mut(handle.index())
            .filter(|entry| entry.is_live());
        let Some(entry) = entry else {
            panic!("freeing {} which is not a live page", handle);
        };
        entry.kind = PageKind::Free;
        self.free.entry(entry.size).or_default().push(handle);
    }

    fn pop_free(&mut self, size: u64) -> Option<BlockHandle> {
        let class = *self.free.range(size..).next()?.0;
        let queue = self.free.get_mut(&class)?;
        let handle = queue.pop();
        if queue.is_empty() {
            self.free.remove(&class);
        }
        handle
    }

    /// Next unused byte of the page region.
    #[inline]
    pub fn next_free_offset(&self) -> u64 {
        self.next_free_offset
    }

    /// Number of entries, including the reserved null entry.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    /// Number of live pages.
    pub fn live_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_live()).count()
    }

    /// Number of freed slots waiting for reuse.
    pub fn free_count(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// Serialize all entries followed by a CRC32 of the entry bytes.
    pub fn encode(&self) -> Vec<u8> {
        let body_len = self.entries.len() * PageTableEntry::ENCODED_LEN;
        let mut buf = vec![0u8; body_len + 4];
        {
            let mut writer = ByteWriter::new(&mut buf);
            for entry in &self.entries {
                writer.put(&entry.offset);
                writer.put(&entry.size);
                writer.put(&(entry.kind as u8));
            }
        }
        let checksum = crc32fast::hash(&buf[..body_len]);
        checksum.encode(&mut buf[body_len..]);
        buf
    }

    /// Size in bytes of an encoded table with `len` entries.
    pub fn encoded_len(len: usize) -> usize {
        len * PageTableEntry::ENCODED_LEN + 4
    }

    /// Rebuild a table (and its free lists) from [`encode`](Self::encode) output.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` on a checksum mismatch, an unknown kind
    /// byte, or a short buffer.
    pub fn decode(data: &[u8], len: usize, next_free_offset: u64) -> Result<Self> {
        let body_len = len * PageTableEntry::ENCODED_LEN;
        if data.len() < body_len + 4 || len == 0 {
            return Err(Error::Corrupted(format!(
                "page table truncated: {} bytes for {} entries",
                data.len(),
                len
            )));
        }

        let stored = u32::decode(&data[body_len..]);
        let computed = crc32fast::hash(&data[..body_len]);
        if stored != computed {
            return Err(Error::Corrupted(format!(
                "page table checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            )));
        }

        let mut table = Self {
            entries: Vec::with_capacity(len),
            free: BTreeMap::new(),
            next_free_offset,
        };
        let mut reader = ByteReader::new(data);
        for id in 0..len {
            let offset: u64 = reader.get();
            let size: u64 = reader.get();
            let raw: u8 = reader.get();
            let kind = PageKind::from_u8(raw).ok_or_else(|| {
                Error::Corrupted(format!("page table entry {} has kind {}", id, raw))
            })?;
            let entry = PageTableEntry { offset, size, kind };
            if id != 0 && entry.is_allocated() && kind == PageKind::Free {
                // `len` came from a u32 header field
                table.free.entry(size).or_default().push(BlockHandle::new(id as u32));
            }
            table.entries.push(entry);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::{HEADER_REGION_SIZE, PAGE_ALIGN};

    #[test]
    fn test_page_kind_from_u8() {
        assert_eq!(PageKind::from_u8(0), Some(PageKind::Index));
        assert_eq!(PageKind::from_u8(1), Some(PageKind::Leaf));
        assert_eq!(PageKind::from_u8(2), Some(PageKind::Free));
        assert_eq!(PageKind::from_u8(3), None);
    }

    #[test]
    fn test_null_handle_never_allocated() {
        let table = PageTable::new(HEADER_REGION_SIZE);
        assert!(table.entry(BlockHandle::NULL).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_append_is_aligned() {
        let mut table = PageTable::new(HEADER_REGION_SIZE);

        let a = table.allocate(100, PageKind::Leaf).unwrap();
        let b = table.allocate(100, PageKind::Index).unwrap();
        assert_eq!(a, BlockHandle::new(1));
        assert_eq!(b, BlockHandle::new(2));

        assert_eq!(table.entry(a).unwrap().offset, HEADER_REGION_SIZE);
        assert_eq!(
            table.entry(b).unwrap().offset,
            HEADER_REGION_SIZE + PAGE_ALIGN
        );
        assert_eq!(table.next_free_offset(), HEADER_REGION_SIZE + PAGE_ALIGN + 100);
        assert_eq!(table.live_kind(a), Some(PageKind::Leaf));
        assert_eq!(table.live_kind(b), Some(PageKind::Index));
    }

    #[test]
    fn test_free_slot_reused_for_same_or_smaller() {
        let mut table = PageTable::new(HEADER_REGION_SIZE);
        let a = table.allocate(100, PageKind::Leaf).unwrap();
        let _b = table.allocate(100, PageKind::Leaf).unwrap();

        table.free(a);
        assert_eq!(table.live_kind(a), None);
        assert_eq!(table.free_count(), 1);

        // Too big: appended instead
        let c = table.allocate(200, PageKind::Index).unwrap();
        assert_ne!(c, a);

        // Fits: reuses the freed slot and its offset
        let offset = table.entry(a).unwrap().offset;
        let d = table.allocate(60, PageKind::Index).unwrap();
        assert_eq!(d, a);
        assert_eq!(table.entry(d).unwrap().offset, offset);
        assert_eq!(table.entry(d).unwrap().size, 100);
        assert_eq!(table.free_count(), 0);
    }

    #[test]
    fn test_smallest_fitting_class_chosen() {
        let mut table = PageTable::new(HEADER_REGION_SIZE);
        let big = table.allocate(300, PageKind::Leaf).unwrap();
        let small = table.allocate(100, PageKind::Leaf).unwrap();
        table.free(big);
        table.free(small);

        assert_eq!(table.allocate(90, PageKind::Leaf).unwrap(), small);
        assert_eq!(table.allocate(90, PageKind::Leaf).unwrap(), big);
    }

    #[test]
    #[should_panic(expected = "not a live page")]
    fn test_double_free_panics() {
        let mut table = PageTable::new(HEADER_REGION_SIZE);
        let a = table.allocate(10, PageKind::Leaf).unwrap();
        table.free(a);
        table.free(a);
    }

    #[test]
    fn test_encode_decode_rebuilds_free_list() {
        let mut table = PageTable::new(HEADER_REGION_SIZE);
        let a = table.allocate(100, PageKind::Leaf).unwrap();
        let b = table.allocate(80, PageKind::Index).unwrap();
        table.free(a);

        let bytes = table.encode();
        assert_eq!(bytes.len(), PageTable::encoded_len(table.len()));

        let mut restored =
            PageTable::decode(&bytes, table.len(), table.next_free_offset()).unwrap();
        assert_eq!(restored.live_kind(b), Some(PageKind::Index));
        assert_eq!(restored.live_count(), 1);
        assert_eq!(restored.free_count(), 1);
        assert_eq!(restored.allocate(100, PageKind::Leaf).unwrap(), a);
    }

    #[test]
    fn test_decode_detects_corruption() {
        let mut table = PageTable::new(HEADER_REGION_SIZE);
        table.allocate(100, PageKind::Leaf).unwrap();

        let mut bytes = table.encode();
        bytes[20] ^= 0x01;
        assert!(matches!(
            PageTable::decode(&bytes, table.len(), 0),
            Err(Error::Corrupted(_))
        ));
    }
}
