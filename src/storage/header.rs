//! Persistent header stored at offset 0 of the backing file.
//!
//! The header records where the tree starts and how to find the page
//! table. It is rewritten in full on every flush.

use crate::common::config::{FORMAT_VERSION, HEADER_REGION_SIZE};
use crate::common::{BlockHandle, Error, Result};
use crate::storage::codec::{ByteReader, ByteWriter};
use crate::storage::page_table::PageTableEntry;

/// Fixed header at the start of the backing file.
///
/// # Layout (40 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     root_handle
/// 4       4     format_magic
/// 8       4     format_version
/// 12      4     live_key_count
/// 16      8     next_free_offset
/// 24      8     page_table_offset
/// 32      4     page_table_len
/// 36      4     checksum (CRC32 of bytes 0..36)
/// ```
///
/// The rest of the first [`HEADER_REGION_SIZE`] bytes is zero padding, so
/// pages begin on the first 4KB boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistentHeader {
    /// Root block, or NULL for a tree that never held a key.
    pub root_handle: BlockHandle,
    /// Fingerprint of key size, value size, order and entry layout.
    pub format_magic: u32,
    pub format_version: u32,
    /// Number of keys stored in the tree.
    pub live_key_count: u32,
    /// Next unused byte in the page region (before alignment).
    pub next_free_offset: u64,
    /// Where the page table was written on the last flush (0 if never).
    pub page_table_offset: u64,
    /// Number of page table entries, including the reserved null entry.
    pub page_table_len: u32,
}

impl PersistentHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 40;

    /// Offset of the checksum field within the header.
    pub const OFFSET_CHECKSUM: usize = 36;

    /// Create the header of a fresh, empty store.
    pub fn new(format_magic: u32) -> Self {
        Self {
            root_handle: BlockHandle::NULL,
            format_magic,
            format_version: FORMAT_VERSION,
            live_key_count: 0,
            next_free_offset: HEADER_REGION_SIZE,
            page_table_offset: 0,
            page_table_len: 0,
        }
    }

    /// Derive the format magic for a given key size, value size and order.
    ///
    /// Files created with different parameters get different magics, so
    /// reopening them with the wrong types is rejected instead of being
    /// misread.
    pub fn compute_magic(key_len: usize, value_len: usize, order: usize) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for param in [key_len, value_len, order, PageTableEntry::ENCODED_LEN] {
            hasher.update(&(param as u64).to_le_bytes());
        }
        hasher.finalize()
    }

    /// Serialize the header, computing its checksum.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        let mut writer = ByteWriter::new(&mut buf);
        writer.put(&self.root_handle);
        writer.put(&self.format_magic);
        writer.put(&self.format_version);
        writer.put(&self.live_key_count);
        writer.put(&self.next_free_offset);
        writer.put(&self.page_table_offset);
        writer.put(&self.page_table_len);
        debug_assert_eq!(writer.position(), Self::OFFSET_CHECKSUM);

        let checksum = crc32fast::hash(&buf[..Self::OFFSET_CHECKSUM]);
        buf[Self::OFFSET_CHECKSUM..].copy_from_slice(&checksum.to_le_bytes());
        buf
    }

    /// Parse and checksum-verify a header.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the buffer is short or the checksum
    /// does not match.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(Error::Corrupted(format!(
                "header truncated: {} of {} bytes",
                data.len(),
                Self::SIZE
            )));
        }

        let mut reader = ByteReader::new(data);
        let header = Self {
            root_handle: reader.get(),
            format_magic: reader.get(),
            format_version: reader.get(),
            live_key_count: reader.get(),
            next_free_offset: reader.get(),
            page_table_offset: reader.get(),
            page_table_len: reader.get(),
        };
        let stored: u32 = reader.get();

        let computed = crc32fast::hash(&data[..Self::OFFSET_CHECKSUM]);
        if stored != computed {
            return Err(Error::Corrupted(format!(
                "header checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            )));
        }

        Ok(header)
    }

    /// Refuse headers written by another version or another parameter set.
    ///
    /// # Errors
    /// `Error::VersionMismatch` or `Error::MagicMismatch`.
    pub fn check_compatible(&self, expected_magic: u32) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::VersionMismatch {
                expected: FORMAT_VERSION,
                found: self.format_version,
            });
        }
        if self.format_magic != expected_magic {
            return Err(Error::MagicMismatch {
                expected: expected_magic,
                found: self.format_magic,
            });
        }
        Ok(())
    }
}
