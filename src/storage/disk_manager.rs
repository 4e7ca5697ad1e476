//! Disk Manager - low-level file I/O for the backing file.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing byte ranges at absolute offsets
//! - Creating or reopening the backing file
//! - Syncing the file to stable storage

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::Result;

/// Manages disk I/O for a single backing file.
///
/// # File Layout
/// ```text
/// ┌──────────────┬─────────┬─────────┬─────┬─────────────┐
/// │ Header (4KB) │ Page A  │ Page B  │ ... │ Page table  │
/// └──────────────┴─────────┴─────────┴─────┴─────────────┘
/// Offset: 0      4096      (4K-aligned slots)  (aligned tail)
/// ```
///
/// Unlike a fixed-page layout, slots are addressed by byte offset because
/// leaf and index blocks serialize to different sizes. The page table in
/// the header maps each handle to its offset.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The `PageStore` that owns it is
/// responsible for serializing access.
///
/// # Durability
/// Writes are not synced individually. [`sync`](Self::sync) is called once
/// after a full flush.
pub struct DiskManager {
    file: File,
}

impl DiskManager {
    /// Create a new backing file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self { file })
    }

    /// Open an existing backing file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        Ok(Self { file })
    }

    /// Open an existing file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Fill `buf` with the bytes stored at `offset`.
    ///
    /// # Errors
    /// Returns an I/O error (`UnexpectedEof`) if the range lies past the end
    /// of the file.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    /// Write `data` at `offset`, extending the file if needed.
    pub fn write_at(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Flush OS buffers to stable storage (`fsync`).
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Get the current size of the backing file in bytes.
    pub fn file_size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }
}
