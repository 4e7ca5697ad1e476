//! Storage layer - disk I/O and on-disk formats.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Low-level file I/O at byte offsets
//! - [`PersistentHeader`] - The fixed header at offset 0
//! - [`PageTable`] - Handle → slot mapping with free-slot reuse
//! - [`FixedCodec`] - Fixed-width encoding for keys and values

pub mod codec;
mod disk_manager;
pub mod header;
pub mod page_table;

pub use codec::FixedCodec;
pub use disk_manager::DiskManager;
pub use header::PersistentHeader;
pub use page_table::{PageKind, PageTable, PageTableEntry};
