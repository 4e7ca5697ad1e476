//! bptree-store - an embedded, disk-backed B+Tree key-value store.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          bptree-store                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree/)                  │   │
//! │  │   BTree + Cursor/Iter + Leaf/Index blocks over handles   │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Page Store (buffer/)                       │   │
//! │  │   ┌─────────────────────────────────────────────────┐   │   │
//! │  │   │  Resident blocks bounded by an LRU replacer     │   │   │
//! │  │   │  (evicted after each operation, dirty written)  │   │   │
//! │  │   └─────────────────────────────────────────────────┘   │   │
//! │  │        PageStore + LruReplacer + Statistics              │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │   DiskManager + PersistentHeader + PageTable + codecs    │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (BlockHandle, Error, config)
//! - [`storage`] - Disk I/O, file header, page table, fixed-size codecs
//! - [`buffer`] - Page store and eviction
//! - [`index`] - The B+Tree
//!
//! # Quick Start
//! ```no_run
//! use bptree_store::{BTree, StoreConfig};
//!
//! let config = StoreConfig::default().with_cache_capacity(256);
//! let mut tree: BTree<u64, [u8; 16]> = BTree::open("my_tree.db", config).unwrap();
//!
//! tree.insert(42, *b"forty-two.......").unwrap();
//! assert!(tree.find(&42).unwrap().is_some());
//!
//! for entry in tree.range(10..100).unwrap() {
//!     let (key, _value) = entry.unwrap();
//!     println!("{}", key);
//! }
//! tree.flush().unwrap();
//! ```

pub mod buffer;
pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::{BlockHandle, Error, Result, StoreConfig};

pub use buffer::{StatsSnapshot, StoreStats};
pub use index::btree::{BTree, Cursor, InsertOutcome, Iter, TreeShape};
pub use storage::FixedCodec;
