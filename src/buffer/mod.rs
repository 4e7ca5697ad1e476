//! Page caching.
//!
//! The page store is the in-memory layer between the tree and disk. It
//! keeps deserialized pages resident, writes dirty ones back and bounds
//! how many stay in memory.
//!
//! # Components
//! - [`PageStore`] - Resident-page arena and file slot management
//! - [`StoredPage`] - What a page must provide to be stored
//! - [`StoreStats`] - Performance statistics
//! - [`replacer`] - Eviction policy implementations

mod page_store;
pub mod replacer;
mod stats;

pub use page_store::{PageStore, StoredPage, PAGE_CHECKSUM_LEN};
pub use stats::{StatsSnapshot, StoreStats};
