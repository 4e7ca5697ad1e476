//! Eviction policy implementations (replacers).
//!
//! Currently implements:
//! - [`LruReplacer`] - Least Recently Used, O(1) per operation

mod lru;

pub use lru::LruReplacer;
