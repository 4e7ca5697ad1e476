//! Page store statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics tracked by the page store.
///
/// All fields are atomic so they can be read through a shared reference
/// while the store itself sits behind a lock.
///
/// # Memory Ordering
/// We use `Ordering::Relaxed` for all operations because:
/// - We only need atomicity (no partial updates)
/// - We don't need synchronization between different counters
///
/// # Example
/// ```
/// use bptree_store::StoreStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = StoreStats::new();
/// stats.cache_hits.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.cache_hits.load(Ordering::Relaxed), 1);
/// ```
#[derive(Debug)]
pub struct StoreStats {
    /// Number of times a page was already resident.
    pub cache_hits: AtomicU64,

    /// Number of times a page had to be read from disk.
    pub cache_misses: AtomicU64,

    /// Number of pages dropped from memory to respect the cache bound.
    pub evictions: AtomicU64,

    /// Number of dirty pages serialized to disk.
    pub dirty_writes: AtomicU64,

    /// Number of pages registered.
    pub pages_created: AtomicU64,

    /// Number of pages deregistered (freed).
    pub pages_destroyed: AtomicU64,
}

impl StoreStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            dirty_writes: AtomicU64::new(0),
            pages_created: AtomicU64::new(0),
            pages_destroyed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            dirty_writes: self.dirty_writes.load(Ordering::Relaxed),
            pages_created: self.pages_created.load(Ordering::Relaxed),
            pages_destroyed: self.pages_destroyed.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.dirty_writes.store(0, Ordering::Relaxed);
        self.pages_created.store(0, Ordering::Relaxed);
        self.pages_destroyed.store(0, Ordering::Relaxed);
    }
}

impl Default for StoreStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of page store statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub dirty_writes: u64,
    pub pages_created: u64,
    pub pages_destroyed: u64,
}

impl StatsSnapshot {
    /// Calculate cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Fraction of evictions that had to write the page back.
    pub fn dirty_ratio(&self) -> f64 {
        if self.evictions == 0 {
            0.0
        } else {
            self.dirty_writes as f64 / self.evictions as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, hit_rate: {:.2}%, created: {}, destroyed: {}, evictions: {}, dirty_writes: {} }}",
            self.cache_hits,
            self.cache_misses,
            self.hit_rate() * 100.0,
            self.pages_created,
            self.pages_destroyed,
            self.evictions,
            self.dirty_writes
        )
    }
}
