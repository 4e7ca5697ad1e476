//! Configuration constants and store settings.

use crate::common::{Error, Result};

/// Alignment unit for page offsets in the backing file (4KB).
///
/// Every page is appended at the next multiple of this value, which
/// matches the OS page size on most systems.
pub const PAGE_ALIGN: u64 = 4096;

/// Bytes reserved for the fixed header at offset 0.
///
/// The first page starts right after this region.
pub const HEADER_REGION_SIZE: u64 = PAGE_ALIGN;

/// On-disk format version. Bump on any layout change.
pub const FORMAT_VERSION: u32 = 1;

/// Default maximum number of keys per block.
pub const DEFAULT_ORDER: usize = 128;

/// Default bound on resident (deserialized) pages.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Smallest order the split/merge arithmetic supports.
pub const MIN_ORDER: usize = 4;

/// Round `offset` up to the next [`PAGE_ALIGN`] boundary.
#[inline]
pub fn align_up(offset: u64) -> u64 {
    (offset + PAGE_ALIGN - 1) & !(PAGE_ALIGN - 1)
}

/// Settings fixed at construction time.
///
/// `order` is part of the on-disk format: reopening a file with a
/// different order is rejected by the format magic.
///
/// # Example
/// ```
/// use bptree_store::StoreConfig;
///
/// let config = StoreConfig::default().with_order(4).with_cache_capacity(8);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Maximum keys per block before a split.
    pub order: usize,
    /// Maximum resident pages after each top-level operation.
    pub cache_capacity: usize,
    /// Call `fsync` after a full flush.
    pub sync_on_flush: bool,
}

impl StoreConfig {
    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn with_cache_capacity(mut self, cache_capacity: usize) -> Self {
        self.cache_capacity = cache_capacity;
        self
    }

    pub fn with_sync_on_flush(mut self, sync_on_flush: bool) -> Self {
        self.sync_on_flush = sync_on_flush;
        self
    }

    /// Half the order; the minimum leaf occupancy.
    #[inline]
    pub fn half_order(&self) -> usize {
        self.order / 2
    }

    /// Check the settings before any file is touched.
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` if the order is below [`MIN_ORDER`],
    /// does not fit the on-disk count fields, or the cache capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.order < MIN_ORDER {
            return Err(Error::InvalidConfig(format!(
                "order must be at least {}, got {}",
                MIN_ORDER, self.order
            )));
        }
        if u32::try_from(self.order + 1).is_err() {
            return Err(Error::InvalidConfig(format!(
                "order {} does not fit a u32 count",
                self.order
            )));
        }
        if self.cache_capacity == 0 {
            return Err(Error::InvalidConfig(
                "cache_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            sync_on_flush: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_align_is_power_of_two() {
        assert!(PAGE_ALIGN.is_power_of_two());
        assert_eq!(HEADER_REGION_SIZE % PAGE_ALIGN, 0);
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0), 0);
        assert_eq!(align_up(1), 4096);
        assert_eq!(align_up(4096), 4096);
        assert_eq!(align_up(4097), 8192);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = StoreConfig::default();
        assert_eq!(config.order, DEFAULT_ORDER);
        assert_eq!(config.half_order(), DEFAULT_ORDER / 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_small_order() {
        let config = StoreConfig::default().with_order(3);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_cache() {
        let config = StoreConfig::default().with_cache_capacity(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
