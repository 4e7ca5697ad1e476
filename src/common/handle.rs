//! Block handle type.

use std::fmt;

/// Identifies a page in the backing file.
///
/// Handles are opaque `u32` values. `0` is reserved as the null handle
/// ("no page"); it terminates the leaf chain and marks an empty tree.
///
/// A handle is stable while its page is live. Once a page is freed, its
/// handle may be handed out again by a later allocation, so a handle is
/// only unique among live pages.
///
/// # Example
/// ```
/// use bptree_store::BlockHandle;
///
/// let handle = BlockHandle::new(42);
/// assert!(!handle.is_null());
/// assert!(BlockHandle::NULL.is_null());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockHandle(pub u32);

impl BlockHandle {
    /// The null handle.
    pub const NULL: BlockHandle = BlockHandle(0);

    /// Create a new BlockHandle.
    #[inline]
    pub fn new(id: u32) -> Self {
        BlockHandle(id)
    }

    /// Check if this is the null handle.
    #[inline]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Position of this handle in the page table.
    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Block(NULL)")
        } else {
            write!(f, "Block({})", self.0)
        }
    }
}
