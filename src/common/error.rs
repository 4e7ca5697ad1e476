//! Error types for the store.

use thiserror::Error;

use crate::common::BlockHandle;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All recoverable errors the store can report.
///
/// Expected absence (missing key, empty tree) and duplicate inserts are not
/// errors: they are reported through `Option`, `bool` and
/// [`InsertOutcome`](crate::InsertOutcome). Broken structural invariants are
/// programmer errors and panic instead.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    ///
    /// This wraps `std::io::Error` from file read/write operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file was written by an incompatible format version.
    #[error("format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// The file was built with different key/value sizes or order.
    #[error("format magic mismatch: expected {expected:#010x}, found {found:#010x}")]
    MagicMismatch { expected: u32, found: u32 },

    /// On-disk bytes failed validation (checksum, page kind, truncation).
    #[error("corruption detected: {0}")]
    Corrupted(String),

    /// The handle does not name a live page.
    #[error("{0} not found")]
    PageNotFound(BlockHandle),

    /// Every `u32` handle is in use.
    #[error("page handle space exhausted")]
    HandleSpaceExhausted,

    /// The store configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(BlockHandle::new(42));
        assert_eq!(format!("{}", err), "Block(42) not found");

        let err = Error::VersionMismatch {
            expected: 1,
            found: 7,
        };
        assert_eq!(
            format!("{}", err),
            "format version mismatch: expected 1, found 7"
        );

        let err = Error::MagicMismatch {
            expected: 0xAB,
            found: 0xCD,
        };
        assert_eq!(
            format!("{}", err),
            "format magic mismatch: expected 0x000000ab, found 0x000000cd"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_result_type_alias() {
        fn might_fail() -> Result<u32> {
            Ok(42)
        }

        assert_eq!(might_fail().unwrap(), 42);
    }
}
