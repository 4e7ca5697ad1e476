//! Common types and utilities shared across the store.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and [`StoreConfig`]
//! - Error types
//! - [`BlockHandle`] page identifiers

pub mod config;
pub mod error;
mod handle;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use handle::BlockHandle;
