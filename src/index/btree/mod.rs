//! B+Tree over handle-addressed blocks.
//!
//! # Components
//! - [`BTree`] - The public map: find, insert, remove, cursors
//! - [`Cursor`] / [`Iter`] - Positions in the leaf chain
//! - [`Block`] - Leaf or index node, stored as one page
//! - [`OrderedSequence`] - Bounded storage inside a block
//!
//! Splits, merges and borrows live in `ops`; whole-tree checks in `verify`.

mod block;
mod cursor;
mod internal;
mod leaf;
mod ops;
mod sequence;
mod tree;
mod verify;

pub use block::{Block, Key, Value};
pub use cursor::{Cursor, Iter};
pub use internal::IndexBlock;
pub use leaf::LeafBlock;
pub use sequence::OrderedSequence;
pub use tree::{BTree, InsertOutcome};
pub use verify::TreeShape;
