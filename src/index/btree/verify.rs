//! Whole-tree structural checks and a text dump.

use crate::common::{BlockHandle, Error, Result};
use crate::index::btree::block::{Block, Key, Value};
use crate::index::btree::ops::BlockStore;

/// Counts gathered by [`BTree::verify`](crate::BTree::verify).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeShape {
    /// Levels from the root to the leaves; 0 for a tree with no root.
    pub height: usize,
    pub leaves: usize,
    pub index_blocks: usize,
    pub keys: usize,
}

/// Leaf links recorded in key order during the walk.
struct LeafLink {
    handle: BlockHandle,
    prev: BlockHandle,
    next: BlockHandle,
}

struct Checker<K> {
    half_order: usize,
    leaf_depth: Option<usize>,
    leaves: Vec<LeafLink>,
    shape: TreeShape,
    _key: std::marker::PhantomData<K>,
}

fn violation(message: String) -> Error {
    Error::Corrupted(message)
}

/// Check ordering, separator bounds, occupancy, equal leaf depth, the leaf
/// chain and the persisted key count.
pub(crate) fn check<K: Key, V: Value>(store: &mut BlockStore<K, V>) -> Result<TreeShape> {
    let root = store.root();
    if store.try_read(root)?.is_none() {
        if store.live_key_count() != 0 {
            return Err(violation(format!(
                "no root but {} live keys recorded",
                store.live_key_count()
            )));
        }
        return Ok(TreeShape::default());
    }

    let mut checker = Checker {
        half_order: store.config().half_order(),
        leaf_depth: None,
        leaves: Vec::new(),
        shape: TreeShape::default(),
        _key: std::marker::PhantomData,
    };
    checker.visit(store, root, 1, None, None)?;
    checker.check_chain()?;

    if checker.shape.keys != store.live_key_count() as usize {
        return Err(violation(format!(
            "{} keys in leaves but {} recorded",
            checker.shape.keys,
            store.live_key_count()
        )));
    }
    checker.shape.height = checker.leaf_depth.unwrap_or(0);
    Ok(checker.shape)
}

impl<K: Key> Checker<K> {
    fn visit<V: Value>(
        &mut self,
        store: &mut BlockStore<K, V>,
        handle: BlockHandle,
        depth: usize,
        lower: Option<&K>,
        upper: Option<&K>,
    ) -> Result<()> {
        let block = store.read(handle)?.clone();
        let is_root = depth == 1;
        let keys = block.keys().as_slice();

        if let Some(pair) = keys.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(violation(format!(
                "{} keys out of order: {:?} before {:?}",
                handle, pair[0], pair[1]
            )));
        }
        if let (Some(lower), Some(first)) = (lower, keys.first()) {
            if first < lower {
                return Err(violation(format!(
                    "{} key {:?} below separator {:?}",
                    handle, first, lower
                )));
            }
        }
        if let (Some(upper), Some(last)) = (upper, keys.last()) {
            if last >= upper {
                return Err(violation(format!(
                    "{} key {:?} not below separator {:?}",
                    handle, last, upper
                )));
            }
        }
        if block.should_split() {
            return Err(violation(format!("{} left full", handle)));
        }

        match &block {
            Block::Leaf(leaf) => {
                if !is_root && leaf.len() < self.half_order {
                    return Err(violation(format!(
                        "leaf {} holds {} keys, minimum {}",
                        handle,
                        leaf.len(),
                        self.half_order
                    )));
                }
                match self.leaf_depth {
                    None => self.leaf_depth = Some(depth),
                    Some(expected) if expected != depth => {
                        return Err(violation(format!(
                            "leaf {} at depth {}, expected {}",
                            handle, depth, expected
                        )));
                    }
                    Some(_) => {}
                }
                self.leaves.push(LeafLink {
                    handle,
                    prev: leaf.prev(),
                    next: leaf.next(),
                });
                self.shape.leaves += 1;
                self.shape.keys += leaf.len();
            }
            Block::Index(index) => {
                let minimum = self.half_order.saturating_sub(1);
                if is_root && index.is_empty() {
                    return Err(violation(format!("root {} has no keys", handle)));
                }
                if !is_root && index.len() < minimum {
                    return Err(violation(format!(
                        "index {} holds {} keys, minimum {}",
                        handle,
                        index.len(),
                        minimum
                    )));
                }
                if index.children().len() != index.len() + 1 {
                    return Err(violation(format!(
                        "index {} has {} keys but {} children",
                        handle,
                        index.len(),
                        index.children().len()
                    )));
                }
                self.shape.index_blocks += 1;

                let separators = index.keys().as_slice();
                for (i, &child) in index.children().iter().enumerate() {
                    let child_lower = if i == 0 { lower } else { Some(&separators[i - 1]) };
                    let child_upper = separators.get(i).or(upper);
                    self.visit(store, child, depth + 1, child_lower, child_upper)?;
                }
            }
        }
        Ok(())
    }

    fn check_chain(&self) -> Result<()> {
        for (i, link) in self.leaves.iter().enumerate() {
            let expected_prev = if i == 0 {
                BlockHandle::NULL
            } else {
                self.leaves[i - 1].handle
            };
            let expected_next = self
                .leaves
                .get(i + 1)
                .map_or(BlockHandle::NULL, |next| next.handle);
            if link.prev != expected_prev || link.next != expected_next {
                return Err(violation(format!(
                    "leaf {} linked {} <-> {}, expected {} <-> {}",
                    link.handle, link.prev, link.next, expected_prev, expected_next
                )));
            }
        }
        Ok(())
    }
}

/// One block per line, indented by depth.
pub(crate) fn render<K: Key, V: Value>(store: &mut BlockStore<K, V>) -> Result<String> {
    let mut out = String::new();
    let root = store.root();
    if store.try_read(root)?.is_none() {
        out.push_str("(empty)\n");
        return Ok(out);
    }
    render_block(store, root, 0, &mut out)?;
    Ok(out)
}

fn render_block<K: Key, V: Value>(
    store: &mut BlockStore<K, V>,
    handle: BlockHandle,
    depth: usize,
    out: &mut String,
) -> Result<()> {
    let indent = "  ".repeat(depth);
    let children = match store.read(handle)? {
        Block::Leaf(leaf) => {
            out.push_str(&format!(
                "{}Leaf {} {:?} prev={} next={}\n",
                indent,
                handle,
                leaf.keys().as_slice(),
                leaf.prev(),
                leaf.next()
            ));
            return Ok(());
        }
        Block::Index(index) => {
            out.push_str(&format!(
                "{}Index {} {:?}\n",
                indent,
                handle,
                index.keys().as_slice()
            ));
            index.children().as_slice().to_vec()
        }
    };
    for child in children {
        render_block(store, child, depth + 1, out)?;
    }
    Ok(())
}
