//! Recursive descent, split and rebalance over handles.
//!
//! Every function takes the store and a handle rather than a block
//! reference: a block is borrowed only between two store calls, because
//! resolving another handle may load a page.

use crate::buffer::PageStore;
use crate::common::{BlockHandle, Result};
use crate::index::btree::block::{Block, Key, Value};

pub(crate) type BlockStore<K, V> = PageStore<Block<K, V>>;

/// Walk from `handle` to the leaf whose range contains `key`.
pub(crate) fn find_leaf<K: Key, V: Value>(
    store: &mut BlockStore<K, V>,
    mut handle: BlockHandle,
    key: &K,
) -> Result<BlockHandle> {
    loop {
        handle = match store.read(handle)? {
            Block::Leaf(_) => return Ok(handle),
            Block::Index(index) => index.child(index.child_position(key)),
        };
    }
}

/// Walk from `handle` to the first or last leaf.
pub(crate) fn edge_leaf<K: Key, V: Value>(
    store: &mut BlockStore<K, V>,
    mut handle: BlockHandle,
    rightmost: bool,
) -> Result<BlockHandle> {
    loop {
        handle = match store.read(handle)? {
            Block::Leaf(_) => return Ok(handle),
            Block::Index(index) if rightmost => index.child(index.children().len() - 1),
            Block::Index(index) => index.child(0),
        };
    }
}

pub(crate) fn find<K: Key, V: Value>(
    store: &mut BlockStore<K, V>,
    root: BlockHandle,
    key: &K,
) -> Result<Option<V>> {
    let leaf = find_leaf(store, root, key)?;
    Ok(store.read(leaf)?.as_leaf().query(key).cloned())
}

/// Insert below `handle`, splitting any child that fills up on the way
/// back. Returns false for a duplicate key, in which case nothing changed.
///
/// `handle` itself is left for the caller to split.
pub(crate) fn insert<K: Key, V: Value>(
    store: &mut BlockStore<K, V>,
    handle: BlockHandle,
    key: K,
    value: V,
) -> Result<bool> {
    let (pos, child) = match store.read(handle)? {
        Block::Leaf(leaf) => {
            if leaf.contains(&key) {
                return Ok(false);
            }
            return Ok(store.get_mut(handle)?.as_leaf_mut().insert(key, value));
        }
        Block::Index(index) => {
            let pos = index.child_position(&key);
            (pos, index.child(pos))
        }
    };

    if !insert(store, child, key, value)? {
        return Ok(false);
    }
    if store.read(child)?.should_split() {
        split_child(store, handle, pos)?;
    }
    Ok(true)
}

/// Remove below `handle`, rebalancing any child that underflows on the
/// way back. Returns false if the key was absent.
pub(crate) fn remove<K: Key, V: Value>(
    store: &mut BlockStore<K, V>,
    handle: BlockHandle,
    key: &K,
) -> Result<bool> {
    let (pos, child) = match store.read(handle)? {
        Block::Leaf(leaf) => {
            if !leaf.contains(key) {
                return Ok(false);
            }
            return Ok(store.get_mut(handle)?.as_leaf_mut().remove(key));
        }
        Block::Index(index) => {
            let pos = index.child_position(key);
            (pos, index.child(pos))
        }
    };

    if !remove(store, child, key)? {
        return Ok(false);
    }
    if store.read(child)?.should_merge() {
        rebalance_child(store, handle, pos)?;
    }
    Ok(true)
}

/// Split the full block at `handle` and register the new right half.
///
/// Returns the separator and the new block's handle; the caller records
/// them in the parent.
pub(crate) fn split_block<K: Key, V: Value>(
    store: &mut BlockStore<K, V>,
    handle: BlockHandle,
) -> Result<(K, BlockHandle)> {
    match store.get_mut(handle)? {
        Block::Leaf(leaf) => {
            let right = leaf.split_off();
            let old_next = right.next;
            let separator = right.keys[0].clone();

            let right_handle = store.allocate_and_register(Block::Leaf(right))?;
            store.get_mut(handle)?.as_leaf_mut().next = right_handle;
            if !old_next.is_null() {
                store.get_mut(old_next)?.as_leaf_mut().prev = right_handle;
            }
            tracing::trace!(left = %handle, right = %right_handle, "btree.split_leaf");
            Ok((separator, right_handle))
        }
        Block::Index(index) => {
            let (separator, right) = index.split_off();
            let right_handle = store.allocate_and_register(Block::Index(right))?;
            tracing::trace!(left = %handle, right = %right_handle, "btree.split_index");
            Ok((separator, right_handle))
        }
    }
}

fn split_child<K: Key, V: Value>(
    store: &mut BlockStore<K, V>,
    parent: BlockHandle,
    pos: usize,
) -> Result<()> {
    let child = store.read(parent)?.as_index().child(pos);
    let (separator, right) = split_block(store, child)?;
    store
        .get_mut(parent)?
        .as_index_mut()
        .insert_child(pos, separator, right);
    Ok(())
}

/// Restore the occupancy of `children[pos]` of `parent`.
///
/// Tries, in order: borrow from the left sibling, borrow from the right
/// sibling, merge into the left sibling's slot, merge with the right
/// sibling.
///
/// # Panics
/// Panics if the child has no sibling, which only a malformed tree allows.
fn rebalance_child<K: Key, V: Value>(
    store: &mut BlockStore<K, V>,
    parent: BlockHandle,
    pos: usize,
) -> Result<()> {
    let (child, left, right) = {
        let index = store.read(parent)?.as_index();
        let left = (pos > 0).then(|| (index.child(pos - 1), index.keys()[pos - 1].clone()));
        let right = (pos + 1 < index.children().len())
            .then(|| (index.child(pos + 1), index.keys()[pos].clone()));
        (index.child(pos), left, right)
    };

    if let Some((left, separator)) = &left {
        if store.read(*left)?.may_borrow() {
            let separator = separator.clone();
            let replacement =
                store.with_pair_mut(child, *left, |c, l| c.borrow_from_left(l, separator))?;
            store.get_mut(parent)?.as_index_mut().keys[pos - 1] = replacement;
            return Ok(());
        }
    }

    if let Some((right, separator)) = &right {
        if store.read(*right)?.may_borrow() {
            let separator = separator.clone();
            let replacement =
                store.with_pair_mut(child, *right, |c, r| c.borrow_from_right(r, separator))?;
            store.get_mut(parent)?.as_index_mut().keys[pos] = replacement;
            return Ok(());
        }
    }

    if let Some((left, separator)) = left {
        store.with_pair_mut(child, left, |c, l| c.merge_with_left(l, separator))?;
        if let Block::Leaf(leaf) = store.read(child)? {
            let prev = leaf.prev;
            if !prev.is_null() {
                store.get_mut(prev)?.as_leaf_mut().next = child;
            }
        }
        store.deregister(left);

        let index = store.get_mut(parent)?.as_index_mut();
        index.keys.remove_at(pos - 1);
        index.children.remove_at(pos - 1);
        tracing::trace!(survivor = %child, absorbed = %left, "btree.merge_left");
        return resplit_if_full(store, parent, pos - 1);
    }

    if let Some((right, separator)) = right {
        store.with_pair_mut(child, right, |c, r| c.merge_with_right(r, separator))?;
        if let Block::Leaf(leaf) = store.read(child)? {
            let next = leaf.next;
            if !next.is_null() {
                store.get_mut(next)?.as_leaf_mut().prev = child;
            }
        }
        store.deregister(right);

        let index = store.get_mut(parent)?.as_index_mut();
        index.keys.remove_at(pos);
        index.children.remove_at(pos + 1);
        tracing::trace!(survivor = %child, absorbed = %right, "btree.merge_right");
        return resplit_if_full(store, parent, pos);
    }

    panic!("{} under {} has no sibling to rebalance with", child, parent)
}

/// An index merge can reach `Order` keys; split it again right away.
fn resplit_if_full<K: Key, V: Value>(
    store: &mut BlockStore<K, V>,
    parent: BlockHandle,
    pos: usize,
) -> Result<()> {
    let child = store.read(parent)?.as_index().child(pos);
    if store.read(child)?.should_split() {
        split_child(store, parent, pos)?;
    }
    Ok(())
}
