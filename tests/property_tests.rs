use std::collections::BTreeMap;

use proptest::prelude::*;

use bptree_store::buffer::replacer::LruReplacer;
use bptree_store::{BTree, BlockHandle, InsertOutcome, StoreConfig};

#[derive(Debug, Clone)]
enum Operation {
    Insert { key: u16, value: u32 },
    Remove { key: u16 },
    Find { key: u16 },
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => (0u16..512, any::<u32>()).prop_map(|(key, value)| Operation::Insert { key, value }),
        2 => (0u16..512).prop_map(|key| Operation::Remove { key }),
        1 => (0u16..512).prop_map(|key| Operation::Find { key }),
    ]
}

fn small_config(order: usize) -> StoreConfig {
    StoreConfig::default()
        .with_order(order)
        .with_cache_capacity(3)
        .with_sync_on_flush(false)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_matches_ordered_map(
        ops in prop::collection::vec(arb_operation(), 1..400),
        order in 4usize..9,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut tree: BTree<u16, u32> = BTree::open(dir.path().join("prop.db"), small_config(order)).unwrap();
        let mut model = BTreeMap::new();

        for op in ops {
            match op {
                Operation::Insert { key, value } => {
                    let expected = if model.contains_key(&key) {
                        InsertOutcome::Duplicate
                    } else {
                        model.insert(key, value);
                        InsertOutcome::Success
                    };
                    prop_assert_eq!(tree.insert(key, value).unwrap(), expected);
                }
                Operation::Remove { key } => {
                    prop_assert_eq!(tree.remove(&key).unwrap(), model.remove(&key).is_some());
                }
                Operation::Find { key } => {
                    prop_assert_eq!(tree.find(&key).unwrap(), model.get(&key).copied());
                }
            }
            prop_assert!(tree.resident_pages() <= 3);
            tree.verify().unwrap();
        }

        let shape = tree.verify().unwrap();
        prop_assert_eq!(shape.keys, model.len());

        let entries: Vec<(u16, u32)> = tree.iter().unwrap().map(|e| e.unwrap()).collect();
        let expected: Vec<(u16, u32)> = model.iter().map(|(&k, &v)| (k, v)).collect();
        prop_assert_eq!(entries, expected);
    }

    #[test]
    fn prop_round_trip_after_reopen(
        keys in prop::collection::btree_set(any::<u32>(), 0..300),
        removed in prop::collection::vec(any::<prop::sample::Index>(), 0..100),
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prop.db");
        let keys: Vec<u32> = keys.into_iter().collect();
        let mut model: BTreeMap<u32, u64> = BTreeMap::new();

        {
            let mut tree: BTree<u32, u64> = BTree::open(&path, small_config(6)).unwrap();
            for &k in &keys {
                tree.insert(k, u64::from(k) * 2).unwrap();
                model.insert(k, u64::from(k) * 2);
            }
            if !keys.is_empty() {
                for index in &removed {
                    let k = keys[index.index(keys.len())];
                    prop_assert_eq!(tree.remove(&k).unwrap(), model.remove(&k).is_some());
                }
            }
        }

        let tree: BTree<u32, u64> = BTree::open(&path, small_config(6)).unwrap();
        prop_assert_eq!(tree.len(), model.len());
        for &k in &keys {
            prop_assert_eq!(tree.find(&k).unwrap(), model.get(&k).copied());
        }
        tree.verify().unwrap();
    }

    #[test]
    fn prop_range_matches_model(
        keys in prop::collection::btree_set(0u32..1000, 0..200),
        start in 0u32..1000,
        len in 0u32..300,
    ) {
        let mut tree: BTree<u32, u32> = BTree::in_memory(small_config(4)).unwrap();
        for &k in &keys {
            tree.insert(k, k).unwrap();
        }
        let end = start + len;

        let got: Vec<u32> = tree.range(start..end).unwrap().map(|e| e.unwrap().0).collect();
        let expected: Vec<u32> = keys.range(start..end).copied().collect();
        prop_assert_eq!(&got, &expected);

        let got_back: Vec<u32> = tree.range(start..=end).unwrap().rev().map(|e| e.unwrap().0).collect();
        let expected_back: Vec<u32> = keys.range(start..=end).rev().copied().collect();
        prop_assert_eq!(got_back, expected_back);
    }

    #[test]
    fn prop_lru_evicts_oldest_untouched(
        count in 1u32..64,
        touched in prop::collection::vec(any::<prop::sample::Index>(), 0..32),
    ) {
        let mut lru = LruReplacer::new();
        for id in 1..=count {
            lru.admit(BlockHandle::new(id));
        }

        let mut recency: Vec<u32> = (1..=count).collect();
        for index in touched {
            let id = recency[index.index(recency.len())];
            prop_assert!(lru.touch(BlockHandle::new(id)));
            if count > 1 {
                prop_assert_ne!(lru.least_recently_used(), Some(BlockHandle::new(id)));
            }
            recency.retain(|&other| other != id);
            recency.push(id);
        }

        for &id in &recency {
            prop_assert_eq!(lru.least_recently_used(), Some(BlockHandle::new(id)));
            prop_assert!(lru.evict(BlockHandle::new(id)));
        }
        prop_assert!(lru.is_empty());
    }
}
