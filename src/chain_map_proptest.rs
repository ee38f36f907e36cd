#![cfg(test)]

// Property tests for ChainMap kept inside the crate so they can check the
// bucket array and the first-bucket hint through `validate`.

use crate::chain_map::{grown_bucket_count, ChainMap, INITIAL_BUCKETS, LOAD_FACTOR};
use proptest::prelude::*;
use rand_core::SeedableRng;
use rand_pcg::Pcg64;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::BuildHasherDefault;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    TryInsert(usize, i32),
    Remove(usize),
    Lookup(usize),
    Replace(usize, i32),
    Bump(usize, i32),
    SlotOrInsert(usize, i32),
    Iterate,
    IterateRandom(u64),
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=40).prop_flat_map(|pool| {
        let idx = 0..pool.len();
        let op = prop_oneof![
            6 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::TryInsert(i, v)),
            3 => idx.clone().prop_map(Op::Remove),
            3 => idx.clone().prop_map(Op::Lookup),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Replace(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Bump(i, d)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::SlotOrInsert(i, d)),
            1 => Just(Op::Iterate),
            1 => any::<u64>().prop_map(Op::IterateRandom),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..150).prop_map(move |ops| (pool.clone(), ops))
    })
}

/// Bucket count the growth policy predicts after one more entry is linked.
fn model_reserve_one(buckets: usize, len_before: usize) -> usize {
    if buckets == 0 {
        INITIAL_BUCKETS
    } else if len_before + 1 > buckets * LOAD_FACTOR {
        grown_bucket_count(buckets)
    } else {
        buckets
    }
}

fn run_scenario<S>(mut sut: ChainMap<Key, i32, S>, pool: Vec<String>, ops: Vec<Op>) -> Result<(), TestCaseError>
where
    S: std::hash::BuildHasher,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut buckets = 0usize;

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = Key(pool[i].clone());
                // `insert` requires a fresh key; only issue it when absent.
                if !model.contains_key(&k) {
                    buckets = model_reserve_one(buckets, model.len());
                    sut.insert(k.clone(), v);
                    model.insert(k, v);
                }
            }
            Op::TryInsert(i, v) => {
                let k = Key(pool[i].clone());
                let fresh = !model.contains_key(&k);
                if fresh {
                    buckets = model_reserve_one(buckets, model.len());
                }
                prop_assert_eq!(sut.try_insert(k.clone(), v), fresh);
                model.entry(k).or_insert(v);
            }
            Op::Remove(i) => {
                let removed = sut.remove(pool[i].as_str());
                prop_assert_eq!(removed, model.remove(pool[i].as_str()));
                prop_assert!(!sut.contains_key(pool[i].as_str()));
            }
            Op::Lookup(i) => {
                let k = pool[i].as_str();
                prop_assert_eq!(sut.lookup(k), model.get(k));
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            Op::Replace(i, v) => {
                let k = pool[i].as_str();
                let expected = model.get_mut(k).map(|slot| std::mem::replace(slot, v));
                prop_assert_eq!(sut.replace(k, v), expected);
            }
            Op::Bump(i, d) => {
                let k = pool[i].as_str();
                match (sut.slot(k), model.get_mut(k)) {
                    (Some(s), Some(m)) => {
                        *s = s.wrapping_add(d);
                        *m = m.wrapping_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "slot presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            Op::SlotOrInsert(i, d) => {
                let k = Key(pool[i].clone());
                if !model.contains_key(&k) {
                    buckets = model_reserve_one(buckets, model.len());
                }
                let s = sut.slot_or_insert_default(k.clone());
                *s = s.wrapping_add(d);
                let m = model.entry(k).or_default();
                *m = m.wrapping_add(d);
            }
            Op::Iterate => {
                let seen: BTreeMap<Key, i32> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(seen.len(), sut.len(), "an entry was visited twice");
                let expected: BTreeMap<Key, i32> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(seen, expected);
            }
            Op::IterateRandom(seed) => {
                let mut rng = Pcg64::seed_from_u64(seed);
                let mut random: Vec<&Key> = sut.iter_random(&mut rng).map(|(k, _)| k).collect();
                let mut plain: Vec<&Key> = sut.keys().collect();
                random.sort();
                plain.sort();
                prop_assert_eq!(random, plain);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
                buckets = 0;
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert_eq!(sut.bucket_count(), buckets);
        // Force the hint so validate also checks it.
        let _ = sut.cursor();
        prop_assert_eq!(sut.validate(), Ok(()));
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - len/contains/lookup parity with the model after every operation.
// - The bucket count follows 5, 23, 113, ... exactly as entries are linked,
//   never shrinks on removal, and resets on clear.
// - Every reachable entry sits in the bucket its hash selects; the count of
//   reachable entries equals len (validate).
// - Standard and randomized traversals visit the same key set, once each.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(ChainMap::new(), pool, ops)?;
    }

    #[test]
    fn prop_state_machine_single_bucket((pool, ops) in arb_scenario()) {
        #[derive(Default)]
        struct ConstHasher;
        impl std::hash::Hasher for ConstHasher {
            fn write(&mut self, _bytes: &[u8]) {}
            fn finish(&self) -> u64 { 0 }
        }
        let sut: ChainMap<Key, i32, BuildHasherDefault<ConstHasher>> =
            ChainMap::with_hasher(BuildHasherDefault::default());
        run_scenario(sut, pool, ops)?;
    }
}
