#![cfg(test)]

// Property tests kept inside the crate so they can run the structural audit
// (red-black invariants, back-links, sequence parity) after every operation.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher};

use proptest::prelude::*;

use crate::policy::OrderPolicy;
use crate::{LinkedTreeHashMap, TreeHashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    Contains(usize),
    ContainsValue(i32),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            8 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            4 => idx.clone().prop_map(Op::Remove),
            3 => idx.clone().prop_map(Op::Get),
            2 => idx.clone().prop_map(Op::Contains),
            1 => any::<i32>().prop_map(Op::ContainsValue),
            2 => Just(Op::Iterate),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0 // every key collides into one bucket
    }
}

// Drives a TreeHashMap against a std HashMap model. Invariants checked on
// every step: operation results match the model, len/is_empty parity, and
// the full structural audit.
fn run_tree<S: BuildHasher>(
    mut sut: TreeHashMap<String, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();
    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                prop_assert_eq!(sut.insert(k.clone(), v), model.insert(k, v));
            }
            Op::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k), model.remove(k));
            }
            Op::Get(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.get(k), model.get(k));
            }
            Op::Contains(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.contains_key(k), model.contains_key(k));
            }
            Op::ContainsValue(v) => {
                prop_assert_eq!(sut.contains_value(&v), model.values().any(|mv| *mv == v));
            }
            Op::Iterate => {
                let mut seen: Vec<(String, i32)> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let mut expect: Vec<(String, i32)> =
                    model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                seen.sort();
                expect.sort();
                prop_assert_eq!(seen, expect);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

// Drives a LinkedTreeHashMap against an insertion-ordered Vec model; every
// Iterate compares the exact sequence, not just the set.
fn run_linked<S: BuildHasher>(
    mut sut: LinkedTreeHashMap<String, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: Vec<(String, i32)> = Vec::new();
    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = pool[i].clone();
                let prev = match model.iter_mut().find(|(mk, _)| *mk == k) {
                    Some((_, mv)) => Some(std::mem::replace(mv, v)),
                    None => {
                        model.push((k.clone(), v));
                        None
                    }
                };
                prop_assert_eq!(sut.insert(k, v), prev);
            }
            Op::Remove(i) => {
                let k = &pool[i];
                let prev = match model.iter().position(|(mk, _)| mk == k) {
                    Some(pos) => Some(model.remove(pos).1),
                    None => None,
                };
                prop_assert_eq!(sut.remove(k), prev);
            }
            Op::Get(i) => {
                let k = &pool[i];
                let expect = model.iter().find(|(mk, _)| mk == k).map(|(_, v)| v);
                prop_assert_eq!(sut.get(k), expect);
            }
            Op::Contains(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.contains_key(k), model.iter().any(|(mk, _)| mk == k));
            }
            Op::ContainsValue(v) => {
                prop_assert_eq!(
                    sut.contains_value(&v),
                    model.iter().any(|(_, mv)| *mv == v)
                );
            }
            Op::Iterate => {
                let seen: Vec<(String, i32)> =
                    sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(&seen, &model);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }
        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    // Property: state-machine equivalence against std::collections::HashMap
    // under hashed (well-spread) keys.
    #[test]
    fn prop_tree_state_machine((pool, ops) in arb_scenario()) {
        run_tree(TreeHashMap::with_bucket_count(4), &pool, ops)?;
    }

    // Property: same equivalence under worst-case collisions (constant
    // hasher, two buckets), stressing the fallback chain's duplicate
    // re-scan and serial tie-break.
    #[test]
    fn prop_tree_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_tree(
            TreeHashMap::with_hasher_and_buckets(ConstBuildHasher, 2),
            &pool,
            ops,
        )?;
    }

    // Property: same equivalence with the natural-order tie-break installed,
    // still under a constant hasher so the order actually decides placement.
    #[test]
    fn prop_tree_state_machine_natural_order((pool, ops) in arb_scenario()) {
        let sut = TreeHashMap::with_parts(ConstBuildHasher, 2, OrderPolicy::natural(), false);
        run_tree(sut, &pool, ops)?;
    }

    // Property: for any interleaving of puts and removes, a full traversal
    // of the linked variant yields the surviving keys in first-insertion
    // order, including across two-children successor swaps.
    #[test]
    fn prop_linked_insertion_order((pool, ops) in arb_scenario()) {
        run_linked(LinkedTreeHashMap::with_bucket_count(4), &pool, ops)?;
    }

    // Property: insertion order survives worst-case collisions, where every
    // delete path runs through the deepest trees the table can produce.
    #[test]
    fn prop_linked_insertion_order_with_collisions((pool, ops) in arb_scenario()) {
        run_linked(
            LinkedTreeHashMap::with_hasher_and_buckets(ConstBuildHasher, 1),
            &pool,
            ops,
        )?;
    }
}
