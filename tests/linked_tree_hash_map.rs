// LinkedTreeHashMap integration suite.
//
// The extra contract over TreeHashMap: a full traversal always yields the
// surviving entries in their original first-insertion order, for any
// interleaving of puts and removes, including removes that relocate a tree
// node via the in-order successor swap.

use std::hash::{BuildHasher, Hasher};

use tree_hashmap::LinkedTreeHashMap;

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
        0
    }
}

fn entries<S: BuildHasher>(m: &LinkedTreeHashMap<String, i32, S>) -> Vec<(String, i32)> {
    m.iter().map(|(k, v)| (k.clone(), *v)).collect()
}

// Verifies: the documented end-to-end scenario: three inserts, one removal,
// then an in-order traversal of the survivors.
#[test]
fn basic_ordered_scenario() {
    let mut m: LinkedTreeHashMap<String, i32> = LinkedTreeHashMap::new();
    for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
        assert_eq!(m.insert(k.to_string(), v), None);
    }
    assert_eq!(m.len(), 3);
    assert_eq!(m.get(&"b".to_string()), Some(&2));

    assert_eq!(m.remove(&"a".to_string()), Some(1));
    assert_eq!(m.len(), 2);
    assert!(!m.contains_key(&"a".to_string()));

    assert_eq!(
        entries(&m),
        vec![("b".to_string(), 2), ("c".to_string(), 3)]
    );
}

// Verifies: traversal order is insertion order, not key order and not
// bucket order.
#[test]
fn traversal_ignores_bucket_placement() {
    let mut m: LinkedTreeHashMap<String, i32> = LinkedTreeHashMap::with_bucket_count(2);
    let keys = ["zeta", "apple", "mango", "kiwi", "banana", "fig"];
    for (i, k) in keys.iter().enumerate() {
        m.insert((*k).to_string(), i as i32);
    }
    let got: Vec<String> = m.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(got, keys.iter().map(|s| s.to_string()).collect::<Vec<_>>());
}

// Verifies: order survives a long interleaving of inserts and removes when
// every key collides, so removals constantly hit two-children nodes and run
// the successor swap.
#[test]
fn order_survives_collision_heavy_churn() {
    let mut m: LinkedTreeHashMap<String, i32, ConstBuildHasher> =
        LinkedTreeHashMap::with_hasher_and_buckets(ConstBuildHasher, 1);
    let mut model: Vec<(String, i32)> = Vec::new();

    let mut lcg: u64 = 0x9e37_79b9_7f4a_7c15;
    let mut next = move || {
        lcg = lcg.wrapping_mul(6364136223846793005).wrapping_add(1);
        lcg >> 33
    };

    for round in 0..600 {
        let k = format!("k{:02}", next() % 48);
        if round % 3 == 2 {
            let expect = model
                .iter()
                .position(|(mk, _)| *mk == k)
                .map(|pos| model.remove(pos).1);
            assert_eq!(m.remove(&k), expect);
        } else {
            let v = round as i32;
            let prev = match model.iter_mut().find(|(mk, _)| *mk == k) {
                Some((_, mv)) => Some(std::mem::replace(mv, v)),
                None => {
                    model.push((k.clone(), v));
                    None
                }
            };
            assert_eq!(m.insert(k, v), prev);
        }
        assert_eq!(m.len(), model.len());
    }
    assert_eq!(entries(&m), model);
}

// Verifies: value replacement keeps sequence position; remove+reinsert
// moves the key to the tail.
#[test]
fn replacement_vs_reinsertion_position() {
    let mut m: LinkedTreeHashMap<String, i32> = LinkedTreeHashMap::new();
    for k in ["a", "b", "c"] {
        m.insert(k.to_string(), 0);
    }

    m.insert("a".to_string(), 9);
    let got: Vec<String> = m.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(got, vec!["a", "b", "c"]);

    m.remove(&"a".to_string());
    m.insert("a".to_string(), 10);
    let got: Vec<String> = m.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(got, vec!["b", "c", "a"]);
}

// Verifies: clear resets the order sequence along with the table.
#[test]
fn clear_resets_order() {
    let mut m: LinkedTreeHashMap<String, i32> = LinkedTreeHashMap::new();
    for k in ["x", "y", "z"] {
        m.insert(k.to_string(), 0);
    }
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.iter().count(), 0);

    m.insert("n".to_string(), 1);
    assert_eq!(entries(&m), vec![("n".to_string(), 1)]);
}

// Verifies: the natural-order constructor changes tree placement only;
// iteration is still insertion order.
#[test]
fn natural_order_does_not_affect_iteration() {
    let mut m: LinkedTreeHashMap<String, i32> = LinkedTreeHashMap::with_natural_order();
    for (i, k) in ["m", "a", "z", "b"].iter().enumerate() {
        m.insert((*k).to_string(), i as i32);
    }
    let got: Vec<String> = m.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(got, vec!["m", "a", "z", "b"]);
}
