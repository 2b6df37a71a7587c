//! LinkedTreeHashMap: the insertion-order-preserving variant.
//!
//! Same bucketed red-black engine as [`TreeHashMap`], built with sequence
//! tracking enabled: every node carries prev/next links forming one global
//! doubly linked list in first-insertion order. The engine repairs that list
//! at its two structural extension points (node creation, and the node swap a
//! two-children deletion performs), so iteration order always reflects the
//! logical entries the caller inserted.

use core::cmp::Ordering;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

use crate::node::NodeId;
use crate::policy::OrderPolicy;
use crate::tree_hash_map::{TreeHashMap, DEFAULT_BUCKETS};

/// A [`TreeHashMap`] whose iteration order is global insertion order,
/// independent of bucket or tree placement.
pub struct LinkedTreeHashMap<K, V, S = RandomState> {
    inner: TreeHashMap<K, V, S>,
}

impl<K, V> LinkedTreeHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::default())
    }

    /// Build with `buckets` slots, rounded up to a power of two.
    pub fn with_bucket_count(buckets: usize) -> Self {
        Self {
            inner: TreeHashMap::with_parts(
                RandomState::default(),
                buckets,
                OrderPolicy::fallback(),
                true,
            ),
        }
    }

    /// Install the key type's natural order as the within-bucket tie-break.
    /// Iteration order is unaffected: it is always insertion order.
    pub fn with_natural_order() -> Self
    where
        K: Ord,
    {
        Self {
            inner: TreeHashMap::with_parts(
                RandomState::default(),
                DEFAULT_BUCKETS,
                OrderPolicy::natural(),
                true,
            ),
        }
    }

    /// Install a caller-supplied total order over keys; see
    /// [`TreeHashMap::with_comparator`].
    pub fn with_comparator<F>(cmp: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + 'static,
    {
        Self {
            inner: TreeHashMap::with_parts(
                RandomState::default(),
                DEFAULT_BUCKETS,
                OrderPolicy::custom(cmp),
                true,
            ),
        }
    }
}

impl<K, V> Default for LinkedTreeHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> LinkedTreeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            inner: TreeHashMap::with_parts(hasher, DEFAULT_BUCKETS, OrderPolicy::fallback(), true),
        }
    }

    pub fn with_hasher_and_buckets(hasher: S, buckets: usize) -> Self {
        Self {
            inner: TreeHashMap::with_parts(hasher, buckets, OrderPolicy::fallback(), true),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Insert or replace. Replacing an existing key keeps its original
    /// position in the insertion order.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.inner.get_mut(key)
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.inner.remove(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.contains_key(key)
    }

    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.inner.contains_value(value)
    }

    /// Lazy traversal in global first-insertion order; stop consuming to
    /// stop early.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            map: &self.inner,
            cursor: self.inner.order_head(),
        }
    }

    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        self.inner.assert_invariants();
    }
}

/// Insertion-order iterator over a [`LinkedTreeHashMap`].
pub struct Iter<'a, K, V, S> {
    map: &'a TreeHashMap<K, V, S>,
    cursor: Option<NodeId>,
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.cursor?;
        let e = self.map.node(n);
        self.cursor = e.next;
        Some((&e.key, &e.value))
    }
}
