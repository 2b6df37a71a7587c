//! TreeHashMap: fixed-bucket hash map whose collision buckets are red-black
//! trees, giving O(log n) lookups inside a bucket even when every key hashes
//! alike.

use core::cmp::Ordering;
use core::hash::{BuildHasher, Hash};
use core::mem;
use std::collections::hash_map::RandomState;
use std::collections::VecDeque;

use slotmap::SlotMap;

use crate::node::{Color, Node, NodeId};
use crate::order_seq::OrderSeq;
use crate::policy::OrderPolicy;

/// Default bucket count. Must be a power of two so indexing can mask.
pub(crate) const DEFAULT_BUCKETS: usize = 16;

/// Which way a put descent moves at a node, or the entry the probe key
/// already occupies.
enum Verdict {
    Found(NodeId),
    Left,
    Right,
}

/// A hash map with a fixed power-of-two bucket array and one red-black tree
/// per bucket. The bucket array never resizes; choose a bucket count up
/// front with [`TreeHashMap::with_bucket_count`] when the table will be
/// large.
pub struct TreeHashMap<K, V, S = RandomState> {
    hasher: S,
    buckets: Vec<Option<NodeId>>,
    nodes: SlotMap<NodeId, Node<K, V>>,
    len: usize,
    policy: OrderPolicy<K>,
    /// Next creation serial, the run-local identity tie-break.
    serial: u64,
    /// Insertion-order sequence; `Some` only for the linked variant.
    order: Option<OrderSeq>,
}

impl<K, V> TreeHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(RandomState::default())
    }

    /// Build with `buckets` slots, rounded up to a power of two.
    pub fn with_bucket_count(buckets: usize) -> Self {
        Self::with_parts(
            RandomState::default(),
            buckets,
            OrderPolicy::fallback(),
            false,
        )
    }

    /// Install the key type's natural order as the within-bucket tie-break
    /// for same-hash, non-equal keys.
    pub fn with_natural_order() -> Self
    where
        K: Ord,
    {
        Self::with_parts(
            RandomState::default(),
            DEFAULT_BUCKETS,
            OrderPolicy::natural(),
            false,
        )
    }

    /// Install a caller-supplied total order over keys. It replaces the
    /// whole fallback chain for within-bucket comparisons; `Ordering::Equal`
    /// means "same logical key". Bucket selection is still hash-based.
    pub fn with_comparator<F>(cmp: F) -> Self
    where
        F: Fn(&K, &K) -> Ordering + 'static,
    {
        Self::with_parts(
            RandomState::default(),
            DEFAULT_BUCKETS,
            OrderPolicy::custom(cmp),
            false,
        )
    }
}

impl<K, V> Default for TreeHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> TreeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_parts(hasher, DEFAULT_BUCKETS, OrderPolicy::fallback(), false)
    }

    pub fn with_hasher_and_buckets(hasher: S, buckets: usize) -> Self {
        Self::with_parts(hasher, buckets, OrderPolicy::fallback(), false)
    }

    pub(crate) fn with_parts(
        hasher: S,
        buckets: usize,
        policy: OrderPolicy<K>,
        linked: bool,
    ) -> Self {
        let count = buckets.max(1).next_power_of_two();
        Self {
            hasher,
            buckets: vec![None; count],
            nodes: SlotMap::with_key(),
            len: 0,
            policy,
            serial: 0,
            order: linked.then(OrderSeq::new),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every entry. The arena and anchors are reset; stale ids cannot
    /// resurface because the arena's generations advance.
    pub fn clear(&mut self) {
        self.nodes.clear();
        for slot in &mut self.buckets {
            *slot = None;
        }
        self.len = 0;
        if let Some(seq) = self.order.as_mut() {
            seq.clear();
        }
    }

    /// Insert or replace. Returns the previous value when the key was
    /// already present; the tree shape is untouched in that case.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.mixed_hash(&key);
        let idx = self.bucket_of(hash);

        let Some(root) = self.buckets[idx] else {
            let id = self.create_node(key, value, hash, None);
            self.buckets[idx] = Some(id);
            self.len += 1;
            self.fix_after_insert(id);
            return None;
        };

        let mut node = root;
        let mut searched = false;
        loop {
            match self.put_verdict(&key, hash, node, &mut searched) {
                Verdict::Found(hit) => {
                    return Some(mem::replace(&mut self.nodes[hit].value, value));
                }
                Verdict::Left => match self.nodes[node].left {
                    Some(l) => node = l,
                    None => {
                        let id = self.create_node(key, value, hash, Some(node));
                        self.nodes[node].left = Some(id);
                        self.len += 1;
                        self.fix_after_insert(id);
                        return None;
                    }
                },
                Verdict::Right => match self.nodes[node].right {
                    Some(r) => node = r,
                    None => {
                        let id = self.create_node(key, value, hash, Some(node));
                        self.nodes[node].right = Some(id);
                        self.len += 1;
                        self.fix_after_insert(id);
                        return None;
                    }
                },
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.find_node(key).map(|n| &self.nodes[n].value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let n = self.find_node(key)?;
        Some(&mut self.nodes[n].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find_node(key).is_some()
    }

    /// Equality sweep over every entry. O(n): values carry no ordering, so
    /// there is nothing better to descend by.
    pub fn contains_value(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|(_, v)| v == value)
    }

    /// Remove a key, returning its value when it was present.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.find_node(key)?;
        Some(self.remove_node(id))
    }

    /// Lazy breadth-first traversal: buckets in slot order, each tree level
    /// by level. No ordering guarantee; stop consuming to stop early.
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            map: self,
            bucket: 0,
            queue: VecDeque::new(),
        }
    }

    fn mixed_hash(&self, key: &K) -> u64 {
        // Fold the high half into the low half so that masking sees the
        // whole hash, then index by mask; the bucket count is a power of two.
        let h = self.hasher.hash_one(key);
        h ^ (h >> 32)
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash & (self.buckets.len() as u64 - 1)) as usize
    }

    fn find_node(&self, key: &K) -> Option<NodeId> {
        if self.len == 0 {
            return None;
        }
        let hash = self.mixed_hash(key);
        let idx = self.bucket_of(hash);
        self.find_from(self.buckets[idx], key, hash)
    }

    /// Get-path descent from `node`: hash, equality, natural order, then an
    /// exhaustive right-then-left subtree scan. Never consults the identity
    /// tie-break, so entries placed by it are still found.
    fn find_from(&self, mut node: Option<NodeId>, key: &K, hash: u64) -> Option<NodeId> {
        if let OrderPolicy::Custom(cmp) = &self.policy {
            while let Some(n) = node {
                node = match cmp(key, &self.nodes[n].key) {
                    Ordering::Equal => return Some(n),
                    Ordering::Less => self.nodes[n].left,
                    Ordering::Greater => self.nodes[n].right,
                };
            }
            return None;
        }
        while let Some(n) = node {
            let e = &self.nodes[n];
            if hash > e.hash {
                node = e.right;
                continue;
            }
            if hash < e.hash {
                node = e.left;
                continue;
            }
            if *key == e.key {
                return Some(n);
            }
            if let OrderPolicy::Fallback { natural: Some(nat) } = &self.policy {
                match nat(key, &e.key) {
                    Ordering::Less => {
                        node = e.left;
                        continue;
                    }
                    Ordering::Greater => {
                        node = e.right;
                        continue;
                    }
                    Ordering::Equal => {}
                }
            }
            if let Some(hit) = self.find_from(e.right, key, hash) {
                return Some(hit);
            }
            node = e.left;
        }
        None
    }

    /// Decide which way the put descent moves at `node`, or report the entry
    /// the probe key already occupies (possibly elsewhere in the subtree,
    /// found by the one-time duplicate re-scan).
    fn put_verdict(&self, key: &K, hash: u64, node: NodeId, searched: &mut bool) -> Verdict {
        if let OrderPolicy::Custom(cmp) = &self.policy {
            return match cmp(key, &self.nodes[node].key) {
                Ordering::Less => Verdict::Left,
                Ordering::Greater => Verdict::Right,
                Ordering::Equal => Verdict::Found(node),
            };
        }
        let e = &self.nodes[node];
        if hash > e.hash {
            return Verdict::Right;
        }
        if hash < e.hash {
            return Verdict::Left;
        }
        if *key == e.key {
            return Verdict::Found(node);
        }
        if let OrderPolicy::Fallback { natural: Some(nat) } = &self.policy {
            match nat(key, &e.key) {
                Ordering::Less => return Verdict::Left,
                Ordering::Greater => return Verdict::Right,
                Ordering::Equal => {}
            }
        }
        if !*searched {
            *searched = true;
            // Equal keys inserted out of naive descent order must update the
            // existing entry instead of minting a second node.
            if let Some(hit) = self
                .find_from(e.left, key, hash)
                .or_else(|| self.find_from(e.right, key, hash))
            {
                return Verdict::Found(hit);
            }
        }
        // Identity tie-break: the probe has no node yet, so its serial-to-be
        // orders after every existing entry.
        Verdict::Right
    }

    fn create_node(&mut self, key: K, value: V, hash: u64, parent: Option<NodeId>) -> NodeId {
        let serial = self.serial;
        self.serial += 1;
        let id = self.nodes.insert(Node::new(key, value, hash, serial, parent));
        // Extension point: the linked variant appends every new node to the
        // insertion-order sequence.
        if let Some(seq) = self.order.as_mut() {
            seq.push_back(&mut self.nodes, id);
        }
        id
    }

    fn remove_node(&mut self, id: NodeId) -> V {
        self.len -= 1;
        let mut doomed = id;

        if self.nodes[id].has_two_children() {
            let right = self.nodes[id].right.expect("node has two children");
            let succ = self.leftmost(right);
            // Relocate the successor's logical entry into `id`. Key, value,
            // cached hash and serial travel together: the cache belongs to
            // the key. The node spliced out of the tree then carries the
            // entry being removed.
            let [a, b] = self
                .nodes
                .get_disjoint_mut([id, succ])
                .expect("two-children node and successor are distinct");
            mem::swap(&mut a.key, &mut b.key);
            mem::swap(&mut a.value, &mut b.value);
            mem::swap(&mut a.hash, &mut b.hash);
            mem::swap(&mut a.serial, &mut b.serial);
            // Extension point: the sequence tracks logical entries, not the
            // physical node the tree chose to splice.
            if let Some(seq) = self.order.as_mut() {
                seq.swap(&mut self.nodes, id, succ);
            }
            doomed = succ;
        }

        // `doomed` now has at most one child. Splice it out.
        let parent = self.nodes[doomed].parent;
        let replacement = self.nodes[doomed].left.or(self.nodes[doomed].right);
        let idx = self.bucket_of(self.nodes[doomed].hash);

        match (replacement, parent) {
            (Some(rep), _) => {
                self.nodes[rep].parent = parent;
                match parent {
                    None => self.buckets[idx] = Some(rep),
                    Some(p) => {
                        if self.nodes[p].left == Some(doomed) {
                            self.nodes[p].left = Some(rep);
                        } else {
                            self.nodes[p].right = Some(rep);
                        }
                    }
                }
                self.fix_after_remove(doomed, Some(rep));
            }
            (None, None) => {
                self.buckets[idx] = None;
            }
            (None, Some(p)) => {
                if self.nodes[p].left == Some(doomed) {
                    self.nodes[p].left = None;
                } else {
                    self.nodes[p].right = None;
                }
                self.fix_after_remove(doomed, None);
            }
        }

        if let Some(seq) = self.order.as_mut() {
            seq.unlink(&mut self.nodes, doomed);
        }
        let dead = self.nodes.remove(doomed).expect("spliced node is live");
        dead.value
    }

    fn fix_after_insert(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id].parent else {
            self.nodes[id].color = Color::Black;
            return;
        };
        if self.is_black(Some(parent)) {
            return;
        }

        let uncle = self.sibling(parent);
        let grand = self.nodes[parent]
            .parent
            .expect("red parent implies a grandparent");

        if self.is_red(uncle) {
            self.set_color(Some(parent), Color::Black);
            self.set_color(uncle, Color::Black);
            self.nodes[grand].color = Color::Red;
            self.fix_after_insert(grand);
            return;
        }

        if self.is_left_child(parent) {
            if self.is_left_child(id) {
                // LL
                self.nodes[parent].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                self.rotate_right(grand);
            } else {
                // LR
                self.nodes[id].color = Color::Black;
                self.nodes[grand].color = Color::Red;
                self.rotate_left(parent);
                self.rotate_right(grand);
            }
        } else if self.is_left_child(id) {
            // RL
            self.nodes[id].color = Color::Black;
            self.nodes[grand].color = Color::Red;
            self.rotate_right(parent);
            self.rotate_left(grand);
        } else {
            // RR
            self.nodes[parent].color = Color::Black;
            self.nodes[grand].color = Color::Red;
            self.rotate_left(grand);
        }
    }

    fn fix_after_remove(&mut self, node: NodeId, replacement: Option<NodeId>) {
        // Splicing out a red node never unbalances black heights.
        if self.is_red(Some(node)) {
            return;
        }

        // Black node replaced by its red child: repaint and done.
        if self.is_red(replacement) {
            self.set_color(replacement, Color::Black);
            return;
        }

        let Some(parent) = self.nodes[node].parent else {
            return;
        };

        // On the first call `node` is a detached leaf (the parent no longer
        // points at it); on recursive calls it is still attached. Both cases
        // resolve the double-black side here.
        let on_left =
            self.nodes[parent].left.is_none() || self.nodes[parent].left == Some(node);

        if on_left {
            let mut sibling = self.nodes[parent].right;
            if self.is_red(sibling) {
                self.set_color(sibling, Color::Black);
                self.nodes[parent].color = Color::Red;
                self.rotate_left(parent);
                sibling = self.nodes[parent].right;
            }
            let sib = sibling.expect("black-height demands a sibling");
            if self.is_black(self.nodes[sib].left) && self.is_black(self.nodes[sib].right) {
                // Both nephews black: push the missing blackness up.
                let parent_was_black = self.is_black(Some(parent));
                self.nodes[parent].color = Color::Black;
                self.nodes[sib].color = Color::Red;
                if parent_was_black {
                    self.fix_after_remove(parent, None);
                }
            } else {
                // Borrow from the sibling's red child.
                let mut sib = sib;
                if self.is_black(self.nodes[sib].right) {
                    self.rotate_right(sib);
                    sib = self.nodes[parent]
                        .right
                        .expect("rotation leaves a sibling");
                }
                self.nodes[sib].color = self.nodes[parent].color;
                let far = self.nodes[sib].right;
                self.set_color(far, Color::Black);
                self.nodes[parent].color = Color::Black;
                self.rotate_left(parent);
            }
        } else {
            let mut sibling = self.nodes[parent].left;
            if self.is_red(sibling) {
                self.set_color(sibling, Color::Black);
                self.nodes[parent].color = Color::Red;
                self.rotate_right(parent);
                sibling = self.nodes[parent].left;
            }
            let sib = sibling.expect("black-height demands a sibling");
            if self.is_black(self.nodes[sib].left) && self.is_black(self.nodes[sib].right) {
                let parent_was_black = self.is_black(Some(parent));
                self.nodes[parent].color = Color::Black;
                self.nodes[sib].color = Color::Red;
                if parent_was_black {
                    self.fix_after_remove(parent, None);
                }
            } else {
                let mut sib = sib;
                if self.is_black(self.nodes[sib].left) {
                    self.rotate_left(sib);
                    sib = self.nodes[parent]
                        .left
                        .expect("rotation leaves a sibling");
                }
                self.nodes[sib].color = self.nodes[parent].color;
                let far = self.nodes[sib].left;
                self.set_color(far, Color::Black);
                self.nodes[parent].color = Color::Black;
                self.rotate_right(parent);
            }
        }
    }

    fn rotate_left(&mut self, grand: NodeId) {
        let parent = self.nodes[grand]
            .right
            .expect("left rotation needs a right child");
        let child = self.nodes[parent].left;
        self.nodes[grand].right = child;
        self.nodes[parent].left = Some(grand);
        self.after_rotate(grand, parent, child);
    }

    fn rotate_right(&mut self, grand: NodeId) {
        let parent = self.nodes[grand]
            .left
            .expect("right rotation needs a left child");
        let child = self.nodes[parent].right;
        self.nodes[grand].left = child;
        self.nodes[parent].right = Some(grand);
        self.after_rotate(grand, parent, child);
    }

    /// Rewire parent links after a rotation; reseat the bucket root when the
    /// rotated node was it.
    fn after_rotate(&mut self, grand: NodeId, parent: NodeId, child: Option<NodeId>) {
        let top = self.nodes[grand].parent;
        self.nodes[parent].parent = top;
        match top {
            Some(t) if self.nodes[t].left == Some(grand) => self.nodes[t].left = Some(parent),
            Some(t) => self.nodes[t].right = Some(parent),
            None => {
                let idx = self.bucket_of(self.nodes[grand].hash);
                self.buckets[idx] = Some(parent);
            }
        }
        if let Some(c) = child {
            self.nodes[c].parent = Some(grand);
        }
        self.nodes[grand].parent = Some(parent);
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(l) = self.nodes[id].left {
            id = l;
        }
        id
    }

    fn is_left_child(&self, id: NodeId) -> bool {
        self.nodes[id]
            .parent
            .is_some_and(|p| self.nodes[p].left == Some(id))
    }

    fn sibling(&self, id: NodeId) -> Option<NodeId> {
        let p = self.nodes[id].parent?;
        if self.nodes[p].left == Some(id) {
            self.nodes[p].right
        } else {
            self.nodes[p].left
        }
    }

    fn color_of(&self, id: Option<NodeId>) -> Color {
        id.map_or(Color::Black, |n| self.nodes[n].color)
    }

    fn is_black(&self, id: Option<NodeId>) -> bool {
        self.color_of(id) == Color::Black
    }

    fn is_red(&self, id: Option<NodeId>) -> bool {
        self.color_of(id) == Color::Red
    }

    fn set_color(&mut self, id: Option<NodeId>, color: Color) {
        if let Some(n) = id {
            self.nodes[n].color = color;
        }
    }

    pub(crate) fn order_head(&self) -> Option<NodeId> {
        self.order.as_ref().and_then(|seq| seq.head())
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node<K, V> {
        &self.nodes[id]
    }
}

/// Breadth-first iterator over a [`TreeHashMap`].
pub struct Iter<'a, K, V, S> {
    map: &'a TreeHashMap<K, V, S>,
    bucket: usize,
    queue: VecDeque<NodeId>,
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(n) = self.queue.pop_front() {
                let e = &self.map.nodes[n];
                if let Some(l) = e.left {
                    self.queue.push_back(l);
                }
                if let Some(r) = e.right {
                    self.queue.push_back(r);
                }
                return Some((&e.key, &e.value));
            }
            let root = self.map.buckets.get(self.bucket)?;
            self.bucket += 1;
            if let Some(r) = *root {
                self.queue.push_back(r);
            }
        }
    }
}

#[cfg(test)]
impl<K, V, S> TreeHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Structural audit: red-black invariants per bucket, parent back-links,
    /// bucket assignment by cached hash, size parity, and (when sequence
    /// tracking is on) sequence/tree membership parity.
    pub(crate) fn assert_invariants(&self) {
        let mut counted = 0;
        for (idx, root) in self.buckets.iter().enumerate() {
            let Some(root) = *root else { continue };
            assert!(
                self.nodes[root].parent.is_none(),
                "bucket root has no parent"
            );
            assert_eq!(self.nodes[root].color, Color::Black, "bucket root is black");
            counted += self.audit_subtree(root, idx).1;
        }
        assert_eq!(counted, self.len, "len matches live tree nodes");
        assert_eq!(
            self.nodes.len(),
            self.len,
            "arena holds exactly the live nodes"
        );

        if let Some(seq) = &self.order {
            let mut seen = 0;
            let mut prev: Option<NodeId> = None;
            let mut cur = seq.head();
            while let Some(n) = cur {
                assert_eq!(self.nodes[n].prev, prev, "sequence back-link agrees");
                seen += 1;
                prev = cur;
                cur = self.nodes[n].next;
            }
            assert_eq!(seq.tail(), prev, "tail anchor is the last node");
            assert_eq!(seen, self.len, "sequence visits every live entry once");
        }
    }

    /// Returns `(black_height, node_count)` of the subtree at `id`.
    fn audit_subtree(&self, id: NodeId, bucket: usize) -> (usize, usize) {
        let e = &self.nodes[id];
        assert_eq!(self.bucket_of(e.hash), bucket, "cached hash maps to bucket");
        if e.color == Color::Red {
            assert!(
                self.is_black(e.left) && self.is_black(e.right),
                "red node has black children"
            );
        }
        let (lh, lc) = e.left.map_or((0, 0), |l| {
            assert_eq!(self.nodes[l].parent, Some(id), "left child back-link");
            self.audit_subtree(l, bucket)
        });
        let (rh, rc) = e.right.map_or((0, 0), |r| {
            assert_eq!(self.nodes[r].parent, Some(id), "right child back-link");
            self.audit_subtree(r, bucket)
        });
        assert_eq!(lh, rh, "equal black height on both sides");
        (lh + usize::from(e.color == Color::Black), lc + rc + 1)
    }
}
