//! tree-hashmap: a fixed-bucket hash map whose collision buckets are
//! red-black trees, plus an insertion-order-preserving variant.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: worst-case O(log n) lookups inside a bucket even under
//!   adversarial hash collisions, built in safe, verifiable layers.
//! - Layers:
//!   - TreeHashMap<K, V, S>: fixed power-of-two bucket array over a
//!     slotmap node arena; owns bucket indexing, the within-bucket key
//!     ordering policy, and all red-black rebalancing. Rotations and
//!     splices are index reassignments on generational ids, so there
//!     are no raw pointers and no dangling links.
//!   - LinkedTreeHashMap<K, V, S>: the same engine with sequence
//!     tracking enabled; a doubly linked list threaded through all
//!     entries makes iteration yield global first-insertion order.
//!
//! Constraints
//! - Single-threaded per operation. Every mutating call takes
//!   `&mut self`, so the borrow checker provides the external
//!   serialization this design requires, and structural mutation during
//!   an in-progress traversal is unrepresentable. No `unsafe`, no
//!   interior mutability, no locking.
//! - The bucket array never resizes. Pick a bucket count up front with
//!   `with_bucket_count` when the table will be large; collisions only
//!   degrade lookups to O(log n) per bucket, never to linear.
//! - Each node caches its mixed hash (`h ^ (h >> 32)`) at creation;
//!   `K: Hash` is never invoked again for that entry.
//!
//! Ordering policy
//! - Within a bucket, keys are ordered by mixed hash, then `Eq`, then
//!   an optional natural order (`with_natural_order`), then a run-local
//!   creation-serial tie-break. Keys that only the tie-break can place
//!   are still found: lookups resolve them through a bounded duplicate
//!   re-scan, so the tie-break shapes the tree but never loses entries.
//!   The serial order is deliberately not reproducible across runs.
//! - `with_comparator` replaces the whole chain: the supplied total
//!   order governs every within-bucket comparison and `Equal` means
//!   "same logical key". Bucket selection is always hash-based.
//!
//! Notes and non-goals
//! - No persistence, no internal locking, no rehash/resize policy.
//! - `contains_value` is an equality sweep over every entry, O(n) by
//!   contract: values carry no ordering.
//! - Removing a node with two children relocates its in-order
//!   successor's entry (key, value, cached hash and serial travel
//!   together); the linked variant repairs the sequence at that exact
//!   moment, so iteration order tracks logical entries and never the
//!   physical node the tree chose to splice.
//! - There are no null keys to validate against in Rust; `Option<K>` is
//!   an ordinary key type here, and [`require_key`] is the helper for
//!   call sites whose own contract demands a present key.

mod node;
mod order_seq;
mod policy;
mod proptests;

pub mod linked_tree_hash_map;
pub mod tree_hash_map;

// Public surface
pub use linked_tree_hash_map::LinkedTreeHashMap;
pub use policy::{require_key, NilKeyError};
pub use tree_hash_map::TreeHashMap;
