//! Tree node storage: arena key type, color tag, and the node record shared
//! by both map variants.

use slotmap::new_key_type;

new_key_type! {
    /// Generational key of a tree node in the arena.
    pub(crate) struct NodeId;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

/// One entry of the map. Tree links (`parent`/`left`/`right`) are arena ids,
/// so rotations and splices are plain index reassignments. The sequence links
/// (`prev`/`next`) belong to the insertion-order overlay and are maintained
/// only when the map was built with sequence tracking enabled.
#[derive(Debug)]
pub(crate) struct Node<K, V> {
    pub key: K,
    pub value: V,
    /// Mixed hash, computed once when the entry is created.
    pub hash: u64,
    /// Creation serial; the run-local identity used as the last-resort
    /// ordering tie-break.
    pub serial: u64,
    pub color: Color,
    pub parent: Option<NodeId>,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

impl<K, V> Node<K, V> {
    pub fn new(key: K, value: V, hash: u64, serial: u64, parent: Option<NodeId>) -> Self {
        Self {
            key,
            value,
            hash,
            serial,
            color: Color::Red,
            parent,
            left: None,
            right: None,
            prev: None,
            next: None,
        }
    }

    pub fn has_two_children(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}
