//! Global insertion-order sequence threaded through the node arena.
//!
//! The sequence is a doubly linked list over the nodes' `prev`/`next` fields
//! with head/tail anchors held here. It tracks logical entries: when the tree
//! deletes a two-children node by splicing out its in-order successor, the
//! two nodes exchange sequence positions first, so the surviving node keeps
//! the position of the entry it now carries.

use slotmap::SlotMap;

use crate::node::{Node, NodeId};

#[derive(Debug)]
pub(crate) struct OrderSeq {
    head: Option<NodeId>,
    tail: Option<NodeId>,
}

impl OrderSeq {
    pub fn new() -> Self {
        Self {
            head: None,
            tail: None,
        }
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    #[cfg(test)]
    pub fn tail(&self) -> Option<NodeId> {
        self.tail
    }

    /// Append a freshly created node at the tail.
    pub fn push_back<K, V>(&mut self, nodes: &mut SlotMap<NodeId, Node<K, V>>, id: NodeId) {
        match self.tail {
            None => {
                self.head = Some(id);
                self.tail = Some(id);
            }
            Some(t) => {
                nodes[t].next = Some(id);
                nodes[id].prev = Some(t);
                self.tail = Some(id);
            }
        }
    }

    /// Exchange the sequence positions of `a` and `b`, fixing the neighbors'
    /// pointers and the anchors. The blind prev/next exchange is correct even
    /// when the two nodes are adjacent: the transient self-links cancel out
    /// once both directions have been patched.
    pub fn swap<K, V>(&mut self, nodes: &mut SlotMap<NodeId, Node<K, V>>, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }

        let tmp = nodes[a].prev;
        nodes[a].prev = nodes[b].prev;
        nodes[b].prev = tmp;
        match nodes[a].prev {
            None => self.head = Some(a),
            Some(p) => nodes[p].next = Some(a),
        }
        match nodes[b].prev {
            None => self.head = Some(b),
            Some(p) => nodes[p].next = Some(b),
        }

        let tmp = nodes[a].next;
        nodes[a].next = nodes[b].next;
        nodes[b].next = tmp;
        match nodes[a].next {
            None => self.tail = Some(a),
            Some(n) => nodes[n].prev = Some(a),
        }
        match nodes[b].next {
            None => self.tail = Some(b),
            Some(n) => nodes[n].prev = Some(b),
        }
    }

    /// Remove `id` from the sequence, healing its neighbors and the anchors.
    pub fn unlink<K, V>(&mut self, nodes: &mut SlotMap<NodeId, Node<K, V>>, id: NodeId) {
        let prev = nodes[id].prev.take();
        let next = nodes[id].next.take();
        match prev {
            None => self.head = next,
            Some(p) => nodes[p].next = next,
        }
        match next {
            None => self.tail = prev,
            Some(n) => nodes[n].prev = prev,
        }
    }

    pub fn clear(&mut self) {
        self.head = None;
        self.tail = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Arena = SlotMap<NodeId, Node<u32, ()>>;

    fn push(seq: &mut OrderSeq, nodes: &mut Arena, key: u32) -> NodeId {
        let id = nodes.insert(Node::new(key, (), 0, u64::from(key), None));
        seq.push_back(nodes, id);
        id
    }

    fn collect(seq: &OrderSeq, nodes: &Arena) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cur = seq.head();
        while let Some(n) = cur {
            out.push(nodes[n].key);
            cur = nodes[n].next;
        }
        out
    }

    fn collect_rev(seq: &OrderSeq, nodes: &Arena) -> Vec<u32> {
        let mut out = Vec::new();
        let mut cur = seq.tail();
        while let Some(n) = cur {
            out.push(nodes[n].key);
            cur = nodes[n].prev;
        }
        out.reverse();
        out
    }

    /// Invariant: appended nodes show up at the tail, and forward/backward
    /// walks agree.
    #[test]
    fn push_back_appends_in_order() {
        let mut nodes = Arena::with_key();
        let mut seq = OrderSeq::new();
        for k in 0..5 {
            push(&mut seq, &mut nodes, k);
        }
        assert_eq!(collect(&seq, &nodes), vec![0, 1, 2, 3, 4]);
        assert_eq!(collect_rev(&seq, &nodes), vec![0, 1, 2, 3, 4]);
    }

    /// Invariant: unlinking head, middle, and tail heals neighbors and moves
    /// the anchors.
    #[test]
    fn unlink_head_middle_tail() {
        let mut nodes = Arena::with_key();
        let mut seq = OrderSeq::new();
        let ids: Vec<_> = (0..5).map(|k| push(&mut seq, &mut nodes, k)).collect();

        seq.unlink(&mut nodes, ids[0]);
        assert_eq!(collect(&seq, &nodes), vec![1, 2, 3, 4]);
        seq.unlink(&mut nodes, ids[2]);
        assert_eq!(collect(&seq, &nodes), vec![1, 3, 4]);
        seq.unlink(&mut nodes, ids[4]);
        assert_eq!(collect(&seq, &nodes), vec![1, 3]);
        assert_eq!(collect_rev(&seq, &nodes), vec![1, 3]);

        seq.unlink(&mut nodes, ids[1]);
        seq.unlink(&mut nodes, ids[3]);
        assert_eq!(seq.head(), None);
        assert_eq!(seq.tail(), None);
    }

    /// Invariant: swapping non-adjacent nodes exchanges exactly their two
    /// positions.
    #[test]
    fn swap_non_adjacent() {
        let mut nodes = Arena::with_key();
        let mut seq = OrderSeq::new();
        let ids: Vec<_> = (0..5).map(|k| push(&mut seq, &mut nodes, k)).collect();

        seq.swap(&mut nodes, ids[1], ids[3]);
        assert_eq!(collect(&seq, &nodes), vec![0, 3, 2, 1, 4]);
        assert_eq!(collect_rev(&seq, &nodes), vec![0, 3, 2, 1, 4]);
    }

    /// Invariant: swapping adjacent nodes works in both adjacency directions
    /// and keeps the anchors right when an endpoint is involved.
    #[test]
    fn swap_adjacent_and_endpoints() {
        let mut nodes = Arena::with_key();
        let mut seq = OrderSeq::new();
        let ids: Vec<_> = (0..4).map(|k| push(&mut seq, &mut nodes, k)).collect();

        seq.swap(&mut nodes, ids[1], ids[2]);
        assert_eq!(collect(&seq, &nodes), vec![0, 2, 1, 3]);
        seq.swap(&mut nodes, ids[2], ids[1]);
        assert_eq!(collect(&seq, &nodes), vec![0, 1, 2, 3]);

        seq.swap(&mut nodes, ids[0], ids[3]);
        assert_eq!(collect(&seq, &nodes), vec![3, 1, 2, 0]);
        assert_eq!(collect_rev(&seq, &nodes), vec![3, 1, 2, 0]);

        seq.swap(&mut nodes, ids[3], ids[3]);
        assert_eq!(collect(&seq, &nodes), vec![3, 1, 2, 0]);
    }

    /// Invariant: a two-node sequence survives an endpoint swap.
    #[test]
    fn swap_two_node_sequence() {
        let mut nodes = Arena::with_key();
        let mut seq = OrderSeq::new();
        let a = push(&mut seq, &mut nodes, 10);
        let b = push(&mut seq, &mut nodes, 20);

        seq.swap(&mut nodes, a, b);
        assert_eq!(collect(&seq, &nodes), vec![20, 10]);
        assert_eq!(collect_rev(&seq, &nodes), vec![20, 10]);
    }
}
