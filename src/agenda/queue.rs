//! Edge agendas.

use crate::chart::{Edge, Slot};
use crate::score::{improves, OrderedScore, Score};
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use rustc_hash::FxHashMap;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Max-first queue of candidate edges, ordered by `Edge::fom`.
pub trait EdgeQueue {
    /// Drop everything; called at the start of each parse.
    fn reset(&mut self);

    /// Offer an edge. Returns `false` when the queue declined it.
    fn push(&mut self, edge: Edge) -> bool;

    fn pop(&mut self) -> Option<Edge>;

    /// Outstanding entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Entry {
    fom: OrderedScore,
    seq: u64,
    edge: Edge,
}

impl Entry {
    #[inline(always)]
    fn key(&self) -> (OrderedScore, Reverse<u64>) {
        (self.fom, Reverse(self.seq))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Plain binary heap. Every push is kept; edges of equal FOM pop in the
/// order they were pushed.
#[derive(Default)]
pub struct FifoTieAgenda {
    heap: BinaryHeap<Entry>,
    seq: u64,
}

impl FifoTieAgenda {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EdgeQueue for FifoTieAgenda {
    fn reset(&mut self) {
        self.heap.clear();
        self.seq = 0;
    }

    fn push(&mut self, edge: Edge) -> bool {
        self.seq += 1;
        self.heap.push(Entry {
            fom: OrderedFloat(edge.fom),
            seq: self.seq,
            edge,
        });
        true
    }

    fn pop(&mut self) -> Option<Edge> {
        self.heap.pop().map(|e| e.edge)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

/// Agenda with duplicate suppression.
///
/// Entries are keyed by target slot layer, so at most one edge per slot
/// layer is outstanding. A push is accepted only when its FOM beats the
/// best FOM ever pushed for that layer in this parse; the accepted edge
/// replaces any outstanding one and the priority is raised in place.
#[derive(Default)]
pub struct MemoAgenda {
    queue: PriorityQueue<(Slot, u8), (OrderedScore, Reverse<u64>)>,
    pending: FxHashMap<(Slot, u8), Edge>,
    best_pushed: FxHashMap<(Slot, u8), Score>,
    seq: u64,
    suppressed: usize,
}

impl MemoAgenda {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes declined in the current parse.
    pub fn suppressed(&self) -> usize {
        self.suppressed
    }

    /// Best FOM pushed so far for `layer` of `slot`.
    pub fn best_pushed(&self, slot: Slot, layer: u8) -> Option<Score> {
        self.best_pushed.get(&(slot, layer)).copied()
    }
}

impl EdgeQueue for MemoAgenda {
    fn reset(&mut self) {
        self.queue.clear();
        self.pending.clear();
        self.best_pushed.clear();
        self.seq = 0;
        self.suppressed = 0;
    }

    fn push(&mut self, edge: Edge) -> bool {
        let target = edge.target();
        if let Some(&best) = self.best_pushed.get(&target) {
            if !improves(edge.fom, best) {
                self.suppressed += 1;
                return false;
            }
        }
        self.seq += 1;
        self.best_pushed.insert(target, edge.fom);
        self.pending.insert(target, edge);
        self.queue.push(target, (OrderedFloat(edge.fom), Reverse(self.seq)));
        true
    }

    fn pop(&mut self) -> Option<Edge> {
        let (target, _) = self.queue.pop()?;
        self.pending.remove(&target)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tests::fish_grammar;

    fn np_edges() -> Vec<Edge> {
        let g = fish_grammar();
        let dt = g.nonterminal("DT").unwrap();
        let nn = g.nonterminal("NN").unwrap();
        let rule = g.binary_with_pair(dt, nn)[0];
        [-3.0, -1.0, -2.0, -1.0]
            .iter()
            .map(|&s| Edge::binary(&g, rule, 0, 1, 2, s))
            .collect()
    }

    #[test]
    fn test_fifo_ties() {
        let g = fish_grammar();
        let nn = g.nonterminal("NN").unwrap();
        let mut q = FifoTieAgenda::new();
        let mut edges = np_edges();
        // Same FOM, different targets: insertion order decides.
        edges[3] = Edge::binary(&g, g.binary_with_pair(nn, nn)[0], 1, 2, 3, -1.0);
        for e in &edges {
            assert!(q.push(*e));
        }
        assert_eq!(q.len(), 4);
        assert_eq!(q.pop().unwrap().start, 0);
        assert_eq!(q.pop().unwrap().start, 1);
        assert_eq!(q.pop().unwrap().inside, -2.0);
        assert_eq!(q.pop().unwrap().inside, -3.0);
        assert!(q.pop().is_none());
    }

    #[test]
    fn test_memo_one_entry_per_slot() {
        let mut q = MemoAgenda::new();
        let edges = np_edges();
        assert!(q.push(edges[0]));
        assert!(q.push(edges[1]));
        // Worse or equal than the best pushed.
        assert!(!q.push(edges[2]));
        assert!(!q.push(edges[3]));
        assert_eq!(q.len(), 1);
        assert_eq!(q.suppressed(), 2);

        let e = q.pop().unwrap();
        assert_eq!(e.inside, -1.0);
        assert!(q.is_empty());

        // The table outlives the pop.
        assert!(!q.push(edges[2]));
        assert_eq!(q.best_pushed(e.slot(), 0), Some(-1.0));
        assert_eq!(q.best_pushed(e.slot(), 1), None);

        q.reset();
        assert!(q.push(edges[2]));
    }

    #[test]
    fn test_memo_layers_are_separate() {
        let g = fish_grammar();
        let s = g.nonterminal("S").unwrap();
        let root_rule = g.unary_with_child(s)[0];
        let mut q = MemoAgenda::new();
        // Same slot, different layers: the worse edge is not a duplicate.
        let low = Edge::unary(&g, root_rule, 0, 2, 1, -4.0);
        let mut high = np_edges()[1];
        high.parent = low.parent;
        assert!(q.push(high));
        assert!(q.push(low));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop().unwrap().layer, 0);
        assert_eq!(q.pop().unwrap().layer, 1);
    }
}
