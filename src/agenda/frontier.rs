//! Discovery of binary edges around a slot whose score went up.

use crate::chart::{Chart, Edge, Slot};
use crate::grammar::{Grammar, ProdId};
use crate::parser::ParseStats;
use crate::policy::{parent_allowed, CellPolicy};
use crate::score::combine;

/// Everything a frontier may read while expanding one slot, plus the
/// buffer it writes candidates to.
pub struct ExpandContext<'a> {
    pub grammar: &'a Grammar,
    pub policy: &'a dyn CellPolicy,
    pub chart: &'a Chart,
    pub stats: &'a mut ParseStats,
    pub(crate) out: &'a mut Vec<Edge>,
}

impl<'a> ExpandContext<'a> {
    /// Build `production` over `(start, mid, end)` from the current chart
    /// entries of its children. Nothing is emitted when either child is
    /// unreachable or the policy forbids the edge.
    #[inline]
    pub fn offer_binary(&mut self, production: ProdId, start: usize, mid: usize, end: usize) -> bool {
        if !self.policy.cell_open(start, end) || !self.policy.midpoints(start, end).contains(&mid) {
            return false;
        }
        let p = self.grammar.production(production);
        if !parent_allowed(self.policy, self.grammar, start, end, p.parent) {
            return false;
        }
        let left = self.chart.inside(start, mid, p.left);
        let right = self.chart.inside(mid, end, p.right);
        match combine(p.logprob, left, right) {
            Some(inside) => {
                self.out.push(Edge::binary(self.grammar, production, start, mid, end, inside));
                true
            }
            None => false,
        }
    }
}

pub trait Frontier {
    /// Prepare per-sentence state for a sentence of `n` words.
    fn reset(&mut self, _grammar: &Grammar, _n: usize) {}

    /// Emit every binary edge that uses `slot` as a child together with a
    /// populated neighbour. Called each time the slot's score goes up;
    /// `is_new` is set on the slot's first commit.
    fn expand(&mut self, cx: &mut ExpandContext<'_>, slot: Slot, is_new: bool);
}

/// Scan all neighbouring cells: `(k, start)` for a left partner and
/// `(end, k)` for a right partner.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanFrontier;

impl Frontier for ScanFrontier {
    fn expand(&mut self, cx: &mut ExpandContext<'_>, slot: Slot, _is_new: bool) {
        let grammar = cx.grammar;
        let (start, end, nt) = (slot.start as usize, slot.end as usize, slot.nt);
        let n = cx.chart.len();

        if grammar.is_left_child(nt) {
            for right_end in (end + 1)..=n {
                for &id in grammar.binary_with_left(nt) {
                    cx.offer_binary(id, start, end, right_end);
                }
            }
        }
        if grammar.is_right_child(nt) {
            for left_start in 0..start {
                for &id in grammar.binary_with_right(nt) {
                    cx.offer_binary(id, left_start, start, end);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tests::fish_grammar;
    use crate::policy::{SpanConstraints, Unconstrained};

    #[test]
    fn test_scan_both_roles() {
        let g = fish_grammar();
        let mut chart = Chart::new(&g, 3);
        // "The fish market"
        for (i, w) in ["The", "fish", "market"].iter().enumerate() {
            chart.seed_lexical(&g, g.word(w).unwrap(), i);
        }
        let nn = g.nonterminal("NN").unwrap();
        let mut stats = ParseStats::default();
        let mut out = Vec::new();
        let mut cx = ExpandContext {
            grammar: &g,
            policy: &Unconstrained,
            chart: &chart,
            stats: &mut stats,
            out: &mut out,
        };
        ScanFrontier.expand(&mut cx, Slot::new(1, 2, nn), true);

        // Left partner DT(0,1): NP -> DT NN; right partner NN(2,3): NP -> NN NN.
        // NP -> DT NP needs NP(1,2), which is empty.
        let mut spans: Vec<_> = out.iter().map(|e| (e.start, e.mid, e.end)).collect();
        spans.sort();
        assert_eq!(spans, vec![(0, 1, 2), (1, 2, 3)]);
    }

    #[test]
    fn test_offer_respects_policy() {
        let g = fish_grammar();
        let mut chart = Chart::new(&g, 2);
        chart.seed_lexical(&g, g.word("The").unwrap(), 0);
        chart.seed_lexical(&g, g.word("fish").unwrap(), 1);
        let dt = g.nonterminal("DT").unwrap();
        let nn = g.nonterminal("NN").unwrap();
        let rule = g.binary_with_pair(dt, nn)[0];
        let policy = SpanConstraints::new().close(0, 2);
        let mut stats = ParseStats::default();
        let mut out = Vec::new();
        let mut cx = ExpandContext {
            grammar: &g,
            policy: &policy,
            chart: &chart,
            stats: &mut stats,
            out: &mut out,
        };
        assert!(!cx.offer_binary(rule, 0, 1, 2));
        assert!(out.is_empty());
    }
}
