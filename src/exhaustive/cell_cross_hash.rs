//! Cell-cross-hash intersection.
//!
//! For each populated (left, right) child pair that some production
//! combines, only the best `left + right` over all midpoints is kept. The
//! productions of the pair are then applied once, at that midpoint, so a
//! pair shared by many productions is not re-derived at every midpoint.

use super::{CellContext, CellFiller};
use crate::grammar::NonTerminal;
use crate::score::{Score, UNREACHABLE};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
pub struct CellCrossHash {
    best: FxHashMap<(NonTerminal, NonTerminal), (Score, usize)>,
    lefts: Vec<NonTerminal>,
    rights: Vec<NonTerminal>,
}

impl CellFiller for CellCrossHash {
    fn fill(&mut self, cx: &mut CellContext<'_>, start: usize, end: usize) {
        let grammar = cx.grammar;
        self.best.clear();

        for mid in cx.policy.midpoints(start, end) {
            self.lefts.clear();
            self.lefts.extend_from_slice(cx.chart.left_children(start, mid));
            self.rights.clear();
            self.rights.extend_from_slice(cx.chart.right_children(mid, end));

            for &l in &self.lefts {
                let left = cx.chart.inside(start, mid, l);
                for &r in &self.rights {
                    if grammar.binary_with_pair(l, r).is_empty() {
                        continue;
                    }
                    let sum = left + cx.chart.inside(mid, end, r);
                    // Strict: the earliest midpoint wins ties.
                    let entry = self.best.entry((l, r)).or_insert((UNREACHABLE, mid));
                    if sum > entry.0 {
                        *entry = (sum, mid);
                    }
                }
            }
        }

        let mut pairs: Vec<_> = self.best.iter().map(|(&pair, &(_, mid))| (pair, mid)).collect();
        pairs.sort_unstable();
        for ((l, r), mid) in pairs {
            let left = cx.chart.inside(start, mid, l);
            let right = cx.chart.inside(mid, end, r);
            for &id in grammar.binary_with_pair(l, r) {
                cx.offer_binary(id, start, mid, end, left, right);
            }
        }
    }
}
