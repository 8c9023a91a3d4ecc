//! Cell-cross-list intersection: walk the populated left children of the
//! left cell and look up productions by left child.

use super::{CellContext, CellFiller};
use crate::grammar::NonTerminal;
use crate::score::is_reachable;

#[derive(Debug, Clone, Default)]
pub struct CellCrossList {
    lefts: Vec<NonTerminal>,
}

impl CellFiller for CellCrossList {
    fn fill(&mut self, cx: &mut CellContext<'_>, start: usize, end: usize) {
        let grammar = cx.grammar;
        for mid in cx.policy.midpoints(start, end) {
            self.lefts.clear();
            self.lefts.extend_from_slice(cx.chart.left_children(start, mid));

            for &left_nt in &self.lefts {
                let left = cx.chart.inside(start, mid, left_nt);
                for &id in grammar.binary_with_left(left_nt) {
                    let right = cx.chart.inside(mid, end, grammar.production(id).right);
                    if is_reachable(right) {
                        cx.offer_binary(id, start, mid, end, left, right);
                    }
                }
            }
        }
    }
}
