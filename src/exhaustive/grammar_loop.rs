//! Grammar-loop intersection: test every binary production at every
//! midpoint.

use super::{CellContext, CellFiller};
use crate::score::is_reachable;

/// The simplest filler; cost is proportional to rules × midpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrammarLoop;

impl CellFiller for GrammarLoop {
    fn fill(&mut self, cx: &mut CellContext<'_>, start: usize, end: usize) {
        let grammar = cx.grammar;
        for mid in cx.policy.midpoints(start, end) {
            for &id in grammar.all_binary() {
                let p = grammar.production(id);
                let left = cx.chart.inside(start, mid, p.left);
                if !is_reachable(left) {
                    continue;
                }
                let right = cx.chart.inside(mid, end, p.right);
                cx.offer_binary(id, start, mid, end, left, right);
            }
        }
    }
}
