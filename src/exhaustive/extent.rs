//! Extent-filtered intersection.
//!
//! For every nonterminal we remember, per sentence position, how far the
//! spans it has been built over reach:
//!
//! - `narrow_right[nt][start]` / `wide_right[nt][start]`: smallest and
//!   largest `end` of a populated `(start, end)` slot for `nt`
//! - `narrow_left[nt][end]` / `wide_left[nt][end]`: largest and smallest
//!   `start` of a populated `(start, end)` slot for `nt`
//!
//! A production `A -> B C` over `(start, end)` needs `B` over `(start, mid)`
//! and `C` over `(mid, end)`, so `mid` must lie in
//! `[narrow_right[B][start], wide_right[B][start]]` and in
//! `[wide_left[C][end], narrow_left[C][end]]`. Empty intersections skip the
//! production without touching the chart.

use super::{CellContext, CellFiller};
use crate::chart::Chart;
use crate::grammar::{Grammar, NonTerminal};
use crate::score::is_reachable;

#[derive(Debug, Clone, Default)]
pub struct ExtentFiltered {
    stride: usize,
    narrow_right: Vec<i32>,
    wide_right: Vec<i32>,
    narrow_left: Vec<i32>,
    wide_left: Vec<i32>,
    /// Productions skipped because no midpoint was feasible.
    skipped: usize,
}

impl ExtentFiltered {
    pub fn new() -> Self {
        Self::default()
    }

    /// Productions skipped by the extent check in the last parse.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    #[inline(always)]
    fn at(&self, nt: NonTerminal, pos: usize) -> usize {
        nt as usize * self.stride + pos
    }

    /// Feasible midpoints for `left` starting at `start` and `right` ending
    /// at `end`, as an inclusive range; `None` when empty.
    #[inline]
    fn feasible(&self, left: NonTerminal, right: NonTerminal, start: usize, end: usize) -> Option<(usize, usize)> {
        let l = self.at(left, start);
        let r = self.at(right, end);
        let lo = self.narrow_right[l].max(self.wide_left[r]);
        let hi = self.wide_right[l].min(self.narrow_left[r]);
        if lo > hi {
            None
        } else {
            Some((lo as usize, hi as usize))
        }
    }
}

impl CellFiller for ExtentFiltered {
    fn reset(&mut self, grammar: &Grammar, n: usize) {
        let stride = n + 1;
        let size = grammar.num_nonterminals() * stride;
        let far = stride as i32;
        self.stride = stride;
        self.skipped = 0;
        self.narrow_right.clear();
        self.narrow_right.resize(size, far);
        self.wide_right.clear();
        self.wide_right.resize(size, -1);
        self.narrow_left.clear();
        self.narrow_left.resize(size, -1);
        self.wide_left.clear();
        self.wide_left.resize(size, far);
    }

    fn fill(&mut self, cx: &mut CellContext<'_>, start: usize, end: usize) {
        let grammar = cx.grammar;
        let allowed = cx.policy.midpoints(start, end);
        if allowed.is_empty() {
            return;
        }

        for &id in grammar.all_binary() {
            let p = grammar.production(id);
            let (lo, hi) = match self.feasible(p.left, p.right, start, end) {
                Some(range) => range,
                None => {
                    self.skipped += 1;
                    continue;
                }
            };
            let lo = lo.max(allowed.start);
            let hi = hi.min(allowed.end - 1);
            for mid in lo..=hi {
                let left = cx.chart.inside(start, mid, p.left);
                if !is_reachable(left) {
                    continue;
                }
                let right = cx.chart.inside(mid, end, p.right);
                cx.offer_binary(id, start, mid, end, left, right);
            }
        }
    }

    fn cell_finished(&mut self, chart: &Chart, start: usize, end: usize) {
        for &nt in chart.populated(start, end) {
            let l = self.at(nt, start);
            let r = self.at(nt, end);
            let (s, e) = (start as i32, end as i32);
            self.narrow_right[l] = self.narrow_right[l].min(e);
            self.wide_right[l] = self.wide_right[l].max(e);
            self.narrow_left[r] = self.narrow_left[r].max(s);
            self.wide_left[r] = self.wide_left[r].min(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exhaustive::ExhaustiveParser;
    use crate::grammar::tests::fish_grammar;
    use crate::policy::Unconstrained;
    use crate::sentence::Sentence;

    #[test]
    fn test_tables_after_parse() {
        let g = fish_grammar();
        let sentence = Sentence::new(&g, "The fish market stands last");
        let mut parser = ExhaustiveParser::new(&g, ExtentFiltered::new());
        parser.parse(&sentence, &Unconstrained);
        let ext = parser.filler();

        let np = g.nonterminal("NP").unwrap();
        let vp = g.nonterminal("VP").unwrap();
        // NP over (1,3) and (0,3); NP never starts at 3.
        assert_eq!(ext.narrow_right[ext.at(np, 1)], 3);
        assert_eq!(ext.narrow_left[ext.at(np, 3)], 1);
        assert_eq!(ext.wide_left[ext.at(np, 3)], 0);
        assert_eq!(ext.wide_right[ext.at(np, 3)], -1);
        assert_eq!(ext.feasible(np, vp, 0, 5), Some((3, 3)));
        assert!(ext.skipped() > 0);
    }

    #[test]
    fn test_reset_between_sentences() {
        let g = fish_grammar();
        let mut parser = ExhaustiveParser::new(&g, ExtentFiltered::new());
        parser.parse(&Sentence::new(&g, "The fish market stands last"), &Unconstrained);
        let out = parser.parse(&Sentence::new(&g, "fish stands"), &Unconstrained);

        let nn = g.nonterminal("NN").unwrap();
        let ext = parser.filler();
        assert_eq!(ext.stride, 3);
        assert_eq!(ext.narrow_right[ext.at(nn, 0)], 1);
        // NP -> NN NN over "fish stands" is the only binary derivation.
        let np = g.nonterminal("NP").unwrap();
        assert!(out.chart.is_populated(0, 2, np));
    }
}
