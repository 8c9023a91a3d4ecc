//! Exhaustive bottom-up (CYK) chart filling.
//!
//! Spans are processed in order of increasing width. For each open span a
//! [`CellFiller`] discovers the binary edges whose children are present in
//! the two child cells and offers them to the cell; then up to
//! `max_unary_chain` unary passes run over the populated entries, pass `d`
//! filling unary layer `d` from layer `d - 1`. Lexical cells are seeded
//! directly from the lexicon.
//!
//! The fillers differ only in how they find matching productions:
//!
//! | filler | iterates | cost per span |
//! |---|---|---|
//! | [`GrammarLoop`] | every binary production at every midpoint | rules × midpoints |
//! | [`CellCrossList`] | populated left children, productions by left child | populated × matching |
//! | [`CellCrossHash`] | populated child pairs; best midpoint per pair | pairs × midpoints + rules |
//! | [`ExtentFiltered`] | every binary production over its feasible midpoints | rules × feasible |
//!
//! Final best scores are the same for all of them; only ties may resolve
//! to different backpointers.

pub mod cell_cross_hash;
pub mod cell_cross_list;
pub mod extent;
pub mod grammar_loop;

pub use cell_cross_hash::CellCrossHash;
pub use cell_cross_list::CellCrossList;
pub use extent::ExtentFiltered;
pub use grammar_loop::GrammarLoop;

use crate::chart::{Chart, Edge};
use crate::grammar::{Grammar, ProdId};
use crate::parser::{Outcome, ParseOutput, ParseStats};
use crate::policy::{parent_allowed, CellPolicy};
use crate::score::{combine, extend, improves, Score};
use crate::sentence::Sentence;
use log::debug;

/// Discovery of binary edges for one span.
pub trait CellFiller {
    /// Prepare per-sentence state for a sentence of `n` words.
    fn reset(&mut self, _grammar: &Grammar, _n: usize) {}

    /// Offer every binary edge over `(start, end)` through `cx`.
    fn fill(&mut self, cx: &mut CellContext<'_>, start: usize, end: usize);

    /// Called once a cell is final (after its unary passes).
    fn cell_finished(&mut self, _chart: &Chart, _start: usize, _end: usize) {}
}

/// What a filler may touch while filling one span.
pub struct CellContext<'a> {
    pub grammar: &'a Grammar,
    pub policy: &'a dyn CellPolicy,
    pub chart: &'a mut Chart,
    pub stats: &'a mut ParseStats,
}

impl<'a> CellContext<'a> {
    /// Build `production` over `(start, mid, end)` from the given child
    /// scores and commit it if it improves the parent's binary layer.
    #[inline]
    pub fn offer_binary(
        &mut self,
        production: ProdId,
        start: usize,
        mid: usize,
        end: usize,
        left: Score,
        right: Score,
    ) -> bool {
        let p = self.grammar.production(production);
        let inside = match combine(p.logprob, left, right) {
            Some(s) => s,
            None => return false,
        };
        self.stats.edges_built += 1;
        if !improves(inside, self.chart.layer_inside(start, end, p.parent, 0))
            || !parent_allowed(self.policy, self.grammar, start, end, p.parent)
        {
            return false;
        }
        self.chart.commit(Edge::binary(self.grammar, production, start, mid, end, inside));
        self.stats.edges_committed += 1;
        true
    }

    /// Run the unary passes over `(start, end)`, one per layer above the
    /// binary one. Pass `d` reads only layer `d - 1`, which no later
    /// commit in the pass can touch.
    pub fn unary_passes(&mut self, start: usize, end: usize) {
        if !self.policy.unary_open(start, end) {
            return;
        }
        let grammar = self.grammar;
        for layer in 1..=self.chart.max_unary_chain() {
            let mut changed = false;
            let mut i = 0;
            while i < self.chart.populated(start, end).len() {
                let child = self.chart.populated(start, end)[i];
                i += 1;
                let score = self.chart.layer_inside(start, end, child, layer - 1);
                for &id in grammar.unary_with_child(child) {
                    let p = grammar.production(id);
                    let inside = match extend(p.logprob, score) {
                        Some(s) => s,
                        None => continue,
                    };
                    self.stats.edges_built += 1;
                    if improves(inside, self.chart.layer_inside(start, end, p.parent, layer))
                        && parent_allowed(self.policy, grammar, start, end, p.parent)
                    {
                        self.chart.commit(Edge::unary(grammar, id, start, end, layer, inside));
                        self.stats.edges_committed += 1;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }
}

/// Bottom-up parser parameterized by its binary-edge discovery.
pub struct ExhaustiveParser<'g, C: CellFiller> {
    grammar: &'g Grammar,
    filler: C,
    max_unary_chain: u8,
}

impl<'g, C: CellFiller> ExhaustiveParser<'g, C> {
    pub fn new(grammar: &'g Grammar, filler: C) -> Self {
        ExhaustiveParser {
            grammar,
            filler,
            max_unary_chain: 1,
        }
    }

    pub fn with_max_unary_chain(mut self, max: u8) -> Self {
        self.max_unary_chain = max;
        self
    }

    pub fn filler(&self) -> &C {
        &self.filler
    }

    pub fn parse(&mut self, sentence: &Sentence, policy: &dyn CellPolicy) -> ParseOutput {
        let grammar = self.grammar;
        let n = sentence.len();
        let mut chart = Chart::with_max_unary_chain(grammar, n, self.max_unary_chain);
        let mut stats = ParseStats::default();
        self.filler.reset(grammar, n);

        for i in 0..n {
            stats.edges_committed += chart.seed_lexical(grammar, sentence.token(i), i).len();
            let mut cx = CellContext {
                grammar,
                policy,
                chart: &mut chart,
                stats: &mut stats,
            };
            cx.unary_passes(i, i + 1);
            self.filler.cell_finished(&chart, i, i + 1);
        }

        for width in 2..=n {
            for start in 0..=(n - width) {
                let end = start + width;
                if policy.cell_open(start, end) {
                    let mut cx = CellContext {
                        grammar,
                        policy,
                        chart: &mut chart,
                        stats: &mut stats,
                    };
                    self.filler.fill(&mut cx, start, end);
                    cx.unary_passes(start, end);
                }
                self.filler.cell_finished(&chart, start, end);
            }
        }

        let outcome = if chart.is_complete() {
            Outcome::Parsed
        } else {
            Outcome::NoParse
        };
        debug!(
            "exhaustive parse of {} words: {} edges built, {} committed, {:?}",
            n, stats.edges_built, stats.edges_committed, outcome
        );
        ParseOutput {
            chart,
            outcome,
            stats,
        }
    }
}
