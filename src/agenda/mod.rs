//! Best-first search over edges.
//!
//! One driver, three seams:
//!
//! - a [`Frontier`] finds the binary edges a slot takes part in once its
//!   score goes up ([`ScanFrontier`] or the lazy [`GhostFrontier`])
//! - a [`CommitRule`] decides whether a popped edge replaces the current
//!   derivation of its slot's layer ([`InsideCommit`] or [`HeuristicCommit`])
//! - an [`EdgeQueue`] orders candidates by figure of merit
//!   ([`FifoTieAgenda`] or the duplicate-suppressing [`MemoAgenda`])
//!
//! Every commit also queues the unary edges over the layer it wrote, up to
//! `max_unary_chain` layers. Lexical cells are seeded left to right and
//! every seeded entry is expanded at once. The search then pops edges until the root slot is
//! committed (`Done`) or the queue runs dry (`Exhausted`).

pub mod frontier;
pub mod ghost;
pub mod queue;

pub use frontier::{ExpandContext, Frontier, ScanFrontier};
pub use ghost::GhostFrontier;
pub use queue::{EdgeQueue, FifoTieAgenda, MemoAgenda};

use crate::chart::{Chart, CommitEffect, Edge, Slot};
use crate::fom::FigureOfMerit;
use crate::grammar::Grammar;
use crate::parser::{Outcome, ParseOutput, ParseStats};
use crate::policy::{parent_allowed, CellPolicy};
use crate::score::{extend, improves, Score};
use crate::sentence::Sentence;
use log::debug;

/// Gate between a popped edge and the chart.
pub trait CommitRule {
    /// The value the rule compares.
    fn key(&self, edge: &Edge) -> Score;

    /// Current value of the slot layer the edge targets, under the same
    /// measure.
    fn current(&self, chart: &Chart, edge: &Edge) -> Score;

    #[inline(always)]
    fn improves(&self, edge: &Edge, chart: &Chart) -> bool {
        improves(self.key(edge), self.current(chart, edge))
    }
}

/// Commit when the inside score beats the slot's.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsideCommit;

impl CommitRule for InsideCommit {
    #[inline(always)]
    fn key(&self, edge: &Edge) -> Score {
        edge.inside
    }

    #[inline(always)]
    fn current(&self, chart: &Chart, edge: &Edge) -> Score {
        chart.layer_inside(edge.start as usize, edge.end as usize, edge.parent, edge.layer)
    }
}

/// Commit when the figure of merit beats the slot's recorded one.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicCommit;

impl CommitRule for HeuristicCommit {
    #[inline(always)]
    fn key(&self, edge: &Edge) -> Score {
        edge.fom
    }

    #[inline(always)]
    fn current(&self, chart: &Chart, edge: &Edge) -> Score {
        chart.layer_fom(edge.start as usize, edge.end as usize, edge.parent, edge.layer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Initializing,
    Searching,
    Done,
    Exhausted,
}

pub struct AgendaParser<'g, F, C, Q> {
    grammar: &'g Grammar,
    frontier: F,
    commit: C,
    queue: Q,
    max_unary_chain: u8,
    max_pops: usize,
    until_exhausted: bool,
    state: ParseState,
    candidates: Vec<Edge>,
}

impl<'g, F: Frontier, C: CommitRule, Q: EdgeQueue> AgendaParser<'g, F, C, Q> {
    pub fn new(grammar: &'g Grammar, frontier: F, commit: C, queue: Q) -> Self {
        AgendaParser {
            grammar,
            frontier,
            commit,
            queue,
            max_unary_chain: 1,
            max_pops: 0,
            until_exhausted: false,
            state: ParseState::Initializing,
            candidates: Vec::new(),
        }
    }

    pub fn with_max_unary_chain(mut self, max: u8) -> Self {
        self.max_unary_chain = max;
        self
    }

    /// Stop after `max` pops (0 = unlimited).
    pub fn with_max_pops(mut self, max: usize) -> Self {
        self.max_pops = max;
        self
    }

    /// Keep popping after the root is resolved, until the queue is empty.
    /// The whole chart then holds best scores, not only the root.
    pub fn until_exhausted(mut self, yes: bool) -> Self {
        self.until_exhausted = yes;
        self
    }

    /// State reached by the last parse.
    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn frontier(&self) -> &F {
        &self.frontier
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn parse(
        &mut self,
        sentence: &Sentence,
        policy: &dyn CellPolicy,
        fom: &mut dyn FigureOfMerit,
    ) -> ParseOutput {
        let grammar = self.grammar;
        let n = sentence.len();
        let mut chart = Chart::with_max_unary_chain(grammar, n, self.max_unary_chain);
        let mut stats = ParseStats::default();

        self.state = ParseState::Initializing;
        self.queue.reset();
        self.frontier.reset(grammar, n);
        fom.init(grammar, sentence);

        for i in 0..n {
            let seeded = chart.seed_lexical(grammar, sentence.token(i), i);
            stats.edges_committed += seeded.len();
            let fresh = CommitEffect {
                is_new: true,
                raised: true,
            };
            for nt in seeded {
                self.expand(&chart, policy, &*fom, &mut stats, (Slot::new(i, i + 1, nt), 0), fresh);
            }
        }

        self.state = if chart.is_complete() && !self.until_exhausted {
            ParseState::Done
        } else {
            ParseState::Searching
        };

        while self.state == ParseState::Searching {
            if self.max_pops > 0 && stats.agenda_pops >= self.max_pops {
                debug!("agenda stopped after {} pops", stats.agenda_pops);
                break;
            }
            let edge = match self.queue.pop() {
                Some(edge) => edge,
                None => break,
            };
            stats.agenda_pops += 1;

            // Anything that loses here lost to a derivation popped earlier.
            if !self.commit.improves(&edge, &chart) {
                continue;
            }
            let effect = chart.commit(edge);
            stats.edges_committed += 1;

            if chart.is_complete() && !self.until_exhausted {
                self.state = ParseState::Done;
                break;
            }
            self.expand(&chart, policy, &*fom, &mut stats, edge.target(), effect);
        }

        if self.state == ParseState::Searching {
            self.state = if chart.is_complete() {
                ParseState::Done
            } else {
                ParseState::Exhausted
            };
        }
        let outcome = if chart.is_complete() {
            Outcome::Parsed
        } else {
            Outcome::NoParse
        };
        debug!(
            "agenda parse of {} words: {:?}, {} pushes, {} pops, {} committed",
            n, self.state, stats.agenda_pushes, stats.agenda_pops, stats.edges_committed
        );
        ParseOutput {
            chart,
            outcome,
            stats,
        }
    }

    /// Collect the unary edges over the committed layer and, when the
    /// slot's score went up, the binary edges over the slot; score them and
    /// push them.
    fn expand(
        &mut self,
        chart: &Chart,
        policy: &dyn CellPolicy,
        fom: &dyn FigureOfMerit,
        stats: &mut ParseStats,
        (slot, layer): (Slot, u8),
        effect: CommitEffect,
    ) {
        let grammar = self.grammar;
        let (start, end) = (slot.start as usize, slot.end as usize);
        self.candidates.clear();

        if layer < chart.max_unary_chain() && policy.unary_open(start, end) {
            let child = chart.layer_inside(start, end, slot.nt, layer);
            for &id in grammar.unary_with_child(slot.nt) {
                let p = grammar.production(id);
                if !parent_allowed(policy, grammar, start, end, p.parent) {
                    continue;
                }
                if let Some(inside) = extend(p.logprob, child) {
                    self.candidates.push(Edge::unary(grammar, id, start, end, layer + 1, inside));
                }
            }
        }

        if effect.raised {
            let mut cx = ExpandContext {
                grammar,
                policy,
                chart,
                stats: &mut *stats,
                out: &mut self.candidates,
            };
            self.frontier.expand(&mut cx, slot, effect.is_new);
        }

        stats.edges_built += self.candidates.len();
        for mut edge in self.candidates.drain(..) {
            edge.fom = fom.score(&edge, chart);
            if self.queue.push(edge) {
                stats.agenda_pushes += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exhaustive::{CellCrossList, ExhaustiveParser};
    use crate::fom::{InsideFom, PriorFom};
    use crate::grammar::tests::fish_grammar;
    use crate::policy::{SpanConstraints, Unconstrained};

    const FISH_TREE: &str = "(ROOT (S (NP (DT The) (NP (NN fish) (NN market))) (VP (VB stands) (RB last))))";

    #[test]
    fn test_every_composition_finds_fish_tree() {
        let g = fish_grammar();
        let sentence = Sentence::new(&g, "The fish market stands last");
        let outputs = vec![
            AgendaParser::new(&g, ScanFrontier, InsideCommit, FifoTieAgenda::new()).parse(
                &sentence,
                &Unconstrained,
                &mut InsideFom,
            ),
            AgendaParser::new(&g, GhostFrontier::new(), InsideCommit, FifoTieAgenda::new()).parse(
                &sentence,
                &Unconstrained,
                &mut InsideFom,
            ),
            AgendaParser::new(&g, ScanFrontier, InsideCommit, MemoAgenda::new()).parse(
                &sentence,
                &Unconstrained,
                &mut InsideFom,
            ),
            AgendaParser::new(&g, GhostFrontier::new(), HeuristicCommit, MemoAgenda::new()).parse(
                &sentence,
                &Unconstrained,
                &mut InsideFom,
            ),
        ];
        let exhaustive = ExhaustiveParser::new(&g, CellCrossList::default()).parse(&sentence, &Unconstrained);
        for out in &outputs {
            assert_eq!(out.outcome, Outcome::Parsed);
            assert_eq!(out.tree(&g, &sentence).unwrap().to_string(), FISH_TREE);
            assert_eq!(out.chart.root_inside(), exhaustive.chart.root_inside());
            assert!(out.stats.agenda_pops > 0);
        }
    }

    #[test]
    fn test_unknown_word() {
        let g = fish_grammar();
        let sentence = Sentence::new(&g, "The fish blorft stands last");
        let mut parser = AgendaParser::new(&g, GhostFrontier::new(), InsideCommit, MemoAgenda::new());
        let out = parser.parse(&sentence, &Unconstrained, &mut InsideFom);
        assert_eq!(parser.state(), ParseState::Done);
        assert_eq!(
            out.tree(&g, &sentence).unwrap().to_string(),
            "(ROOT (S (NP (DT The) (NP (NN fish) (NN blorft))) (VP (VB stands) (RB last))))"
        );
    }

    #[test]
    fn test_exhausted_without_parse() {
        let g = fish_grammar();
        let sentence = Sentence::new(&g, "The fish market stands last last");
        let mut parser = AgendaParser::new(&g, ScanFrontier, InsideCommit, FifoTieAgenda::new());
        let out = parser.parse(&sentence, &Unconstrained, &mut InsideFom);
        assert_eq!(parser.state(), ParseState::Exhausted);
        assert_eq!(out.outcome, Outcome::NoParse);
        assert!(out.tree(&g, &sentence).is_none());
        assert!(parser.queue().is_empty());

        let out = parser.parse(&Sentence::new(&g, ""), &Unconstrained, &mut InsideFom);
        assert_eq!(parser.state(), ParseState::Exhausted);
        assert_eq!(out.outcome, Outcome::NoParse);
    }

    #[test]
    fn test_max_pops_bounds_search() {
        let g = fish_grammar();
        let sentence = Sentence::new(&g, "The fish market stands last");
        let mut parser = AgendaParser::new(&g, ScanFrontier, InsideCommit, FifoTieAgenda::new()).with_max_pops(2);
        let out = parser.parse(&sentence, &Unconstrained, &mut InsideFom);
        assert_eq!(out.stats.agenda_pops, 2);
        assert_eq!(out.outcome, Outcome::NoParse);
        assert_eq!(parser.state(), ParseState::Exhausted);
    }

    #[test]
    fn test_until_exhausted_fills_chart() {
        let g = fish_grammar();
        let sentence = Sentence::new(&g, "The fish market stands last");
        let exhaustive = ExhaustiveParser::new(&g, CellCrossList::default()).parse(&sentence, &Unconstrained);
        let out = AgendaParser::new(&g, GhostFrontier::new(), InsideCommit, FifoTieAgenda::new())
            .until_exhausted(true)
            .parse(&sentence, &Unconstrained, &mut InsideFom);
        assert_eq!(out.chart.entries(), exhaustive.chart.entries());
    }

    #[test]
    fn test_policy_is_consulted() {
        let g = fish_grammar();
        let sentence = Sentence::new(&g, "The fish market stands last");
        let policy = SpanConstraints::new().close(3, 5);
        let out = AgendaParser::new(&g, GhostFrontier::new(), InsideCommit, FifoTieAgenda::new()).parse(
            &sentence,
            &policy,
            &mut InsideFom,
        );
        assert_eq!(out.outcome, Outcome::NoParse);
    }

    #[test]
    fn test_heuristic_commit_records_fom() {
        let g = fish_grammar();
        let sentence = Sentence::new(&g, "The fish market stands last");
        let mut fom = PriorFom::from_grammar(&g);
        let out = AgendaParser::new(&g, ScanFrontier, HeuristicCommit, FifoTieAgenda::new()).parse(
            &sentence,
            &Unconstrained,
            &mut fom,
        );
        assert_eq!(out.outcome, Outcome::Parsed);
        let np = g.nonterminal("NP").unwrap();
        let expected = out.chart.inside(1, 3, np) + fom.prior(np as usize);
        assert_eq!(out.chart.fom(1, 3, np), expected);
        // Lexical entries keep their raw probability.
        let nn = g.nonterminal("NN").unwrap();
        assert_eq!(out.chart.fom(2, 3, nn), out.chart.inside(2, 3, nn));
    }
}
