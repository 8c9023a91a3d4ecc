//! Best-first search over spans.
//!
//! Instead of queueing edges, the parser keeps one priority per span: the
//! best figure of merit of any binary edge over the span that would improve
//! the binary layer of the slot it targets. The best span is popped and
//! *visited*: the best such edge per parent nonterminal is collected, and a
//! small local queue admits
//! up to `max_local_edges` of them (with the unary extensions of each
//! admission) into the chart. Spans that can use the visited span as a
//! child are then rescanned and re-keyed in place.
//!
//! The span heap is a `PriorityQueue` so keys can move both ways. Ties
//! prefer the narrower span, then the one further left.
//!
//! The search stops once the root slot is populated and no span promises
//! an edge better than the root's figure of merit, when no span holds an
//! improving edge, or after `max_pops` visits. With [`InsideFom`] and
//! unlimited local admission the root score is then exact.
//!
//! [`InsideFom`]: crate::fom::InsideFom

use crate::chart::{Chart, Edge, Pos};
use crate::fom::FigureOfMerit;
use crate::grammar::{Grammar, NonTerminal, ProductionKind};
use crate::parser::{Outcome, ParseOutput, ParseStats};
use crate::policy::{parent_allowed, CellPolicy};
use crate::score::{combine, extend, improves, is_reachable, OrderedScore, Score, UNREACHABLE};
use crate::sentence::Sentence;
use log::{debug, trace};
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

type Span = (Pos, Pos);
type SpanPriority = (OrderedScore, Reverse<Pos>, Reverse<Pos>);

fn span_priority(fom: Score, start: usize, end: usize) -> SpanPriority {
    (OrderedFloat(fom), Reverse((end - start) as Pos), Reverse(start as Pos))
}

/// Entry of the per-visit admission queue.
struct Local {
    fom: OrderedScore,
    seq: u32,
    edge: Edge,
}

impl PartialEq for Local {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Local {}

impl PartialOrd for Local {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Local {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.fom, Reverse(self.seq)).cmp(&(other.fom, Reverse(other.seq)))
    }
}

pub struct CoarseCellParser<'g> {
    grammar: &'g Grammar,
    max_unary_chain: u8,
    max_pops: usize,
    max_local_edges: usize,
    best_per_parent: Vec<Option<Edge>>,
    touched: Vec<NonTerminal>,
}

/// State of one parse.
struct Search<'a> {
    grammar: &'a Grammar,
    policy: &'a dyn CellPolicy,
    fom: &'a dyn FigureOfMerit,
    chart: Chart,
    stats: ParseStats,
    spans: PriorityQueue<Span, SpanPriority>,
    local: BinaryHeap<Local>,
    seq: u32,
}

impl<'g> CoarseCellParser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        CoarseCellParser {
            grammar,
            max_unary_chain: 1,
            max_pops: 0,
            max_local_edges: 0,
            best_per_parent: vec![None; grammar.num_nonterminals()],
            touched: Vec::new(),
        }
    }

    pub fn with_max_unary_chain(mut self, max: u8) -> Self {
        self.max_unary_chain = max;
        self
    }

    /// Stop after `max` span visits (0 = unlimited).
    pub fn with_max_pops(mut self, max: usize) -> Self {
        self.max_pops = max;
        self
    }

    /// Admit at most `max` edges per visit (0 = unlimited).
    pub fn with_max_local_edges(mut self, max: usize) -> Self {
        self.max_local_edges = max;
        self
    }

    pub fn parse(
        &mut self,
        sentence: &Sentence,
        policy: &dyn CellPolicy,
        fom: &mut dyn FigureOfMerit,
    ) -> ParseOutput {
        let grammar = self.grammar;
        let n = sentence.len();
        fom.init(grammar, sentence);

        let mut search = Search {
            grammar,
            policy,
            fom: &*fom,
            chart: Chart::with_max_unary_chain(grammar, n, self.max_unary_chain),
            stats: ParseStats::default(),
            spans: PriorityQueue::new(),
            local: BinaryHeap::new(),
            seq: 0,
        };

        for i in 0..n {
            let seeded = search.chart.seed_lexical(grammar, sentence.token(i), i);
            search.stats.edges_committed += seeded.len();
            for nt in seeded {
                search.push_unaries(i, i + 1, nt, 0);
            }
            search.admit(self.max_local_edges);
        }
        for i in 0..n {
            search.propagate(i, i + 1);
        }

        loop {
            let top = search.spans.peek().map(|(_, p)| p.0.into_inner());
            if search.chart.is_complete() {
                let root_fom = search.chart.fom(0, n, grammar.start_symbol());
                if top.map_or(true, |t| t <= root_fom) {
                    break;
                }
            }
            if top.is_none() {
                break;
            }
            if self.max_pops > 0 && search.stats.spans_visited >= self.max_pops {
                debug!("coarse search stopped after {} visits", search.stats.spans_visited);
                break;
            }
            let ((start, end), priority) = match search.spans.pop() {
                Some(entry) => entry,
                None => break,
            };
            let (start, end) = (start as usize, end as usize);
            search.stats.spans_visited += 1;
            trace!("visit ({}, {}) best edge fom {}", start, end, priority.0);

            self.visit(&mut search, start, end);
            search.rekey(start, end);
            search.propagate(start, end);
        }

        let Search { chart, stats, .. } = search;
        let outcome = if chart.is_complete() {
            Outcome::Parsed
        } else {
            Outcome::NoParse
        };
        debug!(
            "coarse parse of {} words: {} spans visited, {} committed, {:?}",
            n, stats.spans_visited, stats.edges_committed, outcome
        );
        ParseOutput {
            chart,
            outcome,
            stats,
        }
    }

    /// Keep the best improving binary edge per parent over the span, then
    /// admit them through the local queue.
    fn visit(&mut self, search: &mut Search<'_>, start: usize, end: usize) {
        let grammar = self.grammar;
        let chart = &search.chart;
        for mid in search.policy.midpoints(start, end) {
            for &l in chart.left_children(start, mid) {
                let left = chart.inside(start, mid, l);
                for &r in chart.right_children(mid, end) {
                    let right = chart.inside(mid, end, r);
                    for &id in grammar.binary_with_pair(l, r) {
                        let p = grammar.production(id);
                        if !parent_allowed(search.policy, grammar, start, end, p.parent) {
                            continue;
                        }
                        let inside = match combine(p.logprob, left, right) {
                            Some(s) => s,
                            None => continue,
                        };
                        search.stats.edges_built += 1;
                        // Only edges the span's key counted may win a parent.
                        if !improves(inside, chart.layer_inside(start, end, p.parent, 0)) {
                            continue;
                        }
                        let mut edge = Edge::binary(grammar, id, start, mid, end, inside);
                        edge.fom = search.fom.score(&edge, chart);
                        let best = &mut self.best_per_parent[p.parent as usize];
                        if best.is_none() {
                            self.touched.push(p.parent);
                        }
                        if best.map_or(true, |b| improves(edge.fom, b.fom)) {
                            *best = Some(edge);
                        }
                    }
                }
            }
        }

        for nt in self.touched.drain(..) {
            if let Some(edge) = self.best_per_parent[nt as usize].take() {
                search.push_local(edge);
            }
        }
        search.admit(self.max_local_edges);
    }
}

impl<'a> Search<'a> {
    fn push_local(&mut self, edge: Edge) {
        self.seq += 1;
        self.stats.agenda_pushes += 1;
        self.local.push(Local {
            fom: OrderedFloat(edge.fom),
            seq: self.seq,
            edge,
        });
    }

    /// Queue the unary extensions of `layer` of `(start, end, child)`.
    fn push_unaries(&mut self, start: usize, end: usize, child: NonTerminal, layer: u8) {
        if layer >= self.chart.max_unary_chain() || !self.policy.unary_open(start, end) {
            return;
        }
        let score = self.chart.layer_inside(start, end, child, layer);
        for &id in self.grammar.unary_with_child(child) {
            let p = self.grammar.production(id);
            if !parent_allowed(self.policy, self.grammar, start, end, p.parent) {
                continue;
            }
            if let Some(inside) = extend(p.logprob, score) {
                self.stats.edges_built += 1;
                let mut edge = Edge::unary(self.grammar, id, start, end, layer + 1, inside);
                edge.fom = self.fom.score(&edge, &self.chart);
                self.push_local(edge);
            }
        }
    }

    /// Drain the local queue, committing up to `max` improving binary
    /// edges (0 = unlimited).
    fn admit(&mut self, max: usize) {
        let mut admitted = 0;
        while let Some(Local { edge, .. }) = self.local.pop() {
            self.stats.agenda_pops += 1;
            // Unary extensions ride along with their admitted child.
            let binary = edge.kind() == ProductionKind::Binary;
            if binary && max > 0 && admitted >= max {
                continue;
            }
            let (start, end) = (edge.start as usize, edge.end as usize);
            if !improves(edge.inside, self.chart.layer_inside(start, end, edge.parent, edge.layer)) {
                continue;
            }
            self.chart.commit(edge);
            self.stats.edges_committed += 1;
            if binary {
                admitted += 1;
            }
            self.push_unaries(start, end, edge.parent, edge.layer);
        }
        self.local.clear();
        self.seq = 0;
    }

    /// Best FOM of any binary edge over the span that would improve the
    /// binary layer of its target slot.
    fn best_edge_fom(&self, start: usize, end: usize) -> Score {
        if !self.policy.cell_open(start, end) {
            return UNREACHABLE;
        }
        let grammar = self.grammar;
        let chart = &self.chart;
        let mut best = UNREACHABLE;
        for mid in self.policy.midpoints(start, end) {
            for &l in chart.left_children(start, mid) {
                let left = chart.inside(start, mid, l);
                for &r in chart.right_children(mid, end) {
                    let right = chart.inside(mid, end, r);
                    for &id in grammar.binary_with_pair(l, r) {
                        let p = grammar.production(id);
                        let inside = match combine(p.logprob, left, right) {
                            Some(s) => s,
                            None => continue,
                        };
                        if !improves(inside, chart.layer_inside(start, end, p.parent, 0))
                            || !parent_allowed(self.policy, grammar, start, end, p.parent)
                        {
                            continue;
                        }
                        let edge = Edge::binary(grammar, id, start, mid, end, inside);
                        let fom = self.fom.score(&edge, chart);
                        if fom > best {
                            best = fom;
                        }
                    }
                }
            }
        }
        best
    }

    /// Recompute the span's key; spans with nothing left to offer leave
    /// the heap.
    fn rekey(&mut self, start: usize, end: usize) {
        let best = self.best_edge_fom(start, end);
        let span = (start as Pos, end as Pos);
        if is_reachable(best) {
            let priority = span_priority(best, start, end);
            if self.spans.change_priority(&span, priority).is_none() {
                self.spans.push(span, priority);
                self.stats.agenda_pushes += 1;
            }
        } else {
            self.spans.remove(&span);
        }
    }

    /// Rekey every span that has `(start, end)` as a child.
    fn propagate(&mut self, start: usize, end: usize) {
        let n = self.chart.len();
        for k in 0..start {
            self.rekey(k, end);
        }
        for k in (end + 1)..=n {
            self.rekey(start, k);
        }
    }
}
