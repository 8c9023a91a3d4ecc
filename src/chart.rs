//! Span-indexed Viterbi chart.
//!
//! The chart for an `n`-word sentence has one cell per span `(start, end)`,
//! `0 <= start < end <= n`, and one slot per nonterminal in every cell. All
//! slot properties live in flat vectors addressed by
//! `cell_index(start, end) * num_nonterminals + nt`, where `cell_index` is
//! the triangular offset of the span. Cells and children are referred to by
//! position, never by pointer.
//!
//! Every slot is split into unary layers `0..=max_unary_chain`. Layer 0
//! holds the best binary or lexical derivation; layer `d` holds the best
//! derivation that ends in exactly `d` unary productions over the span, and
//! is built only from layer `d - 1` of its child. The slot's score is the
//! best of its layers. Binary edges read slot scores; unary edges read the
//! one layer they extend, so a backpointer always names the derivation its
//! score was built from.
//!
//! Each cell additionally keeps three short lists of the nonterminals that
//! are populated in it: all of them, those usable as a left child, and those
//! usable as a right child. A nonterminal is appended the first time any of
//! its layers becomes reachable, so strategies can iterate populated entries
//! without scanning the whole nonterminal range.

use crate::grammar::{Grammar, NonTerminal, ProdId, ProductionKind, WordId, NO_CHILD};
use crate::score::{improves, Score, UNREACHABLE};
use crate::sentence::Sentence;
use std::fmt;

/// Position in the sentence.
pub type Pos = u32;

/// One (span, nonterminal) entry of the chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot {
    pub start: Pos,
    pub end: Pos,
    pub nt: NonTerminal,
}

impl Slot {
    #[inline(always)]
    pub fn new(start: usize, end: usize, nt: NonTerminal) -> Self {
        Slot {
            start: start as Pos,
            end: end as Pos,
            nt,
        }
    }
}

/// A candidate derivation: a production applied to child cells.
///
/// The left (or only) child lives in cell `(start, mid)` and the right
/// child in `(mid, end)`. Unary and lexical edges have `mid == end` and
/// `right == NO_CHILD`; lexical edges also have `left == NO_CHILD`.
/// `layer` is the unary layer the edge fills: 0 for binary and lexical
/// edges, one above the child's layer for unary ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
    pub production: ProdId,
    pub parent: NonTerminal,
    pub left: NonTerminal,
    pub right: NonTerminal,
    pub start: Pos,
    pub mid: Pos,
    pub end: Pos,
    pub layer: u8,
    pub inside: Score,
    /// Figure of merit; equals `inside` until a heuristic scores the edge.
    pub fom: Score,
}

impl Edge {
    pub fn binary(
        grammar: &Grammar,
        production: ProdId,
        start: usize,
        mid: usize,
        end: usize,
        inside: Score,
    ) -> Self {
        let p = grammar.production(production);
        Edge {
            production,
            parent: p.parent,
            left: p.left,
            right: p.right,
            start: start as Pos,
            mid: mid as Pos,
            end: end as Pos,
            layer: 0,
            inside,
            fom: inside,
        }
    }

    /// Unary edge filling `layer` (at least 1) from the child's layer below.
    pub fn unary(grammar: &Grammar, production: ProdId, start: usize, end: usize, layer: u8, inside: Score) -> Self {
        debug_assert!(layer > 0);
        let p = grammar.production(production);
        Edge {
            production,
            parent: p.parent,
            left: p.left,
            right: NO_CHILD,
            start: start as Pos,
            mid: end as Pos,
            end: end as Pos,
            layer,
            inside,
            fom: inside,
        }
    }

    /// Lexical edge over the word at `start`, scored by its production.
    pub fn lexical(grammar: &Grammar, production: ProdId, start: usize) -> Self {
        let p = grammar.production(production);
        Edge {
            production,
            parent: p.parent,
            left: NO_CHILD,
            right: NO_CHILD,
            start: start as Pos,
            mid: (start + 1) as Pos,
            end: (start + 1) as Pos,
            layer: 0,
            inside: p.logprob,
            fom: p.logprob,
        }
    }

    #[inline(always)]
    pub fn kind(&self) -> ProductionKind {
        if self.right != NO_CHILD {
            ProductionKind::Binary
        } else if self.left != NO_CHILD {
            ProductionKind::Unary
        } else {
            ProductionKind::Lexical
        }
    }

    #[inline(always)]
    pub fn slot(&self) -> Slot {
        Slot {
            start: self.start,
            end: self.end,
            nt: self.parent,
        }
    }

    /// Slot and layer the edge competes for.
    #[inline(always)]
    pub fn target(&self) -> (Slot, u8) {
        (self.slot(), self.layer)
    }

    #[inline(always)]
    pub fn width(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn left_cell(&self) -> (usize, usize) {
        (self.start as usize, self.mid as usize)
    }

    pub fn right_cell(&self) -> Option<(usize, usize)> {
        match self.kind() {
            ProductionKind::Binary => Some((self.mid as usize, self.end as usize)),
            _ => None,
        }
    }
}

/// What a commit changed, beyond the layer it wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitEffect {
    /// The slot had no derivation in any layer before.
    pub is_new: bool,
    /// The slot's score (best over its layers) went up, so binary edges
    /// built over it would change.
    pub raised: bool,
}

/// The chart for one sentence.
#[derive(Debug, Clone)]
pub struct Chart {
    n: usize,
    num_nts: usize,
    layers: usize,
    start_symbol: NonTerminal,
    inside: Vec<Score>,
    best_layer: Vec<u8>,
    layer_inside: Vec<Score>,
    layer_fom: Vec<Score>,
    layer_edges: Vec<Option<Edge>>,
    populated: Vec<Vec<NonTerminal>>,
    left_children: Vec<Vec<NonTerminal>>,
    right_children: Vec<Vec<NonTerminal>>,
    left_role: Vec<bool>,
    right_role: Vec<bool>,
}

impl Chart {
    /// Allocate an empty chart for a sentence of `n` words, allowing one
    /// unary production per span.
    pub fn new(grammar: &Grammar, n: usize) -> Self {
        Self::with_max_unary_chain(grammar, n, 1)
    }

    /// Allocate an empty chart whose slots hold derivations ending in up
    /// to `max_chain` unary productions.
    pub fn with_max_unary_chain(grammar: &Grammar, n: usize, max_chain: u8) -> Self {
        let num_nts = grammar.num_nonterminals();
        let layers = max_chain as usize + 1;
        let num_cells = n * (n + 1) / 2;
        let slots = num_cells * num_nts;
        Chart {
            n,
            num_nts,
            layers,
            start_symbol: grammar.start_symbol(),
            inside: vec![UNREACHABLE; slots],
            best_layer: vec![0; slots],
            layer_inside: vec![UNREACHABLE; slots * layers],
            layer_fom: vec![UNREACHABLE; slots * layers],
            layer_edges: vec![None; slots * layers],
            populated: vec![Vec::new(); num_cells],
            left_children: vec![Vec::new(); num_cells],
            right_children: vec![Vec::new(); num_cells],
            left_role: (0..num_nts).map(|nt| grammar.is_left_child(nt as NonTerminal)).collect(),
            right_role: (0..num_nts).map(|nt| grammar.is_right_child(nt as NonTerminal)).collect(),
        }
    }

    /// Sentence length.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn num_cells(&self) -> usize {
        self.populated.len()
    }

    pub fn num_nonterminals(&self) -> usize {
        self.num_nts
    }

    /// Longest run of unary productions a slot may end in.
    pub fn max_unary_chain(&self) -> u8 {
        (self.layers - 1) as u8
    }

    /// Triangular offset of span `(start, end)`; cells of the same start
    /// are contiguous.
    #[inline(always)]
    pub fn cell_index(&self, start: usize, end: usize) -> usize {
        debug_assert!(start < end && end <= self.n, "bad span ({}, {})", start, end);
        start * (2 * self.n - start + 1) / 2 + (end - start - 1)
    }

    #[inline(always)]
    fn slot_index(&self, start: usize, end: usize, nt: NonTerminal) -> usize {
        self.cell_index(start, end) * self.num_nts + nt as usize
    }

    #[inline(always)]
    fn layer_index(&self, slot: usize, layer: u8) -> usize {
        debug_assert!((layer as usize) < self.layers, "layer {} out of range", layer);
        slot * self.layers + layer as usize
    }

    /// Best inside score of the slot over all of its layers.
    #[inline(always)]
    pub fn inside(&self, start: usize, end: usize, nt: NonTerminal) -> Score {
        self.inside[self.slot_index(start, end, nt)]
    }

    #[inline(always)]
    pub fn layer_inside(&self, start: usize, end: usize, nt: NonTerminal, layer: u8) -> Score {
        self.layer_inside[self.layer_index(self.slot_index(start, end, nt), layer)]
    }

    /// Figure of merit recorded with the slot's best derivation.
    #[inline(always)]
    pub fn fom(&self, start: usize, end: usize, nt: NonTerminal) -> Score {
        let idx = self.slot_index(start, end, nt);
        self.layer_fom[self.layer_index(idx, self.best_layer[idx])]
    }

    #[inline(always)]
    pub fn layer_fom(&self, start: usize, end: usize, nt: NonTerminal, layer: u8) -> Score {
        self.layer_fom[self.layer_index(self.slot_index(start, end, nt), layer)]
    }

    /// Backpointer of the slot's best derivation.
    #[inline(always)]
    pub fn edge(&self, start: usize, end: usize, nt: NonTerminal) -> Option<&Edge> {
        let idx = self.slot_index(start, end, nt);
        self.layer_edges[self.layer_index(idx, self.best_layer[idx])].as_ref()
    }

    #[inline(always)]
    pub fn layer_edge(&self, start: usize, end: usize, nt: NonTerminal, layer: u8) -> Option<&Edge> {
        self.layer_edges[self.layer_index(self.slot_index(start, end, nt), layer)].as_ref()
    }

    /// Number of consecutive unary productions at the top of the slot's
    /// best derivation.
    #[inline(always)]
    pub fn unary_depth(&self, start: usize, end: usize, nt: NonTerminal) -> u8 {
        self.best_layer[self.slot_index(start, end, nt)]
    }

    #[inline(always)]
    pub fn is_populated(&self, start: usize, end: usize, nt: NonTerminal) -> bool {
        self.edge(start, end, nt).is_some()
    }

    #[inline(always)]
    pub fn populated(&self, start: usize, end: usize) -> &[NonTerminal] {
        &self.populated[self.cell_index(start, end)]
    }

    /// Populated nonterminals that are the left child of some production.
    #[inline(always)]
    pub fn left_children(&self, start: usize, end: usize) -> &[NonTerminal] {
        &self.left_children[self.cell_index(start, end)]
    }

    /// Populated nonterminals that are the right child of some production.
    #[inline(always)]
    pub fn right_children(&self, start: usize, end: usize) -> &[NonTerminal] {
        &self.right_children[self.cell_index(start, end)]
    }

    /// Store `edge` as the best derivation of its slot's layer.
    ///
    /// The caller has already decided that the edge improves that layer
    /// (see the commit rules in the agenda module).
    pub fn commit(&mut self, edge: Edge) -> CommitEffect {
        let (start, end) = (edge.start as usize, edge.end as usize);
        let idx = self.slot_index(start, end, edge.parent);
        let at = self.layer_index(idx, edge.layer);
        let cell = self.cell_index(start, end);

        let is_new = self.layer_edges[self.layer_index(idx, self.best_layer[idx])].is_none();
        self.layer_inside[at] = edge.inside;
        self.layer_fom[at] = edge.fom;
        self.layer_edges[at] = Some(edge);

        let raised = is_new || improves(edge.inside, self.inside[idx]);
        if raised {
            self.best_layer[idx] = edge.layer;
            self.inside[idx] = edge.inside;
        }

        if is_new {
            let nt = edge.parent;
            self.populated[cell].push(nt);
            if self.left_role[nt as usize] {
                self.left_children[cell].push(nt);
            }
            if self.right_role[nt as usize] {
                self.right_children[cell].push(nt);
            }
        }
        CommitEffect { is_new, raised }
    }

    /// Commit the lexical productions of `word` at position `i`; returns
    /// the nonterminals whose slots changed.
    pub fn seed_lexical(&mut self, grammar: &Grammar, word: WordId, i: usize) -> Vec<NonTerminal> {
        let mut changed = Vec::new();
        for &id in grammar.lexical_with_token(word) {
            let edge = Edge::lexical(grammar, id, i);
            if improves(edge.inside, self.layer_inside(i, i + 1, edge.parent, 0)) {
                self.commit(edge);
                changed.push(edge.parent);
            }
        }
        changed
    }

    /// Inside score of the start symbol over the whole sentence.
    pub fn root_inside(&self) -> Score {
        if self.n == 0 {
            return UNREACHABLE;
        }
        self.inside(0, self.n, self.start_symbol)
    }

    /// Whether the root cell holds a derivation of the start symbol.
    pub fn is_complete(&self) -> bool {
        self.n > 0 && self.is_populated(0, self.n, self.start_symbol)
    }

    /// All populated slots with their inside scores, by span then nonterminal.
    pub fn entries(&self) -> Vec<(Slot, Score)> {
        let mut out = Vec::new();
        for start in 0..self.n {
            for end in (start + 1)..=self.n {
                let mut nts = self.populated(start, end).to_vec();
                nts.sort_unstable();
                for nt in nts {
                    out.push((Slot::new(start, end, nt), self.inside(start, end, nt)));
                }
            }
        }
        out
    }

    /// Number of populated slots.
    pub fn num_populated(&self) -> usize {
        self.populated.iter().map(|c| c.len()).sum()
    }

    /// Follow backpointers from the root to the best derivation.
    ///
    /// Returns `None` when the sentence has no parse.
    pub fn tree(&self, grammar: &Grammar, sentence: &Sentence) -> Option<ParseTree> {
        if !self.is_complete() {
            return None;
        }
        let root = self.start_symbol;
        self.subtree(grammar, sentence, 0, self.n, root, self.unary_depth(0, self.n, root))
    }

    fn subtree(
        &self,
        grammar: &Grammar,
        sentence: &Sentence,
        start: usize,
        end: usize,
        nt: NonTerminal,
        layer: u8,
    ) -> Option<ParseTree> {
        let edge = self.layer_edge(start, end, nt, layer)?;
        let label = grammar.nonterminal_name(nt).to_string();
        match edge.kind() {
            ProductionKind::Lexical => Some(ParseTree::Leaf {
                label,
                word: sentence.word(start).to_string(),
            }),
            ProductionKind::Unary => {
                let child = self.subtree(grammar, sentence, start, end, edge.left, layer - 1)?;
                Some(ParseTree::Node {
                    label,
                    children: vec![child],
                })
            }
            ProductionKind::Binary => {
                let mid = edge.mid as usize;
                let (l, r) = (edge.left, edge.right);
                let left = self.subtree(grammar, sentence, start, mid, l, self.unary_depth(start, mid, l))?;
                let right = self.subtree(grammar, sentence, mid, end, r, self.unary_depth(mid, end, r))?;
                Some(ParseTree::Node {
                    label,
                    children: vec![left, right],
                })
            }
        }
    }
}

/// Best derivation read back from a chart.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseTree {
    Leaf { label: String, word: String },
    Node { label: String, children: Vec<ParseTree> },
}

impl ParseTree {
    pub fn label(&self) -> &str {
        match self {
            ParseTree::Leaf { label, .. } | ParseTree::Node { label, .. } => label,
        }
    }

    /// Preterminal labels, left to right.
    pub fn tags(&self) -> Vec<&str> {
        match self {
            ParseTree::Leaf { label, .. } => vec![label.as_str()],
            ParseTree::Node { children, .. } => children.iter().flat_map(|c| c.tags()).collect(),
        }
    }

    /// Surface words, left to right.
    pub fn words(&self) -> Vec<&str> {
        match self {
            ParseTree::Leaf { word, .. } => vec![word.as_str()],
            ParseTree::Node { children, .. } => children.iter().flat_map(|c| c.words()).collect(),
        }
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseTree::Leaf { label, word } => write!(f, "({} {})", label, word),
            ParseTree::Node { label, children } => {
                write!(f, "({}", label)?;
                for child in children {
                    write!(f, " {}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
