//! Strategy selection and the results every strategy returns.

use crate::agenda::{
    AgendaParser, CommitRule, EdgeQueue, FifoTieAgenda, Frontier, GhostFrontier, HeuristicCommit, InsideCommit,
    MemoAgenda, ScanFrontier,
};
use crate::chart::{Chart, ParseTree};
use crate::coarse::CoarseCellParser;
use crate::exhaustive::{CellCrossHash, CellCrossList, CellFiller, ExhaustiveParser, ExtentFiltered, GrammarLoop};
use crate::fom::{FigureOfMerit, InsideFom};
use crate::grammar::Grammar;
use crate::policy::{CellPolicy, Unconstrained};
use crate::score::Score;
use crate::sentence::Sentence;

/// How binary edges are discovered by the exhaustive parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intersection {
    GrammarLoop,
    CellCrossList,
    CellCrossHash,
    ExtentFiltered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontierKind {
    Scan,
    Ghost,
}

/// What the agenda's commit test compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Derivation probability.
    Inside,
    /// The figure of merit itself.
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Exhaustive(Intersection),
    Agenda { frontier: FrontierKind, objective: Objective },
    CoarseCell,
}

/// Configuration for the parser.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    pub strategy: Strategy,
    /// Maximum number of consecutive unary productions over one span.
    pub max_unary_chain: u8,
    /// Maximum agenda pops or span visits (0 = unlimited).
    pub max_pops: usize,
    /// Maximum binary admissions per coarse span visit (0 = unlimited).
    pub max_local_edges: usize,
    /// Suppress duplicate agenda entries per slot.
    pub memoize: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            strategy: Strategy::Exhaustive(Intersection::CellCrossList),
            max_unary_chain: 1,
            max_pops: 0,
            max_local_edges: 0,
            memoize: false,
        }
    }
}

/// Counters for one parse.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Candidate binary and unary edges constructed.
    pub edges_built: usize,
    pub edges_committed: usize,
    pub agenda_pushes: usize,
    pub agenda_pops: usize,
    pub spans_visited: usize,
    pub ghost_completions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Parsed,
    NoParse,
}

/// The filled chart with its outcome.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub chart: Chart,
    pub outcome: Outcome,
    pub stats: ParseStats,
}

impl ParseOutput {
    pub fn is_parsed(&self) -> bool {
        self.outcome == Outcome::Parsed
    }

    /// Inside score of the root, `None` without a parse.
    pub fn score(&self) -> Option<Score> {
        if self.is_parsed() {
            Some(self.chart.root_inside())
        } else {
            None
        }
    }

    pub fn tree(&self, grammar: &Grammar, sentence: &Sentence) -> Option<ParseTree> {
        self.chart.tree(grammar, sentence)
    }
}

/// A grammar bound to a configuration.
///
/// Parses are independent: each call allocates its own chart and agenda,
/// so one `Parser` can serve many sentences, one at a time or from
/// several threads.
#[derive(Debug, Clone)]
pub struct Parser<'g> {
    grammar: &'g Grammar,
    config: ParserConfig,
}

impl<'g> Parser<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self::with_config(grammar, ParserConfig::default())
    }

    pub fn with_config(grammar: &'g Grammar, config: ParserConfig) -> Self {
        Parser { grammar, config }
    }

    pub fn grammar(&self) -> &'g Grammar {
        self.grammar
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse without cell constraints, ordering search by inside score.
    pub fn parse(&self, sentence: &Sentence) -> ParseOutput {
        self.parse_with(sentence, &Unconstrained, &mut InsideFom)
    }

    pub fn parse_with(
        &self,
        sentence: &Sentence,
        policy: &dyn CellPolicy,
        fom: &mut dyn FigureOfMerit,
    ) -> ParseOutput {
        let config = &self.config;
        match config.strategy {
            Strategy::Exhaustive(Intersection::GrammarLoop) => self.exhaustive(GrammarLoop, sentence, policy),
            Strategy::Exhaustive(Intersection::CellCrossList) => {
                self.exhaustive(CellCrossList::default(), sentence, policy)
            }
            Strategy::Exhaustive(Intersection::CellCrossHash) => {
                self.exhaustive(CellCrossHash::default(), sentence, policy)
            }
            Strategy::Exhaustive(Intersection::ExtentFiltered) => {
                self.exhaustive(ExtentFiltered::new(), sentence, policy)
            }
            Strategy::Agenda { frontier, objective } => match (frontier, objective) {
                (FrontierKind::Scan, Objective::Inside) => self.agenda(ScanFrontier, InsideCommit, sentence, policy, fom),
                (FrontierKind::Scan, Objective::Heuristic) => {
                    self.agenda(ScanFrontier, HeuristicCommit, sentence, policy, fom)
                }
                (FrontierKind::Ghost, Objective::Inside) => {
                    self.agenda(GhostFrontier::new(), InsideCommit, sentence, policy, fom)
                }
                (FrontierKind::Ghost, Objective::Heuristic) => {
                    self.agenda(GhostFrontier::new(), HeuristicCommit, sentence, policy, fom)
                }
            },
            Strategy::CoarseCell => CoarseCellParser::new(self.grammar)
                .with_max_unary_chain(config.max_unary_chain)
                .with_max_pops(config.max_pops)
                .with_max_local_edges(config.max_local_edges)
                .parse(sentence, policy, fom),
        }
    }

    fn exhaustive<C: CellFiller>(&self, filler: C, sentence: &Sentence, policy: &dyn CellPolicy) -> ParseOutput {
        ExhaustiveParser::new(self.grammar, filler)
            .with_max_unary_chain(self.config.max_unary_chain)
            .parse(sentence, policy)
    }

    fn agenda<F: Frontier, C: CommitRule>(
        &self,
        frontier: F,
        commit: C,
        sentence: &Sentence,
        policy: &dyn CellPolicy,
        fom: &mut dyn FigureOfMerit,
    ) -> ParseOutput {
        if self.config.memoize {
            self.run_agenda(frontier, commit, MemoAgenda::new(), sentence, policy, fom)
        } else {
            self.run_agenda(frontier, commit, FifoTieAgenda::new(), sentence, policy, fom)
        }
    }

    fn run_agenda<F: Frontier, C: CommitRule, Q: EdgeQueue>(
        &self,
        frontier: F,
        commit: C,
        queue: Q,
        sentence: &Sentence,
        policy: &dyn CellPolicy,
        fom: &mut dyn FigureOfMerit,
    ) -> ParseOutput {
        AgendaParser::new(self.grammar, frontier, commit, queue)
            .with_max_unary_chain(self.config.max_unary_chain)
            .with_max_pops(self.config.max_pops)
            .parse(sentence, policy, fom)
    }
}

/// Builder for parsers.
pub struct ParserBuilder {
    config: ParserConfig,
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserBuilder {
    pub fn new() -> Self {
        ParserBuilder {
            config: ParserConfig::default(),
        }
    }

    pub fn config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn max_unary_chain(mut self, n: u8) -> Self {
        self.config.max_unary_chain = n;
        self
    }

    pub fn max_pops(mut self, n: usize) -> Self {
        self.config.max_pops = n;
        self
    }

    pub fn max_local_edges(mut self, n: usize) -> Self {
        self.config.max_local_edges = n;
        self
    }

    pub fn memoize(mut self, yes: bool) -> Self {
        self.config.memoize = yes;
        self
    }

    pub fn build(self, grammar: &Grammar) -> Parser<'_> {
        Parser::with_config(grammar, self.config)
    }
}
