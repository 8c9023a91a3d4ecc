//! Viterbi chart parsing for binarized probabilistic context-free grammars.
//!
//! This crate provides:
//! - A grammar index with lookup by child, child pair and word
//! - A flat span-indexed chart with backpointers
//! - Exhaustive bottom-up parsing with four intersection strategies
//! - Best-first agenda parsing with pluggable frontier, commit rule and queue
//! - Span-level best-first parsing with bounded local admission
//!
//! ```
//! use pcfg_chart::{read_grammar, ParserBuilder, Sentence, Strategy};
//!
//! let grammar = read_grammar(
//!     "ROOT\nROOT -> S 0\nS -> NN VB 0\n===== LEXICON =====\nNN -> fish 0\nVB -> swim 0\n",
//! )
//! .unwrap();
//! let parser = ParserBuilder::new().strategy(Strategy::CoarseCell).build(&grammar);
//! let sentence = Sentence::new(&grammar, "fish swim");
//! let out = parser.parse(&sentence);
//! assert_eq!(
//!     out.tree(&grammar, &sentence).unwrap().to_string(),
//!     "(ROOT (S (NN fish) (VB swim)))"
//! );
//! ```

pub mod agenda;
pub mod chart;
pub mod coarse;
pub mod exhaustive;
pub mod fom;
pub mod grammar;
pub mod parser;
pub mod policy;
pub mod reader;
pub mod score;
pub mod sentence;


// Re-exports for convenience
pub use agenda::{
    AgendaParser, CommitRule, EdgeQueue, FifoTieAgenda, Frontier, GhostFrontier, HeuristicCommit, InsideCommit,
    MemoAgenda, ParseState, ScanFrontier,
};
pub use chart::{Chart, CommitEffect, Edge, ParseTree, Slot};
pub use coarse::CoarseCellParser;
pub use exhaustive::{CellCrossHash, CellCrossList, CellFiller, ExhaustiveParser, ExtentFiltered, GrammarLoop};
pub use fom::{FigureOfMerit, InsideFom, PriorFom};
pub use grammar::{Grammar, GrammarBuilder, GrammarError, NonTerminal, Production, ProductionKind, WordId};
pub use parser::{
    FrontierKind, Intersection, Objective, Outcome, ParseOutput, ParseStats, Parser, ParserBuilder, ParserConfig,
    Strategy,
};
pub use policy::{CellPolicy, SpanConstraints, Unconstrained};
pub use reader::{read_grammar, ReadError};
pub use score::Score;
pub use sentence::Sentence;
