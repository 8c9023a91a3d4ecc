//! Binarized PCFG and its production indexes.
//!
//! The grammar is built once, then shared read-only by every parse. All
//! lookups the chart strategies need are precomputed here as dense
//! per-nonterminal tables:
//!
//! - binary productions by left child, by right child, by child pair
//! - unary productions by child
//! - lexical productions by word

use crate::score::Score;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use thiserror::Error;

/// Nonterminal id (interned category symbol).
pub type NonTerminal = u16;

/// Index of a production in [`Grammar::production`].
pub type ProdId = u32;

/// Child slot of unary and lexical productions.
pub const NO_CHILD: NonTerminal = NonTerminal::MAX;

/// Reserved lexicon entry that unknown tokens are mapped to.
pub const UNKNOWN_WORD: &str = "UNK";

/// Interned word id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordId(u32);

impl WordId {
    /// Token outside the lexicon with no `UNK` fallback; has no productions.
    pub const UNKNOWN: WordId = WordId(u32::MAX);

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductionKind {
    Binary,
    Unary,
    Lexical,
}

/// A weighted production `parent -> left right`, `parent -> left` or
/// `parent -> word`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Production {
    pub parent: NonTerminal,
    /// Left (or only) child; [`NO_CHILD`] for lexical productions.
    pub left: NonTerminal,
    /// Right child; [`NO_CHILD`] for unary and lexical productions.
    pub right: NonTerminal,
    /// Terminal of a lexical production, [`WordId::UNKNOWN`] otherwise.
    pub word: WordId,
    pub logprob: Score,
}

impl Production {
    #[inline(always)]
    pub fn kind(&self) -> ProductionKind {
        if self.right != NO_CHILD {
            ProductionKind::Binary
        } else if self.word != WordId::UNKNOWN {
            ProductionKind::Lexical
        } else {
            ProductionKind::Unary
        }
    }

    #[inline(always)]
    pub fn is_binary(&self) -> bool {
        self.right != NO_CHILD
    }
}

/// Errors raised while assembling a grammar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GrammarError {
    #[error("no start symbol was declared")]
    MissingStartSymbol,
    #[error("start symbol {0} is not the parent of any production")]
    UnusedStartSymbol(String),
    #[error("production {rule} has a non-finite log-probability {logprob}")]
    NonFiniteProbability { rule: String, logprob: Score },
    #[error("production {0} is declared twice")]
    DuplicateProduction(String),
    #[error("grammar has {0} nonterminals, more than a u16 id can address")]
    TooManyNonTerminals(usize),
}

/// String interner: name <-> dense id.
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    str_to_id: FxHashMap<Box<str>, u32>,
    id_to_str: Vec<Box<str>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its id.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(&id) = self.str_to_id.get(s) {
            return id;
        }

        let id = self.id_to_str.len() as u32;
        let boxed: Box<str> = s.into();
        self.str_to_id.insert(boxed.clone(), id);
        self.id_to_str.push(boxed);
        id
    }

    pub fn get(&self, s: &str) -> Option<u32> {
        self.str_to_id.get(s).copied()
    }

    pub fn resolve(&self, id: u32) -> &str {
        &self.id_to_str[id as usize]
    }

    pub fn len(&self) -> usize {
        self.id_to_str.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_str.is_empty()
    }
}

/// Immutable, indexed binarized PCFG.
#[derive(Debug, Clone)]
pub struct Grammar {
    nonterminals: SymbolTable,
    words: SymbolTable,
    productions: Vec<Production>,
    binary: Vec<ProdId>,
    binary_by_left: Vec<Vec<ProdId>>,
    binary_by_right: Vec<Vec<ProdId>>,
    binary_by_pair: FxHashMap<(NonTerminal, NonTerminal), Vec<ProdId>>,
    unary_by_child: Vec<Vec<ProdId>>,
    lexical_by_word: Vec<Vec<ProdId>>,
    factored: Vec<bool>,
    start: NonTerminal,
    unknown: WordId,
}

impl Grammar {
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::new()
    }

    #[inline(always)]
    pub fn production(&self, id: ProdId) -> &Production {
        &self.productions[id as usize]
    }

    pub fn num_productions(&self) -> usize {
        self.productions.len()
    }

    #[inline(always)]
    pub fn num_nonterminals(&self) -> usize {
        self.nonterminals.len()
    }

    #[inline(always)]
    pub fn start_symbol(&self) -> NonTerminal {
        self.start
    }

    #[inline(always)]
    pub fn all_binary(&self) -> &[ProdId] {
        &self.binary
    }

    #[inline(always)]
    pub fn binary_with_left(&self, nt: NonTerminal) -> &[ProdId] {
        &self.binary_by_left[nt as usize]
    }

    #[inline(always)]
    pub fn binary_with_right(&self, nt: NonTerminal) -> &[ProdId] {
        &self.binary_by_right[nt as usize]
    }

    #[inline(always)]
    pub fn binary_with_pair(&self, left: NonTerminal, right: NonTerminal) -> &[ProdId] {
        self.binary_by_pair
            .get(&(left, right))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    #[inline(always)]
    pub fn unary_with_child(&self, nt: NonTerminal) -> &[ProdId] {
        &self.unary_by_child[nt as usize]
    }

    #[inline(always)]
    pub fn lexical_with_token(&self, word: WordId) -> &[ProdId] {
        if word == WordId::UNKNOWN {
            return &[];
        }
        &self.lexical_by_word[word.0 as usize]
    }

    #[inline(always)]
    pub fn is_factored(&self, nt: NonTerminal) -> bool {
        self.factored[nt as usize]
    }

    /// Whether `nt` appears as the left child of some binary production.
    #[inline(always)]
    pub fn is_left_child(&self, nt: NonTerminal) -> bool {
        !self.binary_by_left[nt as usize].is_empty()
    }

    /// Whether `nt` appears as the right child of some binary production.
    #[inline(always)]
    pub fn is_right_child(&self, nt: NonTerminal) -> bool {
        !self.binary_by_right[nt as usize].is_empty()
    }

    pub fn nonterminal(&self, name: &str) -> Option<NonTerminal> {
        self.nonterminals.get(name).map(|id| id as NonTerminal)
    }

    pub fn nonterminal_name(&self, nt: NonTerminal) -> &str {
        self.nonterminals.resolve(nt as u32)
    }

    /// Word id for a surface token, without the unknown-word fallback.
    pub fn word(&self, name: &str) -> Option<WordId> {
        self.words.get(name).map(WordId)
    }

    pub fn word_name(&self, word: WordId) -> &str {
        if word == WordId::UNKNOWN {
            return UNKNOWN_WORD;
        }
        self.words.resolve(word.0)
    }

    /// Id every out-of-lexicon token maps to: the `UNK` entry when the
    /// lexicon has one, [`WordId::UNKNOWN`] otherwise.
    pub fn unknown_word(&self) -> WordId {
        self.unknown
    }

    /// Word id for a surface token, falling back to [`Grammar::unknown_word`].
    pub fn token(&self, name: &str) -> WordId {
        self.word(name).unwrap_or(self.unknown)
    }

    /// Human-readable form of a production, e.g. `NP -> DT NN`.
    pub fn display_production(&self, id: ProdId) -> String {
        let p = self.production(id);
        let parent = self.nonterminal_name(p.parent);
        match p.kind() {
            ProductionKind::Binary => format!(
                "{} -> {} {}",
                parent,
                self.nonterminal_name(p.left),
                self.nonterminal_name(p.right)
            ),
            ProductionKind::Unary => format!("{} -> {}", parent, self.nonterminal_name(p.left)),
            ProductionKind::Lexical => format!("{} -> {}", parent, self.word_name(p.word)),
        }
    }
}

/// Writes the grammar in the text format accepted by [`crate::reader::read_grammar`].
impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.nonterminal_name(self.start))?;
        let (lexical, rules): (Vec<ProdId>, Vec<ProdId>) = (0..self.productions.len() as ProdId)
            .partition(|&id| self.production(id).kind() == ProductionKind::Lexical);
        for id in rules {
            writeln!(f, "{} {}", self.display_production(id), self.production(id).logprob)?;
        }
        writeln!(f, "{}", crate::reader::LEXICON_SEPARATOR)?;
        for id in lexical {
            writeln!(f, "{} {}", self.display_production(id), self.production(id).logprob)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum PendingRule {
    Binary(String, String, String, Score),
    Unary(String, String, Score),
    Lexical(String, String, Score),
}

/// Builder for [`Grammar`].
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    rules: Vec<PendingRule>,
    start: Option<String>,
    factored: Vec<String>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(mut self, symbol: &str) -> Self {
        self.start = Some(symbol.to_string());
        self
    }

    /// `parent -> left right`
    pub fn binary(mut self, parent: &str, left: &str, right: &str, logprob: Score) -> Self {
        self.rules.push(PendingRule::Binary(
            parent.to_string(),
            left.to_string(),
            right.to_string(),
            logprob,
        ));
        self
    }

    /// `parent -> child`
    pub fn unary(mut self, parent: &str, child: &str, logprob: Score) -> Self {
        self.rules
            .push(PendingRule::Unary(parent.to_string(), child.to_string(), logprob));
        self
    }

    /// `parent -> word`
    pub fn lexical(mut self, parent: &str, word: &str, logprob: Score) -> Self {
        self.rules
            .push(PendingRule::Lexical(parent.to_string(), word.to_string(), logprob));
        self
    }

    /// Mark a nonterminal as factored regardless of its name.
    pub fn factored(mut self, symbol: &str) -> Self {
        self.factored.push(symbol.to_string());
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let start_name = self.start.ok_or(GrammarError::MissingStartSymbol)?;

        let mut nonterminals = SymbolTable::new();
        let mut words = SymbolTable::new();
        nonterminals.intern(&start_name);

        let mut productions = Vec::with_capacity(self.rules.len());
        let mut seen = FxHashSet::default();
        for rule in &self.rules {
            let (production, label) = match rule {
                PendingRule::Binary(p, l, r, lp) => (
                    Production {
                        parent: nonterminals.intern(p) as NonTerminal,
                        left: nonterminals.intern(l) as NonTerminal,
                        right: nonterminals.intern(r) as NonTerminal,
                        word: WordId::UNKNOWN,
                        logprob: *lp,
                    },
                    format!("{} -> {} {}", p, l, r),
                ),
                PendingRule::Unary(p, c, lp) => (
                    Production {
                        parent: nonterminals.intern(p) as NonTerminal,
                        left: nonterminals.intern(c) as NonTerminal,
                        right: NO_CHILD,
                        word: WordId::UNKNOWN,
                        logprob: *lp,
                    },
                    format!("{} -> {}", p, c),
                ),
                PendingRule::Lexical(p, w, lp) => (
                    Production {
                        parent: nonterminals.intern(p) as NonTerminal,
                        left: NO_CHILD,
                        right: NO_CHILD,
                        word: WordId(words.intern(w)),
                        logprob: *lp,
                    },
                    format!("{} -> {}", p, w),
                ),
            };

            if !production.logprob.is_finite() {
                return Err(GrammarError::NonFiniteProbability {
                    rule: label,
                    logprob: production.logprob,
                });
            }
            let key = (production.parent, production.left, production.right, production.word);
            if !seen.insert(key) {
                return Err(GrammarError::DuplicateProduction(label));
            }
            productions.push(production);
        }
        for name in &self.factored {
            nonterminals.intern(name);
        }

        // NO_CHILD must stay out of the id space.
        let num_nts = nonterminals.len();
        if num_nts >= NO_CHILD as usize {
            return Err(GrammarError::TooManyNonTerminals(num_nts));
        }

        let start: NonTerminal = 0;
        if !productions.iter().any(|p| p.parent == start) {
            return Err(GrammarError::UnusedStartSymbol(start_name));
        }

        let mut binary = Vec::new();
        let mut binary_by_left = vec![Vec::new(); num_nts];
        let mut binary_by_right = vec![Vec::new(); num_nts];
        let mut binary_by_pair: FxHashMap<(NonTerminal, NonTerminal), Vec<ProdId>> =
            FxHashMap::default();
        let mut unary_by_child = vec![Vec::new(); num_nts];
        let mut lexical_by_word = vec![Vec::new(); words.len()];

        for (id, p) in productions.iter().enumerate() {
            let id = id as ProdId;
            match p.kind() {
                ProductionKind::Binary => {
                    binary.push(id);
                    binary_by_left[p.left as usize].push(id);
                    binary_by_right[p.right as usize].push(id);
                    binary_by_pair.entry((p.left, p.right)).or_default().push(id);
                }
                ProductionKind::Unary => unary_by_child[p.left as usize].push(id),
                ProductionKind::Lexical => lexical_by_word[p.word.0 as usize].push(id),
            }
        }

        let factored = (0..num_nts)
            .map(|nt| {
                let name = nonterminals.resolve(nt as u32);
                name.starts_with('@') || name.contains('|') || self.factored.iter().any(|f| f == name)
            })
            .collect();

        let unknown = words.get(UNKNOWN_WORD).map(WordId).unwrap_or(WordId::UNKNOWN);

        Ok(Grammar {
            nonterminals,
            words,
            productions,
            binary,
            binary_by_left,
            binary_by_right,
            binary_by_pair,
            unary_by_child,
            lexical_by_word,
            factored,
            start,
            unknown,
        })
    }
}
