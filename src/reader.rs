//! Text format reader for binarized grammars.
//!
//! ```text
//! # comment
//! ROOT                      start symbol
//! S -> NP VP 0              binary production
//! ROOT -> S 0               unary production
//! ===== LEXICON =====
//! DT -> The 0               lexical production
//! ```
//!
//! Every rule ends with its natural-log probability. Rules before the
//! separator are binary or unary (decided by arity); rules after it are
//! lexical.
//!
//! # Example
//!
//! ```rust
//! use pcfg_chart::reader::read_grammar;
//!
//! let grammar = read_grammar(r#"
//!     S
//!     S -> A B -0.5
//!     ===== LEXICON =====
//!     A -> a 0
//!     B -> b 0
//! "#).unwrap();
//!
//! assert_eq!(grammar.all_binary().len(), 1);
//! ```

use crate::grammar::{Grammar, GrammarBuilder, GrammarError};
use crate::score::Score;
use thiserror::Error;

/// Line separating syntactic rules from the lexicon.
pub const LEXICON_SEPARATOR: &str = "===== LEXICON =====";

/// Reader error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    #[error("grammar text has no start symbol line")]
    MissingStartSymbol,
    #[error("line {line}: expected `->` after the parent symbol")]
    MissingArrow { line: usize },
    #[error("line {line}: expected {expected} symbols on the right-hand side, found {found}")]
    Arity {
        line: usize,
        expected: &'static str,
        found: usize,
    },
    #[error("line {line}: invalid log-probability {text:?}")]
    InvalidNumber { line: usize, text: String },
    #[error(transparent)]
    Grammar(#[from] GrammarError),
}

/// Result type for reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Start,
    Rules,
    Lexicon,
}

/// Read a grammar from its text form.
pub fn read_grammar(input: &str) -> ReadResult<Grammar> {
    let mut builder = GrammarBuilder::new();
    let mut section = Section::Start;

    for (idx, raw) in input.lines().enumerate() {
        let line = idx + 1;
        let text = strip_comment(raw).trim();
        if text.is_empty() {
            continue;
        }
        if text == LEXICON_SEPARATOR {
            if section == Section::Start {
                return Err(ReadError::MissingStartSymbol);
            }
            section = Section::Lexicon;
            continue;
        }

        match section {
            Section::Start => {
                builder = builder.start(text);
                section = Section::Rules;
            }
            Section::Rules => {
                let (parent, rhs, logprob) = split_rule(text, line)?;
                builder = match rhs.as_slice() {
                    [child] => builder.unary(parent, child, logprob),
                    [left, right] => builder.binary(parent, left, right, logprob),
                    _ => {
                        return Err(ReadError::Arity {
                            line,
                            expected: "1 or 2",
                            found: rhs.len(),
                        })
                    }
                };
            }
            Section::Lexicon => {
                let (parent, rhs, logprob) = split_rule(text, line)?;
                builder = match rhs.as_slice() {
                    [word] => builder.lexical(parent, word, logprob),
                    _ => {
                        return Err(ReadError::Arity {
                            line,
                            expected: "1",
                            found: rhs.len(),
                        })
                    }
                };
            }
        }
    }

    if section == Section::Start {
        return Err(ReadError::MissingStartSymbol);
    }
    Ok(builder.build()?)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Split `parent -> rhs... logprob` into its parts.
fn split_rule(text: &str, line: usize) -> ReadResult<(&str, Vec<&str>, Score)> {
    let mut fields = text.split_whitespace();
    let parent = fields.next().ok_or(ReadError::MissingArrow { line })?;
    if fields.next() != Some("->") {
        return Err(ReadError::MissingArrow { line });
    }

    let mut rhs: Vec<&str> = fields.collect();
    let number = rhs.pop().ok_or(ReadError::Arity {
        line,
        expected: "at least 1",
        found: 0,
    })?;
    let logprob = number.parse::<Score>().map_err(|_| ReadError::InvalidNumber {
        line,
        text: number.to_string(),
    })?;
    Ok((parent, rhs, logprob))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ProductionKind;

    const FISH: &str = r#"
        # Toy English grammar
        ROOT
        ROOT -> S 0
        S -> NP VP 0
        NP -> DT NP -1.386294
        NP -> DT NN -1.386294
        NP -> NN NN -1.791759
        VP -> VB RB -0.693147
        ===== LEXICON =====
        DT -> The 0
        NN -> fish 0
        NN -> market -0.405465
        VB -> market -1.098612   # verb reading
        RB -> last -0.405465
    "#;

    #[test]
    fn test_read_grammar() {
        let g = read_grammar(FISH).unwrap();
        assert_eq!(g.nonterminal_name(g.start_symbol()), "ROOT");
        assert_eq!(g.all_binary().len(), 5);

        let s = g.nonterminal("S").unwrap();
        let unary = g.unary_with_child(s);
        assert_eq!(unary.len(), 1);
        assert_eq!(g.production(unary[0]).kind(), ProductionKind::Unary);

        let market = g.word("market").unwrap();
        let lex = g.lexical_with_token(market);
        assert_eq!(lex.len(), 2);
        assert!((g.production(lex[1]).logprob + 1.098612).abs() < 1e-6);
    }

    #[test]
    fn test_display_round_trip() {
        let g = read_grammar(FISH).unwrap();
        let again = read_grammar(&g.to_string()).unwrap();
        assert_eq!(again.num_productions(), g.num_productions());
        assert_eq!(again.num_nonterminals(), g.num_nonterminals());
        assert_eq!(again.to_string(), g.to_string());
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            read_grammar("# nothing\n").unwrap_err(),
            ReadError::MissingStartSymbol
        );
        assert_eq!(
            read_grammar("S\nS => A B 0\n").unwrap_err(),
            ReadError::MissingArrow { line: 2 }
        );
        assert_eq!(
            read_grammar("S\nS -> A B C 0\n").unwrap_err(),
            ReadError::Arity {
                line: 2,
                expected: "1 or 2",
                found: 3
            }
        );
        assert_eq!(
            read_grammar("S\nS -> A B x\n").unwrap_err(),
            ReadError::InvalidNumber {
                line: 2,
                text: "x".into()
            }
        );
        assert_eq!(
            read_grammar("S\nS -> A 0\n===== LEXICON =====\nA -> a b 0\n").unwrap_err(),
            ReadError::Arity {
                line: 4,
                expected: "1",
                found: 2
            }
        );
        assert!(matches!(
            read_grammar("S\nA -> B 0\n"),
            Err(ReadError::Grammar(GrammarError::UnusedStartSymbol(_)))
        ));
    }
}
