//! Tokenized input sentence.

use crate::grammar::{Grammar, WordId};

/// Surface words plus the word ids used for lexical lookup.
///
/// Tokens outside the lexicon are mapped to the grammar's unknown-word
/// entry; the surface form is kept for tree output.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    words: Vec<String>,
    tokens: Vec<WordId>,
}

impl Sentence {
    /// Split `text` on whitespace and map each word through the lexicon.
    pub fn new(grammar: &Grammar, text: &str) -> Self {
        Self::from_words(grammar, text.split_whitespace())
    }

    pub fn from_words<I, S>(grammar: &Grammar, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words.into_iter().map(|w| w.as_ref().to_string()).collect();
        let tokens = words.iter().map(|w| grammar.token(w)).collect();
        Sentence { words, tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline(always)]
    pub fn token(&self, i: usize) -> WordId {
        self.tokens[i]
    }

    pub fn tokens(&self) -> &[WordId] {
        &self.tokens
    }

    pub fn word(&self, i: usize) -> &str {
        &self.words[i]
    }
}
