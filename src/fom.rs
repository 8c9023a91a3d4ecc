//! Figures of merit: the priorities that order agenda search.
//!
//! A figure of merit scores a candidate edge before it is committed, so it
//! may only look at the edge itself and chart entries that already exist.

use crate::chart::{Chart, Edge};
use crate::grammar::Grammar;
use crate::score::Score;
use crate::sentence::Sentence;

pub trait FigureOfMerit {
    /// Called once per sentence before any edge is scored.
    fn init(&mut self, _grammar: &Grammar, _sentence: &Sentence) {}

    fn score(&self, edge: &Edge, chart: &Chart) -> Score;
}

/// Priority equal to the edge's inside score.
///
/// With non-positive log-probabilities every derivation scores at most as
/// well as its children, so best-first search under this FOM finds the
/// Viterbi parse the first time the root is resolved.
#[derive(Debug, Clone, Copy, Default)]
pub struct InsideFom;

impl FigureOfMerit for InsideFom {
    #[inline(always)]
    fn score(&self, edge: &Edge, _chart: &Chart) -> Score {
        edge.inside
    }
}

/// Inside score plus a per-nonterminal log prior.
#[derive(Debug, Clone)]
pub struct PriorFom {
    priors: Vec<Score>,
}

impl PriorFom {
    /// `priors[nt]` is added to every edge whose parent is `nt`.
    pub fn new(priors: Vec<Score>) -> Self {
        PriorFom { priors }
    }

    /// Log relative frequency of each nonterminal as a production parent.
    /// Nonterminals that never head a production get the smallest prior.
    pub fn from_grammar(grammar: &Grammar) -> Self {
        let mut counts = vec![0u32; grammar.num_nonterminals()];
        for id in 0..grammar.num_productions() {
            counts[grammar.production(id as u32).parent as usize] += 1;
        }
        let total = grammar.num_productions().max(1) as Score;
        let floor = (1.0 / (total + 1.0)).ln();
        let priors = counts
            .iter()
            .map(|&c| if c == 0 { floor } else { (c as Score / total).ln() })
            .collect();
        PriorFom { priors }
    }

    pub fn prior(&self, nt: usize) -> Score {
        self.priors[nt]
    }
}

impl FigureOfMerit for PriorFom {
    #[inline(always)]
    fn score(&self, edge: &Edge, _chart: &Chart) -> Score {
        edge.inside + self.priors[edge.parent as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::tests::fish_grammar;

    #[test]
    fn test_inside_fom() {
        let g = fish_grammar();
        let chart = Chart::new(&g, 2);
        let dt = g.nonterminal("DT").unwrap();
        let nn = g.nonterminal("NN").unwrap();
        let edge = Edge::binary(&g, g.binary_with_pair(dt, nn)[0], 0, 1, 2, -1.5);
        assert_eq!(InsideFom.score(&edge, &chart), -1.5);
    }

    #[test]
    fn test_prior_fom() {
        let g = fish_grammar();
        let chart = Chart::new(&g, 2);
        let fom = PriorFom::from_grammar(&g);
        let dt = g.nonterminal("DT").unwrap();
        let nn = g.nonterminal("NN").unwrap();
        let np = g.nonterminal("NP").unwrap();
        let edge = Edge::binary(&g, g.binary_with_pair(dt, nn)[0], 0, 1, 2, -1.5);

        // NP heads 3 of the 17 productions.
        let expected = -1.5 + (3.0f32 / 17.0).ln();
        assert!((fom.score(&edge, &chart) - expected).abs() < 1e-6);
        assert!(fom.prior(np as usize) > fom.prior(dt as usize));
    }
}
