//! Cell-level constraints consulted by every strategy.
//!
//! A policy is a set of pure predicates over spans. The parsers never
//! interpret them beyond skipping what they forbid:
//!
//! - `cell_open`: binary and unary edges may be built in the span
//! - `only_factored`: only factored (binarization) parents are allowed
//! - `unary_open`: unary productions may be applied in the span
//! - `midpoints`: the split points binary edges may use
//!
//! Lexical cells are always seeded, whatever the policy says.

use crate::grammar::{Grammar, NonTerminal};
use rustc_hash::FxHashSet;
use std::ops::Range;

pub trait CellPolicy {
    /// Split points allowed for binary edges over `(start, end)`.
    fn midpoints(&self, start: usize, end: usize) -> Range<usize> {
        (start + 1)..end
    }

    fn cell_open(&self, _start: usize, _end: usize) -> bool {
        true
    }

    fn only_factored(&self, _start: usize, _end: usize) -> bool {
        false
    }

    fn unary_open(&self, _start: usize, _end: usize) -> bool {
        true
    }
}

/// Whether `parent` may be placed in `(start, end)` under `policy`.
#[inline(always)]
pub fn parent_allowed(
    policy: &dyn CellPolicy,
    grammar: &Grammar,
    start: usize,
    end: usize,
    parent: NonTerminal,
) -> bool {
    !policy.only_factored(start, end) || grammar.is_factored(parent)
}

/// No constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconstrained;

impl CellPolicy for Unconstrained {}

/// Explicit per-span constraints.
#[derive(Debug, Clone, Default)]
pub struct SpanConstraints {
    closed: FxHashSet<(usize, usize)>,
    factored_only: FxHashSet<(usize, usize)>,
    no_unary: FxHashSet<(usize, usize)>,
    max_child_width: Option<usize>,
}

impl SpanConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close(mut self, start: usize, end: usize) -> Self {
        self.closed.insert((start, end));
        self
    }

    /// Allow only factored parents over `(start, end)`.
    pub fn factored_only(mut self, start: usize, end: usize) -> Self {
        self.factored_only.insert((start, end));
        self
    }

    pub fn no_unary(mut self, start: usize, end: usize) -> Self {
        self.no_unary.insert((start, end));
        self
    }

    /// Limit both children of every binary edge to at most `width` words.
    pub fn max_child_width(mut self, width: usize) -> Self {
        self.max_child_width = Some(width.max(1));
        self
    }
}

impl CellPolicy for SpanConstraints {
    fn midpoints(&self, start: usize, end: usize) -> Range<usize> {
        match self.max_child_width {
            Some(w) => {
                // left = mid - start <= w, right = end - mid <= w
                let lo = (start + 1).max(end.saturating_sub(w));
                let hi = end.min(start + w + 1);
                lo..hi.max(lo)
            }
            None => (start + 1)..end,
        }
    }

    fn cell_open(&self, start: usize, end: usize) -> bool {
        !self.closed.contains(&(start, end))
    }

    fn only_factored(&self, start: usize, end: usize) -> bool {
        self.factored_only.contains(&(start, end))
    }

    fn unary_open(&self, start: usize, end: usize) -> bool {
        !self.no_unary.contains(&(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconstrained() {
        let p = Unconstrained;
        assert_eq!(p.midpoints(2, 6), 3..6);
        assert!(p.cell_open(0, 3));
        assert!(!p.only_factored(0, 3));
        assert!(p.unary_open(0, 3));
    }

    #[test]
    fn test_span_constraints() {
        let p = SpanConstraints::new()
            .close(1, 3)
            .factored_only(0, 2)
            .no_unary(2, 4);
        assert!(!p.cell_open(1, 3));
        assert!(p.cell_open(0, 3));
        assert!(p.only_factored(0, 2));
        assert!(!p.only_factored(1, 3));
        assert!(!p.unary_open(2, 4));
        assert_eq!(p.midpoints(0, 5), 1..5);
    }

    #[test]
    fn test_max_child_width() {
        let p = SpanConstraints::new().max_child_width(2);
        // Span of width 4 only splits in the middle.
        assert_eq!(p.midpoints(0, 4).collect::<Vec<_>>(), vec![2]);
        assert_eq!(p.midpoints(3, 6).collect::<Vec<_>>(), vec![4, 5]);
        // Width 5 can't be split into two children of width <= 2.
        assert_eq!(p.midpoints(0, 5).count(), 0);
    }
}
