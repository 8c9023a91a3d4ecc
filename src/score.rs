//! Log-space Viterbi scores.
//!
//! All scores are natural-log probabilities stored as `f32`. This is the
//! max-times (Viterbi) semiring moved to log space: aggregation is `max`,
//! combination is `+`, zero is `-inf` and one is `0.0`.
//!
//! Combination short-circuits on unreachable operands instead of summing
//! them, so `-inf + -inf` never flows into adjacent code and a `NaN` can't
//! be produced from two unreachable children.

use ordered_float::OrderedFloat;

/// A log-probability.
pub type Score = f32;

/// Score of an item with no derivation (the semiring zero).
pub const UNREACHABLE: Score = f32::NEG_INFINITY;

/// Score of the empty derivation (the semiring one).
pub const CERTAIN: Score = 0.0;

/// Totally ordered score, usable as a heap priority.
pub type OrderedScore = OrderedFloat<Score>;

#[inline(always)]
pub fn is_reachable(score: Score) -> bool {
    score > UNREACHABLE
}

/// Score of a unary derivation: `logprob + child`.
#[inline(always)]
pub fn extend(logprob: Score, child: Score) -> Option<Score> {
    if is_reachable(child) {
        Some(logprob + child)
    } else {
        None
    }
}

/// Score of a binary derivation: `logprob + (left + right)`.
///
/// Every strategy builds binary scores through this function. The children
/// are summed first, so a strategy that picks the best `left + right` over
/// several midpoints before adding the production arrives at exactly the
/// same score as one that tries every midpoint.
#[inline(always)]
pub fn combine(logprob: Score, left: Score, right: Score) -> Option<Score> {
    if is_reachable(left) && is_reachable(right) {
        Some(logprob + (left + right))
    } else {
        None
    }
}

/// Strict improvement test; equal scores never replace each other.
#[inline(always)]
pub fn improves(candidate: Score, current: Score) -> bool {
    candidate > current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_short_circuits() {
        assert_eq!(combine(-1.0, UNREACHABLE, -2.0), None);
        assert_eq!(combine(-1.0, -2.0, UNREACHABLE), None);
        assert_eq!(combine(-1.0, UNREACHABLE, UNREACHABLE), None);
        assert_eq!(combine(-1.0, -2.0, -3.0), Some(-6.0));
    }

    #[test]
    fn test_extend() {
        assert_eq!(extend(-0.5, UNREACHABLE), None);
        assert_eq!(extend(-0.5, -1.0), Some(-1.5));
    }

    #[test]
    fn test_improves_is_strict() {
        assert!(improves(-1.0, -2.0));
        assert!(!improves(-1.0, -1.0));
        assert!(improves(-100.0, UNREACHABLE));
        assert!(!improves(UNREACHABLE, UNREACHABLE));
    }

    #[test]
    fn test_children_are_summed_first() {
        // (1e8 + -1e8) + 1 would be 1; -1e8 + 1 rounds back to -1e8.
        assert_eq!(combine(1e8, -1e8, 1.0), Some(0.0));
        assert!(CERTAIN > UNREACHABLE);
    }
}
