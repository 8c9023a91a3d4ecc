//! Lazy ("ghost") frontier.
//!
//! When a nonterminal is first populated over `(start, end)` it leaves one
//! ghost per binary production it can take part in:
//!
//! - as a left child of `A -> X C`, under `awaiting_right[(C, end)]`
//! - as a right child of `A -> B X`, under `awaiting_left[(B, start)]`
//!
//! Every later raise of `Y` over `(s, e)` looks up `awaiting_right[(Y, s)]`
//! and `awaiting_left[(Y, e)]` and completes the ghosts found there, reading
//! both children's current scores from the chart. This finds the same
//! partners a neighbour scan would, without touching empty cells.
//!
//! Ghosts are never removed: a slot stays populated once it is, so its
//! ghosts stay valid for the rest of the parse.

use super::frontier::{ExpandContext, Frontier};
use crate::chart::{Pos, Slot};
use crate::grammar::{Grammar, NonTerminal, ProdId};
use rustc_hash::FxHashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Ghost {
    production: ProdId,
    /// Far boundary of the child that registered the ghost.
    anchor: Pos,
}

#[derive(Debug, Clone, Default)]
pub struct GhostFrontier {
    n: usize,
    awaiting_right: FxHashMap<(NonTerminal, Pos), Vec<Ghost>>,
    awaiting_left: FxHashMap<(NonTerminal, Pos), Vec<Ghost>>,
}

impl GhostFrontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registered ghosts, both directions.
    pub fn num_ghosts(&self) -> usize {
        self.awaiting_right.values().chain(self.awaiting_left.values()).map(|v| v.len()).sum()
    }

    fn register(&mut self, grammar: &Grammar, slot: Slot) {
        let (start, end) = (slot.start as usize, slot.end as usize);
        // Nothing combines with the whole sentence.
        if start == 0 && end == self.n {
            return;
        }
        if end < self.n {
            for &id in grammar.binary_with_left(slot.nt) {
                let right = grammar.production(id).right;
                self.awaiting_right.entry((right, slot.end)).or_default().push(Ghost {
                    production: id,
                    anchor: slot.start,
                });
            }
        }
        if start > 0 {
            for &id in grammar.binary_with_right(slot.nt) {
                let left = grammar.production(id).left;
                self.awaiting_left.entry((left, slot.start)).or_default().push(Ghost {
                    production: id,
                    anchor: slot.end,
                });
            }
        }
    }
}

impl Frontier for GhostFrontier {
    fn reset(&mut self, _grammar: &Grammar, n: usize) {
        self.n = n;
        self.awaiting_right.clear();
        self.awaiting_left.clear();
    }

    fn expand(&mut self, cx: &mut ExpandContext<'_>, slot: Slot, is_new: bool) {
        let (start, end) = (slot.start as usize, slot.end as usize);

        if let Some(ghosts) = self.awaiting_right.get(&(slot.nt, slot.start)) {
            for g in ghosts {
                if cx.offer_binary(g.production, g.anchor as usize, start, end) {
                    cx.stats.ghost_completions += 1;
                }
            }
        }
        if let Some(ghosts) = self.awaiting_left.get(&(slot.nt, slot.end)) {
            for g in ghosts {
                if cx.offer_binary(g.production, start, end, g.anchor as usize) {
                    cx.stats.ghost_completions += 1;
                }
            }
        }

        if is_new {
            self.register(cx.grammar, slot);
        }
    }
}
