//! A uniformly random move selector for `genmove`.
//!
//! Useful as a sparring partner and for exercising a controller end to end.
//! It never fills its own single-point eyes, so games between two random
//! selectors end in passes rather than mutual self-destruction.

use std::time::Instant;

use crate::board::{Board, Color, Point, Stone};
use crate::gtp::{MoveSelector, Selection};
use crate::session::{GameSession, Move};

pub struct RandomSelector {
    rng: fastrand::Rng,
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSelector {
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// A selector whose choices are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

/// Whether every neighbor of `point` is a stone of `stone`'s color.
fn is_own_eye(board: &Board, (x, y): Point, stone: Stone) -> bool {
    let own = Color::from(stone);
    board.neighbors_of(x, y).all(|p| board.at(p) == own)
}

impl MoveSelector for RandomSelector {
    fn select_move(
        &mut self,
        session: &GameSession,
        stone: Stone,
        deadline: Option<Instant>,
    ) -> anyhow::Result<Selection> {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Ok(Selection::Move(Move::pass(stone)));
        }
        let candidates: Vec<Move> = session
            .legal_moves(stone)
            .into_iter()
            .filter(|mv| match mv.point() {
                Some(p) => !is_own_eye(session.board(), p, stone),
                None => false,
            })
            .collect();
        if candidates.is_empty() {
            return Ok(Selection::Move(Move::pass(stone)));
        }
        let pick = candidates[self.rng.usize(..candidates.len())];
        Ok(Selection::Move(pick))
    }
}
