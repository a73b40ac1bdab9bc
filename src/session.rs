//! Authoritative game state: board, ko, side to move, and move history.
//!
//! [`GameSession`] is the only type that mutates a [`Board`]. Every stone goes
//! through the same capture-and-place sequence: remove captured groups, place
//! the stone, recompute the ko, append to history, hand the turn over.

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::board::{Board, BoardError, Color, Group, Point, Stone};
use crate::constants::{PASSES_TO_END, SUPPORTED_SIZES};
use crate::ko::KoState;
use crate::legality::{self, IllegalReason, Legality};

/// A stone placement or a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Move {
    Play { x: usize, y: usize, stone: Stone },
    Pass { stone: Stone },
}

impl Move {
    pub fn play(x: usize, y: usize, stone: Stone) -> Self {
        Move::Play { x, y, stone }
    }

    pub fn pass(stone: Stone) -> Self {
        Move::Pass { stone }
    }

    pub fn stone(&self) -> Stone {
        match *self {
            Move::Play { stone, .. } | Move::Pass { stone } => stone,
        }
    }

    pub fn point(&self) -> Option<Point> {
        match *self {
            Move::Play { x, y, .. } => Some((x, y)),
            Move::Pass { .. } => None,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Move::Pass { .. })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Play { x, y, stone } => write!(f, "{stone} ({x}, {y})"),
            Move::Pass { stone } => write!(f, "{stone} pass"),
        }
    }
}

/// A rejected move and the first rule it broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal move {mv}: {reason}")]
pub struct IllegalMoveError {
    pub mv: Move,
    pub reason: IllegalReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    IllegalMove(#[from] IllegalMoveError),
    #[error("cannot undo {requested} moves, only {available} played")]
    CannotUndo { requested: usize, available: usize },
}

/// Whether a stone must match the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnOrder {
    /// Only the side to move may place a stone.
    #[default]
    Strict,
    /// Either color may place a stone; the turn passes to the opponent of
    /// whoever moved.
    Free,
}

/// How [`GameSession::replay`] treats the incoming moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    /// Every move must pass the legality check.
    Validate,
    /// Moves are placed without the legality check; captures still resolve.
    /// Off-board and occupied points are still rejected.
    Trust,
}

/// Prisoners taken by each color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Captures {
    pub black: usize,
    pub white: usize,
}

impl Captures {
    pub fn get(&self, stone: Stone) -> usize {
        match stone {
            Stone::Black => self.black,
            Stone::White => self.white,
        }
    }

    fn add(&mut self, stone: Stone, count: usize) {
        match stone {
            Stone::Black => self.black += count,
            Stone::White => self.white += count,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameSession {
    board: Board,
    ko: KoState,
    to_move: Stone,
    history: Vec<Move>,
    captures: Captures,
    passes: u32,
    turn_order: TurnOrder,
}

impl GameSession {
    /// Start a game on an empty `size` x `size` board with black to move.
    pub fn new(size: usize) -> Result<Self, BoardError> {
        Self::with_turn_order(size, TurnOrder::default())
    }

    pub fn with_turn_order(size: usize, turn_order: TurnOrder) -> Result<Self, BoardError> {
        if !SUPPORTED_SIZES.contains(&size) {
            return Err(BoardError::UnsupportedSize(size));
        }
        Ok(Self {
            board: Board::new(size),
            ko: KoState::none(),
            to_move: Stone::Black,
            history: Vec::new(),
            captures: Captures::default(),
            passes: 0,
            turn_order,
        })
    }

    /// Rebuild a session from a move list, e.g. one loaded from a game record.
    pub fn replay(
        size: usize,
        moves: impl IntoIterator<Item = Move>,
        mode: ReplayMode,
        turn_order: TurnOrder,
    ) -> Result<Self, SessionError> {
        let mut session = Self::with_turn_order(size, turn_order)?;
        for mv in moves {
            match mode {
                ReplayMode::Validate => session.play(mv)?,
                ReplayMode::Trust => session.place_unchecked(mv)?,
            };
        }
        Ok(session)
    }

    /// Empty the board and history, keeping size and turn order.
    pub fn clear(&mut self) {
        self.board = Board::new(self.board.size());
        self.ko = KoState::none();
        self.to_move = Stone::Black;
        self.history.clear();
        self.captures = Captures::default();
        self.passes = 0;
    }

    pub fn size(&self) -> usize {
        self.board.size()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn ko(&self) -> &KoState {
        &self.ko
    }

    pub fn to_move(&self) -> Stone {
        self.to_move
    }

    pub fn turn_order(&self) -> TurnOrder {
        self.turn_order
    }

    pub fn captures(&self) -> Captures {
        self.captures
    }

    /// Moves played so far, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// True once both players have passed in succession.
    pub fn is_over(&self) -> bool {
        self.passes >= PASSES_TO_END
    }

    pub fn color_at(&self, x: usize, y: usize) -> Result<Color, BoardError> {
        self.board.color_at(x, y)
    }

    pub fn group_and_liberties(&self, x: usize, y: usize) -> Option<Group> {
        self.board.group_and_liberties(x, y)
    }

    fn expected_color(&self) -> Option<Stone> {
        match self.turn_order {
            TurnOrder::Strict => Some(self.to_move),
            TurnOrder::Free => None,
        }
    }

    /// Judge a move against the current position without changing anything.
    pub fn evaluate(&self, mv: &Move) -> Legality {
        match *mv {
            Move::Pass { stone } if self.expected_color().is_some_and(|side| side != stone) => {
                Legality::Illegal(IllegalReason::WrongColor)
            }
            Move::Pass { .. } => Legality::Legal {
                captured: Vec::new(),
            },
            Move::Play { x, y, stone } => {
                legality::evaluate(&self.board, &self.ko, (x, y), stone, self.expected_color())
            }
        }
    }

    pub fn is_legal(&self, mv: &Move) -> bool {
        self.evaluate(mv).is_legal()
    }

    /// Legality of a stone at `(x, y)` for the side to move.
    pub fn is_legal_at(&self, x: usize, y: usize) -> bool {
        self.is_legal(&Move::play(x, y, self.to_move))
    }

    /// Play a move, returning the points whose stones were captured.
    ///
    /// On error nothing changes.
    pub fn play(&mut self, mv: Move) -> Result<Vec<Point>, IllegalMoveError> {
        let captured = match self.evaluate(&mv) {
            Legality::Legal { captured } => captured,
            Legality::Illegal(reason) => {
                debug!(%mv, %reason, "rejected move");
                return Err(IllegalMoveError { mv, reason });
            }
        };
        match mv {
            Move::Pass { stone } => {
                self.record_pass(stone);
                Ok(Vec::new())
            }
            Move::Play { x, y, stone } => Ok(self.settle((x, y), stone, captured)),
        }
    }

    /// Play a stone for the side to move.
    pub fn play_at(&mut self, x: usize, y: usize) -> Result<Vec<Point>, IllegalMoveError> {
        self.play(Move::play(x, y, self.to_move))
    }

    /// Pass for the side to move.
    pub fn pass(&mut self) -> Move {
        let mv = Move::pass(self.to_move);
        self.record_pass(self.to_move);
        mv
    }

    /// Place a move without the legality check. Captures resolve normally and a
    /// stone left without liberties is removed along with its group.
    pub fn place_unchecked(&mut self, mv: Move) -> Result<Vec<Point>, IllegalMoveError> {
        let (x, y, stone) = match mv {
            Move::Pass { stone } => {
                self.record_pass(stone);
                return Ok(Vec::new());
            }
            Move::Play { x, y, stone } => (x, y, stone),
        };
        let reason = match self.board.color_at(x, y) {
            Ok(Color::Empty) => None,
            Ok(_) => Some(IllegalReason::Occupied),
            Err(_) => Some(IllegalReason::OutOfBounds),
        };
        if let Some(reason) = reason {
            return Err(IllegalMoveError { mv, reason });
        }
        self.board.set((x, y), stone.into());
        let captured = legality::captured_by(&self.board, (x, y), stone);
        Ok(self.settle((x, y), stone, captured))
    }

    /// Take back the last `n` moves by replaying the rest from an empty board.
    pub fn undo(&mut self, n: usize) -> Result<(), SessionError> {
        let available = self.history.len();
        if n > available {
            return Err(SessionError::CannotUndo {
                requested: n,
                available,
            });
        }
        let kept = self.history[..available - n].to_vec();
        let mut rebuilt = Self::with_turn_order(self.size(), self.turn_order)?;
        for mv in kept {
            rebuilt.place_unchecked(mv)?;
        }
        *self = rebuilt;
        Ok(())
    }

    /// Every legal move for `stone`, including a pass when `stone` may move.
    pub fn legal_moves(&self, stone: Stone) -> Vec<Move> {
        let size = self.size();
        (0..size)
            .flat_map(|y| (0..size).map(move |x| Move::play(x, y, stone)))
            .chain(std::iter::once(Move::pass(stone)))
            .filter(|mv| self.is_legal(mv))
            .collect()
    }

    fn record_pass(&mut self, stone: Stone) {
        self.ko = KoState::none();
        self.history.push(Move::pass(stone));
        self.to_move = stone.opponent();
        self.passes += 1;
    }

    /// Capture-and-place for a stone at `point`.
    fn settle(&mut self, point: Point, stone: Stone, captured: Vec<Group>) -> Vec<Point> {
        let mut removed: Vec<Point> = Vec::new();
        for group in &captured {
            self.board.remove(group);
            removed.extend(group.stones.iter().copied());
        }
        self.board.set(point, stone.into());

        self.ko = match self.board.group_and_liberties(point.0, point.1) {
            Some(placed) if placed.liberty_count() > 0 => {
                KoState::after_play(stone, &captured, &placed)
            }
            Some(placed) => {
                // Only reachable through unchecked placement
                self.board.remove(&placed);
                self.captures.add(stone.opponent(), placed.len());
                KoState::none()
            }
            None => {
                debug_assert!(false, "no group at a point that was just set");
                KoState::none()
            }
        };
        self.captures.add(stone, removed.len());

        if !removed.is_empty() {
            debug!(point = ?point, %stone, stones = removed.len(), "captured");
        }
        if let Some(ko) = self.ko.active() {
            debug!(point = ?ko.point, forbidden = %ko.forbidden, "ko");
        }
        debug_assert!(self.liberties_settled(point));

        self.history.push(Move::play(point.0, point.1, stone));
        self.to_move = stone.opponent();
        self.passes = 0;
        removed
    }

    /// Every group touching `point` (and at `point`) has a liberty.
    fn liberties_settled(&self, (x, y): Point) -> bool {
        std::iter::once((x, y))
            .chain(self.board.neighbors_of(x, y))
            .filter_map(|(px, py)| self.board.group_and_liberties(px, py))
            .all(|g| g.liberty_count() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        GameSession::new(19).unwrap()
    }

    #[test]
    fn test_new_session() {
        let s = session();
        assert_eq!(s.size(), 19);
        assert_eq!(s.to_move(), Stone::Black);
        assert!(s.history().is_empty());
        assert!(s.board().is_empty());
        assert_eq!(GameSession::new(7).unwrap_err(), BoardError::UnsupportedSize(7));
    }

    #[test]
    fn test_play_flips_turn_and_records() {
        let mut s = session();
        s.play(Move::play(3, 3, Stone::Black)).unwrap();
        assert_eq!(s.color_at(3, 3), Ok(Color::Black));
        assert_eq!(s.to_move(), Stone::White);
        assert_eq!(s.history(), &[Move::play(3, 3, Stone::Black)]);
    }

    #[test]
    fn test_strict_turn_order_rejects_wrong_color() {
        let mut s = session();
        let err = s.play(Move::play(3, 3, Stone::White)).unwrap_err();
        assert_eq!(err.reason, IllegalReason::WrongColor);
        assert!(s.board().is_empty());
        assert!(s.history().is_empty());
    }

    #[test]
    fn test_free_turn_order_accepts_either_color() {
        let mut s = GameSession::with_turn_order(9, TurnOrder::Free).unwrap();
        s.play(Move::play(3, 3, Stone::White)).unwrap();
        assert_eq!(s.to_move(), Stone::Black);
        s.play(Move::play(4, 4, Stone::White)).unwrap();
        assert_eq!(s.to_move(), Stone::Black);
    }

    #[test]
    fn test_failed_play_leaves_state_untouched() {
        let mut s = session();
        s.play_at(5, 5).unwrap();
        let before = s.clone();
        assert!(s.play(Move::play(5, 5, Stone::White)).is_err());
        assert_eq!(s.board(), before.board());
        assert_eq!(s.history(), before.history());
        assert_eq!(s.to_move(), before.to_move());
    }

    #[test]
    fn test_pass_clears_ko_and_flips() {
        let mut s = session();
        let mv = s.pass();
        assert_eq!(mv, Move::pass(Stone::Black));
        assert_eq!(s.to_move(), Stone::White);
        assert!(!s.is_over());
        s.pass();
        assert!(s.is_over());
        s.play_at(3, 3).unwrap();
        assert!(!s.is_over());
    }

    #[test]
    fn test_captures_are_tallied() {
        let mut s = session();
        for &(x, y) in &[(2, 3), (3, 3), (4, 3), (18, 18), (3, 2), (18, 17)] {
            s.play_at(x, y).unwrap();
        }
        let removed = s.play_at(3, 4).unwrap();
        assert_eq!(removed, vec![(3, 3)]);
        assert_eq!(s.captures().get(Stone::Black), 1);
        assert_eq!(s.captures().get(Stone::White), 0);
    }

    #[test]
    fn test_undo_restores_captured_stones() {
        let mut s = session();
        for &(x, y) in &[(2, 3), (3, 3), (4, 3), (18, 18), (3, 2), (18, 17), (3, 4)] {
            s.play_at(x, y).unwrap();
        }
        assert_eq!(s.color_at(3, 3), Ok(Color::Empty));
        s.undo(1).unwrap();
        assert_eq!(s.color_at(3, 3), Ok(Color::White));
        assert_eq!(s.color_at(3, 4), Ok(Color::Empty));
        assert_eq!(s.to_move(), Stone::Black);
        assert_eq!(s.captures(), Captures::default());
        assert_eq!(
            s.undo(7).unwrap_err(),
            SessionError::CannotUndo {
                requested: 7,
                available: 6
            }
        );
    }

    #[test]
    fn test_trusted_replay_skips_rule_checks() {
        // Two black stones in a row would be rejected with strict turn order
        let moves = [Move::play(2, 2, Stone::Black), Move::play(3, 3, Stone::Black)];
        assert!(
            GameSession::replay(9, moves, ReplayMode::Validate, TurnOrder::Strict).is_err()
        );
        let s = GameSession::replay(9, moves, ReplayMode::Trust, TurnOrder::Strict).unwrap();
        assert_eq!(s.color_at(3, 3), Ok(Color::Black));
        assert_eq!(s.history().len(), 2);

        let occupied = [Move::play(2, 2, Stone::Black), Move::play(2, 2, Stone::White)];
        let err = GameSession::replay(9, occupied, ReplayMode::Trust, TurnOrder::Free).unwrap_err();
        assert!(matches!(
            err,
            SessionError::IllegalMove(IllegalMoveError {
                reason: IllegalReason::Occupied,
                ..
            })
        ));
    }

    #[test]
    fn test_unchecked_suicide_removes_own_group() {
        let mut s = GameSession::with_turn_order(9, TurnOrder::Free).unwrap();
        s.play(Move::play(8, 7, Stone::White)).unwrap();
        s.play(Move::play(7, 8, Stone::White)).unwrap();
        s.place_unchecked(Move::play(8, 8, Stone::Black)).unwrap();
        assert_eq!(s.color_at(8, 8), Ok(Color::Empty));
        assert_eq!(s.captures().get(Stone::White), 1);
    }

    #[test]
    fn test_legal_moves_exclude_occupied_and_sentinel() {
        let mut s = GameSession::new(9).unwrap();
        s.play_at(4, 4).unwrap();
        let moves = s.legal_moves(Stone::White);
        // 81 points, minus the stone, minus the reserved origin, plus pass
        assert_eq!(moves.len(), 81 - 1 - 1 + 1);
        assert!(moves.contains(&Move::pass(Stone::White)));
        assert!(!moves.contains(&Move::play(4, 4, Stone::White)));
        assert!(!moves.contains(&Move::play(0, 0, Stone::White)));
        // Black is not to move under strict turn order
        assert!(s.legal_moves(Stone::Black).is_empty());
    }

    #[test]
    fn test_strict_turn_order_rejects_out_of_turn_pass() {
        let mut s = session();
        let err = s.play(Move::pass(Stone::White)).unwrap_err();
        assert_eq!(err.reason, IllegalReason::WrongColor);
        assert_eq!(s.to_move(), Stone::Black);
        assert!(s.history().is_empty());

        let mut free = GameSession::with_turn_order(9, TurnOrder::Free).unwrap();
        free.play(Move::pass(Stone::White)).unwrap();
        assert_eq!(free.to_move(), Stone::Black);
    }
}
