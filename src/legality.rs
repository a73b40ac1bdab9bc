//! Move legality: bounds, occupancy, turn order, ko, and suicide.
//!
//! Evaluation never touches the caller's board. The candidate stone is placed
//! on a scratch copy so that opponent captures are resolved before the
//! suicide check, exactly as they would be during a real play.

use thiserror::Error;

use crate::board::{Board, Color, Group, Point, Stone};
use crate::constants::RESERVED_SENTINEL;
use crate::ko::KoState;

/// Why a stone move was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum IllegalReason {
    #[error("off board")]
    OutOfBounds,
    #[error("reserved point")]
    ReservedSentinel,
    #[error("point not empty")]
    Occupied,
    #[error("wrong color")]
    WrongColor,
    #[error("retakes ko")]
    KoViolation,
    #[error("suicide")]
    Suicide,
}

/// Outcome of evaluating a stone move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Legality {
    /// The move may be played; these opponent groups would be removed.
    Legal { captured: Vec<Group> },
    Illegal(IllegalReason),
}

impl Legality {
    pub fn is_legal(&self) -> bool {
        matches!(self, Legality::Legal { .. })
    }

    pub fn reason(&self) -> Option<IllegalReason> {
        match self {
            Legality::Legal { .. } => None,
            Legality::Illegal(reason) => Some(*reason),
        }
    }
}

/// Evaluate a stone of color `stone` at `(x, y)`.
///
/// Checks run in a fixed order and the first failure wins. `to_move` is the
/// side whose turn it is when turn order is enforced, or `None` when any
/// color may play.
pub fn evaluate(
    board: &Board,
    ko: &KoState,
    (x, y): Point,
    stone: Stone,
    to_move: Option<Stone>,
) -> Legality {
    if !board.contains(x, y) {
        return Legality::Illegal(IllegalReason::OutOfBounds);
    }
    if (x, y) == RESERVED_SENTINEL {
        return Legality::Illegal(IllegalReason::ReservedSentinel);
    }
    if board.at((x, y)) != Color::Empty {
        return Legality::Illegal(IllegalReason::Occupied);
    }
    if to_move.is_some_and(|side| side != stone) {
        return Legality::Illegal(IllegalReason::WrongColor);
    }
    if ko.forbids((x, y), stone) {
        return Legality::Illegal(IllegalReason::KoViolation);
    }

    let mut scratch = board.clone();
    scratch.set((x, y), stone.into());
    let captured = captured_by(&scratch, (x, y), stone);
    for group in &captured {
        scratch.remove(group);
    }

    match scratch.group_and_liberties(x, y) {
        Some(own) if own.liberty_count() > 0 => Legality::Legal { captured },
        _ => Legality::Illegal(IllegalReason::Suicide),
    }
}

/// Opponent groups adjacent to a just-placed stone that have no liberties left.
///
/// `board` must already hold `stone` at `point`. Each group is reported once
/// even when it touches the placed stone on several sides.
pub(crate) fn captured_by(board: &Board, (x, y): Point, stone: Stone) -> Vec<Group> {
    let opponent = Color::from(stone.opponent());
    let mut captured: Vec<Group> = Vec::new();
    for (nx, ny) in board.neighbors_of(x, y) {
        if board.at((nx, ny)) != opponent || captured.iter().any(|g| g.contains((nx, ny))) {
            continue;
        }
        if let Some(group) = board.group_and_liberties(nx, ny) {
            if group.liberty_count() == 0 {
                captured.push(group);
            }
        }
    }
    captured
}
