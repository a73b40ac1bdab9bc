//! Simple-ko tracking.
//!
//! At most one intersection is forbidden at a time, and only for one color.
//! The restriction lasts exactly one ply: whatever is played next, including
//! a pass, replaces it.

use crate::board::{Group, Point, Stone};

/// The forbidden recapture point and the color that may not play there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ko {
    pub point: Point,
    pub forbidden: Stone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KoState {
    active: Option<Ko>,
}

impl KoState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<Ko> {
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whether `stone` is barred from playing at `point` this ply.
    pub fn forbids(&self, point: Point, stone: Stone) -> bool {
        matches!(self.active, Some(ko) if ko.point == point && ko.forbidden == stone)
    }

    /// The ko state following a stone play by `mover`.
    ///
    /// A ko arises when exactly one opponent stone was captured and the
    /// placed stone stands alone with a single liberty (the captured point).
    pub fn after_play(mover: Stone, captured: &[Group], placed: &Group) -> Self {
        let mut taken = captured.iter().flat_map(|g| g.stones.iter());
        let (Some(&point), None) = (taken.next(), taken.next()) else {
            return Self::none();
        };
        if placed.len() == 1 && placed.liberty_count() == 1 {
            Self {
                active: Some(Ko {
                    point,
                    forbidden: mover.opponent(),
                }),
            }
        } else {
            Self::none()
        }
    }
}
