//! Board representation and group/liberty traversal.
//!
//! The board is a flat `size * size` array of [`Color`] values addressed by
//! zero-based `(x, y)`, with `y = 0` as the top row. Groups are not stored:
//! they are derived on demand by flood-fill over same-colored neighbors.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::constants::column_letter;

/// A coordinate on the board: `(x, y)`.
pub type Point = (usize, usize);

/// The contents of an intersection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Color {
    #[default]
    Empty,
    Black,
    White,
}

/// A player, or the color of a placed stone.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stone {
    Black,
    White,
}

impl Stone {
    pub fn opponent(self) -> Stone {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }
}

impl From<Stone> for Color {
    fn from(stone: Stone) -> Self {
        match stone {
            Stone::Black => Color::Black,
            Stone::White => Color::White,
        }
    }
}

impl Color {
    /// The stone occupying this intersection, if any.
    pub fn stone(self) -> Option<Stone> {
        match self {
            Color::Empty => None,
            Color::Black => Some(Stone::Black),
            Color::White => Some(Stone::White),
        }
    }
}

impl fmt::Display for Stone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stone::Black => write!(f, "black"),
            Stone::White => write!(f, "white"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("point ({x}, {y}) is off the {size}x{size} board")]
    OutOfBounds { x: usize, y: usize, size: usize },
    #[error("unsupported board size {0}")]
    UnsupportedSize(usize),
}

/// A maximal connected set of same-colored stones and its liberties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub stone: Stone,
    pub stones: BTreeSet<Point>,
    pub liberties: BTreeSet<Point>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.stones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stones.is_empty()
    }

    pub fn liberty_count(&self) -> usize {
        self.liberties.len()
    }

    pub fn contains(&self, point: Point) -> bool {
        self.stones.contains(&point)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Color>,
}

impl Board {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Color::Empty; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.size + x
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.size && y < self.size
    }

    pub fn color_at(&self, x: usize, y: usize) -> Result<Color, BoardError> {
        if !self.contains(x, y) {
            return Err(BoardError::OutOfBounds {
                x,
                y,
                size: self.size,
            });
        }
        Ok(self.cells[self.idx(x, y)])
    }

    /// Color at an in-bounds point.
    pub(crate) fn at(&self, (x, y): Point) -> Color {
        self.cells[self.idx(x, y)]
    }

    pub(crate) fn set(&mut self, (x, y): Point, color: Color) {
        let i = self.idx(x, y);
        self.cells[i] = color;
    }

    /// Empty every stone of `group`.
    pub(crate) fn remove(&mut self, group: &Group) {
        for &p in &group.stones {
            self.set(p, Color::Empty);
        }
    }

    /// Orthogonal neighbors of `(x, y)`; fewer than four at edges, none off the board.
    pub fn neighbors_of(&self, x: usize, y: usize) -> impl Iterator<Item = Point> + use<> {
        let s = self.size;
        let mut v = Vec::with_capacity(4);
        if x < s && y < s {
            if x > 0 {
                v.push((x - 1, y));
            }
            if x + 1 < s {
                v.push((x + 1, y));
            }
            if y > 0 {
                v.push((x, y - 1));
            }
            if y + 1 < s {
                v.push((x, y + 1));
            }
        }
        v.into_iter()
    }

    /// The group containing `(x, y)` and its liberties.
    ///
    /// Returns `None` for an empty or off-board point. Cost is proportional
    /// to the group size.
    pub fn group_and_liberties(&self, x: usize, y: usize) -> Option<Group> {
        let stone = self.color_at(x, y).ok()?.stone()?;
        let color = Color::from(stone);
        let mut stack = vec![(x, y)];
        let mut visited = vec![false; self.size * self.size];
        let mut stones = BTreeSet::new();
        let mut liberties = BTreeSet::new();

        while let Some((cx, cy)) = stack.pop() {
            let i = self.idx(cx, cy);
            if visited[i] {
                continue;
            }
            visited[i] = true;
            stones.insert((cx, cy));
            for (nx, ny) in self.neighbors_of(cx, cy) {
                match self.at((nx, ny)) {
                    Color::Empty => {
                        liberties.insert((nx, ny));
                    }
                    c if c == color && !visited[self.idx(nx, ny)] => stack.push((nx, ny)),
                    _ => {}
                }
            }
        }

        Some(Group {
            stone,
            stones,
            liberties,
        })
    }

    /// All occupied points with their stones, in row-major order.
    pub fn stones(&self) -> impl Iterator<Item = (Point, Stone)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.stone().map(|s| ((i % self.size, i / self.size), s))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|c| *c == Color::Empty)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for x in 0..self.size {
            write!(f, " {}", column_letter(x))?;
        }
        writeln!(f)?;
        for y in 0..self.size {
            write!(f, "{:>2} ", self.size - y)?;
            for x in 0..self.size {
                let ch = match self.at((x, y)) {
                    Color::Black => 'X',
                    Color::White => 'O',
                    Color::Empty => '.',
                };
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
