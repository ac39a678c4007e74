//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Simulation tick counter
pub type Tick = u64;

/// Integer grid coordinate.
///
/// Rows grow downward, columns grow to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// Cell reached by taking `action` from here (no bounds or wall checks)
    pub fn step(self, action: Action) -> Self {
        let (dr, dc) = action.delta();
        Self::new(self.row + dr, self.col + dc)
    }

    pub fn manhattan(&self, other: &Self) -> i32 {
        (self.row - other.row).abs() + (self.col - other.col).abs()
    }

    pub fn distance(&self, other: &Self) -> f64 {
        let dr = (other.row - self.row) as f64;
        let dc = (other.col - self.col) as f64;
        dr.hypot(dc)
    }

    /// Signed offset `(rows, cols)` from `self` to `other`
    pub fn offset_to(&self, other: &Self) -> (i32, i32) {
        (other.row - self.row, other.col - self.col)
    }
}

impl From<(i32, i32)> for Position {
    fn from((row, col): (i32, i32)) -> Self {
        Self::new(row, col)
    }
}

/// The four discrete moves. Discriminants are the action-value vector indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
}

impl Action {
    pub const COUNT: usize = 4;

    /// Fixed enumeration order used for tie-breaking everywhere
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    pub const fn index(self) -> usize {
        self as usize
    }

    /// `(row, col)` delta
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (-1, 0),
            Action::Down => (1, 0),
            Action::Left => (0, -1),
            Action::Right => (0, 1),
        }
    }

    /// Unit facing vector for field-of-view tests
    pub fn unit_vector(self) -> (f64, f64) {
        let (dr, dc) = self.delta();
        (dr as f64, dc as f64)
    }
}

/// Kind of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CellKind {
    #[default]
    Floor = 0,
    Room = 1,
    Wall = 2,
}

impl CellKind {
    pub fn is_wall(self) -> bool {
        matches!(self, CellKind::Wall)
    }

    pub fn glyph(self) -> char {
        match self {
            CellKind::Floor => '.',
            CellKind::Room => 'r',
            CellKind::Wall => '#',
        }
    }

    pub fn from_glyph(c: char) -> Option<Self> {
        match c {
            '.' => Some(CellKind::Floor),
            'r' => Some(CellKind::Room),
            '#' => Some(CellKind::Wall),
            _ => None,
        }
    }
}
