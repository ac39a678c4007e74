//! Static cell grid the guard navigates
//!
//! Immutable during an episode; layout changes happen between episodes
//! through `&mut` access only.

use crate::core::error::{GuardError, Result};
use crate::core::types::{Action, CellKind, Position};

/// Rectangular grid of cell kinds, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridWorld {
    pub width: usize,
    pub height: usize,
    cells: Vec<CellKind>,
}

impl GridWorld {
    /// Grid filled with a single cell kind
    pub fn filled(width: usize, height: usize, kind: CellKind) -> Self {
        Self {
            width,
            height,
            cells: vec![kind; width * height],
        }
    }

    /// Floor grid with no walls at all
    pub fn empty(width: usize, height: usize) -> Self {
        Self::filled(width, height, CellKind::Floor)
    }

    /// Floor interior surrounded by a wall border
    pub fn open(width: usize, height: usize) -> Self {
        let mut grid = Self::empty(width, height);
        grid.add_border();
        grid
    }

    /// Parse an ASCII map: `#` wall, `.` floor, `r` room
    ///
    /// Blank lines and surrounding whitespace are ignored. Rows must all
    /// have the same width.
    pub fn parse(text: &str) -> Result<Self> {
        let rows: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let height = rows.len();
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(GuardError::InvalidMap("map is empty".into()));
        }

        let mut cells = Vec::with_capacity(width * height);
        for (row, line) in rows.iter().enumerate() {
            if line.chars().count() != width {
                return Err(GuardError::InvalidMap(format!(
                    "row {} has width {}, expected {}",
                    row,
                    line.chars().count(),
                    width
                )));
            }
            for (col, c) in line.chars().enumerate() {
                let kind = CellKind::from_glyph(c).ok_or_else(|| {
                    GuardError::InvalidMap(format!("unknown cell '{c}' at ({row}, {col})"))
                })?;
                cells.push(kind);
            }
        }

        Ok(Self { width, height, cells })
    }

    #[inline]
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row >= 0
            && pos.col >= 0
            && (pos.row as usize) < self.height
            && (pos.col as usize) < self.width
    }

    #[inline]
    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.row as usize * self.width + pos.col as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn cell(&self, pos: Position) -> Option<CellKind> {
        self.index(pos).map(|i| self.cells[i])
    }

    pub fn set(&mut self, pos: Position, kind: CellKind) -> Result<()> {
        let i = self.index(pos).ok_or(GuardError::OutOfBounds(pos))?;
        self.cells[i] = kind;
        Ok(())
    }

    /// Out-of-bounds cells count as walls
    #[inline]
    pub fn is_wall(&self, pos: Position) -> bool {
        self.cell(pos).map_or(true, CellKind::is_wall)
    }

    #[inline]
    pub fn is_walkable(&self, pos: Position) -> bool {
        !self.is_wall(pos)
    }

    pub fn is_room(&self, pos: Position) -> bool {
        self.cell(pos) == Some(CellKind::Room)
    }

    /// Walkable 4-neighbors in action order
    pub fn walkable_neighbors(&self, pos: Position) -> impl Iterator<Item = (Action, Position)> + '_ {
        Action::ALL
            .into_iter()
            .map(move |action| (action, pos.step(action)))
            .filter(|(_, next)| self.is_walkable(*next))
    }

    /// Turn the outermost ring into walls
    pub fn add_border(&mut self) {
        let (w, h) = (self.width as i32, self.height as i32);
        for col in 0..w {
            self.cells[col as usize] = CellKind::Wall;
            self.cells[((h - 1) * w + col) as usize] = CellKind::Wall;
        }
        for row in 0..h {
            self.cells[(row * w) as usize] = CellKind::Wall;
            self.cells[(row * w + w - 1) as usize] = CellKind::Wall;
        }
    }

    /// True if every border cell is a wall
    pub fn has_wall_border(&self) -> bool {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..w).all(|c| self.is_wall(Position::new(0, c)) && self.is_wall(Position::new(h - 1, c)))
            && (0..h).all(|r| self.is_wall(Position::new(r, 0)) && self.is_wall(Position::new(r, w - 1)))
    }

    /// All positions in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height as i32)
            .flat_map(move |row| (0..self.width as i32).map(move |col| Position::new(row, col)))
    }

    /// Closest walkable cell to `pos` by Manhattan distance, first in
    /// row-major order on ties
    pub fn nearest_walkable(&self, pos: Position) -> Option<Position> {
        self.positions()
            .filter(|p| self.is_walkable(*p))
            .min_by_key(|p| p.manhattan(&pos))
    }

    /// Render as ASCII with optional overlay glyphs (later overlays win)
    pub fn render_ascii(&self, overlays: &[(Position, char)]) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in 0..self.height as i32 {
            for col in 0..self.width as i32 {
                let pos = Position::new(row, col);
                let glyph = overlays
                    .iter()
                    .rev()
                    .find(|(p, _)| *p == pos)
                    .map(|(_, g)| *g)
                    .unwrap_or_else(|| self.cells[row as usize * self.width + col as usize].glyph());
                out.push(glyph);
            }
            out.push('\n');
        }
        out
    }
}
