//! Partial map memory built from the cells the guard has stood on
//!
//! Standing on a cell also reveals its four neighbors, so walls bordering
//! visited floor become known and doorways can be recognised.

use ahash::AHashMap;

use crate::core::types::{Action, CellKind, Position};
use crate::world::grid::GridWorld;

#[derive(Debug, Clone, Default)]
pub struct MapMemory {
    known: AHashMap<Position, CellKind>,
}

impl MapMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the cell at `pos` and its in-bounds neighbors
    pub fn memorize(&mut self, pos: Position, grid: &GridWorld) {
        if let Some(kind) = grid.cell(pos) {
            self.known.insert(pos, kind);
        }
        for action in Action::ALL {
            let next = pos.step(action);
            if let Some(kind) = grid.cell(next) {
                self.known.insert(next, kind);
            }
        }
    }

    pub fn get(&self, pos: &Position) -> Option<CellKind> {
        self.known.get(pos).copied()
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Known floor cell next to at least one known wall
    fn is_known_doorway(&self, pos: Position) -> bool {
        self.get(&pos) == Some(CellKind::Floor)
            && Action::ALL
                .iter()
                .any(|a| self.get(&pos.step(*a)) == Some(CellKind::Wall))
    }

    /// Nearest known doorway by Manhattan distance
    ///
    /// Ties resolve to the smallest `(row, col)` so the answer does not
    /// depend on hash iteration order.
    pub fn nearest_door(&self, pos: Position) -> Option<Position> {
        self.known
            .keys()
            .copied()
            .filter(|p| self.is_known_doorway(*p))
            .min_by_key(|p| (p.manhattan(&pos), p.row, p.col))
    }

    /// Nearest known doorway, or `fallback` when none is known
    pub fn nearest_door_or(&self, pos: Position, fallback: Position) -> Position {
        self.nearest_door(pos).unwrap_or(fallback)
    }

    pub fn clear(&mut self) {
        self.known.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> GridWorld {
        GridWorld::parse(
            "
            #######
            #rr.rr#
            #######
            ",
        )
        .unwrap()
    }

    #[test]
    fn test_memory_grows_monotonically() {
        let grid = GridWorld::open(6, 6);
        let mut memory = MapMemory::new();
        memory.memorize(Position::new(2, 2), &grid);
        let before = memory.len();
        assert_eq!(before, 5);

        memory.memorize(Position::new(2, 3), &grid);
        assert!(memory.len() >= before);
        memory.memorize(Position::new(2, 2), &grid);
        assert_eq!(memory.len(), 8);
    }

    #[test]
    fn test_no_doors_known_uses_fallback() {
        let grid = GridWorld::empty(8, 8);
        let mut memory = MapMemory::new();
        memory.memorize(Position::new(4, 4), &grid);
        let fallback = Position::new(2, 2);
        assert_eq!(memory.nearest_door_or(Position::new(4, 4), fallback), fallback);
    }

    #[test]
    fn test_finds_floor_between_walls() {
        let grid = corridor();
        let mut memory = MapMemory::new();
        for col in 1..=5 {
            memory.memorize(Position::new(1, col), &grid);
        }
        // Only (1, 3) is floor; room cells never count
        assert_eq!(memory.nearest_door(Position::new(1, 1)), Some(Position::new(1, 3)));
    }

    #[test]
    fn test_nearest_by_manhattan() {
        let grid = GridWorld::open(10, 10);
        let mut memory = MapMemory::new();
        memory.memorize(Position::new(1, 1), &grid);
        memory.memorize(Position::new(8, 8), &grid);

        assert_eq!(memory.nearest_door(Position::new(7, 7)), Some(Position::new(8, 8)));
        assert_eq!(memory.nearest_door(Position::new(2, 2)), Some(Position::new(1, 1)));
    }
}
