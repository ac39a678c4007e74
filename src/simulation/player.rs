//! Scripted stand-ins for player input

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::types::{Action, Position};
use crate::world::grid::GridWorld;

/// Source of player moves, queried once per tick
pub trait PlayerPolicy {
    /// Move for this tick, or `None` to stand still
    fn next_move(&mut self, player: Position, grid: &GridWorld) -> Option<Action>;
}

/// Never moves
#[derive(Debug, Clone, Copy, Default)]
pub struct Stationary;

impl PlayerPolicy for Stationary {
    fn next_move(&mut self, _player: Position, _grid: &GridWorld) -> Option<Action> {
        None
    }
}

/// Uniform step onto a walkable neighbor, pausing with probability `idle_chance`
#[derive(Debug, Clone)]
pub struct RandomWalk {
    rng: ChaCha8Rng,
    idle_chance: f64,
}

impl RandomWalk {
    pub fn new(seed: u64) -> Self {
        Self::with_idle_chance(seed, 0.0)
    }

    pub fn with_idle_chance(seed: u64, idle_chance: f64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            idle_chance: idle_chance.clamp(0.0, 1.0),
        }
    }
}

impl PlayerPolicy for RandomWalk {
    fn next_move(&mut self, player: Position, grid: &GridWorld) -> Option<Action> {
        if self.idle_chance > 0.0 && self.rng.gen::<f64>() < self.idle_chance {
            return None;
        }
        let options: Vec<Action> = grid.walkable_neighbors(player).map(|(a, _)| a).collect();
        if options.is_empty() {
            return None;
        }
        Some(options[self.rng.gen_range(0..options.len())])
    }
}

/// Replays a fixed list of moves, then stands still
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    moves: Vec<Option<Action>>,
    cursor: usize,
}

impl Scripted {
    pub fn new(moves: Vec<Option<Action>>) -> Self {
        Self { moves, cursor: 0 }
    }
}

impl PlayerPolicy for Scripted {
    fn next_move(&mut self, _player: Position, _grid: &GridWorld) -> Option<Action> {
        let next = self.moves.get(self.cursor).copied().flatten();
        self.cursor += 1;
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_walk_stays_walkable() {
        let grid = GridWorld::open(6, 6);
        let mut walker = RandomWalk::new(9);
        let mut pos = Position::new(1, 1);
        for _ in 0..200 {
            if let Some(action) = walker.next_move(pos, &grid) {
                pos = pos.step(action);
            }
            assert!(grid.is_walkable(pos));
        }
    }

    #[test]
    fn test_random_walk_is_seeded() {
        let grid = GridWorld::open(8, 8);
        let pos = Position::new(4, 4);
        let a: Vec<_> = {
            let mut w = RandomWalk::new(3);
            (0..20).map(|_| w.next_move(pos, &grid)).collect()
        };
        let b: Vec<_> = {
            let mut w = RandomWalk::new(3);
            (0..20).map(|_| w.next_move(pos, &grid)).collect()
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_scripted_then_idle() {
        let grid = GridWorld::open(5, 5);
        let mut script = Scripted::new(vec![Some(Action::Up), None, Some(Action::Left)]);
        let pos = Position::new(2, 2);
        assert_eq!(script.next_move(pos, &grid), Some(Action::Up));
        assert_eq!(script.next_move(pos, &grid), None);
        assert_eq!(script.next_move(pos, &grid), Some(Action::Left));
        assert_eq!(script.next_move(pos, &grid), None);
        assert_eq!(Stationary.next_move(pos, &grid), None);
    }
}
