//! Breadth-first pathfinding on the 4-connected grid
//!
//! Every step costs the same, so BFS gives shortest step counts without
//! the priority queue an A* search needs. Neighbors are expanded in
//! action order (Up, Down, Left, Right), which fixes tie-breaking.

use std::collections::VecDeque;

use ahash::AHashMap;
use rand::Rng;

use crate::core::types::{Action, Position};
use crate::world::grid::GridWorld;

/// Breadth-first search from `start`, stopping once `goal` is discovered.
///
/// Returns the predecessor map: each discovered cell maps to the cell it
/// was reached from and the action taken.
fn search(start: Position, goal: Position, grid: &GridWorld) -> AHashMap<Position, (Position, Action)> {
    let mut came_from: AHashMap<Position, (Position, Action)> = AHashMap::new();
    let mut queue = VecDeque::new();
    queue.push_back(start);

    while let Some(current) = queue.pop_front() {
        if current == goal {
            break;
        }
        for (action, next) in grid.walkable_neighbors(current) {
            if next == start || came_from.contains_key(&next) {
                continue;
            }
            came_from.insert(next, (current, action));
            queue.push_back(next);
        }
    }

    came_from
}

/// Shortest sequence of moves from `start` to `goal`
///
/// Returns `Some(vec![])` when `start == goal` and `None` when the goal
/// cannot be reached through walkable cells.
pub fn find_path(start: Position, goal: Position, grid: &GridWorld) -> Option<Vec<Action>> {
    if start == goal {
        return Some(Vec::new());
    }
    if grid.is_wall(goal) {
        return None;
    }

    let came_from = search(start, goal, grid);
    reconstruct_path(&came_from, goal)
}

/// Walk predecessors back from the goal
fn reconstruct_path(
    came_from: &AHashMap<Position, (Position, Action)>,
    goal: Position,
) -> Option<Vec<Action>> {
    let mut path = Vec::new();
    let mut current = goal;
    while let Some(&(prev, action)) = came_from.get(&current) {
        path.push(action);
        current = prev;
    }
    if path.is_empty() {
        return None;
    }
    path.reverse();
    Some(path)
}

/// First move along a shortest path, or a uniformly random move when the
/// path is empty or the goal is unreachable
pub fn first_step<R: Rng + ?Sized>(
    start: Position,
    goal: Position,
    grid: &GridWorld,
    rng: &mut R,
) -> Action {
    match find_path(start, goal, grid).and_then(|path| path.first().copied()) {
        Some(action) => action,
        None => random_action(rng),
    }
}

pub fn random_action<R: Rng + ?Sized>(rng: &mut R) -> Action {
    Action::ALL[rng.gen_range(0..Action::COUNT)]
}

/// Cell reached by following `path` from `start`
pub fn walk(start: Position, path: &[Action]) -> Position {
    path.iter().fold(start, |pos, action| pos.step(*action))
}
