//! Stuck detection over a bounded window of recent positions

use std::collections::VecDeque;

use ahash::AHashSet;

use crate::core::types::Position;

/// Fixed-capacity FIFO of recent positions, overwritten oldest-first
#[derive(Debug, Clone)]
pub struct PositionHistory {
    positions: VecDeque<Position>,
    capacity: usize,
}

impl PositionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            positions: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, pos: Position) {
        if self.positions.len() == self.capacity {
            self.positions.pop_front();
        }
        self.positions.push_back(pos);
    }

    pub fn is_full(&self) -> bool {
        self.positions.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn distinct(&self) -> usize {
        self.positions.iter().collect::<AHashSet<_>>().len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

/// Flags lack of progress once the history window is full
#[derive(Debug, Clone)]
pub struct StuckDetector {
    history: PositionHistory,
    threshold: usize,
}

impl StuckDetector {
    pub fn new(capacity: usize, threshold: usize) -> Self {
        Self {
            history: PositionHistory::new(capacity),
            threshold,
        }
    }

    /// Push a position; returns true (and clears the window) when a full
    /// window holds fewer than `threshold` distinct positions
    pub fn record(&mut self, pos: Position) -> bool {
        self.history.push(pos);
        if self.history.is_full() && self.history.distinct() < self.threshold {
            self.history.clear();
            return true;
        }
        false
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
