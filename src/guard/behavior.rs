//! PATROL / CHASE / SEARCH state machine
//!
//! Transitions are evaluated once per tick from the current visibility:
//! 1. Visible target: CHASE from any mode, counters reset.
//! 2. Lost sight while chasing: after `lost_threshold` grace ticks, SEARCH.
//! 3. Searching without sight: time-since-seen grows.
//!
//! PATROL is left only through rule 1. SEARCH returns to PATROL only from
//! action selection, once the guard reaches the last known position.

use crate::core::types::Position;
use crate::guard::state::Mode;

#[derive(Debug, Clone)]
pub struct BehaviorStateMachine {
    mode: Mode,
    lost_frames: u32,
    lost_threshold: u32,
    last_known: Option<Position>,
    time_since_seen: u32,
}

impl BehaviorStateMachine {
    pub fn new(lost_threshold: u32) -> Self {
        Self {
            mode: Mode::Patrol,
            lost_frames: 0,
            lost_threshold,
            last_known: None,
            time_since_seen: 0,
        }
    }

    /// Apply this tick's transition rules and return the resulting mode
    pub fn update(&mut self, visible: bool, target: Position) -> Mode {
        let before = self.mode;

        if visible {
            self.mode = Mode::Chase;
            self.lost_frames = 0;
            self.last_known = Some(target);
            self.time_since_seen = 0;
        } else {
            match self.mode {
                Mode::Chase => {
                    self.lost_frames += 1;
                    if self.lost_frames > self.lost_threshold {
                        self.mode = Mode::Search;
                        self.time_since_seen = 1;
                    }
                }
                Mode::Search => self.time_since_seen += 1,
                Mode::Patrol => {}
            }
        }

        if before != self.mode {
            tracing::debug!(from = %before, to = %self.mode, "mode transition");
        }
        self.mode
    }

    /// Fallback used by action selection when a search reaches its goal
    pub fn reset_to_patrol(&mut self) {
        if self.mode != Mode::Patrol {
            tracing::debug!(from = %self.mode, to = %Mode::Patrol, "search exhausted");
        }
        self.mode = Mode::Patrol;
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn last_known(&self) -> Option<Position> {
        self.last_known
    }

    pub fn time_since_seen(&self) -> u32 {
        self.time_since_seen
    }

    pub fn lost_frames(&self) -> u32 {
        self.lost_frames
    }

    /// Back to the initial PATROL state with no memory of the target
    pub fn reset(&mut self) {
        *self = Self::new(self.lost_threshold);
    }
}
