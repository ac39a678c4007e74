//! Behavior modes and the discrete state key used by the Q-tables

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::types::Position;

/// Offsets strictly beyond this many cells set a directional flag
const DIRECTION_THRESHOLD: i32 = 2;

/// Guard behavior mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Patrol,
    Chase,
    Search,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Patrol, Mode::Chase, Mode::Search];

    /// Modes that own a Q-table
    pub fn is_learning(self) -> bool {
        match self {
            Mode::Patrol => false,
            Mode::Chase | Mode::Search => true,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Patrol => "PATROL",
            Mode::Chase => "CHASE",
            Mode::Search => "SEARCH",
        };
        f.write_str(name)
    }
}

/// Raw inputs to state encoding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Situation {
    pub mode: Mode,
    pub visible: bool,
    pub guard: Position,
    pub target: Position,
    pub time_since_seen: u32,
    pub in_room: bool,
}

/// Discrete, hashable summary of a situation
///
/// Equality and hashing are structural over all fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey {
    pub mode: Mode,
    pub visible: bool,
    pub distance_bucket: u32,
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
    pub time_since_seen: u32,
    pub in_room: bool,
}

impl StateKey {
    /// Encode a situation. Pure: the same inputs always give the same key.
    pub fn encode(situation: &Situation, time_cap: u32, bucket_cap: u32) -> Self {
        let (dr, dc) = situation.guard.offset_to(&situation.target);
        let dist = situation.guard.distance(&situation.target);
        let bucket = ((dist / 2.0).floor() as u32).min(bucket_cap);

        Self {
            mode: situation.mode,
            visible: situation.visible,
            distance_bucket: bucket,
            north: dr < -DIRECTION_THRESHOLD,
            south: dr > DIRECTION_THRESHOLD,
            east: dc > DIRECTION_THRESHOLD,
            west: dc < -DIRECTION_THRESHOLD,
            time_since_seen: situation.time_since_seen.min(time_cap),
            in_room: situation.in_room,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn situation(guard: Position, target: Position) -> Situation {
        Situation {
            mode: Mode::Chase,
            visible: true,
            guard,
            target,
            time_since_seen: 0,
            in_room: false,
        }
    }

    #[test]
    fn test_distance_bucket() {
        let g = Position::new(0, 0);
        let key = StateKey::encode(&situation(g, Position::new(0, 3)), 15, 5);
        assert_eq!(key.distance_bucket, 1);
        let key = StateKey::encode(&situation(g, Position::new(0, 5)), 15, 5);
        assert_eq!(key.distance_bucket, 2);
        let key = StateKey::encode(&situation(g, Position::new(30, 30)), 15, 5);
        assert_eq!(key.distance_bucket, 5);
    }

    #[test]
    fn test_direction_flags() {
        let g = Position::new(10, 10);
        let key = StateKey::encode(&situation(g, Position::new(5, 14)), 15, 5);
        assert!(key.north && !key.south);
        assert!(key.east && !key.west);

        // Offsets of exactly two cells do not set flags
        let key = StateKey::encode(&situation(g, Position::new(12, 8)), 15, 5);
        assert!(!key.north && !key.south && !key.east && !key.west);
    }

    #[test]
    fn test_time_since_seen_is_clamped() {
        let mut s = situation(Position::new(0, 0), Position::new(1, 1));
        s.time_since_seen = 40;
        assert_eq!(StateKey::encode(&s, 15, 5).time_since_seen, 15);
    }

    #[test]
    fn test_structural_equality() {
        use std::collections::HashSet;
        let s = situation(Position::new(3, 3), Position::new(7, 1));
        let a = StateKey::encode(&s, 15, 5);
        let b = StateKey::encode(&s, 15, 5);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(Mode::Chase.to_string(), "CHASE");
        assert!(!Mode::Patrol.is_learning());
        assert!(Mode::Search.is_learning());
    }
}
