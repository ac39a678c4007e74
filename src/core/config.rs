//! Guard and simulation configuration with documented constants
//!
//! All tunables are collected here with explanations of their purpose
//! and how they interact with each other. Both structs deserialize from
//! TOML; any key left out falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{GuardError, Result};
use crate::core::types::Position;

/// Configuration for a single guard's decision engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    // === LEARNING ===
    /// Q-update step size (alpha)
    ///
    /// At 0.7 a single update moves the estimate 70% of the way to the
    /// new target, so the table reacts quickly to a moving player.
    pub learning_rate: f64,

    /// Weight of the best next-state value in the update target (gamma)
    pub discount: f64,

    /// Initial exploration probability
    ///
    /// In CHASE this is also the probability of taking the BFS expert move.
    pub epsilon: f64,

    /// Multiplier applied to epsilon after every real update
    ///
    /// At 0.95 epsilon reaches its floor of 0.1 after ~44 updates.
    pub epsilon_decay: f64,

    /// Floor for epsilon
    pub epsilon_min: f64,

    /// Synthetic Dyna-Q updates run after each real update
    pub planning_steps: usize,

    // === BEHAVIOR ===
    /// Invisible ticks tolerated in CHASE before switching to SEARCH
    pub lost_threshold: u32,

    /// Chance of a uniformly random move while patrolling
    pub patrol_random_chance: f64,

    // === PERCEPTION ===
    /// Maximum sight distance in cells (Euclidean)
    pub max_range: f64,

    /// Full width of the vision cone in degrees
    pub fov_degrees: f64,

    // === STATE ENCODING ===
    /// Cap for the time-since-seen component of the state key
    pub time_since_seen_cap: u32,

    /// Cap for the distance bucket component of the state key
    pub distance_bucket_cap: u32,

    // === STUCK DETECTION ===
    /// Number of recent positions remembered
    pub history_capacity: usize,

    /// Fewer distinct positions than this in a full history means stuck
    pub stuck_threshold: usize,

    /// Seed for the guard's private random source
    pub seed: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.7,
            discount: 0.9,
            epsilon: 0.95,
            epsilon_decay: 0.95,
            epsilon_min: 0.1,
            planning_steps: 5,

            lost_threshold: 3,
            patrol_random_chance: 0.2,

            max_range: 6.0,
            fov_degrees: 90.0,

            time_since_seen_cap: 15,
            distance_bucket_cap: 5,

            history_capacity: 6,
            stuck_threshold: 4,

            seed: 42,
        }
    }
}

impl GuardConfig {
    /// Same config with a different random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| -> Result<()> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(GuardError::InvalidConfig(format!(
                    "{name} ({v}) must be within [0, 1]"
                )))
            }
        };
        unit("learning_rate", self.learning_rate)?;
        unit("discount", self.discount)?;
        unit("epsilon", self.epsilon)?;
        unit("epsilon_decay", self.epsilon_decay)?;
        unit("epsilon_min", self.epsilon_min)?;
        unit("patrol_random_chance", self.patrol_random_chance)?;

        if self.epsilon_min > self.epsilon {
            return Err(GuardError::InvalidConfig(format!(
                "epsilon_min ({}) should be <= epsilon ({})",
                self.epsilon_min, self.epsilon
            )));
        }

        if self.max_range <= 0.0 {
            return Err(GuardError::InvalidConfig("max_range must be positive".into()));
        }

        if self.fov_degrees <= 0.0 || self.fov_degrees > 360.0 {
            return Err(GuardError::InvalidConfig(format!(
                "fov_degrees ({}) must be within (0, 360]",
                self.fov_degrees
            )));
        }

        if self.history_capacity == 0 {
            return Err(GuardError::InvalidConfig("history_capacity must be non-zero".into()));
        }

        if self.stuck_threshold > self.history_capacity {
            return Err(GuardError::InvalidConfig(format!(
                "stuck_threshold ({}) should be <= history_capacity ({})",
                self.stuck_threshold, self.history_capacity
            )));
        }

        Ok(())
    }
}

/// Configuration for the headless episode driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub guard: GuardConfig,

    // === WORLD ===
    /// Side length of the square world
    pub world_size: usize,

    /// Rooms the generator tries to place
    pub room_count: usize,

    /// Seed for layout generation and the scripted player
    pub world_seed: u64,

    /// Regenerate the layout between episodes
    pub change_layout: bool,

    // === EPISODES ===
    pub episodes: u32,

    /// Episode ends after this many ticks even if the player was not caught
    pub max_ticks: u64,

    /// Ticks without sight after which the guard is penalised for idling
    pub idle_threshold: u32,

    pub guard_start: Position,
    pub player_start: Position,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            guard: GuardConfig::default(),

            world_size: 20,
            room_count: 4,
            world_seed: 7,
            change_layout: false,

            episodes: 10,
            max_ticks: 500,
            idle_threshold: 20,

            guard_start: Position::new(15, 15),
            player_start: Position::new(5, 5),
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.guard.validate()?;

        // Wall border plus at least one interior cell
        if self.world_size < 3 {
            return Err(GuardError::InvalidConfig(format!(
                "world_size ({}) must be at least 3",
                self.world_size
            )));
        }

        if self.max_ticks == 0 {
            return Err(GuardError::InvalidConfig("max_ticks must be non-zero".into()));
        }

        Ok(())
    }
}
