//! Headless episode driver
//!
//! Supplies the guard with a grid, a player position and a tick cadence,
//! validates its moves against walls, and feeds back a shaped reward.

pub mod episode;
pub mod player;
pub mod runner;

pub use episode::{resolve_move, shaped_reward, Episode, EpisodeSummary, ModeTicks, TickOutcome};
pub use player::{PlayerPolicy, RandomWalk, Scripted, Stationary};
pub use runner::Simulation;
