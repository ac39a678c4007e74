//! Stealth Guard - adaptive guard controller for grid-based stealth simulation
//!
//! A guard patrols, chases and searches for a player using a blend of
//! breadth-first pathfinding and per-mode Q-learning with Dyna-Q planning.

pub mod core;
pub mod guard;
pub mod simulation;
pub mod world;
