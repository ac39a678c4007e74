//! Grid world provider: static layout plus room generation

pub mod generation;
pub mod grid;

pub use generation::{generate_rooms, Layout, RoomRect};
pub use grid::GridWorld;
