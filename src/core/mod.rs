pub mod config;
pub mod error;
pub mod types;

pub use config::{GuardConfig, SimulationConfig};
pub use error::{GuardError, Result};
pub use types::{Action, CellKind, Position, Tick};
