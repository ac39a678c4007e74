//! Guard decision engine
//!
//! Leaves first: visibility, pathfinding, memory, stuck detection, then the
//! learning policy and the behavior state machine, with `GuardAgent` on top.

pub mod agent;
pub mod behavior;
pub mod memory;
pub mod model;
pub mod pathfinding;
pub mod policy;
pub mod q_table;
pub mod snapshot;
pub mod state;
pub mod stuck;
pub mod visibility;

pub use agent::GuardAgent;
pub use behavior::BehaviorStateMachine;
pub use memory::MapMemory;
pub use model::{ExperienceModel, Outcome, Transition};
pub use pathfinding::{find_path, first_step};
pub use policy::{ActionPolicy, Decision, PatrolRoute};
pub use q_table::{ActionValues, QTable};
pub use snapshot::PolicySnapshot;
pub use state::{Mode, Situation, StateKey};
pub use stuck::{PositionHistory, StuckDetector};
pub use visibility::{is_visible, VisionCone};
