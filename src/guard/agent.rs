//! The guard: every decision component behind one owner
//!
//! The agent never holds the grid or its own authoritative position. The
//! driver passes both in each tick and applies the returned actions.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::GuardConfig;
use crate::core::error::Result;
use crate::core::types::{Action, Position, Tick};
use crate::guard::behavior::BehaviorStateMachine;
use crate::guard::memory::MapMemory;
use crate::guard::pathfinding::first_step;
use crate::guard::policy::{ActionPolicy, Decision, PatrolRoute};
use crate::guard::snapshot::PolicySnapshot;
use crate::guard::state::{Mode, Situation, StateKey};
use crate::guard::stuck::StuckDetector;
use crate::guard::visibility::VisionCone;
use crate::world::grid::GridWorld;

#[derive(Debug, Clone)]
pub struct GuardAgent {
    config: GuardConfig,
    cone: VisionCone,
    machine: BehaviorStateMachine,
    policy: ActionPolicy,
    memory: MapMemory,
    stuck: StuckDetector,
    facing: Action,
    /// Visibility from the most recent `observe`
    visible: bool,
    rng: ChaCha8Rng,
}

impl GuardAgent {
    pub fn new(config: GuardConfig, grid: &GridWorld) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cone: VisionCone::new(config.max_range, config.fov_degrees),
            machine: BehaviorStateMachine::new(config.lost_threshold),
            policy: ActionPolicy::new(&config, PatrolRoute::for_grid(grid)),
            memory: MapMemory::new(),
            stuck: StuckDetector::new(config.history_capacity, config.stuck_threshold),
            facing: Action::Down,
            visible: false,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    /// Reset per-episode state for a (possibly new) grid
    ///
    /// Q-tables, the experience model and epsilon carry over.
    pub fn begin_episode(&mut self, grid: &GridWorld) {
        self.machine.reset();
        self.memory.clear();
        self.stuck.reset();
        self.facing = Action::Down;
        self.visible = false;
        self.policy.set_patrol(PatrolRoute::for_grid(grid));
    }

    /// Test visibility and run the mode transition; returns visibility
    pub fn observe(&mut self, guard: Position, player: Position, grid: &GridWorld, tick: Tick) -> bool {
        self.visible = self.cone.can_see(guard, player, grid, self.facing);
        let mode = self.machine.update(self.visible, player);
        tracing::trace!(tick, visible = self.visible, %mode, "observe");
        self.visible
    }

    pub fn state_key(&self, guard: Position, player: Position, grid: &GridWorld) -> StateKey {
        let situation = Situation {
            mode: self.machine.mode(),
            visible: self.visible,
            guard,
            target: player,
            time_since_seen: self.machine.time_since_seen(),
            in_room: grid.is_room(player),
        };
        StateKey::encode(
            &situation,
            self.config.time_since_seen_cap,
            self.config.distance_bucket_cap,
        )
    }

    /// Mode-driven action proposal; the caller still validates it
    pub fn choose_action(
        &mut self,
        guard: Position,
        player: Position,
        state: StateKey,
        grid: &GridWorld,
    ) -> Action {
        let decision = Decision {
            guard,
            target: player,
            visible: self.visible,
            state,
        };
        self.policy
            .select_action(&mut self.machine, &decision, grid, &mut self.rng)
    }

    /// Real update plus Dyna-Q planning against the table of `state.mode`
    ///
    /// Returns the new Q-value, or `None` when the state was PATROL.
    pub fn learn(&mut self, state: StateKey, action: Action, reward: f64, next_state: StateKey) -> Option<f64> {
        let value = self.policy.update(state.mode, state, action, reward, next_state)?;
        self.policy.plan_default(state.mode, &mut self.rng);
        Some(value)
    }

    /// Remember the cell and check for lack of progress
    ///
    /// Returns the forced escape step toward the nearest known doorway (or
    /// the current patrol waypoint) when the guard is stuck.
    pub fn record_position(&mut self, pos: Position, grid: &GridWorld) -> Option<Action> {
        self.memory.memorize(pos, grid);
        if !self.stuck.record(pos) {
            return None;
        }
        let goal = self.memory.nearest_door_or(pos, self.policy.patrol().current());
        let step = first_step(pos, goal, grid, &mut self.rng);
        tracing::debug!(row = pos.row, col = pos.col, ?goal, ?step, "stuck, forcing escape");
        Some(step)
    }

    pub fn set_facing(&mut self, facing: Action) {
        self.facing = facing;
    }

    pub fn facing(&self) -> Action {
        self.facing
    }

    pub fn mode(&self) -> Mode {
        self.machine.mode()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn epsilon(&self) -> f64 {
        self.policy.epsilon()
    }

    pub fn last_known(&self) -> Option<Position> {
        self.machine.last_known()
    }

    pub fn time_since_seen(&self) -> u32 {
        self.machine.time_since_seen()
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn policy(&self) -> &ActionPolicy {
        &self.policy
    }

    pub fn memory(&self) -> &MapMemory {
        &self.memory
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        self.policy.snapshot()
    }

    pub fn restore(&mut self, snapshot: &PolicySnapshot) -> Result<()> {
        self.policy.restore(snapshot)
    }
}
