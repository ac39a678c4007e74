//! Mode-dependent action selection and Q-learning
//!
//! PATROL is scripted: walk a cyclic waypoint route with some jitter.
//! CHASE blends the BFS expert with the CHASE Q-table. With probability
//! epsilon the expert move is taken; otherwise the table is consulted
//! epsilon-greedily. A high epsilon therefore means *more* pathfinding,
//! not more random moves, while the table is young.
//! SEARCH walks to the last known position and falls back to PATROL on
//! arrival.

use rand::Rng;

use crate::core::config::GuardConfig;
use crate::core::error::Result;
use crate::core::types::{Action, Position};
use crate::guard::behavior::BehaviorStateMachine;
use crate::guard::model::ExperienceModel;
use crate::guard::pathfinding::{first_step, random_action};
use crate::guard::q_table::QTable;
use crate::guard::snapshot::PolicySnapshot;
use crate::guard::state::{Mode, StateKey};
use crate::world::grid::GridWorld;

/// Inset of the patrol corners from the map edge
const PATROL_INSET: i32 = 2;

/// Cyclic route of four waypoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatrolRoute {
    waypoints: [Position; 4],
    index: usize,
}

impl PatrolRoute {
    pub fn new(waypoints: [Position; 4]) -> Self {
        Self { waypoints, index: 0 }
    }

    /// Rectangle inset two cells from the map edge, each corner moved to
    /// the nearest walkable cell
    pub fn for_grid(grid: &GridWorld) -> Self {
        let max_row = grid.height as i32 - 1;
        let max_col = grid.width as i32 - 1;
        let near = PATROL_INSET.min(max_row).min(max_col);
        let far_row = (max_row - PATROL_INSET).max(0);
        let far_col = (max_col - PATROL_INSET).max(0);

        let corners = [
            Position::new(near, near),
            Position::new(near, far_col),
            Position::new(far_row, far_col),
            Position::new(far_row, near),
        ];
        Self::new(corners.map(|c| grid.nearest_walkable(c).unwrap_or(c)))
    }

    pub fn current(&self) -> Position {
        self.waypoints[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn waypoints(&self) -> &[Position; 4] {
        &self.waypoints
    }

    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.waypoints.len();
    }

    /// Step toward the current waypoint, advancing first if already on it
    ///
    /// Moves along the axis with the larger offset; ties move horizontally.
    pub fn next_action(&mut self, pos: Position) -> Action {
        if pos == self.current() {
            self.advance();
        }
        let (dr, dc) = pos.offset_to(&self.current());
        if dr.abs() > dc.abs() {
            if dr > 0 {
                Action::Down
            } else {
                Action::Up
            }
        } else if dc > 0 {
            Action::Right
        } else {
            Action::Left
        }
    }
}

/// Inputs to one action selection
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub guard: Position,
    pub target: Position,
    pub visible: bool,
    pub state: StateKey,
}

/// Per-mode Q-tables, exploration schedule, and Dyna-Q model
#[derive(Debug, Clone)]
pub struct ActionPolicy {
    chase: QTable,
    search: QTable,
    model: ExperienceModel,
    patrol: PatrolRoute,

    epsilon: f64,
    epsilon_decay: f64,
    epsilon_min: f64,
    learning_rate: f64,
    discount: f64,
    planning_steps: usize,
    patrol_random_chance: f64,
}

impl ActionPolicy {
    pub fn new(config: &GuardConfig, patrol: PatrolRoute) -> Self {
        Self {
            chase: QTable::new(),
            search: QTable::new(),
            model: ExperienceModel::new(),
            patrol,
            epsilon: config.epsilon,
            epsilon_decay: config.epsilon_decay,
            epsilon_min: config.epsilon_min,
            learning_rate: config.learning_rate,
            discount: config.discount,
            planning_steps: config.planning_steps,
            patrol_random_chance: config.patrol_random_chance,
        }
    }

    pub fn table(&self, mode: Mode) -> Option<&QTable> {
        match mode {
            Mode::Patrol => None,
            Mode::Chase => Some(&self.chase),
            Mode::Search => Some(&self.search),
        }
    }

    fn table_mut(&mut self, mode: Mode) -> Option<&mut QTable> {
        match mode {
            Mode::Patrol => None,
            Mode::Chase => Some(&mut self.chase),
            Mode::Search => Some(&mut self.search),
        }
    }

    /// Pick an action for the machine's current mode
    ///
    /// In SEARCH, arriving at the last known position resets the machine
    /// to PATROL and returns a scripted patrol step.
    pub fn select_action<R: Rng + ?Sized>(
        &mut self,
        machine: &mut BehaviorStateMachine,
        decision: &Decision,
        grid: &GridWorld,
        rng: &mut R,
    ) -> Action {
        match machine.mode() {
            Mode::Patrol => self.patrol_action(decision.guard, rng),
            Mode::Chase => {
                let goal = if decision.visible {
                    decision.target
                } else {
                    machine.last_known().unwrap_or(decision.target)
                };
                if rng.gen::<f64>() < self.epsilon {
                    first_step(decision.guard, goal, grid, rng)
                } else {
                    self.q_action(Mode::Chase, decision.state, rng)
                }
            }
            Mode::Search => match machine.last_known() {
                Some(last_known) if last_known != decision.guard => {
                    first_step(decision.guard, last_known, grid, rng)
                }
                _ => {
                    machine.reset_to_patrol();
                    self.patrol.next_action(decision.guard)
                }
            },
        }
    }

    /// Scripted patrol step with random jitter
    pub fn patrol_action<R: Rng + ?Sized>(&mut self, guard: Position, rng: &mut R) -> Action {
        if rng.gen::<f64>() < self.patrol_random_chance {
            return random_action(rng);
        }
        self.patrol.next_action(guard)
    }

    /// Epsilon-greedy choice from a mode's table; PATROL has no table and
    /// always explores
    pub fn q_action<R: Rng + ?Sized>(&mut self, mode: Mode, state: StateKey, rng: &mut R) -> Action {
        if rng.gen::<f64>() < self.epsilon {
            return random_action(rng);
        }
        match self.table_mut(mode) {
            Some(table) => table.best_action(state),
            None => random_action(rng),
        }
    }

    /// Real-experience update for `mode`'s table
    ///
    /// Writes the new value, records the transition for planning, and
    /// decays epsilon. Returns `None` (and changes nothing) in PATROL.
    pub fn update(
        &mut self,
        mode: Mode,
        state: StateKey,
        action: Action,
        reward: f64,
        next_state: StateKey,
    ) -> Option<f64> {
        let (alpha, gamma) = (self.learning_rate, self.discount);
        let table = self.table_mut(mode)?;
        let new = table.update(state, action, reward, next_state, alpha, gamma);

        self.model.record(state, action, next_state, reward);
        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.epsilon_min);

        tracing::trace!(%mode, ?action, reward, new, epsilon = self.epsilon, "q update");
        Some(new)
    }

    /// Run `n` Dyna-Q replays against `mode`'s table; returns how many ran
    pub fn plan<R: Rng + ?Sized>(&mut self, mode: Mode, n: usize, rng: &mut R) -> usize {
        if !mode.is_learning() {
            return 0;
        }
        let (alpha, gamma) = (self.learning_rate, self.discount);
        let mut applied = 0;
        for _ in 0..n {
            let Some(t) = self.model.sample(rng) else {
                break;
            };
            if let Some(table) = self.table_mut(mode) {
                table.update(t.state, t.action, t.reward, t.next_state, alpha, gamma);
                applied += 1;
            }
        }
        applied
    }

    /// Planning with the configured step count
    pub fn plan_default<R: Rng + ?Sized>(&mut self, mode: Mode, rng: &mut R) -> usize {
        self.plan(mode, self.planning_steps, rng)
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn model(&self) -> &ExperienceModel {
        &self.model
    }

    pub fn patrol(&self) -> &PatrolRoute {
        &self.patrol
    }

    pub fn set_patrol(&mut self, patrol: PatrolRoute) {
        self.patrol = patrol;
    }

    pub fn snapshot(&self) -> PolicySnapshot {
        PolicySnapshot::capture(&self.chase, &self.search, &self.model, self.epsilon)
    }

    /// Replace all learned state; epsilon is clamped to this policy's floor
    pub fn restore(&mut self, snapshot: &PolicySnapshot) -> Result<()> {
        snapshot.validate()?;
        let (chase, search) = snapshot.tables();
        self.chase = chase;
        self.search = search;
        self.model = snapshot.experience();
        self.epsilon = snapshot.epsilon.clamp(self.epsilon_min, 1.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn key(mode: Mode) -> StateKey {
        StateKey {
            mode,
            visible: false,
            distance_bucket: 2,
            north: false,
            south: false,
            east: false,
            west: true,
            time_since_seen: 1,
            in_room: false,
        }
    }

    fn no_explore() -> GuardConfig {
        GuardConfig {
            epsilon: 0.0,
            epsilon_min: 0.0,
            patrol_random_chance: 0.0,
            ..GuardConfig::default()
        }
    }

    #[test]
    fn test_patrol_route_cycles() {
        let mut route = PatrolRoute::new([
            Position::new(2, 2),
            Position::new(2, 7),
            Position::new(7, 7),
            Position::new(7, 2),
        ]);
        assert_eq!(route.next_action(Position::new(2, 2)), Action::Right);
        assert_eq!(route.index(), 1);
        assert_eq!(route.next_action(Position::new(2, 7)), Action::Down);
        assert_eq!(route.next_action(Position::new(7, 7)), Action::Left);
        assert_eq!(route.next_action(Position::new(7, 2)), Action::Up);
        assert_eq!(route.index(), 0);
    }

    #[test]
    fn test_patrol_prefers_larger_axis_then_horizontal() {
        let mut route = PatrolRoute::new([Position::new(9, 5); 4]);
        assert_eq!(route.next_action(Position::new(2, 4)), Action::Down);
        let mut route = PatrolRoute::new([Position::new(5, 5); 4]);
        assert_eq!(route.next_action(Position::new(2, 8)), Action::Left);
    }

    #[test]
    fn test_route_for_grid_is_walkable() {
        let grid = GridWorld::open(20, 20);
        let route = PatrolRoute::for_grid(&grid);
        assert_eq!(
            route.waypoints(),
            &[
                Position::new(2, 2),
                Position::new(2, 17),
                Position::new(17, 17),
                Position::new(17, 2),
            ]
        );

        let tiny = GridWorld::open(3, 3);
        for w in PatrolRoute::for_grid(&tiny).waypoints() {
            assert!(tiny.is_walkable(*w));
        }
    }

    #[test]
    fn test_update_skipped_in_patrol() {
        let config = GuardConfig::default();
        let mut policy = ActionPolicy::new(&config, PatrolRoute::for_grid(&GridWorld::open(10, 10)));
        assert_eq!(policy.update(Mode::Patrol, key(Mode::Patrol), Action::Up, 5.0, key(Mode::Patrol)), None);
        assert!(policy.model().is_empty());
        assert_eq!(policy.epsilon(), config.epsilon);
    }

    #[test]
    fn test_update_records_and_decays() {
        let config = GuardConfig::default();
        let mut policy = ActionPolicy::new(&config, PatrolRoute::for_grid(&GridWorld::open(10, 10)));

        let new = policy.update(Mode::Chase, key(Mode::Chase), Action::Left, 10.0, key(Mode::Chase));
        assert_eq!(new, Some(7.0));
        assert_eq!(policy.model().len(), 1);
        assert!((policy.epsilon() - 0.95 * 0.95).abs() < 1e-12);
        assert_eq!(policy.table(Mode::Chase).unwrap().value(&key(Mode::Chase), Action::Left), 7.0);
        assert!(policy.table(Mode::Search).unwrap().is_empty());
    }

    #[test]
    fn test_epsilon_floor() {
        let config = GuardConfig::default();
        let mut policy = ActionPolicy::new(&config, PatrolRoute::for_grid(&GridWorld::open(10, 10)));
        let mut last = policy.epsilon();
        for _ in 0..200 {
            policy.update(Mode::Search, key(Mode::Search), Action::Up, -1.0, key(Mode::Search));
            assert!(policy.epsilon() <= last);
            assert!(policy.epsilon() >= config.epsilon_min);
            last = policy.epsilon();
        }
        assert_eq!(policy.epsilon(), config.epsilon_min);
    }

    #[test]
    fn test_planning_on_empty_model_is_noop() {
        let mut policy = ActionPolicy::new(&GuardConfig::default(), PatrolRoute::for_grid(&GridWorld::open(10, 10)));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(policy.plan(Mode::Chase, 5, &mut rng), 0);
        assert!(policy.table(Mode::Chase).unwrap().is_empty());
    }

    #[test]
    fn test_planning_propagates_reward() {
        let mut policy = ActionPolicy::new(&no_explore(), PatrolRoute::for_grid(&GridWorld::open(10, 10)));
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let s = key(Mode::Chase);
        policy.update(Mode::Chase, s, Action::Down, 10.0, s);
        let after_real = policy.table(Mode::Chase).unwrap().value(&s, Action::Down);

        assert_eq!(policy.plan(Mode::Chase, 5, &mut rng), 5);
        let after_plan = policy.table(Mode::Chase).unwrap().value(&s, Action::Down);
        assert!(after_plan > after_real);
        assert_eq!(policy.plan(Mode::Patrol, 5, &mut rng), 0);
    }

    #[test]
    fn test_chase_exploits_table_when_epsilon_zero() {
        let grid = GridWorld::open(10, 10);
        let mut policy = ActionPolicy::new(&no_explore(), PatrolRoute::for_grid(&grid));
        let mut machine = BehaviorStateMachine::new(3);
        let target = Position::new(5, 8);
        machine.update(true, target);

        let s = key(Mode::Chase);
        policy.update(Mode::Chase, s, Action::Up, 3.0, s);

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let decision = Decision { guard: Position::new(5, 5), target, visible: true, state: s };
        for _ in 0..10 {
            assert_eq!(policy.select_action(&mut machine, &decision, &grid, &mut rng), Action::Up);
        }
    }

    #[test]
    fn test_chase_uses_pathfinder_when_epsilon_one() {
        let grid = GridWorld::open(10, 10);
        let config = GuardConfig {
            epsilon: 1.0,
            epsilon_decay: 1.0,
            ..GuardConfig::default()
        };
        let mut policy = ActionPolicy::new(&config, PatrolRoute::for_grid(&grid));
        let mut machine = BehaviorStateMachine::new(3);
        let target = Position::new(5, 8);
        machine.update(true, target);

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let decision = Decision {
            guard: Position::new(5, 5),
            target,
            visible: true,
            state: key(Mode::Chase),
        };
        for _ in 0..10 {
            assert_eq!(policy.select_action(&mut machine, &decision, &grid, &mut rng), Action::Right);
        }
    }

    #[test]
    fn test_search_walks_to_last_known_then_patrols() {
        let grid = GridWorld::open(10, 10);
        let mut policy = ActionPolicy::new(&no_explore(), PatrolRoute::for_grid(&grid));
        let mut machine = BehaviorStateMachine::new(0);
        let last_seen = Position::new(5, 2);
        machine.update(true, last_seen);
        machine.update(false, Position::new(1, 1));
        assert_eq!(machine.mode(), Mode::Search);

        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut decision = Decision {
            guard: Position::new(5, 5),
            target: Position::new(1, 1),
            visible: false,
            state: key(Mode::Search),
        };
        assert_eq!(policy.select_action(&mut machine, &decision, &grid, &mut rng), Action::Left);
        assert_eq!(machine.mode(), Mode::Search);

        decision.guard = last_seen;
        policy.select_action(&mut machine, &decision, &grid, &mut rng);
        assert_eq!(machine.mode(), Mode::Patrol);
    }
}
