//! One guard-versus-player episode on a fixed grid
//!
//! Tick order:
//! player move -> observe -> state -> choose -> validated apply -> facing
//! -> next state -> reward -> learn -> position record / stuck escape

use serde::Serialize;

use crate::core::config::SimulationConfig;
use crate::core::types::{Action, Position, Tick};
use crate::guard::agent::GuardAgent;
use crate::guard::state::Mode;
use crate::simulation::player::PlayerPolicy;
use crate::world::grid::GridWorld;

pub const CAUGHT_REWARD: f64 = 100.0;
pub const VISIBLE_BASE_REWARD: f64 = 20.0;
pub const IDLE_PENALTY: f64 = -10.0;
pub const STEP_PENALTY: f64 = -1.0;

/// Shaped reward for the guard's position after its move
///
/// Seeing the player pays more the closer the guard is; `reach` is the
/// distance at which the proximity bonus runs out.
pub fn shaped_reward(
    guard: Position,
    player: Position,
    visible: bool,
    unseen_ticks: u32,
    idle_threshold: u32,
    reach: i32,
) -> f64 {
    if guard == player {
        CAUGHT_REWARD
    } else if visible {
        VISIBLE_BASE_REWARD + 2.0 * f64::from(reach - guard.manhattan(&player))
    } else if unseen_ticks > idle_threshold {
        IDLE_PENALTY
    } else {
        STEP_PENALTY
    }
}

/// Apply `proposed` unless it walks into a wall
///
/// On collision the first walkable neighbor in action order is taken
/// instead. Returns the action actually applied and the resulting cell;
/// `None` when boxed in, leaving the guard where it was.
pub fn resolve_move(grid: &GridWorld, from: Position, proposed: Action) -> Option<(Action, Position)> {
    let next = from.step(proposed);
    if grid.is_walkable(next) {
        return Some((proposed, next));
    }
    let resolved = grid.walkable_neighbors(from).next();
    tracing::warn!(
        row = from.row,
        col = from.col,
        ?proposed,
        resolved = ?resolved.map(|(a, _)| a),
        "blocked move re-resolved"
    );
    resolved
}

/// Ticks spent in each mode, keyed by the mode after observation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModeTicks {
    pub patrol: u64,
    pub chase: u64,
    pub search: u64,
}

impl ModeTicks {
    fn count(&mut self, mode: Mode) {
        match mode {
            Mode::Patrol => self.patrol += 1,
            Mode::Chase => self.chase += 1,
            Mode::Search => self.search += 1,
        }
    }

    pub fn get(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Patrol => self.patrol,
            Mode::Chase => self.chase,
            Mode::Search => self.search,
        }
    }

    pub fn total(&self) -> u64 {
        self.patrol + self.chase + self.search
    }
}

/// Everything that happened in one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub tick: Tick,
    pub guard: Position,
    pub player: Position,
    pub proposed: Action,
    /// Action applied after wall validation, `None` if the guard stayed put
    pub applied: Option<Action>,
    pub escape: Option<Action>,
    pub visible: bool,
    pub mode: Mode,
    pub reward: f64,
    pub caught: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub ticks: Tick,
    pub caught: bool,
    pub score: f64,
    pub epsilon: f64,
    pub escapes: u64,
    pub mode_ticks: ModeTicks,
    /// Final positions
    pub guard: Position,
    pub player: Position,
}

pub struct Episode<'a> {
    grid: &'a GridWorld,
    agent: &'a mut GuardAgent,
    guard: Position,
    player: Position,
    tick: Tick,
    score: f64,
    caught: bool,
    unseen_ticks: u32,
    escapes: u64,
    mode_ticks: ModeTicks,

    max_ticks: Tick,
    idle_threshold: u32,
    reach: i32,
}

impl<'a> Episode<'a> {
    pub fn new(
        grid: &'a GridWorld,
        agent: &'a mut GuardAgent,
        guard: Position,
        player: Position,
        config: &SimulationConfig,
    ) -> Self {
        Self {
            grid,
            agent,
            guard,
            player,
            tick: 0,
            score: 0.0,
            caught: guard == player,
            unseen_ticks: 0,
            escapes: 0,
            mode_ticks: ModeTicks::default(),
            max_ticks: config.max_ticks,
            idle_threshold: config.idle_threshold,
            reach: config.world_size as i32,
        }
    }

    /// Advance one tick with the given player move
    pub fn step(&mut self, player_move: Option<Action>) -> TickOutcome {
        let grid = self.grid;

        if let Some(m) = player_move {
            let next = self.player.step(m);
            if grid.is_walkable(next) {
                self.player = next;
            }
        }

        let visible = self.agent.observe(self.guard, self.player, grid, self.tick);
        let state = self.agent.state_key(self.guard, self.player, grid);
        let proposed = self.agent.choose_action(self.guard, self.player, state, grid);

        let applied = match resolve_move(grid, self.guard, proposed) {
            Some((action, next)) => {
                self.guard = next;
                self.agent.set_facing(action);
                Some(action)
            }
            None => None,
        };

        let next_state = self.agent.state_key(self.guard, self.player, grid);
        self.unseen_ticks = if visible { 0 } else { self.unseen_ticks + 1 };
        let reward = shaped_reward(
            self.guard,
            self.player,
            visible,
            self.unseen_ticks,
            self.idle_threshold,
            self.reach,
        );
        self.agent
            .learn(state, applied.unwrap_or(proposed), reward, next_state);

        let escape = self.agent.record_position(self.guard, grid);
        if let Some((action, next)) = escape.and_then(|step| resolve_move(grid, self.guard, step)) {
            self.guard = next;
            self.agent.set_facing(action);
            self.escapes += 1;
        }

        self.caught = self.guard == self.player;
        self.score += reward;
        self.mode_ticks.count(state.mode);

        let outcome = TickOutcome {
            tick: self.tick,
            guard: self.guard,
            player: self.player,
            proposed,
            applied,
            escape,
            visible,
            mode: self.agent.mode(),
            reward,
            caught: self.caught,
        };
        tracing::trace!(
            tick = self.tick,
            mode = %outcome.mode,
            ?proposed,
            ?applied,
            reward,
            "tick"
        );
        self.tick += 1;
        outcome
    }

    /// Play until the player is caught or the tick limit is reached
    pub fn run<P: PlayerPolicy + ?Sized>(mut self, player: &mut P) -> EpisodeSummary {
        while !self.is_finished() {
            let player_move = player.next_move(self.player, self.grid);
            self.step(player_move);
        }
        let summary = self.summary();
        tracing::debug!(
            ticks = summary.ticks,
            caught = summary.caught,
            score = summary.score,
            "episode finished"
        );
        summary
    }

    pub fn is_finished(&self) -> bool {
        self.caught || self.tick >= self.max_ticks
    }

    pub fn summary(&self) -> EpisodeSummary {
        EpisodeSummary {
            ticks: self.tick,
            caught: self.caught,
            score: self.score,
            epsilon: self.agent.epsilon(),
            escapes: self.escapes,
            mode_ticks: self.mode_ticks,
            guard: self.guard,
            player: self.player,
        }
    }

    /// Grid with `P` for the player and `G` for the guard
    pub fn render(&self) -> String {
        self.grid
            .render_ascii(&[(self.player, 'P'), (self.guard, 'G')])
    }

    pub fn guard(&self) -> Position {
        self.guard
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn agent(&self) -> &GuardAgent {
        &*self.agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GuardConfig;
    use crate::simulation::player::Stationary;

    #[test]
    fn test_reward_shaping() {
        let g = Position::new(5, 5);
        assert_eq!(shaped_reward(g, g, true, 0, 20, 20), CAUGHT_REWARD);
        assert_eq!(shaped_reward(g, Position::new(5, 8), true, 0, 20, 20), 54.0);
        assert_eq!(shaped_reward(g, Position::new(9, 9), false, 21, 20, 20), IDLE_PENALTY);
        assert_eq!(shaped_reward(g, Position::new(9, 9), false, 20, 20, 20), STEP_PENALTY);
    }

    #[test]
    fn test_resolve_move_avoids_walls() {
        let grid = GridWorld::open(5, 5);
        let corner = Position::new(1, 1);
        assert_eq!(
            resolve_move(&grid, corner, Action::Right),
            Some((Action::Right, Position::new(1, 2)))
        );
        // Up is a wall; Down is the first walkable neighbor
        assert_eq!(
            resolve_move(&grid, corner, Action::Up),
            Some((Action::Down, Position::new(2, 1)))
        );
    }

    #[test]
    fn test_boxed_in_guard_stays_put() {
        let grid = GridWorld::parse(
            "
            ###
            #.#
            ###
            ",
        )
        .unwrap();
        assert_eq!(resolve_move(&grid, Position::new(1, 1), Action::Left), None);
    }

    #[test]
    fn test_guard_never_enters_walls() {
        let grid = GridWorld::open(8, 8);
        let config = SimulationConfig {
            max_ticks: 200,
            ..SimulationConfig::default()
        };
        let mut agent = GuardAgent::new(GuardConfig::default(), &grid).unwrap();
        let mut episode = Episode::new(&grid, &mut agent, Position::new(6, 6), Position::new(1, 1), &config);
        while !episode.is_finished() {
            let outcome = episode.step(None);
            assert!(grid.is_walkable(outcome.guard));
        }
    }

    #[test]
    fn test_run_reports_summary() {
        let grid = GridWorld::open(10, 10);
        let config = SimulationConfig {
            max_ticks: 50,
            world_size: 10,
            ..SimulationConfig::default()
        };
        let mut agent = GuardAgent::new(GuardConfig::default(), &grid).unwrap();
        let summary = Episode::new(&grid, &mut agent, Position::new(8, 8), Position::new(2, 2), &config)
            .run(&mut Stationary);
        assert!(summary.ticks <= 50);
        assert_eq!(summary.mode_ticks.total(), summary.ticks);
        assert!(summary.caught || summary.ticks == 50);
    }
}
