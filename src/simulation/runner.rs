//! Multi-episode training loop
//!
//! The guard's learned state persists across episodes. When
//! `change_layout` is set, a fresh layout is generated between episodes.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::SimulationConfig;
use crate::core::error::{GuardError, Result};
use crate::core::types::Position;
use crate::guard::agent::GuardAgent;
use crate::simulation::episode::{Episode, EpisodeSummary};
use crate::simulation::player::PlayerPolicy;
use crate::world::generation::{generate_rooms, Layout};
use crate::world::grid::GridWorld;

pub struct Simulation {
    config: SimulationConfig,
    layout: Layout,
    agent: GuardAgent,
    world_rng: ChaCha8Rng,
    episodes_run: u32,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut world_rng = ChaCha8Rng::seed_from_u64(config.world_seed);
        let layout = generate_rooms(config.world_size, config.room_count, &mut world_rng)?;
        let agent = GuardAgent::new(config.guard.clone(), &layout.grid)?;
        Ok(Self {
            config,
            layout,
            agent,
            world_rng,
            episodes_run: 0,
        })
    }

    /// Use a given grid instead of a generated one
    pub fn with_grid(config: SimulationConfig, grid: GridWorld) -> Result<Self> {
        config.validate()?;
        let agent = GuardAgent::new(config.guard.clone(), &grid)?;
        Ok(Self {
            world_rng: ChaCha8Rng::seed_from_u64(config.world_seed),
            config,
            layout: Layout {
                grid,
                rooms: Vec::new(),
            },
            agent,
            episodes_run: 0,
        })
    }

    /// Start cell snapped to the nearest walkable cell
    fn start_cell(&self, wanted: Position) -> Result<Position> {
        self.layout
            .grid
            .nearest_walkable(wanted)
            .ok_or_else(|| GuardError::InvalidMap("no walkable cell for start position".into()))
    }

    fn next_layout(&mut self) -> Result<()> {
        if self.episodes_run > 0 && self.config.change_layout {
            self.layout = generate_rooms(
                self.config.world_size,
                self.config.room_count,
                &mut self.world_rng,
            )?;
            tracing::debug!(rooms = self.layout.rooms.len(), "regenerated layout");
        }
        Ok(())
    }

    pub fn run_episode<P: PlayerPolicy + ?Sized>(&mut self, player: &mut P) -> Result<EpisodeSummary> {
        self.next_layout()?;
        let guard = self.start_cell(self.config.guard_start)?;
        let player_start = self.start_cell(self.config.player_start)?;

        self.agent.begin_episode(&self.layout.grid);
        let summary = Episode::new(
            &self.layout.grid,
            &mut self.agent,
            guard,
            player_start,
            &self.config,
        )
        .run(player);

        self.episodes_run += 1;
        tracing::info!(
            episode = self.episodes_run,
            ticks = summary.ticks,
            caught = summary.caught,
            score = summary.score,
            epsilon = summary.epsilon,
            "episode complete"
        );
        Ok(summary)
    }

    /// Run the configured number of episodes
    pub fn run<P: PlayerPolicy + ?Sized>(&mut self, player: &mut P) -> Result<Vec<EpisodeSummary>> {
        (0..self.config.episodes)
            .map(|_| self.run_episode(&mut *player))
            .collect()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridWorld {
        &self.layout.grid
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn agent(&self) -> &GuardAgent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut GuardAgent {
        &mut self.agent
    }

    pub fn episodes_run(&self) -> u32 {
        self.episodes_run
    }
}
