//! Stealth Guard - headless training runner
//!
//! Trains a guard over several episodes against a scripted player and
//! prints per-episode summaries. Learned state can be saved and reloaded.

use std::path::PathBuf;

use clap::Parser;
use stealth_guard::core::config::SimulationConfig;
use stealth_guard::core::error::{GuardError, Result};
use stealth_guard::guard::PolicySnapshot;
use stealth_guard::simulation::{EpisodeSummary, PlayerPolicy, RandomWalk, Simulation, Stationary};

/// Stealth Guard - adaptive guard training runner
#[derive(Parser, Debug)]
#[command(name = "stealth-guard")]
#[command(about = "Train an adaptive stealth guard against a scripted player")]
struct Args {
    /// TOML configuration file (missing keys use defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of episodes (overrides the config)
    #[arg(long)]
    episodes: Option<u32>,

    /// Maximum ticks per episode (overrides the config)
    #[arg(long)]
    ticks: Option<u64>,

    /// Seed for the guard, the world and the player
    #[arg(long)]
    seed: Option<u64>,

    /// Player behavior: random or stationary
    #[arg(long, default_value = "random")]
    player: String,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,

    /// Print the grid after each episode
    #[arg(long)]
    render: bool,

    /// Write the learned policy here when done
    #[arg(long)]
    save_policy: Option<PathBuf>,

    /// Start from a previously saved policy
    #[arg(long)]
    load_policy: Option<PathBuf>,
}

fn build_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(episodes) = args.episodes {
        config.episodes = episodes;
    }
    if let Some(ticks) = args.ticks {
        config.max_ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.guard.seed = seed;
        config.world_seed = seed.wrapping_add(1);
    }
    config.validate()?;
    Ok(config)
}

fn build_player(args: &Args, seed: u64) -> Result<Box<dyn PlayerPolicy>> {
    match args.player.as_str() {
        "random" => Ok(Box::new(RandomWalk::with_idle_chance(seed, 0.2))),
        "stationary" => Ok(Box::new(Stationary)),
        other => Err(GuardError::InvalidConfig(format!("unknown player policy '{other}'"))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_format(format: &str) -> Result<OutputFormat> {
    match format {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(GuardError::InvalidConfig(format!("unknown output format '{other}'"))),
    }
}

fn report(format: OutputFormat, episode: usize, summary: &EpisodeSummary) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string(summary)?);
    } else {
        println!(
            "episode {:>3}: {:>4} ticks  caught={:<5}  score={:>8.1}  epsilon={:.3}  chase={} search={} escapes={}",
            episode + 1,
            summary.ticks,
            summary.caught,
            summary.score,
            summary.epsilon,
            summary.mode_ticks.chase,
            summary.mode_ticks.search,
            summary.escapes,
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("stealth_guard=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let format = parse_format(&args.format)?;
    let config = build_config(&args)?;
    let mut player = build_player(&args, config.world_seed)?;
    let mut sim = Simulation::new(config)?;

    if let Some(path) = &args.load_policy {
        let snapshot = PolicySnapshot::load(path)?;
        sim.agent_mut().restore(&snapshot)?;
        tracing::info!(path = %path.display(), epsilon = sim.agent().epsilon(), "loaded policy");
    }

    tracing::info!(
        episodes = sim.config().episodes,
        max_ticks = sim.config().max_ticks,
        rooms = sim.layout().rooms.len(),
        "stealth guard starting"
    );

    for episode in 0..sim.config().episodes as usize {
        let summary = sim.run_episode(player.as_mut())?;
        report(format, episode, &summary)?;
        if args.render {
            println!(
                "{}",
                sim.grid()
                    .render_ascii(&[(summary.player, 'P'), (summary.guard, 'G')])
            );
        }
    }

    if let Some(path) = &args.save_policy {
        sim.agent().snapshot().save(path)?;
        tracing::info!(path = %path.display(), "saved policy");
    }

    Ok(())
}
