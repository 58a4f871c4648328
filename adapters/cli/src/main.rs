#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter: validates routines and dry-runs them against a
//! simulated game.

mod config;
mod console;

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use maple_bot_core::SystemClock;
use maple_bot_system_commands::{Engine, Entry, Routine};
use maple_bot_system_monitor::{Monitor, Services};
use maple_bot_world::{
    simulation::{IdleMatcher, SimulatedGame},
    Handles, SharedState, WaypointGraph,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    config::FileConfig,
    console::{AutoAcknowledge, LogPlayer},
};

#[derive(Debug, Parser)]
#[command(name = "maple-bot", version, about = "Routine runner for the maple bot")]
struct Cli {
    #[command(subcommand)]
    command: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Parses and validates a routine file.
    Check {
        /// Routine file to validate.
        routine: PathBuf,
    },
    /// Runs a routine against the simulated game.
    Simulate {
        /// Routine file to run.
        routine: PathBuf,
        /// TOML configuration file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Seed for jump decisions, overriding the configuration.
        #[arg(long)]
        seed: Option<u64>,
        /// Wall-clock seconds to run before shutting down.
        #[arg(long, default_value_t = 10.0)]
        seconds: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Action::Check { routine } => {
            init_tracing(false);
            check(&routine)
        }
        Action::Simulate {
            routine,
            config,
            seed,
            seconds,
        } => {
            let config = match config {
                Some(path) => FileConfig::load(&path)?,
                None => FileConfig::default(),
            };
            init_tracing(config.debug);
            simulate(&routine, &config, seed, seconds)
        }
    }
}

/// `RUST_LOG` wins; otherwise the configured debug flag picks the level.
fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

fn load_routine(path: &Path) -> Result<Routine> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read routine at {}", path.display()))?;
    Routine::parse(&text).with_context(|| format!("invalid routine at {}", path.display()))
}

fn check(path: &Path) -> Result<()> {
    let routine = load_routine(path)?;
    let (mut labels, mut points, mut commands) = (0, 0, 0);
    for entry in routine.entries() {
        match entry {
            Entry::Label(_) => labels += 1,
            Entry::Point(point) => {
                points += 1;
                commands += point.commands().len();
            }
            Entry::Command(_) => commands += 1,
        }
    }
    println!(
        "{}: {} entries ({labels} labels, {points} points, {commands} commands)",
        path.display(),
        routine.len()
    );
    Ok(())
}

fn simulate(path: &Path, config: &FileConfig, seed: Option<u64>, seconds: f64) -> Result<()> {
    let routine = load_routine(path)?;
    let duration = Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("invalid duration: {seconds} seconds"))?;
    let waypoints = routine.waypoints();

    let (state, handles) = SharedState::create();
    let Handles {
        producer,
        hazards,
        cursor,
        switch,
    } = handles;
    let (simulation, start) = config.simulation();
    let game = Arc::new(SimulatedGame::new(simulation, producer, start));
    game.publish_idle_capture();

    let layout = WaypointGraph::from_nodes(config.engine.link_distance, waypoints.clone());
    let mut engine = Engine::new(
        config.engine(seed),
        routine,
        Box::new(layout),
        game.clone(),
        game.clone(),
        state.clone(),
        cursor,
    );
    let mut monitor = Monitor::new(
        config.monitor(),
        state.clone(),
        hazards,
        waypoints,
        Services {
            keys: game.clone(),
            clock: Arc::new(SystemClock::new()),
            matcher: Arc::new(IdleMatcher),
            player: Arc::new(LogPlayer),
            hotkey: Arc::new(AutoAcknowledge),
        },
    );

    let shutdown = AtomicBool::new(false);
    info!(routine = %path.display(), ?duration, "starting dry run");
    switch.enable();
    thread::scope(|scope| {
        let _ = scope.spawn(|| engine.run(&shutdown));
        let _ = scope.spawn(|| monitor.run(&shutdown));
        thread::sleep(duration);
        switch.disable();
        shutdown.store(true, Ordering::Release);
    });

    println!(
        "final position {}, cursor {}, {} key events",
        state.player_pos(),
        state.seq_index(),
        game.key_log().len()
    );
    Ok(())
}
