#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays the configured waves headlessly.
//!
//! The driver advances the simulation in fixed steps and stands in for the
//! player by periodically killing a random live entity, so every wave
//! eventually clears.

mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;
use wave_warden_core::{Event, Vec3};
use wave_warden_simulation::{QueueState, Simulation};
use wave_warden_world::{arena::StaticArena, query};

use crate::config::DriverConfig;

/// Command-line arguments accepted by the driver.
#[derive(Debug, Parser)]
#[command(
    name = "wave-warden",
    author,
    version,
    about = "Play configured spawn waves headlessly"
)]
struct CliArgs {
    /// TOML file describing the waves and the arena.
    #[arg(long, value_name = "PATH", default_value = "waves.toml")]
    config: PathBuf,
    /// Simulated milliseconds per step.
    #[arg(long, value_name = "MS", default_value_t = 50)]
    step_ms: u64,
    /// Simulated milliseconds between two kills.
    #[arg(long, value_name = "MS", default_value_t = 750)]
    cull_interval_ms: u64,
    /// Upper bound on simulated time.
    #[arg(long, value_name = "SECONDS", default_value_t = 120)]
    max_seconds: u64,
    /// Overrides the placement seed from the configuration.
    #[arg(long)]
    seed: Option<u64>,
}

/// Entry point for the Wave Warden command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    anyhow::ensure!(args.step_ms > 0, "--step-ms must be greater than zero");

    let DriverConfig {
        mut simulation,
        arena,
    } = DriverConfig::load(&args.config)?;
    if let Some(seed) = args.seed {
        simulation.placement.seed = seed;
    }
    let health = simulation.template.health;
    let mut culler = ChaCha8Rng::seed_from_u64(simulation.placement.seed);

    let mut simulation = Simulation::new(simulation, arena);
    simulation.start().context("failed to start the first wave")?;

    let step = Duration::from_millis(args.step_ms);
    let cull_interval = Duration::from_millis(args.cull_interval_ms);
    let limit = Duration::from_secs(args.max_seconds);
    let mut since_cull = Duration::ZERO;

    while query::elapsed(simulation.world()) < limit && !finished(&simulation) {
        simulation.advance(step).context("simulation step failed")?;
        since_cull += step;
        if since_cull < cull_interval {
            continue;
        }
        since_cull = Duration::ZERO;

        let live = simulation.live_entities();
        if let Some(victim) = live.choose(&mut culler).copied() {
            simulation
                .damage(victim, health, Vec3::Y)
                .context("failed to damage entity")?;
        }
    }

    let cleared = finished(&simulation);
    report(&simulation);
    simulation.teardown().context("teardown failed")?;
    anyhow::ensure!(
        cleared,
        "stopped at the --max-seconds limit of {}s before every wave cleared",
        args.max_seconds
    );
    Ok(())
}

fn finished(simulation: &Simulation<StaticArena>) -> bool {
    simulation.queue_state() == QueueState::Idle && simulation.live_entities().is_empty()
}

fn report(simulation: &Simulation<StaticArena>) {
    let events = simulation.events();
    let count = |predicate: fn(&Event) -> bool| {
        events.iter().filter(|event| predicate(event)).count()
    };

    let stats = query::pool_stats(simulation.world());
    tracing::info!(
        elapsed = ?query::elapsed(simulation.world()),
        waves_cleared = count(|event| matches!(event, Event::WaveCleared { .. })),
        spawned = count(|event| matches!(event, Event::EntitySpawned { .. })),
        reused = count(|event| matches!(event, Event::EntitySpawned { reused: true, .. })),
        active = stats.active,
        idle = stats.idle,
        "run finished"
    );
}
