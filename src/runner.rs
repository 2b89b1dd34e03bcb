//! Headless simulation runner: config loading, world seeding, tick loop.

use std::collections::BTreeMap;
use std::path::Path;

use evolvarium_core::config::{PopulationConfig, SimConfig};
use evolvarium_core::snapshot::WorldStats;
use evolvarium_core::World;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to read config file '{path}': {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error(transparent)]
    Simulation(#[from] anyhow::Error),
}

/// Loads `SimConfig` from a TOML file, falling back to defaults when the
/// file does not exist.
pub fn load_config(path: &str) -> Result<SimConfig, RunnerError> {
    if !Path::new(path).exists() {
        tracing::warn!(path, "config file not found, using defaults");
        return Ok(SimConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| RunnerError::ConfigRead {
        path: path.to_string(),
        source,
    })?;
    SimConfig::from_toml(&content).map_err(|e| RunnerError::ConfigInvalid(e.to_string()))
}

/// Builtin archetypes cycled through when seeding default populations.
/// Index 0 is a grazer, 1 a hunter, 2 a generalist scavenger.
fn archetype_traits(index: usize) -> BTreeMap<String, f64> {
    let pairs: &[(&str, f64)] = match index % 3 {
        0 => &[
            ("speed", 0.4),
            ("size", -0.2),
            ("defense", 0.3),
            ("metabolism", -0.2),
        ],
        1 => &[
            ("aggression", 0.6),
            ("strength", 0.5),
            ("size", 0.3),
            ("speed", 0.2),
        ],
        _ => &[
            ("speed", 0.1),
            ("strength", 0.1),
            ("defense", 0.1),
            ("metabolism", 0.1),
        ],
    };
    pairs
        .iter()
        .map(|&(name, value)| (name.to_string(), value))
        .collect()
}

/// Seeds `config.world.num_populations` archetype populations spread
/// evenly across the world, returning their generated species names.
pub fn seed_default_populations(world: &mut World) -> Result<Vec<String>, RunnerError> {
    let count = world.config.world.num_populations;
    let width = world.config.world.width;
    let height = world.config.world.height;
    let mut species = Vec::with_capacity(count);
    for i in 0..count {
        let frac = (i as f64 + 0.5) / count.max(1) as f64;
        let cfg = PopulationConfig {
            name: format!("pop-{}", i + 1),
            species: format!("founder-{}", i + 1),
            base_traits: archetype_traits(i),
            start_position: (width * frac, height * frac),
            spread_radius: (width.min(height) / 10.0).max(1.0),
            base_mutation_rate: world.config.evolution.mutation_rate,
            color: None,
        };
        species.push(world.add_population(&cfg)?);
    }
    Ok(species)
}

/// Final report printed after a headless run.
#[derive(Serialize, Debug)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub extinct_world: bool,
    pub stats: WorldStats,
}

/// Runs the world for up to `ticks` ticks, stopping early if every entity
/// dies.
pub fn run(world: &mut World, ticks: u64) -> Result<RunSummary, RunnerError> {
    let mut ticks_run = 0;
    for _ in 0..ticks {
        world.update()?;
        ticks_run += 1;
        if world.entity_count() == 0 {
            tracing::info!(tick = world.tick, "world is empty, stopping early");
            break;
        }
    }
    Ok(RunSummary {
        ticks_run,
        extinct_world: world.entity_count() == 0,
        stats: world.get_stats(),
    })
}
