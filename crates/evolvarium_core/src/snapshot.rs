//! Immutable end-of-tick views of the world for rendering, analysis, and
//! stats reporting. Snapshots are plain serializable data detached from
//! the live simulation state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct EntitySnapshot {
    pub id: u64,
    pub species: String,
    pub x: f64,
    pub y: f64,
    pub energy: f64,
    pub max_energy: f64,
    pub age: u64,
    pub generation: u32,
    pub lineage_id: Uuid,
    pub fitness: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SpeciesSnapshot {
    pub id: u64,
    pub name: String,
    pub population: usize,
    pub peak_population: usize,
    pub formation_tick: u64,
    pub is_extinct: bool,
    pub extinction_tick: u64,
}

/// Per-population aggregates for one tick.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct PopulationStats {
    pub name: String,
    pub size: usize,
    pub generation: u32,
    pub mean_energy: f64,
    pub best_fitness: f64,
    /// Mean value per trait over members carrying that trait.
    pub trait_averages: BTreeMap<String, f64>,
}

/// World-level aggregates for one tick.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct WorldStats {
    pub tick: u64,
    pub total_entities: usize,
    pub births_this_tick: usize,
    pub deaths_this_tick: usize,
    pub active_species: usize,
    pub extinct_species: usize,
    pub populations: Vec<PopulationStats>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: f64,
    pub height: f64,
    pub entities: Vec<EntitySnapshot>,
    pub species: Vec<SpeciesSnapshot>,
    pub stats: WorldStats,
}
