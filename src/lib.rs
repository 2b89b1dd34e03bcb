//! Evolvarium: a trait-driven evolutionary simulation.
//!
//! Entities carry real-valued trait genomes, populations evolve them with
//! tournament selection and Gaussian mutation, and a speciation system
//! clusters the results by genetic distance. The root crate wires the
//! simulation core into a headless CLI runner; the library surface
//! re-exports everything embedders need.

pub mod runner;

pub use evolvarium_core::{
    config::{PopulationConfig, SimConfig},
    init_logging, EntityLogic, GenomeLogic, HistoryLogger, LiveEvent, Modifier, Population,
    SpeciationSystem, World,
};
pub use evolvarium_data::{Biome, Entity, Genome, Species, TraitId, TRAIT_MAX, TRAIT_MIN};
