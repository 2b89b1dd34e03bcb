//! Core data structures for the Evolvarium simulation.
//!
//! This crate holds the plain, serializable state types shared by the
//! simulation core and any hosting layer: genomes, entities, species
//! records, and biome tags. All behavior (mutation, selection, combat,
//! clustering) lives in `evolvarium_core`.

pub mod data;

pub use data::biome::Biome;
pub use data::entity::Entity;
pub use data::genome::{Genome, TraitId, TRAIT_MAX, TRAIT_MIN};
pub use data::species::Species;
