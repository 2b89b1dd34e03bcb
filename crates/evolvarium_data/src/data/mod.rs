//! Core data structures for the Evolvarium simulation.

pub mod biome;
pub mod entity;
pub mod genome;
pub mod species;
