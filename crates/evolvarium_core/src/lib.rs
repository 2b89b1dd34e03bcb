//! # Evolvarium Core
//!
//! The evolutionary simulation engine for Evolvarium - a trait-driven
//! artificial life world.
//!
//! This crate contains the deterministic simulation logic, including:
//! - Heritable trait genomes with Gaussian mutation and union crossover
//! - Population-level genetic search (tournament selection, elitism)
//! - Genetic-distance speciation with extinction accounting
//! - Spatial grid indexing for proximity interactions
//! - The discrete world tick orchestrator with lifecycle events
//!
//! ## Architecture
//!
//! Plain data types live in `evolvarium_data`; behavior is layered on top
//! through extension traits (`GenomeLogic`, `EntityLogic`) and owning
//! systems (`Population`, `SpeciationSystem`, `World`). All randomness is
//! drawn from instance-scoped seeded generators so a seeded run replays
//! bit-for-bit.
//!
//! ## Example
//!
//! ```
//! use evolvarium_core::genetics::GenomeLogic;
//! use evolvarium_data::Genome;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut genome = Genome::from_pairs([("speed", 0.2), ("size", -0.1)]);
//! genome.mutate_with_rng(1.0, 0.1, &mut rng);
//! assert!(genome.get("speed").abs() <= 2.0);
//! ```

/// Typed configuration for the world, populations, and genetic operators
pub mod config;
/// Entity behavior: combat, consumption, merging, movement
pub mod entity;
/// Lifecycle event types and the append-only JSONL history log
pub mod events;
/// Genome behavior: mutation, crossover, genetic distance
pub mod genetics;
/// Procedural species display names
pub mod naming;
/// A named cohort owning the generational genetic algorithm
pub mod population;
/// End-of-tick immutable snapshots for external readers
pub mod snapshot;
/// Spatial grid with O(1) cell lookup for proximity queries
pub mod spatial;
/// World-wide genetic-distance species clustering
pub mod speciation;
/// The world orchestrator and its discrete tick loop
pub mod world;

pub use entity::{EntityLogic, IdAllocator};
pub use events::{HistoryLogger, LiveEvent};
pub use genetics::GenomeLogic;
pub use population::Population;
pub use speciation::SpeciationSystem;
pub use world::{init_logging, Modifier, World};
