//! Configuration management for simulation parameters.
//!
//! Strongly-typed structures that map to a `config.toml` file. Defaults
//! are hardcoded in the `Default` impls and individually overridable.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! width = 100.0
//! height = 100.0
//! grid_width = 20
//! grid_height = 20
//! population_size = 50
//! seed = 42
//!
//! [evolution]
//! mutation_rate = 0.1
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// World-level simulation configuration, validated at world construction.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WorldConfig {
    /// World width in world units.
    pub width: f64,
    /// World height in world units.
    pub height: f64,
    /// Number of default populations the hosting runner seeds.
    pub num_populations: usize,
    /// Entities instantiated per added population.
    pub population_size: usize,
    /// Spatial grid columns.
    pub grid_width: usize,
    /// Spatial grid rows.
    pub grid_height: usize,
    /// RNG seed; `None` seeds from entropy (non-replayable).
    pub seed: Option<u64>,
    /// Emit a tracing summary every this many ticks.
    pub stats_interval: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
            num_populations: 2,
            population_size: 50,
            grid_width: 20,
            grid_height: 20,
            seed: None,
            stats_interval: 100,
        }
    }
}

/// Energy and lifespan parameters governing survival.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct MetabolismConfig {
    /// Idle energy burn per tick before trait modifiers.
    pub base_decay: f64,
    /// Starting and maximum energy of fresh entities.
    pub max_energy: f64,
    /// Base lifespan in ticks before the longevity trait applies.
    pub base_lifespan: u64,
}

impl Default for MetabolismConfig {
    fn default() -> Self {
        Self {
            base_decay: 0.5,
            max_energy: 100.0,
            base_lifespan: 1000,
        }
    }
}

/// Genetic operator parameters for population `evolve()`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EvolutionConfig {
    pub mutation_rate: f64,
    pub mutation_strength: f64,
    pub elite_size: usize,
    pub tournament_size: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            mutation_rate: 0.1,
            mutation_strength: 0.2,
            elite_size: 2,
            tournament_size: 3,
        }
    }
}

/// When and how new entities appear during the tick loop.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ReproductionConfig {
    /// Ticks between generational `evolve()` passes per population.
    pub evolve_interval: u64,
    /// Enables world-level pairwise merge mating.
    pub mating_enabled: bool,
    /// Energy both partners need before merge mating is attempted.
    pub mating_energy_threshold: f64,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            evolve_interval: 100,
            mating_enabled: true,
            mating_energy_threshold: 80.0,
        }
    }
}

/// Species clustering parameters.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SpeciationConfig {
    pub distance_threshold: f64,
    /// Membership refresh period in ticks.
    pub update_interval: u64,
    /// Ticks a species may sit empty before extinction.
    pub extinction_grace: u64,
}

impl Default for SpeciationConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 0.6,
            update_interval: 25,
            extinction_grace: 50,
        }
    }
}

/// Combat resolution parameters for the tick loop.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CombatConfig {
    /// Minimum aggression trait before an entity hunts neighbors.
    pub aggression_threshold: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            aggression_threshold: 0.5,
        }
    }
}

/// Complete simulation configuration.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SimConfig {
    pub world: WorldConfig,
    pub metabolism: MetabolismConfig,
    pub evolution: EvolutionConfig,
    pub reproduction: ReproductionConfig,
    pub speciation: SpeciationConfig,
    pub combat: CombatConfig,
}

impl SimConfig {
    /// Validates all parameters, reporting the first failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.world.width > 0.0, "World width must be positive");
        anyhow::ensure!(self.world.height > 0.0, "World height must be positive");
        anyhow::ensure!(self.world.grid_width > 0, "Grid width must be positive");
        anyhow::ensure!(self.world.grid_height > 0, "Grid height must be positive");
        anyhow::ensure!(
            self.world.population_size > 0,
            "Population size must be positive"
        );
        anyhow::ensure!(
            self.world.stats_interval > 0,
            "Stats interval must be positive"
        );

        anyhow::ensure!(
            self.metabolism.base_decay >= 0.0,
            "Base decay must be non-negative"
        );
        anyhow::ensure!(
            self.metabolism.max_energy > 0.0,
            "Max energy must be positive"
        );
        anyhow::ensure!(
            self.metabolism.base_lifespan > 0,
            "Base lifespan must be positive"
        );

        anyhow::ensure!(
            (0.0..=1.0).contains(&self.evolution.mutation_rate),
            "Mutation rate must be in [0.0, 1.0]"
        );
        anyhow::ensure!(
            self.evolution.mutation_strength >= 0.0,
            "Mutation strength must be non-negative"
        );
        anyhow::ensure!(
            self.evolution.tournament_size >= 1,
            "Tournament size must be at least 1"
        );
        anyhow::ensure!(
            self.evolution.elite_size <= self.world.population_size,
            "Elite size cannot exceed population size"
        );

        anyhow::ensure!(
            self.reproduction.evolve_interval > 0,
            "Evolve interval must be positive"
        );
        anyhow::ensure!(
            self.reproduction.mating_energy_threshold >= 0.0,
            "Mating energy threshold must be non-negative"
        );

        anyhow::ensure!(
            self.speciation.distance_threshold >= 0.0,
            "Speciation threshold must be non-negative"
        );
        anyhow::ensure!(
            self.speciation.update_interval > 0,
            "Speciation interval must be positive"
        );

        Ok(())
    }

    /// Loads and validates configuration from TOML content.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Stable digest of all behavior-affecting sections, for replay
    /// identity checks.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.world).as_bytes());
        hasher.update(format!("{:?}", self.metabolism).as_bytes());
        hasher.update(format!("{:?}", self.evolution).as_bytes());
        hasher.update(format!("{:?}", self.reproduction).as_bytes());
        hasher.update(format!("{:?}", self.speciation).as_bytes());
        hasher.update(format!("{:?}", self.combat).as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Configuration for one population handed to `World::add_population`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PopulationConfig {
    /// Registry key of the population inside the world.
    pub name: String,
    /// Founding label the generated species display name derives from;
    /// never used verbatim.
    pub species: String,
    /// Trait schema with per-trait base values; may be empty.
    pub base_traits: BTreeMap<String, f64>,
    pub start_position: (f64, f64),
    /// Entities scatter uniformly within this radius of the start.
    pub spread_radius: f64,
    pub base_mutation_rate: f64,
    /// Display-only hint for rendering collaborators; ignored by the core.
    pub color: Option<String>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            name: "population".to_string(),
            species: "unnamed".to_string(),
            base_traits: BTreeMap::new(),
            start_position: (0.0, 0.0),
            spread_radius: 5.0,
            base_mutation_rate: 0.1,
            color: None,
        }
    }
}

impl PopulationConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.name.is_empty(), "Population name must not be empty");
        anyhow::ensure!(
            self.spread_radius >= 0.0,
            "Spread radius must be non-negative"
        );
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.base_mutation_rate),
            "Base mutation rate must be in [0.0, 1.0]"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_grid_width_rejected() {
        let config = SimConfig {
            world: WorldConfig {
                grid_width: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_population_size_rejected() {
        let config = SimConfig {
            world: WorldConfig {
                population_size: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_mutation_rate_rejected() {
        let config = SimConfig {
            evolution: EvolutionConfig {
                mutation_rate: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let config = SimConfig::from_toml(
            "[world]\nwidth = 50.0\nheight = 50.0\n\n[evolution]\nmutation_rate = 0.3\n",
        )
        .expect("parse");
        assert_eq!(config.world.width, 50.0);
        assert_eq!(config.evolution.mutation_rate, 0.3);
        assert_eq!(config.speciation.update_interval, 25);
    }

    #[test]
    fn test_fingerprint_consistency() {
        assert_eq!(
            SimConfig::default().fingerprint(),
            SimConfig::default().fingerprint()
        );
        let other = SimConfig {
            evolution: EvolutionConfig {
                mutation_rate: 0.9,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_ne!(SimConfig::default().fingerprint(), other.fingerprint());
    }

    #[test]
    fn test_population_config_validation() {
        let mut cfg = PopulationConfig::default();
        assert!(cfg.validate().is_ok());
        cfg.name = String::new();
        assert!(cfg.validate().is_err());
    }
}
