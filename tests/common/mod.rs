use std::collections::BTreeMap;

use evolvarium_core::config::WorldConfig;
use evolvarium_lib::{PopulationConfig, SimConfig, World};

#[allow(dead_code)]
pub struct WorldBuilder {
    config: SimConfig,
    populations: Vec<PopulationConfig>,
}

#[allow(dead_code)]
impl WorldBuilder {
    pub fn new() -> Self {
        let config = SimConfig {
            world: WorldConfig {
                width: 50.0,
                height: 50.0,
                num_populations: 0,
                population_size: 8,
                grid_width: 10,
                grid_height: 10,
                seed: Some(1),
                ..Default::default()
            },
            ..Default::default()
        };
        Self {
            config,
            populations: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.world.seed = Some(seed);
        self
    }

    pub fn with_config<F>(mut self, modifier: F) -> Self
    where
        F: FnOnce(&mut SimConfig),
    {
        modifier(&mut self.config);
        self
    }

    pub fn with_population(self, name: &str, base_traits: &[(&str, f64)]) -> Self {
        self.with_population_at(name, base_traits, (25.0, 25.0))
    }

    pub fn with_population_at(
        mut self,
        name: &str,
        base_traits: &[(&str, f64)],
        position: (f64, f64),
    ) -> Self {
        self.populations.push(PopulationConfig {
            name: name.to_string(),
            species: format!("{name}-founder"),
            base_traits: trait_map(base_traits),
            start_position: position,
            spread_radius: 3.0,
            base_mutation_rate: 0.1,
            color: None,
        });
        self
    }

    pub fn build(self) -> World {
        let mut world = World::new(self.config).expect("world construction");
        for cfg in &self.populations {
            world.add_population(cfg).expect("population seeding");
        }
        world
    }
}

#[allow(dead_code)]
pub fn trait_map(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs
        .iter()
        .map(|&(name, value)| (name.to_string(), value))
        .collect()
}
