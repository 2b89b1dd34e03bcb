//! A named cohort of entities owning the generational genetic algorithm:
//! fitness evaluation, tournament selection, elitism, crossover, mutation.

use anyhow::Result;
use evolvarium_data::{Entity, Genome};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::entity::{offspring, spawn, IdAllocator};
use crate::genetics::GenomeLogic;

/// Starting energy for entities created without world configuration.
pub const DEFAULT_MAX_ENERGY: f64 = 100.0;
/// Base lifespan in ticks for entities created without world configuration.
pub const DEFAULT_LIFESPAN: u64 = 1000;

/// A cohort sharing one trait schema and species label.
///
/// `evolve()` is size-conserving: the next generation always has exactly as
/// many entities as the previous one. Ids are drawn from the population's
/// allocator, which is shared with the world when attached so ids are never
/// reused anywhere.
pub struct Population {
    pub name: String,
    /// Species display label stamped onto member entities.
    pub species: String,
    pub entities: Vec<Entity>,
    pub generation: u32,
    pub mutation_rate: f64,
    pub mutation_strength: f64,
    pub elite_size: usize,
    pub tournament_size: usize,
    pub trait_names: Vec<String>,
    rng: ChaCha8Rng,
    ids: IdAllocator,
}

impl Population {
    /// Creates a population of `size` entities with each trait drawn
    /// uniformly from [-1, 1]. An empty trait list is legal; entities then
    /// simply carry no traits.
    pub fn new(
        name: &str,
        species: &str,
        trait_names: &[String],
        size: usize,
        seed: u64,
    ) -> Result<Self> {
        anyhow::ensure!(size > 0, "Population size must be positive");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ids = IdAllocator::new();
        let mut entities = Vec::with_capacity(size);
        for _ in 0..size {
            let mut genome = Genome::new();
            for trait_name in trait_names {
                genome.set(trait_name, rng.gen_range(-1.0..=1.0));
            }
            entities.push(spawn(
                ids.next_id(),
                genome,
                species,
                0.0,
                0.0,
                0,
                DEFAULT_MAX_ENERGY,
                DEFAULT_LIFESPAN,
            ));
        }
        Ok(Self {
            name: name.to_string(),
            species: species.to_string(),
            entities,
            generation: 0,
            mutation_rate: 0.1,
            mutation_strength: 0.2,
            elite_size: 2.min(size),
            tournament_size: 3.min(size),
            trait_names: trait_names.to_vec(),
            rng,
            ids,
        })
    }

    /// Wraps pre-built entities; used by the world, which supplies its own
    /// id allocator and a derived RNG stream.
    #[must_use]
    pub fn from_entities(
        name: &str,
        species: &str,
        entities: Vec<Entity>,
        trait_names: Vec<String>,
        ids: IdAllocator,
        rng: ChaCha8Rng,
    ) -> Self {
        let size = entities.len();
        Self {
            name: name.to_string(),
            species: species.to_string(),
            entities,
            generation: 0,
            mutation_rate: 0.1,
            mutation_strength: 0.2,
            elite_size: 2.min(size),
            tournament_size: 3.min(size.max(1)),
            trait_names,
            rng,
            ids,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Applies an externally supplied scoring function to every entity.
    pub fn evaluate_fitness<F: Fn(&Entity) -> f64>(&mut self, scorer: F) {
        for entity in &mut self.entities {
            entity.fitness = scorer(entity);
        }
    }

    /// Sorts descending by fitness. The sort is stable, so entities with
    /// equal fitness keep their original relative order.
    pub fn sort_by_fitness(&mut self) {
        self.entities
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    }

    /// The entity with maximal fitness; the first such entity on ties.
    #[must_use]
    pub fn get_best(&self) -> Option<&Entity> {
        let mut best: Option<&Entity> = None;
        for entity in &self.entities {
            match best {
                Some(b) if entity.fitness <= b.fitness => {}
                _ => best = Some(entity),
            }
        }
        best
    }

    /// Draws `tournament_size` entities uniformly at random with
    /// replacement and returns the fittest; ties resolve to the
    /// first-drawn. With `tournament_size = 1` this degenerates to uniform
    /// random selection.
    #[must_use]
    pub fn tournament_selection(&mut self) -> Option<&Entity> {
        let idx = self.select_index()?;
        self.entities.get(idx)
    }

    fn select_index(&mut self) -> Option<usize> {
        if self.entities.is_empty() {
            return None;
        }
        let rounds = self.tournament_size.max(1);
        let mut winner = self.rng.gen_range(0..self.entities.len());
        for _ in 1..rounds {
            let challenger = self.rng.gen_range(0..self.entities.len());
            if self.entities[challenger].fitness > self.entities[winner].fitness {
                winner = challenger;
            }
        }
        Some(winner)
    }

    /// Produces the next generation in place: stable fitness sort, elitist
    /// carry-over with fresh ids, then tournament crossover plus mutation
    /// for the remaining slots. Size-conserving by construction.
    pub fn evolve(&mut self) {
        self.evolve_at(0);
    }

    /// [`evolve`] with an explicit birth tick stamped onto new entities.
    ///
    /// [`evolve`]: Population::evolve
    pub fn evolve_at(&mut self, tick: u64) {
        if self.entities.is_empty() {
            self.generation += 1;
            return;
        }
        let target = self.entities.len();
        let elites = self.elite_size.min(target);

        self.sort_by_fitness();

        let mut next = Vec::with_capacity(target);
        for elite in self.entities.iter().take(elites) {
            let mut clone = elite.clone();
            clone.id = self.ids.next_id();
            next.push(clone);
        }

        while next.len() < target {
            let a = self.select_index().unwrap_or(0);
            let b = self.select_index().unwrap_or(0);
            let new_id = self.ids.next_id();
            let mut child = offspring(
                &self.entities[a],
                &self.entities[b],
                new_id,
                &self.species,
                tick,
                &mut self.rng,
            );
            child
                .genome
                .mutate_with_rng(self.mutation_rate, self.mutation_strength, &mut self.rng);
            next.push(child);
        }

        debug_assert_eq!(next.len(), target);
        self.entities = next;
        self.generation += 1;
    }

    /// Drops dead entities so they never participate in selection.
    pub fn compact(&mut self) {
        self.entities.retain(|e| e.is_alive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trait_names(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_new_population_has_requested_size_and_schema() {
        let pop = Population::new("grazers", "Valko", &trait_names(&["speed", "size"]), 12, 1)
            .expect("population");
        assert_eq!(pop.len(), 12);
        for e in &pop.entities {
            assert!(e.genome.contains("speed"));
            assert!(e.genome.contains("size"));
            assert!(e.genome.get("speed").abs() <= 1.0);
        }
    }

    #[test]
    fn test_empty_trait_schema_is_legal() {
        let pop = Population::new("blanks", "Nul", &[], 4, 1).expect("population");
        assert_eq!(pop.len(), 4);
        assert!(pop.entities[0].genome.is_empty());
        assert_eq!(pop.entities[0].genome.get("anything"), 0.0);
    }

    #[test]
    fn test_evolve_conserves_size_across_generations() {
        let mut pop =
            Population::new("runners", "Syl", &trait_names(&["speed"]), 9, 3).expect("population");
        for generation in 1..=5 {
            pop.evaluate_fitness(|e| e.genome.get("speed"));
            pop.evolve();
            assert_eq!(pop.len(), 9);
            assert_eq!(pop.generation, generation);
        }
    }

    #[test]
    fn test_evolve_assigns_fresh_unique_ids() {
        let mut pop =
            Population::new("idcheck", "Tor", &trait_names(&["size"]), 6, 5).expect("population");
        let old_max = pop.entities.iter().map(|e| e.id).max().unwrap();
        pop.evaluate_fitness(|e| e.genome.get("size"));
        pop.evolve();
        let mut ids: Vec<u64> = pop.entities.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 6);
        assert!(ids.iter().all(|&id| id > old_max));
    }

    #[test]
    fn test_elites_carry_the_best_genome_forward() {
        let mut pop =
            Population::new("elite", "Kael", &trait_names(&["strength"]), 8, 11).expect("population");
        pop.evaluate_fitness(|e| e.genome.get("strength"));
        let best_before = pop.get_best().unwrap().genome.get("strength");
        pop.evolve();
        let carried = pop
            .entities
            .iter()
            .any(|e| e.genome.get("strength") == best_before);
        assert!(carried);
    }

    #[test]
    fn test_get_best_prefers_first_on_ties() {
        let mut pop =
            Population::new("ties", "Mor", &trait_names(&["size"]), 3, 2).expect("population");
        pop.evaluate_fitness(|_| 1.0);
        let first_id = pop.entities[0].id;
        assert_eq!(pop.get_best().unwrap().id, first_id);
    }

    #[test]
    fn test_stable_sort_preserves_order_of_equal_fitness() {
        let mut pop =
            Population::new("stable", "Rhun", &trait_names(&["size"]), 5, 2).expect("population");
        let original: Vec<u64> = pop.entities.iter().map(|e| e.id).collect();
        pop.evaluate_fitness(|_| 0.5);
        pop.sort_by_fitness();
        let sorted: Vec<u64> = pop.entities.iter().map(|e| e.id).collect();
        assert_eq!(original, sorted);
    }

    #[test]
    fn test_tournament_size_one_is_uniform_random() {
        let mut pop =
            Population::new("uniform", "Pyr", &trait_names(&["speed"]), 5, 17).expect("population");
        pop.tournament_size = 1;
        // Give wildly different fitness; size-1 tournaments must ignore it.
        pop.evaluate_fitness(|e| e.genome.get("speed") * 1000.0);
        let mut counts = std::collections::HashMap::new();
        for _ in 0..10_000 {
            let id = pop.tournament_selection().unwrap().id;
            *counts.entry(id).or_insert(0usize) += 1;
        }
        assert_eq!(counts.len(), 5);
        for &count in counts.values() {
            // Expected 2000 per entity; generous statistical bounds.
            assert!((1500..=2500).contains(&count), "skewed draw: {count}");
        }
    }

    #[test]
    fn test_tournament_pressure_favors_the_fit() {
        let mut pop =
            Population::new("pressure", "Zan", &trait_names(&["speed"]), 10, 23).expect("population");
        pop.tournament_size = 4;
        pop.evaluate_fitness(|e| e.genome.get("speed"));
        let best = pop.get_best().unwrap().id;
        let mut best_wins = 0;
        for _ in 0..1000 {
            if pop.tournament_selection().unwrap().id == best {
                best_wins += 1;
            }
        }
        // P(best in a 4-draw) = 1 - 0.9^4 ~ 0.34; uniform would be 0.1.
        assert!(best_wins > 200, "only {best_wins} wins for the best");
    }

    #[test]
    fn test_compact_drops_dead_entities() {
        let mut pop =
            Population::new("morgue", "Oth", &trait_names(&["size"]), 6, 2).expect("population");
        pop.entities[1].is_alive = false;
        pop.entities[4].is_alive = false;
        pop.compact();
        assert_eq!(pop.len(), 4);
        assert!(pop.entities.iter().all(|e| e.is_alive));
    }

    #[test]
    fn test_zero_size_population_is_rejected() {
        assert!(Population::new("none", "Nil", &[], 0, 1).is_err());
    }
}
