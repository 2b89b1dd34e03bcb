//! Entity behavior: spawning, combat, consumption, merging, movement.
//!
//! Every mutating capability (`kill`, `consume`, `merge`) re-validates its
//! own `can_*` precondition, so callers that skip the check still get a
//! safe `false`/`None` no-op instead of corrupted state.

use evolvarium_data::{Biome, Entity, Genome};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::genetics::GenomeLogic;

/// Combat reach in world units.
pub const ATTACK_RANGE: f64 = 1.5;
/// Scavenging reach in world units.
pub const EAT_RANGE: f64 = 1.5;
/// Merge-mating reach in world units.
pub const MERGE_RANGE: f64 = 2.0;
/// Minimum energy each partner must hold to merge.
pub const MERGE_MIN_ENERGY: f64 = 40.0;
/// Fraction of a carcass's energy transferred on consumption.
pub const EAT_EFFICIENCY: f64 = 0.8;
/// Fraction of combined parent energy passed to a merge child.
pub const MERGE_ENERGY_YIELD: f64 = 0.75;
/// Flat energy spent on a successful attack.
pub const ATTACK_COST: f64 = 1.0;
/// Energy drained per unit distance, per unit mass, per unit viscosity.
pub const MOVE_COST_FACTOR: f64 = 0.05;

/// Monotone id source shared by every authority that creates entities.
///
/// A standalone population starts its allocator at 0; populations attached
/// to a world share the world's allocator so ids stay world-unique and are
/// never reused, even after death.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator(Arc<AtomicU64>);

impl IdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self(Arc::new(AtomicU64::new(first)))
    }

    /// Returns the next id and advances the counter.
    pub fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }

    /// The id the next call to [`next_id`] would return.
    ///
    /// [`next_id`]: IdAllocator::next_id
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Constructs a live entity with derived max lifespan and speed caps.
#[must_use]
pub fn spawn(
    id: u64,
    genome: Genome,
    species: &str,
    x: f64,
    y: f64,
    tick: u64,
    max_energy: f64,
    base_lifespan: u64,
) -> Entity {
    let longevity = genome.get("longevity").clamp(-1.0, 1.0);
    let max_lifespan = ((base_lifespan as f64) * (1.0 + 0.25 * longevity)).max(1.0) as u64;
    Entity {
        id,
        genome,
        species: species.to_string(),
        fitness: 0.0,
        x,
        y,
        energy: max_energy,
        max_energy,
        age: 0,
        max_lifespan,
        is_alive: true,
        generation: 0,
        lineage_id: Uuid::new_v4(),
        parent_id: None,
        birth_tick: tick,
    }
}

/// Behavioral extension of [`Entity`].
pub trait EntityLogic {
    /// Offensive power: `(1+aggression)(1+strength)(1+size)`.
    fn effective_power(&self) -> f64;
    /// Defensive power: `(1+defense)(1+strength)(1+size)`.
    fn defense_power(&self) -> f64;
    /// Maximum displacement per unit time.
    fn max_speed(&self) -> f64;

    fn can_kill(&self, other: &Entity) -> bool;
    /// Kills `other` if [`can_kill`] holds; ties favor the defender.
    ///
    /// [`can_kill`]: EntityLogic::can_kill
    fn kill(&mut self, other: &mut Entity) -> bool;

    fn can_eat(&self, other: &Entity) -> bool;
    /// Transfers a carcass's energy to this entity if [`can_eat`] holds.
    ///
    /// [`can_eat`]: EntityLogic::can_eat
    fn consume(&mut self, other: &mut Entity) -> bool;

    fn can_merge(&self, other: &Entity) -> bool;
    /// Combines two living partners into one child; both parents die.
    /// Returns `None` (and mutates nothing) if [`can_merge`] fails.
    ///
    /// [`can_merge`]: EntityLogic::can_merge
    fn merge<R: Rng>(&mut self, other: &mut Entity, new_id: u64, tick: u64, rng: &mut R)
        -> Option<Entity>;

    /// Moves toward `(x, y)` capped at `max_speed * dt`, paying an energy
    /// cost proportional to distance, mass, and biome viscosity. Returns
    /// the energy spent.
    fn move_to_with_biome(&mut self, x: f64, y: f64, dt: f64, biome: Biome) -> f64;
    /// [`move_to_with_biome`] over open grassland.
    ///
    /// [`move_to_with_biome`]: EntityLogic::move_to_with_biome
    fn move_to(&mut self, x: f64, y: f64, dt: f64) -> f64;
}

/// Builds a crossover child of two parents: union genome, fitness 0,
/// midpoint position, generation `max(parents) + 1`.
#[must_use]
pub fn offspring<R: Rng>(
    a: &Entity,
    b: &Entity,
    new_id: u64,
    species: &str,
    tick: u64,
    rng: &mut R,
) -> Entity {
    let genome = a.genome.crossover_with_rng(&b.genome, rng);
    let max_energy = a.max_energy.max(b.max_energy);
    let base_lifespan = a.max_lifespan.max(b.max_lifespan);
    let mut child = spawn(
        new_id,
        genome,
        species,
        (a.x + b.x) / 2.0,
        (a.y + b.y) / 2.0,
        tick,
        max_energy,
        base_lifespan,
    );
    child.generation = a.generation.max(b.generation) + 1;
    child.lineage_id = if rng.gen_bool(0.5) {
        a.lineage_id
    } else {
        b.lineage_id
    };
    child.parent_id = Some(a.id);
    child
}

impl EntityLogic for Entity {
    fn effective_power(&self) -> f64 {
        (1.0 + self.genome.get("aggression"))
            * (1.0 + self.genome.get("strength"))
            * (1.0 + self.genome.get("size"))
    }

    fn defense_power(&self) -> f64 {
        (1.0 + self.genome.get("defense"))
            * (1.0 + self.genome.get("strength"))
            * (1.0 + self.genome.get("size"))
    }

    fn max_speed(&self) -> f64 {
        (1.0 + 0.5 * self.genome.get("speed")).max(0.1)
    }

    fn can_kill(&self, other: &Entity) -> bool {
        self.is_alive
            && other.is_alive
            && self.id != other.id
            && self.distance_to(other) <= ATTACK_RANGE
            && self.effective_power() > other.defense_power()
    }

    fn kill(&mut self, other: &mut Entity) -> bool {
        if !self.can_kill(other) {
            return false;
        }
        other.is_alive = false;
        self.energy -= ATTACK_COST;
        true
    }

    fn can_eat(&self, other: &Entity) -> bool {
        self.is_alive
            && !other.is_alive
            && self.id != other.id
            && self.distance_to(other) <= EAT_RANGE
            && other.energy > 0.0
    }

    fn consume(&mut self, other: &mut Entity) -> bool {
        if !self.can_eat(other) {
            return false;
        }
        let gain = other.energy * EAT_EFFICIENCY;
        self.energy = (self.energy + gain).min(self.max_energy);
        other.energy = 0.0;
        true
    }

    fn can_merge(&self, other: &Entity) -> bool {
        self.is_alive
            && other.is_alive
            && self.id != other.id
            && self.species == other.species
            && self.energy >= MERGE_MIN_ENERGY
            && other.energy >= MERGE_MIN_ENERGY
            && self.distance_to(other) <= MERGE_RANGE
    }

    fn merge<R: Rng>(
        &mut self,
        other: &mut Entity,
        new_id: u64,
        tick: u64,
        rng: &mut R,
    ) -> Option<Entity> {
        if !self.can_merge(other) {
            return None;
        }
        let mut child = offspring(self, other, new_id, &self.species, tick, rng);
        child.energy = ((self.energy + other.energy) * MERGE_ENERGY_YIELD).min(child.max_energy);
        self.is_alive = false;
        self.energy = 0.0;
        other.is_alive = false;
        other.energy = 0.0;
        Some(child)
    }

    fn move_to_with_biome(&mut self, x: f64, y: f64, dt: f64, biome: Biome) -> f64 {
        let dx = x - self.x;
        let dy = y - self.y;
        let dist = dx.hypot(dy);
        if dist <= 0.0 || dt <= 0.0 {
            return 0.0;
        }
        let step = dist.min(self.max_speed() * dt);
        let scale = step / dist;
        self.x += dx * scale;
        self.y += dy * scale;

        let mut viscosity = biome.viscosity();
        if biome.is_aquatic() {
            let affinity = self.genome.get("aquatic_affinity").clamp(0.0, 1.0);
            viscosity *= 1.0 - 0.5 * affinity;
        }
        let cost = step * self.mass() * viscosity * MOVE_COST_FACTOR;
        self.energy -= cost;
        cost
    }

    fn move_to(&mut self, x: f64, y: f64, dt: f64) -> f64 {
        self.move_to_with_biome(x, y, dt, Biome::Grassland)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(99)
    }

    fn basic(id: u64, x: f64, y: f64) -> Entity {
        spawn(id, Genome::new(), "testspec", x, y, 0, 100.0, 1000)
    }

    #[test]
    fn test_clone_independence() {
        let mut original = basic(1, 0.0, 0.0);
        original.genome.set("speed", 0.4);
        let mut copy = original.clone();
        copy.genome.set("speed", -1.0);
        copy.energy = 1.0;
        assert_eq!(original.genome.get("speed"), 0.4);
        assert_eq!(original.energy, 100.0);
    }

    #[test]
    fn test_predator_prey_combat_scenario() {
        let mut predator = basic(1, 0.0, 0.0);
        predator.genome.set("aggression", 0.9);
        predator.genome.set("strength", 0.8);
        predator.genome.set("size", 0.7);

        let mut prey = basic(2, 1.0, 1.0);
        prey.genome.set("defense", 0.1);
        prey.genome.set("strength", 0.2);
        prey.genome.set("size", -0.5);

        assert!(predator.distance_to(&prey) <= 1.5);
        assert!(predator.can_kill(&prey));
        assert!(predator.kill(&mut prey));
        assert!(!prey.is_alive);
        assert!(predator.can_eat(&prey));
        assert!(predator.consume(&mut prey));
        assert_eq!(prey.energy, 0.0);
    }

    #[test]
    fn test_ties_favor_the_defender() {
        let attacker = basic(1, 0.0, 0.0);
        let defender = basic(2, 0.5, 0.5);
        // No traits set on either side: powers are equal, strict > fails.
        assert!(!attacker.can_kill(&defender));
    }

    #[test]
    fn test_kill_on_incapable_pair_is_noop() {
        let mut weak = basic(1, 0.0, 0.0);
        weak.genome.set("aggression", -0.9);
        let mut strong = basic(2, 1.0, 0.0);
        strong.genome.set("defense", 0.9);
        assert!(!weak.kill(&mut strong));
        assert!(strong.is_alive);
        assert_eq!(weak.energy, 100.0);
    }

    #[test]
    fn test_out_of_range_attack_fails() {
        let mut predator = basic(1, 0.0, 0.0);
        predator.genome.set("aggression", 1.0);
        let mut prey = basic(2, 10.0, 10.0);
        prey.genome.set("size", -0.9);
        assert!(!predator.can_kill(&prey));
        assert!(!predator.kill(&mut prey));
    }

    #[test]
    fn test_cannot_eat_the_living() {
        let mut a = basic(1, 0.0, 0.0);
        let mut b = basic(2, 0.5, 0.0);
        assert!(!a.can_eat(&b));
        assert!(!a.consume(&mut b));
        assert_eq!(b.energy, 100.0);
    }

    #[test]
    fn test_merge_kills_both_parents() {
        let mut a = basic(1, 0.0, 0.0);
        let mut b = basic(2, 1.0, 0.0);
        a.genome.set("speed", 0.5);
        b.genome.set("venom", 0.3);
        let child = a.merge(&mut b, 77, 10, &mut rng()).expect("merge");
        assert!(!a.is_alive);
        assert!(!b.is_alive);
        assert_eq!(child.id, 77);
        assert_eq!(child.generation, 1);
        assert!(child.genome.contains("speed"));
        assert!(child.genome.contains("venom"));
        assert_eq!(child.x, 0.5);
    }

    #[test]
    fn test_merge_rejects_species_mismatch() {
        let mut a = basic(1, 0.0, 0.0);
        let mut b = basic(2, 1.0, 0.0);
        b.species = "other".to_string();
        assert!(a.merge(&mut b, 3, 0, &mut rng()).is_none());
        assert!(a.is_alive && b.is_alive);
    }

    #[test]
    fn test_merge_requires_energy() {
        let mut a = basic(1, 0.0, 0.0);
        let mut b = basic(2, 1.0, 0.0);
        b.energy = MERGE_MIN_ENERGY - 1.0;
        assert!(!a.can_merge(&b));
    }

    #[test]
    fn test_movement_costs_energy_and_caps_speed() {
        let mut e = basic(1, 0.0, 0.0);
        let cost = e.move_to(100.0, 0.0, 1.0);
        // Default speed trait 0 -> max_speed 1.0, so one unit of travel.
        assert!((e.x - 1.0).abs() < 1e-9);
        assert!(cost > 0.0);
        assert!(e.energy < 100.0);
    }

    #[test]
    fn test_aquatic_affinity_discounts_water_travel() {
        let mut swimmer = basic(1, 0.0, 0.0);
        swimmer.genome.set("aquatic_affinity", 1.0);
        let mut walker = basic(2, 0.0, 0.0);
        let swim_cost = swimmer.move_to_with_biome(1.0, 0.0, 1.0, Biome::Ocean);
        let wade_cost = walker.move_to_with_biome(1.0, 0.0, 1.0, Biome::Ocean);
        assert!(swim_cost < wade_cost);
    }

    #[test]
    fn test_id_allocator_is_monotone() {
        let ids = IdAllocator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        let shared = ids.clone();
        let c = shared.next_id();
        assert!(a < b && b < c);
        assert_eq!(ids.peek(), 3);
    }
}
