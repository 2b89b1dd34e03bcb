mod common;

use common::WorldBuilder;
use evolvarium_lib::World;

fn run_world(seed: u64, ticks: u64) -> World {
    let mut world = WorldBuilder::new()
        .with_seed(seed)
        .with_config(|c| c.reproduction.evolve_interval = 10)
        .with_population("herd", &[("speed", 0.2), ("size", -0.1)])
        .with_population_at("pack", &[("aggression", 0.7), ("strength", 0.5)], (40.0, 40.0))
        .build();
    for _ in 0..ticks {
        world.update().unwrap();
    }
    world
}

fn state_vector(world: &World) -> Vec<(u64, f64, f64, f64, u64)> {
    let mut state = Vec::new();
    for pop in world.populations.values() {
        for e in &pop.entities {
            state.push((e.id, e.x, e.y, e.energy, e.age));
        }
    }
    state
}

#[test]
fn test_seeded_runs_replay_bit_for_bit() {
    let a = run_world(12345, 100);
    let b = run_world(12345, 100);

    assert_eq!(a.tick, b.tick);
    assert_eq!(state_vector(&a), state_vector(&b));
    assert_eq!(
        a.speciation.active_count(),
        b.speciation.active_count()
    );
    assert_eq!(a.get_stats().total_entities, b.get_stats().total_entities);
}

#[test]
fn test_different_seeds_diverge() {
    let a = run_world(12345, 50);
    let b = run_world(54321, 50);
    assert_ne!(state_vector(&a), state_vector(&b));
}

#[test]
fn test_species_names_are_seed_stable() {
    let a = run_world(777, 1);
    let b = run_world(777, 1);
    let names_a: Vec<String> = a.speciation.species.iter().map(|s| s.name.clone()).collect();
    let names_b: Vec<String> = b.speciation.species.iter().map(|s| s.name.clone()).collect();
    assert_eq!(names_a, names_b);
}
