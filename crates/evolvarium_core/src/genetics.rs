//! Genome behavior: Gaussian mutation, union crossover, genetic distance.
//!
//! Logic is layered over the plain `evolvarium_data::Genome` type as an
//! extension trait so the data crate stays behavior-free. Every operation
//! that draws randomness takes the caller's generator; there is no hidden
//! global RNG anywhere in the genetic path.

use evolvarium_data::{Genome, TRAIT_MAX, TRAIT_MIN};
use rand::Rng;
use rand_distr::StandardNormal;

/// Behavioral extension of [`Genome`].
pub trait GenomeLogic {
    /// For each trait, with probability `rate`, adds Gaussian noise with
    /// standard deviation `strength` and clamps the result to
    /// `[TRAIT_MIN, TRAIT_MAX]`. `rate = 0.0` leaves every value
    /// bit-identical.
    fn mutate_with_rng<R: Rng>(&mut self, rate: f64, strength: f64, rng: &mut R);

    /// Builds a child genome over the union of both parents' trait names.
    ///
    /// Names present in only one parent inherit that parent's value; for
    /// shared names one parent is picked uniformly at random. The policy is
    /// deterministic under a seeded generator.
    fn crossover_with_rng<R: Rng>(&self, other: &Genome, rng: &mut R) -> Genome;

    /// Root-mean-square distance over the *shared* trait names.
    ///
    /// Returns `f64::INFINITY` when two non-empty genomes share no names,
    /// which always exceeds any speciation threshold and forces a new
    /// cluster. Two empty genomes are identical and read as `0.0`.
    fn distance(&self, other: &Genome) -> f64;
}

impl GenomeLogic for Genome {
    fn mutate_with_rng<R: Rng>(&mut self, rate: f64, strength: f64, rng: &mut R) {
        self.for_each_value_mut(|_, value| {
            if rng.gen::<f64>() < rate {
                let noise: f64 = rng.sample(StandardNormal);
                *value = (*value + noise * strength).clamp(TRAIT_MIN, TRAIT_MAX);
            }
        });
    }

    fn crossover_with_rng<R: Rng>(&self, other: &Genome, rng: &mut R) -> Genome {
        let mut child = Genome::new();
        for (name, value) in self.entries() {
            match other.try_get(name) {
                Some(theirs) => {
                    let picked = if rng.gen_bool(0.5) { value } else { theirs };
                    child.set(name, picked);
                }
                None => child.set(name, value),
            }
        }
        for (name, value) in other.entries() {
            if !child.contains(name) {
                child.set(name, value);
            }
        }
        child
    }

    fn distance(&self, other: &Genome) -> f64 {
        let mut sum_sq = 0.0;
        let mut shared = 0usize;
        for (name, value) in self.entries() {
            if let Some(theirs) = other.try_get(name) {
                let d = value - theirs;
                sum_sq += d * d;
                shared += 1;
            }
        }
        if shared == 0 {
            if self.is_empty() && other.is_empty() {
                return 0.0;
            }
            return f64::INFINITY;
        }
        (sum_sq / shared as f64).sqrt()
    }
}
