use super::genome::Genome;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One living (or retired) individual.
///
/// Identity contract: `id` is assigned once by whichever authority created
/// the entity and is never reused, even after death. Dead entities keep
/// their state until a compaction pass prunes them; `is_alive` is the only
/// liveness flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u64,
    pub genome: Genome,
    /// Display label of the species cluster this entity currently belongs to.
    pub species: String,
    /// Transient score, recomputed on each evaluation pass. Not persisted.
    #[serde(skip)]
    pub fitness: f64,
    pub x: f64,
    pub y: f64,
    pub energy: f64,
    pub max_energy: f64,
    /// Age in ticks.
    pub age: u64,
    pub max_lifespan: u64,
    pub is_alive: bool,
    pub generation: u32,
    pub lineage_id: Uuid,
    pub parent_id: Option<u64>,
    pub birth_tick: u64,
}

impl Entity {
    /// Euclidean distance to another entity.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Body mass derived from the size trait; floored so movement cost
    /// never goes non-positive.
    #[must_use]
    pub fn mass(&self) -> f64 {
        (1.0 + 0.5 * self.genome.get("size")).max(0.1)
    }

    /// Grid cell coordinates from the truncated position.
    #[must_use]
    pub fn cell(&self) -> (i64, i64) {
        (self.x.trunc() as i64, self.y.trunc() as i64)
    }
}
