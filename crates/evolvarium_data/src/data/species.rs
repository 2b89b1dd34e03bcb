use super::genome::Genome;
use serde::{Deserialize, Serialize};

/// An emergent genetic cluster tracked across the whole world.
///
/// Membership is a lookup relation into the world's entity set, never
/// ownership: `members` holds stable entity ids that are resolved through
/// the world on each use. A species transitions to `is_extinct` exactly
/// once; afterwards it stays in the historical record for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    /// Sequential id; also the documented tie-break key for assignment.
    pub id: u64,
    /// Procedurally generated display name.
    pub name: String,
    /// Centroid genome the clustering compares against.
    pub representative: Genome,
    /// Ids of current member entities, refreshed on each clustering pass.
    pub members: Vec<u64>,
    pub formation_tick: u64,
    /// 0 while the species is alive; fixed at the extinction transition.
    pub extinction_tick: u64,
    /// Highest member count ever observed.
    pub peak_population: usize,
    pub is_extinct: bool,
    /// Tick at which the member set first became empty, if it still is.
    pub empty_since: Option<u64>,
}

impl Species {
    #[must_use]
    pub fn population(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_extinct
    }
}
