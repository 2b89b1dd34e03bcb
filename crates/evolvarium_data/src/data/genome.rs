use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lower clamp for any heritable trait value.
pub const TRAIT_MIN: f64 = -2.0;
/// Upper clamp for any heritable trait value.
pub const TRAIT_MAX: f64 = 2.0;

/// Well-known heritable traits, stored densely to keep per-tick lookups
/// off the hash path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraitId {
    /// Willingness to initiate combat.
    Aggression,
    /// Raw physical strength.
    Strength,
    /// Body size; feeds mass and combat power.
    Size,
    /// Resistance when attacked.
    Defense,
    /// Maximum movement speed modifier.
    Speed,
    /// Idle energy burn modifier.
    Metabolism,
    /// Perception radius modifier.
    Vision,
    /// Movement discount in aquatic biomes.
    AquaticAffinity,
    /// Mating eagerness.
    Fertility,
    /// Lifespan modifier.
    Longevity,
}

impl TraitId {
    /// Every well-known trait, in dense storage order.
    pub const ALL: [Self; 10] = [
        Self::Aggression,
        Self::Strength,
        Self::Size,
        Self::Defense,
        Self::Speed,
        Self::Metabolism,
        Self::Vision,
        Self::AquaticAffinity,
        Self::Fertility,
        Self::Longevity,
    ];

    /// Number of well-known traits.
    pub const COUNT: usize = Self::ALL.len();

    /// Canonical name used in configuration and genome maps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Aggression => "aggression",
            Self::Strength => "strength",
            Self::Size => "size",
            Self::Defense => "defense",
            Self::Speed => "speed",
            Self::Metabolism => "metabolism",
            Self::Vision => "vision",
            Self::AquaticAffinity => "aquatic_affinity",
            Self::Fertility => "fertility",
            Self::Longevity => "longevity",
        }
    }

    /// Reverse lookup from a canonical name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The full heritable trait mapping of one individual.
///
/// Well-known traits live in a fixed dense array; any experimentally added
/// trait name falls back to a small sorted map. A name that was never set
/// reads as `0.0`; lookups are fail-soft by contract and never error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "BTreeMap<String, f64>", from = "BTreeMap<String, f64>")]
pub struct Genome {
    dense: [f64; TraitId::COUNT],
    present: [bool; TraitId::COUNT],
    sparse: BTreeMap<String, f64>,
}

impl Genome {
    /// Creates an empty genome with no traits set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a genome from `(name, value)` pairs.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut genome = Self::new();
        for (name, value) in pairs {
            genome.set(name, value);
        }
        genome
    }

    /// Returns the stored value, or `0.0` if the trait was never set.
    #[must_use]
    pub fn get(&self, name: &str) -> f64 {
        self.try_get(name).unwrap_or(0.0)
    }

    /// Returns the stored value, or `None` if the trait was never set.
    #[must_use]
    pub fn try_get(&self, name: &str) -> Option<f64> {
        match TraitId::from_name(name) {
            Some(id) if self.present[id.index()] => Some(self.dense[id.index()]),
            Some(_) => None,
            None => self.sparse.get(name).copied(),
        }
    }

    /// Inserts or overwrites a trait value, silently growing the trait set.
    pub fn set(&mut self, name: &str, value: f64) {
        match TraitId::from_name(name) {
            Some(id) => {
                self.dense[id.index()] = value;
                self.present[id.index()] = true;
            }
            None => {
                self.sparse.insert(name.to_string(), value);
            }
        }
    }

    /// Whether a trait name has been set.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.try_get(name).is_some()
    }

    /// Number of traits set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.present.iter().filter(|&&p| p).count() + self.sparse.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates `(name, value)` pairs in a deterministic order: well-known
    /// traits in dense order, then sparse traits sorted by name.
    pub fn entries(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        TraitId::ALL
            .iter()
            .filter(|id| self.present[id.index()])
            .map(|id| (id.name(), self.dense[id.index()]))
            .chain(self.sparse.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    /// Iterates trait names in the same deterministic order as [`entries`].
    ///
    /// [`entries`]: Genome::entries
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries().map(|(name, _)| name)
    }

    /// Applies `f` to every stored trait value in place.
    pub fn for_each_value_mut<F: FnMut(&str, &mut f64)>(&mut self, mut f: F) {
        for id in TraitId::ALL {
            if self.present[id.index()] {
                f(id.name(), &mut self.dense[id.index()]);
            }
        }
        for (name, value) in &mut self.sparse {
            f(name, value);
        }
    }
}

impl From<Genome> for BTreeMap<String, f64> {
    fn from(genome: Genome) -> Self {
        genome
            .entries()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}

impl From<BTreeMap<String, f64>> for Genome {
    fn from(map: BTreeMap<String, f64>) -> Self {
        let mut genome = Self::new();
        for (name, value) in map {
            genome.set(&name, value);
        }
        genome
    }
}
