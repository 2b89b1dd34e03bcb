use serde::{Deserialize, Serialize};

/// Terrain class of a grid cell. The core only consumes the movement
/// viscosity; richer biome semantics belong to collaborator subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Biome {
    #[default]
    Grassland,
    Forest,
    Desert,
    Swamp,
    River,
    Ocean,
    Mountain,
    Tundra,
}

impl Biome {
    /// Movement drag multiplier for this biome.
    #[must_use]
    pub const fn viscosity(self) -> f64 {
        match self {
            Self::Grassland => 1.0,
            Self::Forest => 1.3,
            Self::Desert => 1.2,
            Self::Swamp => 1.8,
            Self::River => 1.6,
            Self::Ocean => 2.0,
            Self::Mountain => 1.7,
            Self::Tundra => 1.4,
        }
    }

    /// Whether aquatic adaptation discounts movement here.
    #[must_use]
    pub const fn is_aquatic(self) -> bool {
        matches!(self, Self::Swamp | Self::River | Self::Ocean)
    }
}
