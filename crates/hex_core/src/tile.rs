//! Map tile kinds.

use serde::{Deserialize, Serialize};

/// How much light a tile lets through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Transparency {
    /// Blocks sight.
    Opaque,
    /// Can be seen into but not through.
    Partial,
    /// Can be seen through.
    Clear,
}

/// A terrain tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    /// Solid rock.
    #[default]
    Wall,
    /// Open cave floor.
    Floor,
    /// Trampled grass.
    ShortGrass,
    /// Grass tall enough to hide in.
    TallGrass,
    /// Spikes left behind by a spike projectile.
    Spikes,
}

impl Tile {
    /// Every tile kind.
    pub const ALL: [Self; 5] = [
        Self::Wall,
        Self::Floor,
        Self::ShortGrass,
        Self::TallGrass,
        Self::Spikes,
    ];

    /// Whether creatures can stand on this tile.
    #[must_use]
    pub const fn can_walk(self) -> bool {
        matches!(self, Self::Floor | Self::ShortGrass | Self::TallGrass)
    }

    /// Light transmission of this tile.
    #[must_use]
    pub const fn transparency(self) -> Transparency {
        match self {
            Self::Wall => Transparency::Opaque,
            Self::TallGrass => Transparency::Partial,
            Self::Floor | Self::ShortGrass | Self::Spikes => Transparency::Clear,
        }
    }

    /// Whether a viewer standing elsewhere can see this tile at all.
    #[must_use]
    pub fn is_visible_through(self) -> bool {
        self.transparency() > Transparency::Opaque
    }

    /// Whether sight passes through this tile unobstructed.
    #[must_use]
    pub fn is_clear(self) -> bool {
        self.transparency() == Transparency::Clear
    }
}
