//! # Materials
//!
//! Block and item kinds the detector cares about.
//!
//! Only the terrain classes that change expected physics are modelled
//! precisely (liquids, climbables, webs). Everything else is either solid or
//! passable, which is all the no-clip scan needs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A material name that does not map to any known [`Material`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown material: {0}")]
pub struct UnknownMaterial(pub String);

/// Block and item kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Material {
    /// Empty space.
    Air,
    /// Stone.
    Stone,
    /// Grass block.
    Grass,
    /// Dirt.
    Dirt,
    /// Cobblestone.
    Cobblestone,
    /// Wooden planks.
    Wood,
    /// Bedrock.
    Bedrock,
    /// Sand.
    Sand,
    /// Gravel.
    Gravel,
    /// Log.
    Log,
    /// Leaves.
    Leaves,
    /// Glass.
    Glass,
    /// Obsidian.
    Obsidian,
    /// Flowing water.
    Water,
    /// Source water.
    StationaryWater,
    /// Flowing lava.
    Lava,
    /// Source lava.
    StationaryLava,
    /// Ladder.
    Ladder,
    /// Vine.
    Vine,
    /// Cobweb.
    Web,
    /// Tall grass.
    LongGrass,
    /// Torch.
    Torch,
    /// Snow layer.
    Snow,
    /// Ice.
    Ice,
    /// Fence.
    Fence,
    /// Stone slab.
    StepSlab,
    /// Chest.
    Chest,
    /// Mushroom soup.
    MushroomSoup,
    /// Bread.
    Bread,
    /// Apple.
    Apple,
    /// Golden apple.
    GoldenApple,
    /// Cooked beef.
    CookedBeef,
    /// Cooked chicken.
    CookedChicken,
    /// Baked potato.
    BakedPotato,
    /// Iron sword.
    IronSword,
    /// Diamond sword.
    DiamondSword,
    /// Bow.
    Bow,
}

impl Material {
    /// Every material, in declaration order.
    pub const ALL: [Self; 37] = [
        Self::Air,
        Self::Stone,
        Self::Grass,
        Self::Dirt,
        Self::Cobblestone,
        Self::Wood,
        Self::Bedrock,
        Self::Sand,
        Self::Gravel,
        Self::Log,
        Self::Leaves,
        Self::Glass,
        Self::Obsidian,
        Self::Water,
        Self::StationaryWater,
        Self::Lava,
        Self::StationaryLava,
        Self::Ladder,
        Self::Vine,
        Self::Web,
        Self::LongGrass,
        Self::Torch,
        Self::Snow,
        Self::Ice,
        Self::Fence,
        Self::StepSlab,
        Self::Chest,
        Self::MushroomSoup,
        Self::Bread,
        Self::Apple,
        Self::GoldenApple,
        Self::CookedBeef,
        Self::CookedChicken,
        Self::BakedPotato,
        Self::IronSword,
        Self::DiamondSword,
        Self::Bow,
    ];

    /// Canonical upper-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Air => "AIR",
            Self::Stone => "STONE",
            Self::Grass => "GRASS",
            Self::Dirt => "DIRT",
            Self::Cobblestone => "COBBLESTONE",
            Self::Wood => "WOOD",
            Self::Bedrock => "BEDROCK",
            Self::Sand => "SAND",
            Self::Gravel => "GRAVEL",
            Self::Log => "LOG",
            Self::Leaves => "LEAVES",
            Self::Glass => "GLASS",
            Self::Obsidian => "OBSIDIAN",
            Self::Water => "WATER",
            Self::StationaryWater => "STATIONARY_WATER",
            Self::Lava => "LAVA",
            Self::StationaryLava => "STATIONARY_LAVA",
            Self::Ladder => "LADDER",
            Self::Vine => "VINE",
            Self::Web => "WEB",
            Self::LongGrass => "LONG_GRASS",
            Self::Torch => "TORCH",
            Self::Snow => "SNOW",
            Self::Ice => "ICE",
            Self::Fence => "FENCE",
            Self::StepSlab => "STEP_SLAB",
            Self::Chest => "CHEST",
            Self::MushroomSoup => "MUSHROOM_SOUP",
            Self::Bread => "BREAD",
            Self::Apple => "APPLE",
            Self::GoldenApple => "GOLDEN_APPLE",
            Self::CookedBeef => "COOKED_BEEF",
            Self::CookedChicken => "COOKED_CHICKEN",
            Self::BakedPotato => "BAKED_POTATO",
            Self::IronSword => "IRON_SWORD",
            Self::DiamondSword => "DIAMOND_SWORD",
            Self::Bow => "BOW",
        }
    }

    /// Lower-case name with spaces, for player-facing reasons.
    #[must_use]
    pub fn display_name(self) -> String {
        self.name().to_lowercase().replace('_', " ")
    }

    /// Blocks movement.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        matches!(
            self,
            Self::Stone
                | Self::Grass
                | Self::Dirt
                | Self::Cobblestone
                | Self::Wood
                | Self::Bedrock
                | Self::Sand
                | Self::Gravel
                | Self::Log
                | Self::Leaves
                | Self::Glass
                | Self::Obsidian
                | Self::Ice
                | Self::Fence
                | Self::StepSlab
                | Self::Chest
        )
    }

    /// Water or lava, flowing or source.
    #[must_use]
    pub const fn is_liquid(self) -> bool {
        matches!(
            self,
            Self::Water | Self::StationaryWater | Self::Lava | Self::StationaryLava
        )
    }

    /// Lava, flowing or source.
    #[must_use]
    pub const fn is_lava(self) -> bool {
        matches!(self, Self::Lava | Self::StationaryLava)
    }

    /// Ladders and vines.
    #[must_use]
    pub const fn is_climbable(self) -> bool {
        matches!(self, Self::Ladder | Self::Vine)
    }

    /// Can be eaten.
    #[must_use]
    pub const fn is_edible(self) -> bool {
        matches!(
            self,
            Self::MushroomSoup
                | Self::Bread
                | Self::Apple
                | Self::GoldenApple
                | Self::CookedBeef
                | Self::CookedChicken
                | Self::BakedPotato
        )
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Material {
    type Err = UnknownMaterial;

    /// Parses a material name, case-insensitively, accepting spaces or
    /// dashes in place of underscores.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase().replace([' ', '-'], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| UnknownMaterial(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("stone".parse::<Material>(), Ok(Material::Stone));
        assert_eq!("stationary water".parse::<Material>(), Ok(Material::StationaryWater));
        assert_eq!("MUSHROOM-SOUP".parse::<Material>(), Ok(Material::MushroomSoup));
        assert_eq!(
            "unobtainium".parse::<Material>(),
            Err(UnknownMaterial("unobtainium".to_string()))
        );
    }

    #[test]
    fn test_every_name_round_trips() {
        for material in Material::ALL {
            assert_eq!(material.name().parse::<Material>(), Ok(material));
        }
    }

    #[test]
    fn test_classification() {
        assert!(Material::Bedrock.is_solid());
        assert!(!Material::Water.is_solid());
        assert!(Material::StationaryLava.is_liquid());
        assert!(Material::Vine.is_climbable());
        assert!(!Material::Web.is_climbable());
        assert!(Material::MushroomSoup.is_edible());
        assert_eq!(Material::StepSlab.display_name(), "step slab");
    }
}
