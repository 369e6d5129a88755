//! Read-only world data consumed by action factories.
//!
//! A [`WorldSnapshot`] is fetched in bulk (maps, monsters, resources, items)
//! before planning begins. Only factories read it; the planner and executor
//! never touch it directly.

use serde::Deserialize;

/// What occupies a map tile, if anything.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapContent {
    /// Content category: "monster", "resource", "bank", "workshop",
    /// "grand_exchange".
    pub content_type: String,
    /// Code of the concrete monster/resource/workshop on this tile.
    pub code: String,
}

/// One tile of the world map.
#[derive(Debug, Clone, Deserialize)]
pub struct MapTile {
    pub x: i64,
    pub y: i64,
    #[serde(default)]
    pub content: Option<MapContent>,
}

impl MapTile {
    /// True when the tile holds content of the given type.
    pub fn has_content_type(&self, content_type: &str) -> bool {
        self.content
            .as_ref()
            .map(|c| c.content_type == content_type)
            .unwrap_or(false)
    }
}

/// A monster the character can fight.
#[derive(Debug, Clone, Deserialize)]
pub struct Monster {
    pub code: String,
    pub name: String,
    pub level: i64,
    pub hp: i64,
}

/// A gatherable resource node.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceNode {
    pub code: String,
    /// Gathering skill required: "mining", "woodcutting", "fishing", ...
    pub skill: String,
    /// Minimum skill level required to harvest.
    pub level: i64,
}

/// A recipe attached to a craftable item.
#[derive(Debug, Clone, Deserialize)]
pub struct CraftRecipe {
    /// Crafting skill: "weaponcrafting", "gearcrafting", "cooking", ...
    pub skill: String,
    /// Minimum skill level required to craft.
    pub level: i64,
}

/// An item definition.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub code: String,
    pub name: String,
    /// Item category: "weapon", "tool", "resource", "consumable", ...
    #[serde(rename = "type")]
    pub item_type: String,
    pub level: i64,
    #[serde(default)]
    pub craft: Option<CraftRecipe>,
}

/// The bulk world-data bundle handed to action factories.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default)]
    pub maps: Vec<MapTile>,
    #[serde(default)]
    pub monsters: Vec<Monster>,
    #[serde(default)]
    pub resources: Vec<ResourceNode>,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl WorldSnapshot {
    /// Looks up the tile at the given coordinates.
    pub fn tile_at(&self, x: i64, y: i64) -> Option<&MapTile> {
        self.maps.iter().find(|t| t.x == x && t.y == y)
    }

    /// All tiles holding content of the given type.
    pub fn tiles_with_content(&self, content_type: &str) -> Vec<&MapTile> {
        self.maps
            .iter()
            .filter(|t| t.has_content_type(content_type))
            .collect()
    }

    /// Looks up a monster by its code.
    pub fn monster_by_code(&self, code: &str) -> Option<&Monster> {
        self.monsters.iter().find(|m| m.code == code)
    }

    /// Looks up a resource node by its code.
    pub fn resource_by_code(&self, code: &str) -> Option<&ResourceNode> {
        self.resources.iter().find(|r| r.code == code)
    }

    /// Looks up an item by its code.
    pub fn item_by_code(&self, code: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.code == code)
    }
}
