//! Perception: mapping live character data into the symbolic state model.
//!
//! The remote API describes a character in game terms (HP numbers, inventory
//! slots, equipment codes); the planner reasons in symbolic facts. This
//! module is the bridge: [`world_state_from_character`] derives a full
//! [`WorldState`] snapshot, including the computed readiness and
//! location-context flags, from a [`CharacterData`] payload plus the world
//! snapshot for map context.
//!
//! The derivation is pure and synchronous. It runs at the start of every
//! planning cycle and again after every action execution, so the symbolic
//! state never drifts far from the live one; on conflict the live API
//! response always wins.

use serde::Deserialize;

use crate::state::{StateKey, WorldState};
use crate::world::WorldSnapshot;

/// One occupied inventory slot.
#[derive(Debug, Clone, Deserialize)]
pub struct InventorySlot {
    pub code: String,
    pub quantity: i64,
}

/// The live character payload returned by the game API.
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterData {
    pub name: String,
    pub level: i64,
    pub xp: i64,
    pub gold: i64,
    pub hp: i64,
    pub max_hp: i64,
    pub x: i64,
    pub y: i64,
    /// Seconds until the next action may be issued; 0 when ready.
    #[serde(default)]
    pub cooldown_seconds: u64,
    #[serde(default = "default_skill_level")]
    pub mining_level: i64,
    #[serde(default = "default_skill_level")]
    pub woodcutting_level: i64,
    #[serde(default = "default_skill_level")]
    pub fishing_level: i64,
    #[serde(default = "default_skill_level")]
    pub weaponcrafting_level: i64,
    #[serde(default = "default_skill_level")]
    pub gearcrafting_level: i64,
    #[serde(default = "default_skill_level")]
    pub jewelrycrafting_level: i64,
    #[serde(default = "default_skill_level")]
    pub cooking_level: i64,
    #[serde(default = "default_skill_level")]
    pub alchemy_level: i64,
    #[serde(default)]
    pub inventory: Vec<InventorySlot>,
    #[serde(default = "default_inventory_max")]
    pub inventory_max_items: i64,
    /// Code of the equipped weapon, empty when none.
    #[serde(default)]
    pub weapon_slot: String,
    /// Code of the equipped gathering tool, empty when none.
    #[serde(default)]
    pub tool_slot: String,
}

fn default_skill_level() -> i64 {
    1
}

fn default_inventory_max() -> i64 {
    100
}

impl CharacterData {
    /// Total number of items held across all inventory slots.
    pub fn inventory_count(&self) -> i64 {
        self.inventory.iter().map(|slot| slot.quantity).sum()
    }

    /// True when at least one more item fits in the inventory.
    pub fn has_inventory_space(&self) -> bool {
        self.inventory_count() < self.inventory_max_items
    }
}

/// Derives the full symbolic snapshot for a character.
///
/// Numeric facts are copied through; readiness flags (`cooldown_ready`,
/// `can_fight`, `hp_full`, ...) and location-context flags (`at_bank`,
/// `at_monster_location`, ...) are computed here so that every action
/// precondition in the system can be expressed against the snapshot alone.
pub fn world_state_from_character(
    character: &CharacterData,
    world: &WorldSnapshot,
) -> WorldState {
    let mut state = WorldState::new();

    state.set(StateKey::CharacterLevel, character.level);
    state.set(StateKey::CharacterXp, character.xp);
    state.set(StateKey::GoldAmount, character.gold);

    state.set(StateKey::HpCurrent, character.hp);
    state.set(StateKey::HpMax, character.max_hp);
    state.set(StateKey::HpFull, character.hp >= character.max_hp);
    // Fighting below half HP is how characters die mid-plan.
    state.set(
        StateKey::CanFight,
        character.hp > 0 && character.hp * 2 >= character.max_hp,
    );
    state.set(StateKey::CanMove, character.hp > 0);
    state.set(StateKey::CanGather, character.hp > 0);
    state.set(StateKey::CanCraft, character.hp > 0);

    state.set(StateKey::CurrentX, character.x);
    state.set(StateKey::CurrentY, character.y);

    state.set(StateKey::CooldownReady, character.cooldown_seconds == 0);
    state.set(
        StateKey::CooldownSecondsRemaining,
        character.cooldown_seconds as i64,
    );

    state.set(StateKey::MiningLevel, character.mining_level);
    state.set(StateKey::WoodcuttingLevel, character.woodcutting_level);
    state.set(StateKey::FishingLevel, character.fishing_level);
    state.set(StateKey::WeaponcraftingLevel, character.weaponcrafting_level);
    state.set(StateKey::GearcraftingLevel, character.gearcrafting_level);
    state.set(
        StateKey::JewelrycraftingLevel,
        character.jewelrycrafting_level,
    );
    state.set(StateKey::CookingLevel, character.cooking_level);
    state.set(StateKey::AlchemyLevel, character.alchemy_level);

    state.set(StateKey::InventoryCount, character.inventory_count());
    state.set(StateKey::InventoryMaxItems, character.inventory_max_items);
    state.set(
        StateKey::InventorySpaceAvailable,
        character.has_inventory_space(),
    );
    state.set(
        StateKey::HasCraftMaterials,
        has_item_of_type(character, world, "resource"),
    );

    let best_weapon = best_weapon_in_inventory(character, world);
    state.set(StateKey::HasWeapon, best_weapon.is_some());
    if let Some(code) = best_weapon {
        state.set(StateKey::BestWeaponAvailable, code);
    }

    state.set(StateKey::WeaponEquipped, !character.weapon_slot.is_empty());
    if !character.weapon_slot.is_empty() {
        state.set(StateKey::EquippedWeapon, character.weapon_slot.clone());
    }
    state.set(StateKey::ToolEquipped, !character.tool_slot.is_empty());
    if !character.tool_slot.is_empty() {
        state.set(StateKey::EquippedTool, character.tool_slot.clone());
    }

    let tile = world.tile_at(character.x, character.y);
    let content_type = tile
        .and_then(|t| t.content.as_ref())
        .map(|c| c.content_type.as_str());
    state.set(StateKey::AtBank, content_type == Some("bank"));
    state.set(StateKey::AtMonsterLocation, content_type == Some("monster"));
    state.set(
        StateKey::AtResourceLocation,
        content_type == Some("resource"),
    );
    state.set(
        StateKey::AtWorkshopLocation,
        content_type == Some("workshop"),
    );
    state.set(
        StateKey::AtGrandExchange,
        content_type == Some("grand_exchange"),
    );
    state.set(StateKey::AtSafeLocation, content_type != Some("monster"));

    state
}

fn has_item_of_type(character: &CharacterData, world: &WorldSnapshot, item_type: &str) -> bool {
    character.inventory.iter().any(|slot| {
        world
            .item_by_code(&slot.code)
            .map(|item| item.item_type == item_type)
            .unwrap_or(false)
    })
}

/// The highest-level weapon in the inventory the character can wield.
fn best_weapon_in_inventory(character: &CharacterData, world: &WorldSnapshot) -> Option<String> {
    character
        .inventory
        .iter()
        .filter_map(|slot| world.item_by_code(&slot.code))
        .filter(|item| item.item_type == "weapon" && item.level <= character.level)
        .max_by_key(|item| item.level)
        .map(|item| item.code.clone())
}
