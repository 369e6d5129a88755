//! Crafting an item at a workshop.

use std::sync::Arc;

use async_trait::async_trait;

use super::{cooldown_sub_goal, observed_changes, sub_goal};
use crate::action::{Action, ActionResult, SubGoalRequest};
use crate::api::{ApiError, GameApi};
use crate::error::Result;
use crate::registry::ActionFactory;
use crate::state::{StateKey, WorldState};
use crate::world::WorldSnapshot;

/// Crafts `item_code` at the workshop on `(x, y)`.
///
/// Weapon recipes additionally claim `has_weapon`, which is what lets the
/// planner chain gather → craft → equip toward a combat goal.
#[derive(Clone)]
pub struct CraftAction {
    item_code: String,
    is_weapon: bool,
    recipe_level: i64,
    skill_key: StateKey,
    x: i64,
    y: i64,
    skill_claim: i64,
    world: Arc<WorldSnapshot>,
}

impl CraftAction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        item_code: impl Into<String>,
        is_weapon: bool,
        recipe_level: i64,
        skill_key: StateKey,
        x: i64,
        y: i64,
        skill_claim: i64,
        world: Arc<WorldSnapshot>,
    ) -> Self {
        Self {
            item_code: item_code.into(),
            is_weapon,
            recipe_level,
            skill_key,
            x,
            y,
            skill_claim,
            world,
        }
    }
}

#[async_trait]
impl Action for CraftAction {
    fn name(&self) -> String {
        format!("craft_{}_at_{}_{}", self.item_code, self.x, self.y)
    }

    fn cost(&self) -> u32 {
        self.recipe_level.max(1) as u32
    }

    fn preconditions(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::CooldownReady, true)
            .with(StateKey::CanCraft, true)
            .with(StateKey::HasCraftMaterials, true)
            .with(StateKey::CurrentX, self.x)
            .with(StateKey::CurrentY, self.y)
    }

    fn effects(&self) -> WorldState {
        let mut effects = WorldState::new()
            .with(self.skill_key, self.skill_claim)
            .with(StateKey::CooldownReady, true);
        if self.is_weapon {
            effects.set(StateKey::HasWeapon, true);
            effects.set(StateKey::BestWeaponAvailable, self.item_code.clone());
        }
        effects
    }

    async fn execute(
        &self,
        character_id: &str,
        state: &WorldState,
        api: &dyn GameApi,
    ) -> Result<ActionResult> {
        if state.get_int(StateKey::CurrentX) != Some(self.x)
            || state.get_int(StateKey::CurrentY) != Some(self.y)
        {
            return Ok(ActionResult::failed_with_sub_goals(
                format!("cannot craft {}: not at the workshop", self.item_code),
                vec![SubGoalRequest::new(
                    sub_goal::MOVE_TO_LOCATION,
                    6,
                    self.name(),
                    format!("workshop is at ({}, {})", self.x, self.y),
                )
                .with_param("target_x", self.x)
                .with_param("target_y", self.y)],
            ));
        }

        match api.craft(character_id, &self.item_code).await {
            Ok(outcome) => Ok(ActionResult::succeeded(
                format!("crafted {}", self.item_code),
                observed_changes(&outcome, &self.world),
                outcome.cooldown_seconds,
            )),
            Err(ApiError::CooldownActive { remaining_seconds }) => {
                Ok(ActionResult::failed_with_sub_goals(
                    format!("craft {} refused: cooldown active", self.item_code),
                    vec![cooldown_sub_goal(&self.name(), remaining_seconds)],
                ))
            }
            Err(err) if err.is_game_level() => Ok(ActionResult::failed(format!(
                "craft {} failed: {}",
                self.item_code, err
            ))),
            Err(err) => Err(err.into()),
        }
    }
}

/// Emits one craft action per (craftable item, matching workshop tile)
/// pair the character's crafting skill allows.
pub struct CraftFactory;

impl ActionFactory for CraftFactory {
    fn action_type(&self) -> &'static str {
        "craft"
    }

    fn create_instances(
        &self,
        world: &Arc<WorldSnapshot>,
        state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>> {
        let mut seen = std::collections::HashSet::new();
        let mut actions: Vec<Arc<dyn Action>> = Vec::new();
        for item in &world.items {
            let Some(recipe) = item.craft.as_ref() else {
                continue;
            };
            let Some(skill_key) = StateKey::skill_level(&recipe.skill) else {
                log::warn!(
                    "craft factory: item {} has unknown craft skill '{}'",
                    item.code,
                    recipe.skill
                );
                continue;
            };
            let skill_level = state.get_int(skill_key).unwrap_or(1);
            if recipe.level > skill_level {
                continue;
            }
            for tile in world.tiles_with_content("workshop") {
                let workshop_matches = tile
                    .content
                    .as_ref()
                    .map(|c| c.code == recipe.skill)
                    .unwrap_or(false);
                if !workshop_matches {
                    continue;
                }
                let action = CraftAction::new(
                    item.code.clone(),
                    item.item_type == "weapon",
                    recipe.level,
                    skill_key,
                    tile.x,
                    tile.y,
                    skill_level + 1,
                    Arc::clone(world),
                );
                if seen.insert(action.name()) {
                    actions.push(Arc::new(action));
                }
            }
        }
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{CraftRecipe, Item, MapContent, MapTile};

    fn world() -> Arc<WorldSnapshot> {
        Arc::new(WorldSnapshot {
            maps: vec![MapTile {
                x: 2,
                y: 2,
                content: Some(MapContent {
                    content_type: "workshop".to_string(),
                    code: "weaponcrafting".to_string(),
                }),
            }],
            monsters: vec![],
            resources: vec![],
            items: vec![
                Item {
                    code: "copper_dagger".to_string(),
                    name: "Copper Dagger".to_string(),
                    item_type: "weapon".to_string(),
                    level: 1,
                    craft: Some(CraftRecipe {
                        skill: "weaponcrafting".to_string(),
                        level: 1,
                    }),
                },
                Item {
                    code: "obsidian_blade".to_string(),
                    name: "Obsidian Blade".to_string(),
                    item_type: "weapon".to_string(),
                    level: 25,
                    craft: Some(CraftRecipe {
                        skill: "weaponcrafting".to_string(),
                        level: 25,
                    }),
                },
            ],
        })
    }

    #[test]
    fn test_weapon_recipe_claims_has_weapon() {
        let action = CraftAction::new(
            "copper_dagger",
            true,
            1,
            StateKey::WeaponcraftingLevel,
            2,
            2,
            3,
            world(),
        );
        let effects = action.effects();
        assert_eq!(effects.get_bool(StateKey::HasWeapon), Some(true));
        assert_eq!(
            effects.get_text(StateKey::BestWeaponAvailable),
            Some("copper_dagger")
        );
    }

    #[test]
    fn test_factory_gates_on_craft_skill() {
        let state = WorldState::new().with(StateKey::WeaponcraftingLevel, 2);
        let actions = CraftFactory.create_instances(&world(), &state).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name(), "craft_copper_dagger_at_2_2");
    }
}
