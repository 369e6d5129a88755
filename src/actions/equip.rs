//! Equipping a weapon from the inventory.

use std::sync::Arc;

use async_trait::async_trait;

use super::{cooldown_sub_goal, observed_changes};
use crate::action::{Action, ActionResult};
use crate::api::{ApiError, GameApi};
use crate::error::Result;
use crate::registry::ActionFactory;
use crate::state::{StateKey, WorldState};
use crate::world::WorldSnapshot;

/// Equips `item_code` into the weapon slot.
#[derive(Clone)]
pub struct EquipAction {
    item_code: String,
    world: Arc<WorldSnapshot>,
}

impl EquipAction {
    pub fn new(item_code: impl Into<String>, world: Arc<WorldSnapshot>) -> Self {
        Self {
            item_code: item_code.into(),
            world,
        }
    }
}

#[async_trait]
impl Action for EquipAction {
    fn name(&self) -> String {
        format!("equip_{}", self.item_code)
    }

    fn cost(&self) -> u32 {
        1
    }

    fn preconditions(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::CooldownReady, true)
            .with(StateKey::HasWeapon, true)
    }

    fn effects(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::WeaponEquipped, true)
            .with(StateKey::EquippedWeapon, self.item_code.clone())
            .with(StateKey::CooldownReady, true)
    }

    async fn execute(
        &self,
        character_id: &str,
        _state: &WorldState,
        api: &dyn GameApi,
    ) -> Result<ActionResult> {
        match api.equip(character_id, &self.item_code).await {
            Ok(outcome) => Ok(ActionResult::succeeded(
                format!("equipped {}", self.item_code),
                observed_changes(&outcome, &self.world),
                outcome.cooldown_seconds,
            )),
            Err(ApiError::CooldownActive { remaining_seconds }) => {
                Ok(ActionResult::failed_with_sub_goals(
                    format!("equip {} refused: cooldown active", self.item_code),
                    vec![cooldown_sub_goal(&self.name(), remaining_seconds)],
                ))
            }
            Err(err) if err.is_game_level() => Ok(ActionResult::failed(format!(
                "equip {} failed: {}",
                self.item_code, err
            ))),
            Err(err) => Err(err.into()),
        }
    }
}

/// Emits equip actions for the best wieldable weapon already in the
/// inventory and for every craftable weapon the character could produce.
///
/// The craftable candidates matter for planning: `has_weapon` only becomes
/// true through a craft action's effects, and the equip that consumes it
/// must already exist in the action universe for the planner to chain
/// gather → craft → equip.
pub struct EquipFactory;

impl ActionFactory for EquipFactory {
    fn action_type(&self) -> &'static str {
        "equip"
    }

    fn create_instances(
        &self,
        world: &Arc<WorldSnapshot>,
        state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>> {
        let mut seen = std::collections::HashSet::new();
        let mut actions: Vec<Arc<dyn Action>> = Vec::new();

        if let Some(code) = state.get_text(StateKey::BestWeaponAvailable) {
            let action = EquipAction::new(code, Arc::clone(world));
            seen.insert(action.name());
            actions.push(Arc::new(action));
        }

        let character_level = state.get_int(StateKey::CharacterLevel).unwrap_or(1);
        for item in &world.items {
            if item.item_type != "weapon" || item.craft.is_none() || item.level > character_level {
                continue;
            }
            let action = EquipAction::new(item.code.clone(), Arc::clone(world));
            if seen.insert(action.name()) {
                actions.push(Arc::new(action));
            }
        }
        Ok(actions)
    }
}
