//! Depositing the inventory at a bank.

use std::sync::Arc;

use async_trait::async_trait;

use super::{cooldown_sub_goal, observed_changes, sub_goal};
use crate::action::{Action, ActionResult, SubGoalRequest};
use crate::api::{ApiError, GameApi};
use crate::error::Result;
use crate::registry::ActionFactory;
use crate::state::{StateKey, WorldState};
use crate::world::WorldSnapshot;

/// Deposits the whole inventory at the bank on `(x, y)`.
#[derive(Clone)]
pub struct BankDepositAction {
    x: i64,
    y: i64,
    world: Arc<WorldSnapshot>,
}

impl BankDepositAction {
    pub fn new(x: i64, y: i64, world: Arc<WorldSnapshot>) -> Self {
        Self { x, y, world }
    }
}

#[async_trait]
impl Action for BankDepositAction {
    fn name(&self) -> String {
        format!("deposit_all_at_{}_{}", self.x, self.y)
    }

    fn cost(&self) -> u32 {
        1
    }

    fn preconditions(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::CooldownReady, true)
            .with(StateKey::CurrentX, self.x)
            .with(StateKey::CurrentY, self.y)
    }

    fn effects(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::InventorySpaceAvailable, true)
            .with(StateKey::InventoryCount, 0)
            .with(StateKey::HasCraftMaterials, false)
            .with(StateKey::HasWeapon, false)
            .with(StateKey::CooldownReady, true)
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
                "cannot deposit: not at the bank",
                vec![SubGoalRequest::new(
                    sub_goal::MOVE_TO_LOCATION,
                    6,
                    self.name(),
                    format!("bank is at ({}, {})", self.x, self.y),
                )
                .with_param("target_x", self.x)
                .with_param("target_y", self.y)],
            ));
        }

        match api.bank_deposit_all(character_id).await {
            Ok(outcome) => Ok(ActionResult::succeeded(
                "deposited inventory",
                observed_changes(&outcome, &self.world),
                outcome.cooldown_seconds,
            )),
            Err(ApiError::CooldownActive { remaining_seconds }) => {
                Ok(ActionResult::failed_with_sub_goals(
                    "deposit refused: cooldown active",
                    vec![cooldown_sub_goal(&self.name(), remaining_seconds)],
                ))
            }
            Err(err) if err.is_game_level() => {
                Ok(ActionResult::failed(format!("deposit failed: {}", err)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Emits one deposit action per bank tile.
pub struct BankDepositFactory;

impl ActionFactory for BankDepositFactory {
    fn action_type(&self) -> &'static str {
        "bank_deposit"
    }

    fn create_instances(
        &self,
        world: &Arc<WorldSnapshot>,
        _state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>> {
        let mut seen = std::collections::HashSet::new();
        let mut actions: Vec<Arc<dyn Action>> = Vec::new();
        for tile in world.tiles_with_content("bank") {
            let action = BankDepositAction::new(tile.x, tile.y, Arc::clone(world));
            if seen.insert(action.name()) {
                actions.push(Arc::new(action));
            }
        }
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{MapContent, MapTile};

    #[test]
    fn test_factory_emits_per_bank_tile() {
        let world = Arc::new(WorldSnapshot {
            maps: vec![
                MapTile {
                    x: 4,
                    y: 1,
                    content: Some(MapContent {
                        content_type: "bank".to_string(),
                        code: "bank".to_string(),
                    }),
                },
                MapTile {
                    x: 0,
                    y: 0,
                    content: None,
                },
            ],
            monsters: vec![],
            resources: vec![],
            items: vec![],
        });
        let actions = BankDepositFactory
            .create_instances(&world, &WorldState::new())
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name(), "deposit_all_at_4_1");
        assert_eq!(
            actions[0].effects().get_bool(StateKey::InventorySpaceAvailable),
            Some(true)
        );
    }
}
