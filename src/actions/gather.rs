//! Harvesting a resource node.

use std::sync::Arc;

use async_trait::async_trait;

use super::{cooldown_sub_goal, observed_changes, sub_goal};
use crate::action::{Action, ActionResult, SubGoalRequest};
use crate::api::{ApiError, GameApi};
use crate::error::Result;
use crate::registry::ActionFactory;
use crate::state::{StateKey, WorldState};
use crate::world::WorldSnapshot;

/// Gathers the resource at `(x, y)` with the matching gathering skill.
///
/// The declared effects claim one level of skill progress and gathered
/// craft materials; observed deltas win at execution time.
#[derive(Clone)]
pub struct GatherAction {
    resource_code: String,
    resource_level: i64,
    skill_key: StateKey,
    x: i64,
    y: i64,
    skill_claim: i64,
    world: Arc<WorldSnapshot>,
}

impl GatherAction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        resource_code: impl Into<String>,
        resource_level: i64,
        skill_key: StateKey,
        x: i64,
        y: i64,
        skill_claim: i64,
        world: Arc<WorldSnapshot>,
    ) -> Self {
        Self {
            resource_code: resource_code.into(),
            resource_level,
            skill_key,
            x,
            y,
            skill_claim,
            world,
        }
    }
}

#[async_trait]
impl Action for GatherAction {
    fn name(&self) -> String {
        format!("gather_{}_at_{}_{}", self.resource_code, self.x, self.y)
    }

    fn cost(&self) -> u32 {
        self.resource_level.max(1) as u32
    }

    fn preconditions(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::CooldownReady, true)
            .with(StateKey::CanGather, true)
            .with(StateKey::InventorySpaceAvailable, true)
            .with(StateKey::CurrentX, self.x)
            .with(StateKey::CurrentY, self.y)
    }

    fn effects(&self) -> WorldState {
        WorldState::new()
            .with(self.skill_key, self.skill_claim)
            .with(StateKey::HasCraftMaterials, true)
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
                format!("cannot gather {}: not at the node", self.resource_code),
                vec![SubGoalRequest::new(
                    sub_goal::MOVE_TO_LOCATION,
                    6,
                    self.name(),
                    format!("resource node is at ({}, {})", self.x, self.y),
                )
                .with_param("target_x", self.x)
                .with_param("target_y", self.y)],
            ));
        }
        if state.get_bool(StateKey::InventorySpaceAvailable) == Some(false) {
            return Ok(ActionResult::failed_with_sub_goals(
                format!("cannot gather {}: inventory full", self.resource_code),
                vec![SubGoalRequest::new(
                    sub_goal::FREE_INVENTORY_SPACE,
                    5,
                    self.name(),
                    "no room for gathered materials",
                )],
            ));
        }

        match api.gather(character_id).await {
            Ok(outcome) => Ok(ActionResult::succeeded(
                format!("gathered {}", self.resource_code),
                observed_changes(&outcome, &self.world),
                outcome.cooldown_seconds,
            )),
            Err(ApiError::CooldownActive { remaining_seconds }) => {
                Ok(ActionResult::failed_with_sub_goals(
                    format!("gather {} refused: cooldown active", self.resource_code),
                    vec![cooldown_sub_goal(&self.name(), remaining_seconds)],
                ))
            }
            Err(ApiError::InventoryFull) => Ok(ActionResult::failed_with_sub_goals(
                format!("gather {} refused: inventory full", self.resource_code),
                vec![SubGoalRequest::new(
                    sub_goal::FREE_INVENTORY_SPACE,
                    5,
                    self.name(),
                    "no room for gathered materials",
                )],
            )),
            Err(err) if err.is_game_level() => Ok(ActionResult::failed(format!(
                "gather {} failed: {}",
                self.resource_code, err
            ))),
            Err(err) => Err(err.into()),
        }
    }
}

/// Emits one gather action per resource tile whose skill requirement the
/// character meets.
pub struct GatherFactory;

impl ActionFactory for GatherFactory {
    fn action_type(&self) -> &'static str {
        "gather"
    }

    fn create_instances(
        &self,
        world: &Arc<WorldSnapshot>,
        state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>> {
        let mut seen = std::collections::HashSet::new();
        let mut actions: Vec<Arc<dyn Action>> = Vec::new();
        for tile in world.tiles_with_content("resource") {
            let Some(content) = tile.content.as_ref() else {
                continue;
            };
            let Some(resource) = world.resource_by_code(&content.code) else {
                continue;
            };
            let Some(skill_key) = StateKey::skill_level(&resource.skill) else {
                log::warn!(
                    "gather factory: resource {} has unknown skill '{}'",
                    resource.code,
                    resource.skill
                );
                continue;
            };
            let skill_level = state.get_int(skill_key).unwrap_or(1);
            if resource.level > skill_level {
                continue;
            }
            let action = GatherAction::new(
                resource.code.clone(),
                resource.level,
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
        Ok(actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{MapContent, MapTile, ResourceNode};

    fn world() -> Arc<WorldSnapshot> {
        Arc::new(WorldSnapshot {
            maps: vec![
                MapTile {
                    x: 1,
                    y: 7,
                    content: Some(MapContent {
                        content_type: "resource".to_string(),
                        code: "copper_rocks".to_string(),
                    }),
                },
                MapTile {
                    x: 3,
                    y: 7,
                    content: Some(MapContent {
                        content_type: "resource".to_string(),
                        code: "gold_rocks".to_string(),
                    }),
                },
            ],
            monsters: vec![],
            resources: vec![
                ResourceNode {
                    code: "copper_rocks".to_string(),
                    skill: "mining".to_string(),
                    level: 1,
                },
                ResourceNode {
                    code: "gold_rocks".to_string(),
                    skill: "mining".to_string(),
                    level: 30,
                },
            ],
            items: vec![],
        })
    }

    #[test]
    fn test_effects_claim_skill_progress() {
        let action = GatherAction::new("copper_rocks", 1, StateKey::MiningLevel, 1, 7, 4, world());
        let effects = action.effects();
        assert_eq!(effects.get_int(StateKey::MiningLevel), Some(4));
        assert_eq!(effects.get_bool(StateKey::HasCraftMaterials), Some(true));
    }

    #[test]
    fn test_factory_gates_on_skill_level() {
        let state = WorldState::new().with(StateKey::MiningLevel, 3);
        let actions = GatherFactory.create_instances(&world(), &state).unwrap();
        // gold_rocks needs mining 30
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name(), "gather_copper_rocks_at_1_7");
        assert_eq!(actions[0].cost(), 1);
    }

    #[tokio::test]
    async fn test_full_inventory_emits_free_space_sub_goal() {
        use crate::actions::test_support::UnreachableApi;

        let action = GatherAction::new("copper_rocks", 1, StateKey::MiningLevel, 1, 7, 4, world());
        let state = WorldState::new()
            .with(StateKey::CurrentX, 1)
            .with(StateKey::CurrentY, 7)
            .with(StateKey::InventorySpaceAvailable, false);

        let result = action
            .execute("kiera", &state, &UnreachableApi)
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(
            result.sub_goal_requests[0].goal_type,
            sub_goal::FREE_INVENTORY_SPACE
        );
    }
}
