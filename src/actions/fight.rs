//! Combat with a monster on a known tile.

use std::sync::Arc;

use async_trait::async_trait;

use super::{cooldown_sub_goal, observed_changes, sub_goal};
use crate::action::{Action, ActionResult, SubGoalRequest};
use crate::api::{ApiError, GameApi};
use crate::error::Result;
use crate::registry::ActionFactory;
use crate::state::{StateKey, WorldState};
use crate::world::WorldSnapshot;

/// Fights the monster at `(x, y)`.
///
/// The declared effect claims one level of combat progress from the level
/// the action was built for. That is a claim for the search, not a
/// guarantee; the observed deltas from the server always win.
///
/// This is the action most likely to discover unmet dependencies at
/// runtime (wrong tile, no weapon, low HP, full inventory), so its failure
/// paths emit the corresponding sub-goal requests.
#[derive(Clone)]
pub struct FightAction {
    monster_code: String,
    monster_level: i64,
    x: i64,
    y: i64,
    level_claim: i64,
    world: Arc<WorldSnapshot>,
}

impl FightAction {
    pub fn new(
        monster_code: impl Into<String>,
        monster_level: i64,
        x: i64,
        y: i64,
        level_claim: i64,
        world: Arc<WorldSnapshot>,
    ) -> Self {
        Self {
            monster_code: monster_code.into(),
            monster_level,
            x,
            y,
            level_claim,
            world,
        }
    }

    /// Dependency checks against the live snapshot, before any remote call.
    fn blocking_sub_goals(&self, state: &WorldState) -> Vec<SubGoalRequest> {
        let name = self.name();
        let mut requests = Vec::new();

        if state.get_bool(StateKey::CanFight) == Some(false) {
            requests.push(SubGoalRequest::new(
                sub_goal::RECOVER_HP,
                9,
                name.clone(),
                "HP too low to safely fight",
            ));
        }
        if state.get_bool(StateKey::WeaponEquipped) == Some(false) {
            requests.push(SubGoalRequest::new(
                sub_goal::EQUIP_WEAPON,
                7,
                name.clone(),
                "no weapon equipped",
            ));
        }
        if state.get_int(StateKey::CurrentX) != Some(self.x)
            || state.get_int(StateKey::CurrentY) != Some(self.y)
        {
            requests.push(
                SubGoalRequest::new(
                    sub_goal::MOVE_TO_LOCATION,
                    6,
                    name.clone(),
                    format!("not at the monster's tile ({}, {})", self.x, self.y),
                )
                .with_param("target_x", self.x)
                .with_param("target_y", self.y),
            );
        }
        if state.get_bool(StateKey::InventorySpaceAvailable) == Some(false) {
            requests.push(SubGoalRequest::new(
                sub_goal::FREE_INVENTORY_SPACE,
                5,
                name.clone(),
                "no room for fight loot",
            ));
        }
        requests
    }
}

#[async_trait]
impl Action for FightAction {
    fn name(&self) -> String {
        format!("fight_{}_at_{}_{}", self.monster_code, self.x, self.y)
    }

    fn cost(&self) -> u32 {
        self.monster_level.max(1) as u32
    }

    fn preconditions(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::CooldownReady, true)
            .with(StateKey::CanFight, true)
            .with(StateKey::WeaponEquipped, true)
            .with(StateKey::CurrentX, self.x)
            .with(StateKey::CurrentY, self.y)
    }

    fn effects(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::CharacterLevel, self.level_claim)
            .with(StateKey::CooldownReady, true)
    }

    async fn execute(
        &self,
        character_id: &str,
        state: &WorldState,
        api: &dyn GameApi,
    ) -> Result<ActionResult> {
        let blockers = self.blocking_sub_goals(state);
        if !blockers.is_empty() {
            return Ok(ActionResult::failed_with_sub_goals(
                format!("cannot fight {} yet: unmet dependencies", self.monster_code),
                blockers,
            ));
        }

        match api.fight(character_id).await {
            Ok(outcome) => Ok(ActionResult::succeeded(
                format!("fought {}", self.monster_code),
                observed_changes(&outcome, &self.world),
                outcome.cooldown_seconds,
            )),
            Err(ApiError::CooldownActive { remaining_seconds }) => {
                Ok(ActionResult::failed_with_sub_goals(
                    format!("fight {} refused: cooldown active", self.monster_code),
                    vec![cooldown_sub_goal(&self.name(), remaining_seconds)],
                ))
            }
            Err(ApiError::InventoryFull) => Ok(ActionResult::failed_with_sub_goals(
                format!("fight {} refused: inventory full", self.monster_code),
                vec![SubGoalRequest::new(
                    sub_goal::FREE_INVENTORY_SPACE,
                    5,
                    self.name(),
                    "no room for fight loot",
                )],
            )),
            Err(ApiError::NotFound(what)) => Ok(ActionResult::failed_with_sub_goals(
                format!("fight {} failed: {} not found here", self.monster_code, what),
                vec![SubGoalRequest::new(
                    sub_goal::MOVE_TO_LOCATION,
                    6,
                    self.name(),
                    "monster is not on the current tile",
                )
                .with_param("target_x", self.x)
                .with_param("target_y", self.y)],
            )),
            Err(err) if err.is_game_level() => Ok(ActionResult::failed(format!(
                "fight {} failed: {}",
                self.monster_code, err
            ))),
            Err(err) => Err(err.into()),
        }
    }
}

/// Emits one fight action per monster tile the character could plausibly
/// take on (monster level no more than two above the character's).
pub struct FightFactory;

impl ActionFactory for FightFactory {
    fn action_type(&self) -> &'static str {
        "fight"
    }

    fn create_instances(
        &self,
        world: &Arc<WorldSnapshot>,
        state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>> {
        let character_level = state.get_int(StateKey::CharacterLevel).unwrap_or(1);
        let level_claim = character_level + 1;

        let mut seen = std::collections::HashSet::new();
        let mut actions: Vec<Arc<dyn Action>> = Vec::new();
        for tile in world.tiles_with_content("monster") {
            let Some(content) = tile.content.as_ref() else {
                continue;
            };
            let Some(monster) = world.monster_by_code(&content.code) else {
                continue;
            };
            if monster.level > character_level + 2 {
                continue;
            }
            let action = FightAction::new(
                monster.code.clone(),
                monster.level,
                tile.x,
                tile.y,
                level_claim,
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
    use crate::actions::test_support::UnreachableApi;
    use crate::world::{MapContent, MapTile, Monster};

    fn world() -> Arc<WorldSnapshot> {
        Arc::new(WorldSnapshot {
            maps: vec![MapTile {
                x: 5,
                y: 5,
                content: Some(MapContent {
                    content_type: "monster".to_string(),
                    code: "goblin".to_string(),
                }),
            }],
            monsters: vec![Monster {
                code: "goblin".to_string(),
                name: "Goblin".to_string(),
                level: 4,
                hp: 60,
            }],
            resources: vec![],
            items: vec![],
        })
    }

    fn ready_state_at(x: i64, y: i64) -> WorldState {
        WorldState::new()
            .with(StateKey::CooldownReady, true)
            .with(StateKey::CanFight, true)
            .with(StateKey::WeaponEquipped, true)
            .with(StateKey::InventorySpaceAvailable, true)
            .with(StateKey::CurrentX, x)
            .with(StateKey::CurrentY, y)
    }

    #[test]
    fn test_preconditions_pin_the_monster_tile() {
        let action = FightAction::new("goblin", 4, 5, 5, 6, world());
        assert!(action.can_execute(&ready_state_at(5, 5)));
        assert!(!action.can_execute(&ready_state_at(4, 5)));
    }

    #[tokio::test]
    async fn test_out_of_position_emits_move_sub_goal_without_api_call() {
        let action = FightAction::new("goblin", 4, 5, 5, 6, world());
        let state = ready_state_at(0, 0);

        let result = action
            .execute("kiera", &state, &UnreachableApi)
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.sub_goal_requests.len(), 1);
        let request = &result.sub_goal_requests[0];
        assert_eq!(request.goal_type, sub_goal::MOVE_TO_LOCATION);
        assert_eq!(request.param_int("target_x"), Some(5));
        assert_eq!(request.param_int("target_y"), Some(5));
    }

    #[tokio::test]
    async fn test_low_hp_outranks_positioning() {
        let action = FightAction::new("goblin", 4, 5, 5, 6, world());
        let mut state = ready_state_at(0, 0);
        state.set(StateKey::CanFight, false);

        let result = action
            .execute("kiera", &state, &UnreachableApi)
            .await
            .unwrap();

        let priorities: Vec<_> = result
            .sub_goal_requests
            .iter()
            .map(|r| (r.goal_type.clone(), r.priority))
            .collect();
        assert!(priorities.contains(&(sub_goal::RECOVER_HP.to_string(), 9)));
        assert!(priorities.contains(&(sub_goal::MOVE_TO_LOCATION.to_string(), 6)));
    }

    #[test]
    fn test_factory_skips_out_of_reach_monsters() {
        let mut snapshot = (*world()).clone();
        snapshot.maps.push(MapTile {
            x: 9,
            y: 9,
            content: Some(MapContent {
                content_type: "monster".to_string(),
                code: "lich".to_string(),
            }),
        });
        snapshot.monsters.push(Monster {
            code: "lich".to_string(),
            name: "Lich".to_string(),
            level: 30,
            hp: 900,
        });
        let state = WorldState::new().with(StateKey::CharacterLevel, 5);

        let actions = FightFactory
            .create_instances(&Arc::new(snapshot), &state)
            .unwrap();

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name(), "fight_goblin_at_5_5");
    }
}
