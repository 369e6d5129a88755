//! Movement to a specific map tile.

use std::sync::Arc;

use async_trait::async_trait;

use super::{cooldown_sub_goal, manhattan, observed_changes};
use crate::action::{Action, ActionResult};
use crate::api::{ApiError, GameApi};
use crate::error::Result;
use crate::registry::ActionFactory;
use crate::state::{StateKey, WorldState};
use crate::world::WorldSnapshot;

/// Moves the character to `(x, y)`.
///
/// Cost is the Manhattan distance from the position the action was built
/// for, so replanning from the same state always yields the same costs.
/// Effects include the location-context flags of the destination tile,
/// which are known at construction time from the world snapshot.
#[derive(Clone)]
pub struct MoveAction {
    x: i64,
    y: i64,
    from_x: i64,
    from_y: i64,
    world: Arc<WorldSnapshot>,
}

impl MoveAction {
    pub fn new(x: i64, y: i64, from_x: i64, from_y: i64, world: Arc<WorldSnapshot>) -> Self {
        Self {
            x,
            y,
            from_x,
            from_y,
            world,
        }
    }
}

#[async_trait]
impl Action for MoveAction {
    fn name(&self) -> String {
        format!("move_to_{}_{}", self.x, self.y)
    }

    fn cost(&self) -> u32 {
        manhattan(self.from_x, self.from_y, self.x, self.y)
    }

    fn preconditions(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::CooldownReady, true)
            .with(StateKey::CanMove, true)
    }

    fn effects(&self) -> WorldState {
        let content_type = self
            .world
            .tile_at(self.x, self.y)
            .and_then(|t| t.content.as_ref())
            .map(|c| c.content_type.as_str());
        WorldState::new()
            .with(StateKey::CurrentX, self.x)
            .with(StateKey::CurrentY, self.y)
            .with(StateKey::AtBank, content_type == Some("bank"))
            .with(StateKey::AtMonsterLocation, content_type == Some("monster"))
            .with(
                StateKey::AtResourceLocation,
                content_type == Some("resource"),
            )
            .with(
                StateKey::AtWorkshopLocation,
                content_type == Some("workshop"),
            )
            .with(
                StateKey::AtGrandExchange,
                content_type == Some("grand_exchange"),
            )
            .with(StateKey::AtSafeLocation, content_type != Some("monster"))
    }

    async fn execute(
        &self,
        character_id: &str,
        _state: &WorldState,
        api: &dyn GameApi,
    ) -> Result<ActionResult> {
        match api.move_character(character_id, self.x, self.y).await {
            Ok(outcome) => Ok(ActionResult::succeeded(
                format!("moved to ({}, {})", self.x, self.y),
                observed_changes(&outcome, &self.world),
                outcome.cooldown_seconds,
            )),
            Err(ApiError::CooldownActive { remaining_seconds }) => {
                Ok(ActionResult::failed_with_sub_goals(
                    format!("move to ({}, {}) refused: cooldown active", self.x, self.y),
                    vec![cooldown_sub_goal(&self.name(), remaining_seconds)],
                ))
            }
            Err(err) if err.is_game_level() => Ok(ActionResult::failed(format!(
                "move to ({}, {}) failed: {}",
                self.x, self.y, err
            ))),
            Err(err) => Err(err.into()),
        }
    }
}

/// Emits one move action per tile of interest: every tile that carries
/// content (monsters, resources, banks, workshops), excluding the tile the
/// character already stands on. Deduplicates by derived name.
pub struct MoveFactory;

impl ActionFactory for MoveFactory {
    fn action_type(&self) -> &'static str {
        "move"
    }

    fn create_instances(
        &self,
        world: &Arc<WorldSnapshot>,
        state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>> {
        let (Some(from_x), Some(from_y)) = (
            state.get_int(StateKey::CurrentX),
            state.get_int(StateKey::CurrentY),
        ) else {
            log::debug!("move factory: current position unknown, emitting nothing");
            return Ok(Vec::new());
        };

        let mut seen = std::collections::HashSet::new();
        let mut actions: Vec<Arc<dyn Action>> = Vec::new();
        for tile in &world.maps {
            if tile.content.is_none() {
                continue;
            }
            if tile.x == from_x && tile.y == from_y {
                continue;
            }
            let action = MoveAction::new(tile.x, tile.y, from_x, from_y, Arc::clone(world));
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

    fn world() -> Arc<WorldSnapshot> {
        Arc::new(WorldSnapshot {
            maps: vec![
                MapTile {
                    x: 0,
                    y: 0,
                    content: None,
                },
                MapTile {
                    x: 2,
                    y: 0,
                    content: Some(MapContent {
                        content_type: "monster".to_string(),
                        code: "goblin".to_string(),
                    }),
                },
                MapTile {
                    x: 0,
                    y: 3,
                    content: Some(MapContent {
                        content_type: "bank".to_string(),
                        code: "bank".to_string(),
                    }),
                },
            ],
            monsters: vec![],
            resources: vec![],
            items: vec![],
        })
    }

    #[test]
    fn test_name_is_deterministic_per_target() {
        let a = MoveAction::new(2, 0, 0, 0, world());
        let b = MoveAction::new(2, 0, 5, 5, world());
        assert_eq!(a.name(), "move_to_2_0");
        // Name depends on the target only; cost depends on the origin.
        assert_eq!(a.name(), b.name());
        assert_eq!(a.cost(), 2);
        assert_eq!(b.cost(), 8);
    }

    #[test]
    fn test_effects_carry_destination_context() {
        let to_monster = MoveAction::new(2, 0, 0, 0, world());
        let effects = to_monster.effects();
        assert_eq!(effects.get_int(StateKey::CurrentX), Some(2));
        assert_eq!(effects.get_bool(StateKey::AtMonsterLocation), Some(true));
        assert_eq!(effects.get_bool(StateKey::AtSafeLocation), Some(false));

        let to_bank = MoveAction::new(0, 3, 0, 0, world());
        assert_eq!(to_bank.effects().get_bool(StateKey::AtBank), Some(true));
        assert_eq!(
            to_bank.effects().get_bool(StateKey::AtSafeLocation),
            Some(true)
        );
    }

    #[test]
    fn test_factory_skips_current_tile_and_empty_tiles() {
        let state = WorldState::new()
            .with(StateKey::CurrentX, 2)
            .with(StateKey::CurrentY, 0);
        let actions = MoveFactory.create_instances(&world(), &state).unwrap();
        // (0,0) has no content, (2,0) is the current tile; only (0,3) remains
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].name(), "move_to_0_3");
    }

    #[test]
    fn test_factory_without_position_emits_nothing() {
        let actions = MoveFactory
            .create_instances(&world(), &WorldState::new())
            .unwrap();
        assert!(actions.is_empty());
    }
}
