//! Resting to recover HP.

use std::sync::Arc;

use async_trait::async_trait;

use super::{cooldown_sub_goal, observed_changes};
use crate::action::{Action, ActionResult};
use crate::api::{ApiError, GameApi};
use crate::error::Result;
use crate::registry::ActionFactory;
use crate::state::{StateKey, WorldState};
use crate::world::WorldSnapshot;

/// Rests until HP is fully restored. Position-independent.
#[derive(Clone)]
pub struct RestAction {
    world: Arc<WorldSnapshot>,
}

impl RestAction {
    pub fn new(world: Arc<WorldSnapshot>) -> Self {
        Self { world }
    }
}

#[async_trait]
impl Action for RestAction {
    fn name(&self) -> String {
        "rest".to_string()
    }

    fn cost(&self) -> u32 {
        2
    }

    fn preconditions(&self) -> WorldState {
        WorldState::new().with(StateKey::CooldownReady, true)
    }

    fn effects(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::HpFull, true)
            .with(StateKey::CanFight, true)
            .with(StateKey::CooldownReady, true)
    }

    async fn execute(
        &self,
        character_id: &str,
        _state: &WorldState,
        api: &dyn GameApi,
    ) -> Result<ActionResult> {
        match api.rest(character_id).await {
            Ok(outcome) => Ok(ActionResult::succeeded(
                "rested to full HP",
                observed_changes(&outcome, &self.world),
                outcome.cooldown_seconds,
            )),
            Err(ApiError::CooldownActive { remaining_seconds }) => {
                Ok(ActionResult::failed_with_sub_goals(
                    "rest refused: cooldown active",
                    vec![cooldown_sub_goal(&self.name(), remaining_seconds)],
                ))
            }
            Err(err) if err.is_game_level() => {
                Ok(ActionResult::failed(format!("rest failed: {}", err)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Emits the single rest action; nothing to parameterize.
pub struct RestFactory;

impl ActionFactory for RestFactory {
    fn action_type(&self) -> &'static str {
        "rest"
    }

    fn create_instances(
        &self,
        world: &Arc<WorldSnapshot>,
        _state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>> {
        Ok(vec![Arc::new(RestAction::new(Arc::clone(world)))])
    }
}
