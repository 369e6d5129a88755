//! Waiting out the server cooldown.
//!
//! The one action whose execution performs no API call: it simply sleeps
//! until the cooldown the server imposed has elapsed. The factory emits it
//! only while the state reports the cooldown as not ready, which is what
//! makes a `wait_for_cooldown` sub-goal plannable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::action::{Action, ActionResult};
use crate::api::GameApi;
use crate::error::Result;
use crate::registry::ActionFactory;
use crate::state::{StateKey, WorldState};
use crate::world::WorldSnapshot;

/// Upper bound on a single wait, in seconds. A cooldown beyond this points
/// at a clock problem rather than a real game cooldown.
const MAX_WAIT_SECONDS: u64 = 120;

/// Sleeps for the remaining cooldown.
#[derive(Clone)]
pub struct WaitForCooldownAction {
    seconds: u64,
}

impl WaitForCooldownAction {
    pub fn new(seconds: u64) -> Self {
        Self {
            seconds: seconds.min(MAX_WAIT_SECONDS),
        }
    }
}

#[async_trait]
impl Action for WaitForCooldownAction {
    fn name(&self) -> String {
        format!("wait_for_cooldown_{}s", self.seconds)
    }

    fn cost(&self) -> u32 {
        self.seconds as u32
    }

    fn preconditions(&self) -> WorldState {
        WorldState::new().with(StateKey::CooldownReady, false)
    }

    fn effects(&self) -> WorldState {
        WorldState::new()
            .with(StateKey::CooldownReady, true)
            .with(StateKey::CooldownSecondsRemaining, 0)
    }

    async fn execute(
        &self,
        _character_id: &str,
        _state: &WorldState,
        _api: &dyn GameApi,
    ) -> Result<ActionResult> {
        log::debug!("waiting {}s for cooldown", self.seconds);
        tokio::time::sleep(Duration::from_secs(self.seconds)).await;
        Ok(ActionResult::succeeded(
            format!("waited {}s for cooldown", self.seconds),
            WorldState::new()
                .with(StateKey::CooldownReady, true)
                .with(StateKey::CooldownSecondsRemaining, 0),
            0,
        ))
    }
}

/// Emits the wait action only while a cooldown is actually pending.
pub struct WaitForCooldownFactory;

impl ActionFactory for WaitForCooldownFactory {
    fn action_type(&self) -> &'static str {
        "wait_for_cooldown"
    }

    fn create_instances(
        &self,
        _world: &Arc<WorldSnapshot>,
        state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>> {
        if state.get_bool(StateKey::CooldownReady) != Some(false) {
            return Ok(Vec::new());
        }
        let seconds = state
            .get_int(StateKey::CooldownSecondsRemaining)
            .unwrap_or(1)
            .max(1) as u64;
        Ok(vec![Arc::new(WaitForCooldownAction::new(seconds))])
    }
}
