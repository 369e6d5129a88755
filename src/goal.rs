//! Goals and the goal manager.
//!
//! A [`Goal`] is a declared objective reduced to a concrete target state
//! the planner can search toward. Goals are created fresh per planning
//! attempt — top-level or recursive — and discarded once their plan is
//! produced; they hold no execution-time mutable state.
//!
//! The [`GoalManager`] resolves top-level goal strings through a template
//! table, then light keyword parsing, then a literal-state-key fallback;
//! and it is the recursive entry point that turns a failing action's
//! [`SubGoalRequest`] into a new [`Goal`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::action::{Action, SubGoalRequest};
use crate::actions::sub_goal;
use crate::error::{AgentError, Result};
use crate::planner::{Plan, Planner};
use crate::state::{StateKey, WorldState};
use crate::world::WorldSnapshot;

/// A declared objective with its concrete target state.
#[derive(Debug, Clone)]
pub struct Goal {
    name: String,
    target_state: WorldState,
    priority: i32,
    timeout: Option<Duration>,
}

impl Goal {
    pub fn new(name: impl Into<String>, target_state: WorldState, priority: i32) -> Self {
        Self {
            name: name.into(),
            target_state,
            priority,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The partial world state the planner searches toward.
    pub fn target_state(&self) -> &WorldState {
        &self.target_state
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// True when every target pair already holds in `state`.
    pub fn is_satisfied_by(&self, state: &WorldState) -> bool {
        state.satisfies(&self.target_state)
    }
}

/// Everything a sub-goal factory needs to build a goal at a given
/// recursion level.
#[derive(Clone)]
pub struct GoalFactoryContext {
    /// Fresh symbolic snapshot, refreshed from the live environment.
    pub character_state: WorldState,
    /// World data for factories that need map context.
    pub game_data: Arc<WorldSnapshot>,
    /// Goal type of the parent attempt, for diagnostics.
    pub parent_goal_type: Option<String>,
    pub recursion_depth: usize,
    pub max_depth: usize,
}

type TargetBuilder = fn(&WorldState) -> WorldState;

/// Maps declared goals to target states, and sub-goal requests to goals.
pub struct GoalManager {
    goal_templates: HashMap<&'static str, TargetBuilder>,
    planner: Planner,
}

impl GoalManager {
    pub fn new() -> Self {
        let mut goal_templates: HashMap<&'static str, TargetBuilder> = HashMap::new();
        goal_templates.insert("equip_weapon", |_| {
            WorldState::new().with(StateKey::WeaponEquipped, true)
        });
        goal_templates.insert("full_hp", |_| WorldState::new().with(StateKey::HpFull, true));
        goal_templates.insert("deposit_items", |_| {
            WorldState::new().with(StateKey::InventorySpaceAvailable, true)
        });
        Self {
            goal_templates,
            planner: Planner::new(),
        }
    }

    /// Resolves a declared goal string against the current state.
    ///
    /// Resolution order: the static template table, then keyword parsing
    /// for level/skill goals, then treating the string as a literal
    /// boolean state key. Anything else is a [`AgentError::NoValidGoal`].
    ///
    /// Level and skill targets are clamped to the next increment: leveling
    /// is inherently incremental, so each planning cycle aims one level
    /// ahead and the caller re-resolves until the declared level holds.
    pub fn resolve_goal(&self, text: &str, current_state: &WorldState) -> Result<Goal> {
        if let Some(builder) = self.goal_templates.get(text) {
            return Ok(Goal::new(text, builder(current_state), 0));
        }

        if let Some(requested) = text.strip_prefix("reach_level_") {
            let requested: i64 = requested
                .parse()
                .map_err(|_| AgentError::NoValidGoal(format!("bad level in '{}'", text)))?;
            let current = current_state.get_int(StateKey::CharacterLevel).unwrap_or(1);
            let target = requested.min(current + 1).max(current);
            return Ok(Goal::new(
                text,
                WorldState::new().with(StateKey::CharacterLevel, target),
                0,
            ));
        }

        if let Some(rest) = text.strip_prefix("reach_") {
            if let Some((skill, level)) = rest.rsplit_once('_') {
                if let (Some(skill_key), Ok(requested)) =
                    (StateKey::skill_level(skill), level.parse::<i64>())
                {
                    let current = current_state.get_int(skill_key).unwrap_or(1);
                    let target = requested.min(current + 1).max(current);
                    return Ok(Goal::new(
                        text,
                        WorldState::new().with(skill_key, target),
                        0,
                    ));
                }
            }
        }

        // Last resort: a literal boolean state key, asked to become true.
        match text.parse::<StateKey>() {
            Ok(key) => Ok(Goal::new(text, WorldState::new().with(key, true), 0)),
            Err(_) => Err(AgentError::NoValidGoal(format!(
                "cannot interpret goal '{}'",
                text
            ))),
        }
    }

    /// The recursive entry point: builds a goal from a failing action's
    /// sub-goal request.
    ///
    /// # Errors
    ///
    /// [`AgentError::UnknownSubGoalType`] when no builder matches the
    /// request's `goal_type`; [`AgentError::NoValidGoal`] when required
    /// parameters are missing.
    pub fn create_goal_from_sub_request(
        &self,
        request: &SubGoalRequest,
        context: &GoalFactoryContext,
    ) -> Result<Goal> {
        log::debug!(
            "goal manager: building sub-goal '{}' for {} at depth {}/{} (parent: {:?})",
            request.goal_type,
            request.requester,
            context.recursion_depth,
            context.max_depth,
            context.parent_goal_type,
        );

        let target_state = match request.goal_type.as_str() {
            sub_goal::MOVE_TO_LOCATION => {
                let (Some(x), Some(y)) =
                    (request.param_int("target_x"), request.param_int("target_y"))
                else {
                    return Err(AgentError::NoValidGoal(format!(
                        "move_to_location from {} lacks target coordinates",
                        request.requester
                    )));
                };
                WorldState::new()
                    .with(StateKey::CurrentX, x)
                    .with(StateKey::CurrentY, y)
            }
            sub_goal::RECOVER_HP => WorldState::new().with(StateKey::HpFull, true),
            sub_goal::EQUIP_WEAPON => WorldState::new().with(StateKey::WeaponEquipped, true),
            sub_goal::FREE_INVENTORY_SPACE => {
                WorldState::new().with(StateKey::InventorySpaceAvailable, true)
            }
            sub_goal::WAIT_FOR_COOLDOWN => WorldState::new().with(StateKey::CooldownReady, true),
            other => return Err(AgentError::UnknownSubGoalType(other.to_string())),
        };

        Ok(Goal::new(
            request.goal_type.clone(),
            target_state,
            request.priority,
        ))
    }

    /// Plans toward a target state.
    ///
    /// At this layer an unsolvable goal is always an error the executor
    /// must handle explicitly, so "no plan found" surfaces as
    /// [`AgentError::NoValidGoal`] rather than a bare planner failure.
    pub fn plan_to_target_state(
        &self,
        current_state: &WorldState,
        target_state: &WorldState,
        available_actions: &[Arc<dyn Action>],
    ) -> Result<Plan> {
        match self.planner.plan(available_actions, current_state, target_state) {
            Ok(plan) => Ok(plan),
            Err(AgentError::NoPlanFound) => Err(AgentError::NoValidGoal(format!(
                "no plan reaches target {}",
                target_state
            ))),
            Err(err) => Err(err),
        }
    }
}

impl Default for GoalManager {
    fn default() -> Self {
        Self::new()
    }
}
