//! The recursive action executor.
//!
//! Drives a plan against the live environment, one action at a time. When
//! an action discovers at runtime that an unmet dependency blocks it, the
//! failure carries sub-goal requests; the executor builds a goal for the
//! highest-priority request, plans for it, recursively executes that
//! sub-plan one depth level down against a freshly fetched state, re-checks
//! that the recursion did not contradict the parent's assumptions, and
//! then retries the original action.
//!
//! Two bounds keep this finite: `max_depth` (checked on entry to every
//! level, before any execution, so a runaway chain cannot begin an extra
//! level) and `max_attempts` per action. Within one character everything
//! here is strictly sequential — the only suspension points are the
//! actions' API calls and cooldown waits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::BoxFuture;

use crate::action::Action;
use crate::api::GameApi;
use crate::error::{AgentError, Result};
use crate::goal::{GoalFactoryContext, GoalManager};
use crate::planner::Plan;
use crate::registry::ActionRegistry;
use crate::sensor::world_state_from_character;
use crate::state::WorldState;
use crate::world::WorldSnapshot;

/// Aggregate result of one top-level `execute_plan_recursive` call.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    pub success: bool,
    /// Maximum recursion depth actually entered.
    pub depth_reached: usize,
    /// Actions executed, including all nested attempts.
    pub actions_executed: usize,
    pub execution_time: Duration,
    pub error_message: Option<String>,
}

impl ExecutionReport {
    fn succeeded(depth_reached: usize, actions_executed: usize, started: Instant) -> Self {
        Self {
            success: true,
            depth_reached,
            actions_executed,
            execution_time: started.elapsed(),
            error_message: None,
        }
    }

    fn failed(
        message: impl Into<String>,
        depth_reached: usize,
        actions_executed: usize,
        started: Instant,
    ) -> Self {
        Self {
            success: false,
            depth_reached,
            actions_executed,
            execution_time: started.elapsed(),
            error_message: Some(message.into()),
        }
    }
}

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Executes plans with bounded recursive sub-goal resolution.
pub struct RecursiveActionExecutor {
    api: Arc<dyn GameApi>,
    registry: Arc<ActionRegistry>,
    goal_manager: Arc<GoalManager>,
    world: Arc<WorldSnapshot>,
    max_depth: usize,
    max_attempts: usize,
}

impl RecursiveActionExecutor {
    pub fn new(
        api: Arc<dyn GameApi>,
        registry: Arc<ActionRegistry>,
        goal_manager: Arc<GoalManager>,
        world: Arc<WorldSnapshot>,
    ) -> Self {
        Self {
            api,
            registry,
            goal_manager,
            world,
            max_depth: DEFAULT_MAX_DEPTH,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Top-level convenience: executes at depth 0 and folds surfaced
    /// errors (max-depth and validation included) into a failed report, so
    /// orchestration loops always get a report to log.
    pub async fn run(
        &self,
        plan: &Plan,
        character_id: &str,
        state: WorldState,
    ) -> ExecutionReport {
        let started = Instant::now();
        match self
            .execute_plan_recursive(plan, character_id, state, 0)
            .await
        {
            Ok(report) => report,
            Err(err) => ExecutionReport::failed(err.to_string(), 0, 0, started),
        }
    }

    /// Executes `plan` at the given recursion depth.
    ///
    /// # Errors
    ///
    /// [`AgentError::MaxDepthExceeded`] when `depth >= max_depth`, checked
    /// before any action runs. Factory and transport errors also surface
    /// as `Err`; ordinary execution failure is an `Ok` report with
    /// `success = false`.
    pub fn execute_plan_recursive<'a>(
        &'a self,
        plan: &Plan,
        character_id: &'a str,
        state: WorldState,
        depth: usize,
    ) -> BoxFuture<'a, Result<ExecutionReport>> {
        self.execute_inner(plan.clone(), character_id.to_string(), state, depth, None)
    }

    fn execute_inner(
        &self,
        plan: Plan,
        character_id: String,
        state: WorldState,
        depth: usize,
        deadline: Option<Instant>,
    ) -> BoxFuture<'_, Result<ExecutionReport>> {
        Box::pin(async move {
            let started = Instant::now();
            if depth >= self.max_depth {
                return Err(AgentError::MaxDepthExceeded {
                    depth,
                    max_depth: self.max_depth,
                });
            }

            log::info!(
                "executor: running {} ({} actions) at depth {}",
                plan.id(),
                plan.len(),
                depth
            );

            let mut live_state = state;
            let mut depth_reached = depth;
            let mut actions_executed = 0usize;

            for action in plan.actions() {
                match self
                    .execute_one_action(
                        action,
                        &character_id,
                        &mut live_state,
                        depth,
                        deadline,
                        &mut depth_reached,
                        &mut actions_executed,
                    )
                    .await?
                {
                    ActionOutcomeKind::Completed => {}
                    ActionOutcomeKind::GaveUp(message) => {
                        return Ok(ExecutionReport::failed(
                            message,
                            depth_reached,
                            actions_executed,
                            started,
                        ));
                    }
                }
            }

            Ok(ExecutionReport::succeeded(
                depth_reached,
                actions_executed,
                started,
            ))
        })
    }

    /// Runs one action through the bounded attempt loop.
    #[allow(clippy::too_many_arguments)]
    async fn execute_one_action(
        &self,
        action: &Arc<dyn Action>,
        character_id: &str,
        live_state: &mut WorldState,
        depth: usize,
        deadline: Option<Instant>,
        depth_reached: &mut usize,
        actions_executed: &mut usize,
    ) -> Result<ActionOutcomeKind> {
        let mut last_failure = String::new();

        for attempt in 1..=self.max_attempts {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(ActionOutcomeKind::GaveUp(format!(
                        "goal timed out before attempt {} of {}",
                        attempt,
                        action.name()
                    )));
                }
            }

            if !action.can_execute(live_state) {
                // Advisory only: the symbolic snapshot may be stale, and
                // the action itself re-discovers blockers against the
                // live environment.
                log::debug!(
                    "executor: pre-flight check failed for {} (attempt {}), executing anyway",
                    action.name(),
                    attempt
                );
            }

            let result = action.execute(character_id, live_state, &*self.api).await?;
            *actions_executed += 1;

            if result.success {
                live_state.merge(&result.state_changes);
                log::info!("executor: {} succeeded: {}", action.name(), result.message);
                if result.cooldown_seconds > 0 {
                    log::debug!(
                        "executor: waiting out {}s cooldown after {}",
                        result.cooldown_seconds,
                        action.name()
                    );
                    tokio::time::sleep(Duration::from_secs(result.cooldown_seconds)).await;
                }
                return Ok(ActionOutcomeKind::Completed);
            }

            last_failure = result.message.clone();
            log::warn!(
                "executor: {} failed (attempt {}/{}): {}",
                action.name(),
                attempt,
                self.max_attempts,
                result.message
            );

            if result.sub_goal_requests.is_empty() {
                // Nothing to remedy; surface the original failure.
                return Ok(ActionOutcomeKind::GaveUp(result.message));
            }

            let resolved = self
                .resolve_sub_goals(
                    action,
                    &result.sub_goal_requests,
                    character_id,
                    depth,
                    deadline,
                    depth_reached,
                    actions_executed,
                )
                .await?;

            match resolved {
                Some(refreshed_state) => {
                    *live_state = refreshed_state;
                    // Fall through to retry the original action.
                }
                None => {
                    // Every request failed to produce progress; report the
                    // original action's failure, not the sub-goal noise.
                    return Ok(ActionOutcomeKind::GaveUp(result.message));
                }
            }
        }

        Ok(ActionOutcomeKind::GaveUp(format!(
            "{} failed after {} attempts: {}",
            action.name(),
            self.max_attempts,
            last_failure
        )))
    }

    /// Processes a failure's sub-goal requests in descending priority.
    ///
    /// Returns the refreshed, consistency-checked state after the first
    /// request whose sub-plan executes successfully, or `None` when every
    /// request fails to produce progress.
    #[allow(clippy::too_many_arguments)]
    async fn resolve_sub_goals(
        &self,
        action: &Arc<dyn Action>,
        requests: &[crate::action::SubGoalRequest],
        character_id: &str,
        depth: usize,
        deadline: Option<Instant>,
        depth_reached: &mut usize,
        actions_executed: &mut usize,
    ) -> Result<Option<WorldState>> {
        let mut ordered: Vec<_> = requests.iter().collect();
        // Stable sort: equal priorities keep emission order.
        ordered.sort_by_key(|r| std::cmp::Reverse(r.priority));

        for request in ordered {
            log::info!("executor: attempting sub-goal {}", request);

            // Never plan a sub-goal against the stale pre-failure
            // snapshot; the failed attempt may have moved the character.
            let before = self.refresh_state(character_id).await?;

            let context = GoalFactoryContext {
                character_state: before.clone(),
                game_data: Arc::clone(&self.world),
                parent_goal_type: Some(action.name()),
                recursion_depth: depth,
                max_depth: self.max_depth,
            };

            let goal = match self.goal_manager.create_goal_from_sub_request(request, &context) {
                Ok(goal) => goal,
                Err(err @ (AgentError::UnknownSubGoalType(_) | AgentError::NoValidGoal(_))) => {
                    log::warn!("executor: skipping sub-goal request: {}", err);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let universe = self
                .registry
                .generate_actions_for_state(&before, &self.world)?;

            let sub_plan =
                match self
                    .goal_manager
                    .plan_to_target_state(&before, goal.target_state(), &universe)
                {
                    Ok(plan) => plan,
                    Err(AgentError::NoValidGoal(message)) => {
                        log::warn!("executor: sub-goal '{}' unplannable: {}", goal.name(), message);
                        continue;
                    }
                    Err(err) => return Err(err),
                };

            let child_deadline = goal
                .timeout()
                .map(|t| Instant::now() + t)
                .or(deadline);

            let child = self
                .execute_inner(
                    sub_plan,
                    character_id.to_string(),
                    before.clone(),
                    depth + 1,
                    child_deadline,
                )
                .await?;

            *depth_reached = (*depth_reached).max(child.depth_reached);
            *actions_executed += child.actions_executed;

            if !child.success {
                log::warn!(
                    "executor: sub-goal '{}' failed at depth {}: {}",
                    goal.name(),
                    depth + 1,
                    child.error_message.as_deref().unwrap_or("unknown")
                );
                continue;
            }

            // The child's final state is fully applied before the parent
            // resumes; fetch it and make sure it did not regress anything
            // the parent depends on.
            let after = self.refresh_state(character_id).await?;
            match verify_state_consistency(&before, &after) {
                Ok(()) => return Ok(Some(after)),
                Err(err) => {
                    log::warn!(
                        "executor: sub-goal '{}' left inconsistent state: {}",
                        goal.name(),
                        err
                    );
                    continue;
                }
            }
        }

        Ok(None)
    }

    async fn refresh_state(&self, character_id: &str) -> Result<WorldState> {
        let character = self.api.fetch_character(character_id).await?;
        Ok(world_state_from_character(&character, &self.world))
    }
}

enum ActionOutcomeKind {
    Completed,
    GaveUp(String),
}

/// Checks that a sub-plan's resulting state does not contradict invariants
/// the parent plan depends on: character and skill levels never decrease.
///
/// A violation is reported, never panicked on; the caller converts it into
/// a failed attempt at its own depth.
pub fn verify_state_consistency(before: &WorldState, after: &WorldState) -> Result<()> {
    for (key, value) in before.iter() {
        if !key.is_progress_level() {
            continue;
        }
        let (Some(previous), Some(current)) = (value.as_int(), after.get_int(*key)) else {
            continue;
        };
        if current < previous {
            return Err(AgentError::StateConsistency(format!(
                "{} decreased from {} to {}",
                key, previous, current
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateKey;

    #[test]
    fn test_consistency_accepts_progress() {
        let before = WorldState::new()
            .with(StateKey::CharacterLevel, 5)
            .with(StateKey::MiningLevel, 3);
        let after = WorldState::new()
            .with(StateKey::CharacterLevel, 6)
            .with(StateKey::MiningLevel, 3);
        assert!(verify_state_consistency(&before, &after).is_ok());
    }

    #[test]
    fn test_consistency_rejects_level_regression() {
        let before = WorldState::new().with(StateKey::CharacterLevel, 5);
        let after = WorldState::new().with(StateKey::CharacterLevel, 4);
        let err = verify_state_consistency(&before, &after).unwrap_err();
        assert!(matches!(err, AgentError::StateConsistency(_)));
    }

    #[test]
    fn test_consistency_ignores_volatile_keys() {
        // Position and HP legitimately change during a sub-plan.
        let before = WorldState::new()
            .with(StateKey::CurrentX, 0)
            .with(StateKey::HpCurrent, 100);
        let after = WorldState::new()
            .with(StateKey::CurrentX, 5)
            .with(StateKey::HpCurrent, 60);
        assert!(verify_state_consistency(&before, &after).is_ok());
    }
}
