//! The agent facade: the refresh → resolve → plan → execute cycle.
//!
//! `GoapAgent` wires the registry, goal manager, planner and executor
//! together for callers (CLI, orchestration loops). One agent drives one
//! character; its control loop is strictly sequential. Several agents for
//! several characters can run concurrently and safely share the registry,
//! goal manager and world snapshot, which are never mutated after startup.

use std::sync::Arc;

use crate::action::Action;
use crate::api::GameApi;
use crate::error::Result;
use crate::executor::{ExecutionReport, RecursiveActionExecutor};
use crate::goal::GoalManager;
use crate::planner::{Plan, Planner};
use crate::registry::ActionRegistry;
use crate::sensor::world_state_from_character;
use crate::state::WorldState;
use crate::world::WorldSnapshot;

const DEFAULT_MAX_CYCLES: usize = 50;

/// Summary of one `achieve_goal` run across planning cycles.
#[derive(Debug, Clone)]
pub struct GoalRunSummary {
    pub success: bool,
    /// Planning cycles performed (each cycle is refresh, plan, execute).
    pub cycles: usize,
    /// Actions executed across every cycle, nested attempts included.
    pub actions_executed: usize,
    pub error_message: Option<String>,
}

/// Ties the planning/execution core together for one character.
pub struct GoapAgent {
    api: Arc<dyn GameApi>,
    registry: Arc<ActionRegistry>,
    goal_manager: Arc<GoalManager>,
    planner: Planner,
    executor: RecursiveActionExecutor,
    world: Arc<WorldSnapshot>,
    max_cycles: usize,
}

impl GoapAgent {
    /// Builds an agent with the default factories, planner and bounds.
    pub fn new(api: Arc<dyn GameApi>, world: Arc<WorldSnapshot>) -> Self {
        let registry = Arc::new(ActionRegistry::with_default_factories());
        let goal_manager = Arc::new(GoalManager::new());
        let executor = RecursiveActionExecutor::new(
            Arc::clone(&api),
            Arc::clone(&registry),
            Arc::clone(&goal_manager),
            Arc::clone(&world),
        );
        Self {
            api,
            registry,
            goal_manager,
            planner: Planner::new(),
            executor,
            world,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }

    /// Replaces the registry (and the executor's view of it).
    pub fn with_registry(mut self, registry: Arc<ActionRegistry>) -> Self {
        self.executor = RecursiveActionExecutor::new(
            Arc::clone(&self.api),
            Arc::clone(&registry),
            Arc::clone(&self.goal_manager),
            Arc::clone(&self.world),
        );
        self.registry = registry;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.executor = self.executor.with_max_depth(max_depth);
        self
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn executor(&self) -> &RecursiveActionExecutor {
        &self.executor
    }

    /// Resolves a goal string and plans for it from the given state.
    pub fn plan(&self, goal_text: &str, current_state: &WorldState) -> Result<Plan> {
        let goal = self.goal_manager.resolve_goal(goal_text, current_state)?;
        let actions = self
            .registry
            .generate_actions_for_state(current_state, &self.world)?;
        self.planner
            .plan(&actions, current_state, goal.target_state())
    }

    /// Diagnostic: the full action universe for a state.
    pub fn action_universe(&self, state: &WorldState) -> Result<Vec<Arc<dyn Action>>> {
        self.registry.generate_actions_for_state(state, &self.world)
    }

    /// Diagnostic: a human-readable plan dump for a goal.
    pub fn describe_plan(&self, goal_text: &str, state: &WorldState) -> Result<String> {
        Ok(self.plan(goal_text, state)?.describe())
    }

    /// Executes one already produced plan from the given state snapshot.
    pub async fn execute_plan(
        &self,
        plan: &Plan,
        character_id: &str,
        state: WorldState,
    ) -> ExecutionReport {
        self.executor.run(plan, character_id, state).await
    }

    /// Drives the full planning cycle until the declared goal holds.
    ///
    /// Each cycle refreshes the symbolic state from the live character,
    /// re-resolves the goal (level goals advance one increment per cycle),
    /// plans, and executes. Stops on goal satisfaction, a failed cycle, or
    /// the cycle bound.
    pub async fn achieve_goal(&self, goal_text: &str, character_id: &str) -> Result<GoalRunSummary> {
        let mut actions_executed = 0usize;

        for cycle in 1..=self.max_cycles {
            let character = self.api.fetch_character(character_id).await?;
            let state = world_state_from_character(&character, &self.world);

            let goal = self.goal_manager.resolve_goal(goal_text, &state)?;
            if goal.is_satisfied_by(&state) {
                log::info!(
                    "agent: goal '{}' satisfied after {} cycle(s)",
                    goal_text,
                    cycle - 1
                );
                return Ok(GoalRunSummary {
                    success: true,
                    cycles: cycle - 1,
                    actions_executed,
                    error_message: None,
                });
            }

            let actions = self.registry.generate_actions_for_state(&state, &self.world)?;
            let plan = self
                .planner
                .plan(&actions, &state, goal.target_state())?;
            log::info!(
                "agent: cycle {} for '{}': {} ({} actions)",
                cycle,
                goal_text,
                plan.id(),
                plan.len()
            );

            let report = self.executor.run(&plan, character_id, state).await;
            actions_executed += report.actions_executed;
            if !report.success {
                return Ok(GoalRunSummary {
                    success: false,
                    cycles: cycle,
                    actions_executed,
                    error_message: report.error_message,
                });
            }
        }

        Ok(GoalRunSummary {
            success: false,
            cycles: self.max_cycles,
            actions_executed,
            error_message: Some(format!(
                "goal '{}' not reached within {} planning cycles",
                goal_text, self.max_cycles
            )),
        })
    }
}
