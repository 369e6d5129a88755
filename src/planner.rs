//! Plan production: turning (state, goal, action universe) into an ordered
//! action sequence.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::action::Action;
use crate::error::Result;
use crate::search::{AStarSearch, SearchAlgorithm};
use crate::state::WorldState;

/// An ordered, finite action sequence for one goal.
///
/// Immutable once produced and consumed strictly in order by the executor;
/// a blocked action triggers a nested goal→plan cycle, never a mutation of
/// this plan. The empty plan is a distinguished valid value meaning the
/// goal was already satisfied.
#[derive(Clone)]
pub struct Plan {
    id: String,
    actions: Vec<Arc<dyn Action>>,
    total_cost: u32,
}

impl Plan {
    /// Builds a plan from an ordered action sequence. The identifier is a
    /// stable hash of the action names, so identical plans from identical
    /// inputs carry identical ids.
    pub fn new(actions: Vec<Arc<dyn Action>>) -> Self {
        let mut hasher = DefaultHasher::new();
        for action in &actions {
            action.name().hash(&mut hasher);
        }
        let total_cost = actions.iter().map(|a| a.cost()).sum();
        Self {
            id: format!("plan-{:016x}", hasher.finish()),
            actions,
            total_cost,
        }
    }

    /// The empty "already satisfied" plan.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn actions(&self) -> &[Arc<dyn Action>] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn total_cost(&self) -> u32 {
        self.total_cost
    }

    /// Human-readable dump of the plan with each action's declared cost,
    /// preconditions and effects. Consumed by "show goal plan" tooling.
    pub fn describe(&self) -> String {
        if self.actions.is_empty() {
            return format!("{}: goal already satisfied (empty plan)", self.id);
        }
        let mut out = format!(
            "{}: {} action(s), total cost {}\n",
            self.id,
            self.actions.len(),
            self.total_cost
        );
        for (i, action) in self.actions.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, action.describe()));
        }
        out
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("id", &self.id)
            .field(
                "actions",
                &self.actions.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("total_cost", &self.total_cost)
            .finish()
    }
}

/// The GOAP planner: delegates to a search algorithm over the action
/// universe supplied per call (the universe is re-derived every planning
/// cycle, so the planner does not own it).
pub struct Planner {
    search_algorithm: Box<dyn SearchAlgorithm>,
}

impl Planner {
    /// Creates a planner with the default A* search.
    pub fn new() -> Self {
        Self {
            search_algorithm: Box::new(AStarSearch::default()),
        }
    }

    /// Creates a planner with a custom search algorithm.
    pub fn with_search_algorithm(search_algorithm: Box<dyn SearchAlgorithm>) -> Self {
        Self { search_algorithm }
    }

    /// Finds a plan from `current_state` to `goal_state`.
    ///
    /// Returns the empty plan when the goal is already satisfied and
    /// [`AgentError::NoPlanFound`](crate::AgentError::NoPlanFound) when the
    /// search space is exhausted.
    pub fn plan(
        &self,
        actions: &[Arc<dyn Action>],
        current_state: &WorldState,
        goal_state: &WorldState,
    ) -> Result<Plan> {
        let sequence = self
            .search_algorithm
            .search(actions, current_state, goal_state)?;
        let plan = Plan::new(sequence);
        log::debug!(
            "planner: produced {} ({} actions, cost {})",
            plan.id(),
            plan.len(),
            plan.total_cost()
        );
        Ok(plan)
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}
