//! Best-first search over world states.
//!
//! A node is a [`WorldState`]; an edge exists where an action's
//! preconditions hold in the node and its declared effects produce the
//! child. Declared effects — never live results — drive the search, so
//! planning is pure and non-suspending.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use crate::action::Action;
use crate::error::{AgentError, Result};
use crate::state::WorldState;

/// Hard cap on expanded nodes. Exhausting it is reported as "no plan
/// found", never as a hang.
pub const DEFAULT_NODE_BUDGET: usize = 10_000;

/// Trait defining the interface for search algorithms used by the planner.
pub trait SearchAlgorithm: Send + Sync {
    /// Finds an ordered action sequence from `current_state` to a state
    /// satisfying `goal_state`, or fails with
    /// [`AgentError::NoPlanFound`].
    fn search(
        &self,
        actions: &[Arc<dyn Action>],
        current_state: &WorldState,
        goal_state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>>;
}

/// A heuristic estimate of remaining cost from a state to the goal.
pub trait HeuristicStrategy: Send + Sync {
    fn estimate(&self, state: &WorldState, goal: &WorldState) -> u32;
}

/// Counts the goal pairs not yet satisfied. The default.
pub struct UnsatisfiedGoalCount;

impl HeuristicStrategy for UnsatisfiedGoalCount {
    fn estimate(&self, state: &WorldState, goal: &WorldState) -> u32 {
        goal.iter()
            .filter(|(key, value)| state.get(key) != Some(value))
            .count() as u32
    }
}

/// No heuristic: degrades the search to uniform-cost order.
pub struct ZeroHeuristic;

impl HeuristicStrategy for ZeroHeuristic {
    fn estimate(&self, _state: &WorldState, _goal: &WorldState) -> u32 {
        0
    }
}

struct Node {
    state: WorldState,
    parent: Option<usize>,
    action: Option<Arc<dyn Action>>,
    g_cost: u32,
}

/// Open-set entry ordered by (f, insertion sequence): lower f first, and
/// among equal f the earliest-discovered node, which keeps planning
/// deterministic for identical inputs.
#[derive(PartialEq, Eq)]
struct OpenEntry {
    f_cost: u32,
    seq: u64,
    idx: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_cost
            .cmp(&other.f_cost)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* search with a pluggable heuristic and an explicit node budget.
pub struct AStarSearch {
    heuristic: Box<dyn HeuristicStrategy>,
    node_budget: usize,
}

impl AStarSearch {
    pub fn new(heuristic: Box<dyn HeuristicStrategy>) -> Self {
        Self {
            heuristic,
            node_budget: DEFAULT_NODE_BUDGET,
        }
    }

    pub fn with_default_heuristic() -> Self {
        Self::new(Box::new(UnsatisfiedGoalCount))
    }

    pub fn with_node_budget(mut self, node_budget: usize) -> Self {
        self.node_budget = node_budget;
        self
    }

    fn reconstruct_path(nodes: &[Node], mut idx: usize) -> Vec<Arc<dyn Action>> {
        let mut path = Vec::new();
        loop {
            let node = &nodes[idx];
            if let Some(action) = &node.action {
                path.push(Arc::clone(action));
            }
            match node.parent {
                Some(parent_idx) => idx = parent_idx,
                None => break,
            }
        }
        path.reverse();
        path
    }
}

impl Default for AStarSearch {
    fn default() -> Self {
        Self::with_default_heuristic()
    }
}

impl SearchAlgorithm for AStarSearch {
    fn search(
        &self,
        actions: &[Arc<dyn Action>],
        current_state: &WorldState,
        goal_state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>> {
        // Terminal success with zero cost; the distinguished empty plan.
        if current_state.satisfies(goal_state) {
            return Ok(Vec::new());
        }

        let mut nodes = vec![Node {
            state: current_state.clone(),
            parent: None,
            action: None,
            g_cost: 0,
        }];
        let mut open: BinaryHeap<Reverse<OpenEntry>> = BinaryHeap::new();
        // Best g seen per state; a state already reached at equal-or-lower
        // cost is never queued again, which bounds the search.
        let mut best_g: HashMap<WorldState, u32> = HashMap::new();
        let mut seq: u64 = 0;

        best_g.insert(current_state.clone(), 0);
        open.push(Reverse(OpenEntry {
            f_cost: self.heuristic.estimate(current_state, goal_state),
            seq,
            idx: 0,
        }));

        let mut expanded = 0usize;
        while let Some(Reverse(entry)) = open.pop() {
            let (node_state, node_g) = {
                let node = &nodes[entry.idx];
                (node.state.clone(), node.g_cost)
            };

            // A cheaper route to this state was queued after this entry.
            if best_g.get(&node_state).copied().unwrap_or(u32::MAX) < node_g {
                continue;
            }

            if node_state.satisfies(goal_state) {
                return Ok(Self::reconstruct_path(&nodes, entry.idx));
            }

            expanded += 1;
            if expanded > self.node_budget {
                log::warn!(
                    "search: node budget of {} exhausted, reporting no plan",
                    self.node_budget
                );
                return Err(AgentError::NoPlanFound);
            }

            // Cheaper actions first; stable sort keeps generation order as
            // the secondary key.
            let mut applicable: Vec<&Arc<dyn Action>> = actions
                .iter()
                .filter(|a| a.can_execute(&node_state))
                .collect();
            applicable.sort_by_key(|a| a.cost());

            for action in applicable {
                let child_state = node_state.apply(&action.effects());
                let child_g = node_g.saturating_add(action.cost());
                if best_g.get(&child_state).copied().unwrap_or(u32::MAX) <= child_g {
                    continue;
                }
                best_g.insert(child_state.clone(), child_g);
                let h = self.heuristic.estimate(&child_state, goal_state);
                nodes.push(Node {
                    state: child_state,
                    parent: Some(entry.idx),
                    action: Some(Arc::clone(action)),
                    g_cost: child_g,
                });
                seq += 1;
                open.push(Reverse(OpenEntry {
                    f_cost: child_g.saturating_add(h),
                    seq,
                    idx: nodes.len() - 1,
                }));
            }
        }

        Err(AgentError::NoPlanFound)
    }
}
