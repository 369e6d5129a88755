//! An autonomous GOAP agent core for cooldown-gated MMO APIs.
//!
//! The crate turns a symbolic world-state snapshot and a declared goal into
//! an ordered action plan, executes that plan against a live, rate-limited
//! game API, and recursively resolves the sub-goals that failing actions
//! discover at runtime — bounded by an explicit recursion depth and with
//! state-consistency re-validation at every recursion boundary.

mod action;
mod actions;
mod agent;
mod api;
mod error;
mod executor;
mod goal;
mod planner;
mod registry;
mod search;
mod sensor;
mod state;
mod world;

pub use action::{Action, ActionResult, SubGoalRequest};
pub use actions::{
    sub_goal, BankDepositAction, BankDepositFactory, CraftAction, CraftFactory, EquipAction,
    EquipFactory, FightAction, FightFactory, GatherAction, GatherFactory, MoveAction, MoveFactory,
    RestAction, RestFactory, WaitForCooldownAction, WaitForCooldownFactory,
};
pub use agent::{GoalRunSummary, GoapAgent};
pub use api::{ActionOutcome, ApiError, GameApi};
pub use error::{AgentError, Result};
pub use executor::{
    verify_state_consistency, ExecutionReport, RecursiveActionExecutor, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DEPTH,
};
pub use goal::{Goal, GoalFactoryContext, GoalManager};
pub use planner::{Plan, Planner};
pub use registry::{ActionFactory, ActionRegistry};
pub use search::{
    AStarSearch, HeuristicStrategy, SearchAlgorithm, UnsatisfiedGoalCount, ZeroHeuristic,
    DEFAULT_NODE_BUDGET,
};
pub use sensor::{world_state_from_character, CharacterData, InventorySlot};
pub use state::{validate_state_dict, StateKey, StateValue, WorldState};
pub use world::{CraftRecipe, Item, MapContent, MapTile, Monster, ResourceNode, WorldSnapshot};
