//! The action contract: preconditions, effects, cost, and the execution
//! protocol every concrete action implements.
//!
//! An action is an immutable capability descriptor. Its `name` and `cost`
//! are pure functions of construction-time parameters (two moves to
//! different tiles are two differently named actions), its preconditions
//! and effects are partial [`WorldState`]s over the fixed vocabulary, and
//! `execute` is the single place where I/O happens.
//!
//! Failure semantics are the load-bearing part of the whole recursive
//! design: an action whose failure can be remedied by satisfying a missing
//! dependency must emit at least one [`SubGoalRequest`] instead of silently
//! failing, so the executor can resolve the dependency and retry.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::api::GameApi;
use crate::error::Result;
use crate::state::{StateValue, WorldState};

/// A declarative ask emitted by a failed action: resolve this dependency,
/// then retry me.
///
/// Requests are immutable and fully constructed at creation. The executor
/// processes a failure's requests in descending priority order and stops at
/// the first one whose resolution makes the retry succeed.
#[derive(Debug, Clone)]
pub struct SubGoalRequest {
    /// Key into the goal manager's sub-goal factory dispatch.
    pub goal_type: String,
    /// Goal-specific arguments, e.g. target coordinates.
    pub parameters: BTreeMap<String, StateValue>,
    /// Higher runs first.
    pub priority: i32,
    /// Originating action name, for diagnostics.
    pub requester: String,
    /// Human-readable justification.
    pub reason: String,
}

impl SubGoalRequest {
    pub fn new(
        goal_type: impl Into<String>,
        priority: i32,
        requester: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            goal_type: goal_type.into(),
            parameters: BTreeMap::new(),
            priority,
            requester: requester.into(),
            reason: reason.into(),
        }
    }

    /// Builder-style parameter attachment.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Integer parameter lookup.
    pub fn param_int(&self, name: &str) -> Option<i64> {
        self.parameters.get(name).and_then(StateValue::as_int)
    }

    /// String parameter lookup.
    pub fn param_text(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(StateValue::as_text)
    }
}

impl fmt::Display for SubGoalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (priority {}, from {}): {}",
            self.goal_type, self.priority, self.requester, self.reason
        )
    }
}

/// The result of executing one action against the live environment.
///
/// `state_changes` holds the *observed* deltas, which are authoritative and
/// may differ from the action's declared effects. `sub_goal_requests` is
/// non-empty only on failures that a resolved dependency could remedy.
#[derive(Debug, Clone)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
    pub state_changes: WorldState,
    pub cooldown_seconds: u64,
    pub sub_goal_requests: Vec<SubGoalRequest>,
}

impl ActionResult {
    /// A successful result carrying observed deltas and the server cooldown.
    pub fn succeeded(
        message: impl Into<String>,
        state_changes: WorldState,
        cooldown_seconds: u64,
    ) -> Self {
        Self {
            success: true,
            message: message.into(),
            state_changes,
            cooldown_seconds,
            sub_goal_requests: Vec::new(),
        }
    }

    /// A terminal failure with no remedy.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            state_changes: WorldState::new(),
            cooldown_seconds: 0,
            sub_goal_requests: Vec::new(),
        }
    }

    /// A failure the executor may remedy by resolving the given sub-goals
    /// and retrying.
    pub fn failed_with_sub_goals(
        message: impl Into<String>,
        sub_goal_requests: Vec<SubGoalRequest>,
    ) -> Self {
        Self {
            success: false,
            message: message.into(),
            state_changes: WorldState::new(),
            cooldown_seconds: 0,
            sub_goal_requests,
        }
    }
}

/// The capability contract every concrete action implements.
///
/// `name`, `cost`, `preconditions` and `effects` are pure: they depend only
/// on construction-time parameters, never on external mutable state, so the
/// same logical action produces the same descriptor across planning calls.
/// `execute` is the only operation allowed to perform I/O.
#[async_trait]
pub trait Action: Send + Sync {
    /// Deterministic, unique identifier for this concrete parameterization.
    fn name(&self) -> String;

    /// Planning cost, used for search optimization and tie-breaking.
    fn cost(&self) -> u32;

    /// Facts that must hold exactly for this action to be eligible.
    fn preconditions(&self) -> WorldState;

    /// State deltas this action claims to produce on success. These drive
    /// the search; execution may observe different deltas.
    fn effects(&self) -> WorldState;

    /// Pre-flight check: true iff every precondition pair is present in
    /// `state` with an exactly equal value. Advisory only; the live
    /// environment can still diverge from the symbolic snapshot.
    fn can_execute(&self, state: &WorldState) -> bool {
        state.satisfies(&self.preconditions())
    }

    /// Performs the action against the live environment.
    ///
    /// Ordinary game-level failures ("monster already dead", "cooldown
    /// still active", "inventory full") must return `success = false` with
    /// a descriptive message — and sub-goal requests where the failure is
    /// recoverable — never an `Err`. Only exceptional transport conditions
    /// propagate as errors.
    async fn execute(
        &self,
        character_id: &str,
        state: &WorldState,
        api: &dyn GameApi,
    ) -> Result<ActionResult>;

    /// One-line description for plan dumps.
    fn describe(&self) -> String {
        format!(
            "{} (cost {}): requires {}, yields {}",
            self.name(),
            self.cost(),
            self.preconditions(),
            self.effects()
        )
    }
}

impl fmt::Debug for dyn Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}
