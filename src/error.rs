use thiserror::Error;

use crate::api::ApiError;

/// Custom error types for the GOAP agent core.
///
/// The variants fall into three families that callers treat differently:
/// expected negative outcomes (`NoPlanFound`, `UnknownSubGoalType`,
/// `NoValidGoal`) that the executor recovers from locally, hard bounds
/// (`UnknownStateKey`, `MaxDepthExceeded`) that always surface to the
/// top-level caller, and defects (`Factory`) that must never be swallowed.
///
/// # Examples
///
/// ```
/// use goapbot::AgentError;
///
/// let err = AgentError::UnknownStateKey("hats_worn".to_string());
/// assert_eq!(format!("{}", err), "Unrecognized state key: hats_worn");
/// ```
#[derive(Error, Debug)]
pub enum AgentError {
    /// An externally supplied state dictionary contains a key outside the
    /// fixed vocabulary. Fatal to the call that supplied it.
    #[error("Unrecognized state key: {0}")]
    UnknownStateKey(String),

    /// A state dictionary value is not a boolean, integer, or string.
    #[error("Invalid value for state key {key}: {detail}")]
    InvalidStateValue { key: String, detail: String },

    /// The planner exhausted its search space (or node budget) before
    /// reaching the goal.
    #[error("No valid plan found to achieve the goal")]
    NoPlanFound,

    /// A sub-goal request named a goal type with no registered builder.
    /// Fatal to that request only; the executor tries the next one.
    #[error("Unknown sub-goal type: {0}")]
    UnknownSubGoalType(String),

    /// A goal could not be resolved or planned for at the goal-manager
    /// layer, where an unsolvable goal is always an error condition.
    #[error("No valid goal: {0}")]
    NoValidGoal(String),

    /// Recursion would exceed the configured bound. Checked before entering
    /// a new depth level, never after.
    #[error("Maximum recursion depth exceeded: depth {depth} >= max {max_depth}")]
    MaxDepthExceeded { depth: usize, max_depth: usize },

    /// A sub-plan's resulting state contradicts an invariant the parent
    /// plan depends on.
    #[error("State consistency violated: {0}")]
    StateConsistency(String),

    /// An action factory failed while generating the action universe.
    /// Deliberately never recovered: a silently missing action type makes
    /// solvable goals look impossible.
    #[error("Action factory '{factory}' failed: {message}")]
    Factory { factory: String, message: String },

    /// A wrapper around errors from the external game API collaborator.
    #[error("Game API error: {0}")]
    Api(#[from] ApiError),

    /// A wrapper around serde_json serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for GOAP agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
