//! The game API collaborator interface.
//!
//! This crate never speaks HTTP itself; a caller supplies an object
//! implementing [`GameApi`] (backed by the real transport and its rate
//! limiter) and the executor and concrete actions drive it. Ordinary
//! game-level failures surface as typed [`ApiError`] variants that actions
//! translate into failed results with sub-goal requests; only genuinely
//! exceptional transport conditions propagate out of `execute()`.

use async_trait::async_trait;
use thiserror::Error;

use crate::sensor::CharacterData;

/// Typed errors from the remote game API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The character's cooldown has not elapsed yet.
    #[error("Cooldown still active: {remaining_seconds}s remaining")]
    CooldownActive { remaining_seconds: u64 },

    /// The character's inventory has no free slot.
    #[error("Inventory is full")]
    InventoryFull,

    /// The addressed entity (character, monster, resource, workshop) does
    /// not exist at the expected location.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested game action is not allowed in the current character
    /// state (wrong location, missing equipment, insufficient skill).
    #[error("Action not allowed: {0}")]
    NotAllowed(String),

    /// The server is down for maintenance.
    #[error("Server maintenance in progress")]
    Maintenance,

    /// The transport layer failed (connection refused, timeout, rate-limit
    /// exhaustion).
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The server replied with a payload this client cannot interpret.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// True for conditions an action may remedy by satisfying a missing
    /// dependency and retrying; false for terminal transport failures.
    pub fn is_game_level(&self) -> bool {
        !matches!(
            self,
            ApiError::Transport(_) | ApiError::MalformedResponse(_) | ApiError::Maintenance
        )
    }
}

/// The outcome of one remote game action.
///
/// The returned character payload is authoritative: the executor derives the
/// observed state deltas from it, and it always wins over whatever the
/// symbolic snapshot predicted.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub character: CharacterData,
    pub cooldown_seconds: u64,
}

/// Per-action remote calls exposed by the game server.
///
/// One action is in flight per character at any time; the server enforces
/// this with cooldowns, and the executor waits them out between calls.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Fetches the live character state.
    async fn fetch_character(&self, character_id: &str) -> Result<CharacterData, ApiError>;

    /// Moves the character to the given map coordinates.
    async fn move_character(
        &self,
        character_id: &str,
        x: i64,
        y: i64,
    ) -> Result<ActionOutcome, ApiError>;

    /// Fights the monster on the character's current tile.
    async fn fight(&self, character_id: &str) -> Result<ActionOutcome, ApiError>;

    /// Harvests the resource on the character's current tile.
    async fn gather(&self, character_id: &str) -> Result<ActionOutcome, ApiError>;

    /// Rests until HP is restored.
    async fn rest(&self, character_id: &str) -> Result<ActionOutcome, ApiError>;

    /// Crafts an item at the workshop on the character's current tile.
    async fn craft(&self, character_id: &str, item_code: &str) -> Result<ActionOutcome, ApiError>;

    /// Equips an item from the character's inventory.
    async fn equip(&self, character_id: &str, item_code: &str) -> Result<ActionOutcome, ApiError>;

    /// Deposits the character's whole inventory at the bank on the current
    /// tile.
    async fn bank_deposit_all(&self, character_id: &str) -> Result<ActionOutcome, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_display() {
        let err = ApiError::CooldownActive {
            remaining_seconds: 12,
        };
        assert_eq!(format!("{}", err), "Cooldown still active: 12s remaining");
    }

    #[test]
    fn test_game_level_classification() {
        assert!(ApiError::InventoryFull.is_game_level());
        assert!(ApiError::CooldownActive {
            remaining_seconds: 1
        }
        .is_game_level());
        assert!(!ApiError::Transport("connection reset".to_string()).is_game_level());
        assert!(!ApiError::Maintenance.is_game_level());
    }
}
