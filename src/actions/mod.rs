//! Concrete, parameterized game actions and their factories.
//!
//! Each submodule defines one action kind together with the factory that
//! enumerates its concrete instances for a given state and world snapshot.
//! Factories are registered on an [`ActionRegistry`](crate::ActionRegistry)
//! at startup; nothing here is global.

mod bank;
mod craft;
mod equip;
mod fight;
mod gather;
mod move_to;
mod rest;
mod wait;

pub use bank::{BankDepositAction, BankDepositFactory};
pub use craft::{CraftAction, CraftFactory};
pub use equip::{EquipAction, EquipFactory};
pub use fight::{FightAction, FightFactory};
pub use gather::{GatherAction, GatherFactory};
pub use move_to::{MoveAction, MoveFactory};
pub use rest::{RestAction, RestFactory};
pub use wait::{WaitForCooldownAction, WaitForCooldownFactory};

use crate::action::SubGoalRequest;
use crate::api::ActionOutcome;
use crate::sensor::world_state_from_character;
use crate::state::WorldState;
use crate::world::WorldSnapshot;

/// Sub-goal type identifiers shared between actions (which emit them) and
/// the goal manager (which dispatches on them).
pub mod sub_goal {
    pub const MOVE_TO_LOCATION: &str = "move_to_location";
    pub const RECOVER_HP: &str = "recover_hp";
    pub const EQUIP_WEAPON: &str = "equip_weapon";
    pub const FREE_INVENTORY_SPACE: &str = "free_inventory_space";
    pub const WAIT_FOR_COOLDOWN: &str = "wait_for_cooldown";
}

/// Manhattan distance between two tiles, the movement cost metric.
pub(crate) fn manhattan(ax: i64, ay: i64, bx: i64, by: i64) -> u32 {
    ((ax - bx).unsigned_abs() + (ay - by).unsigned_abs()) as u32
}

/// Observed deltas for a successful outcome: the full re-derived snapshot,
/// since the returned character payload is authoritative.
pub(crate) fn observed_changes(outcome: &ActionOutcome, world: &WorldSnapshot) -> WorldState {
    world_state_from_character(&outcome.character, world)
}

/// The uniform remedy for a cooldown-gated refusal: wait it out, then retry.
pub(crate) fn cooldown_sub_goal(requester: &str, remaining_seconds: u64) -> SubGoalRequest {
    SubGoalRequest::new(
        sub_goal::WAIT_FOR_COOLDOWN,
        8,
        requester,
        format!("cooldown active for another {}s", remaining_seconds),
    )
    .with_param("seconds", remaining_seconds as i64)
}
