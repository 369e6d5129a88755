//! Symbolic world-state model for the GOAP agent.
//!
//! Everything the planner can reason about is expressed through this module:
//! a closed, compile-time vocabulary of [`StateKey`]s, a typed [`StateValue`]
//! for each, and the [`WorldState`] mapping between them.
//!
//! A key that is absent from a [`WorldState`] means *unknown*, which is a
//! distinct case from an explicit `false` or `0` — consumers must not
//! conflate the two.
//!
//! Externally sourced state dictionaries (built from a live character
//! snapshot) enter the planner exclusively through [`validate_state_dict`],
//! which rejects any key outside the vocabulary.
//!
//! # Example
//!
//! ```
//! use goapbot::{StateKey, WorldState};
//!
//! let mut current = WorldState::new();
//! current.set(StateKey::CharacterLevel, 5);
//! current.set(StateKey::WeaponEquipped, true);
//!
//! let mut goal = WorldState::new();
//! goal.set(StateKey::WeaponEquipped, true);
//!
//! assert!(current.satisfies(&goal));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde_json::Value;

use crate::error::{AgentError, Result};

/// The closed vocabulary of facts the planner can reason about.
///
/// Keys are stable identifiers fixed at compile time; preconditions and
/// effects can therefore never reference a fact the rest of the system does
/// not know. The `snake_case` spelling returned by [`StateKey::as_str`] is
/// the wire form used by raw state dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKey {
    // Character progression
    CharacterLevel,
    CharacterXp,
    GoldAmount,

    // Health and readiness
    HpCurrent,
    HpMax,
    HpFull,
    CanFight,
    CanMove,
    CanGather,
    CanCraft,

    // Position
    CurrentX,
    CurrentY,

    // Cooldown
    CooldownReady,
    CooldownSecondsRemaining,

    // Skills
    MiningLevel,
    WoodcuttingLevel,
    FishingLevel,
    WeaponcraftingLevel,
    GearcraftingLevel,
    JewelrycraftingLevel,
    CookingLevel,
    AlchemyLevel,

    // Inventory
    InventorySpaceAvailable,
    InventoryCount,
    InventoryMaxItems,
    HasCraftMaterials,
    HasWeapon,
    BestWeaponAvailable,

    // Equipment
    WeaponEquipped,
    EquippedWeapon,
    ToolEquipped,
    EquippedTool,

    // Location context
    AtBank,
    AtMonsterLocation,
    AtResourceLocation,
    AtWorkshopLocation,
    AtGrandExchange,
    AtSafeLocation,
}

impl StateKey {
    /// Returns the stable `snake_case` identifier for this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::CharacterLevel => "character_level",
            StateKey::CharacterXp => "character_xp",
            StateKey::GoldAmount => "gold_amount",
            StateKey::HpCurrent => "hp_current",
            StateKey::HpMax => "hp_max",
            StateKey::HpFull => "hp_full",
            StateKey::CanFight => "can_fight",
            StateKey::CanMove => "can_move",
            StateKey::CanGather => "can_gather",
            StateKey::CanCraft => "can_craft",
            StateKey::CurrentX => "current_x",
            StateKey::CurrentY => "current_y",
            StateKey::CooldownReady => "cooldown_ready",
            StateKey::CooldownSecondsRemaining => "cooldown_seconds_remaining",
            StateKey::MiningLevel => "mining_level",
            StateKey::WoodcuttingLevel => "woodcutting_level",
            StateKey::FishingLevel => "fishing_level",
            StateKey::WeaponcraftingLevel => "weaponcrafting_level",
            StateKey::GearcraftingLevel => "gearcrafting_level",
            StateKey::JewelrycraftingLevel => "jewelrycrafting_level",
            StateKey::CookingLevel => "cooking_level",
            StateKey::AlchemyLevel => "alchemy_level",
            StateKey::InventorySpaceAvailable => "inventory_space_available",
            StateKey::InventoryCount => "inventory_count",
            StateKey::InventoryMaxItems => "inventory_max_items",
            StateKey::HasCraftMaterials => "has_craft_materials",
            StateKey::HasWeapon => "has_weapon",
            StateKey::BestWeaponAvailable => "best_weapon_available",
            StateKey::WeaponEquipped => "weapon_equipped",
            StateKey::EquippedWeapon => "equipped_weapon",
            StateKey::ToolEquipped => "tool_equipped",
            StateKey::EquippedTool => "equipped_tool",
            StateKey::AtBank => "at_bank",
            StateKey::AtMonsterLocation => "at_monster_location",
            StateKey::AtResourceLocation => "at_resource_location",
            StateKey::AtWorkshopLocation => "at_workshop_location",
            StateKey::AtGrandExchange => "at_grand_exchange",
            StateKey::AtSafeLocation => "at_safe_location",
        }
    }

    /// True for the monotonic progression keys (character level, skill
    /// levels) that no legitimate action sequence ever decreases.
    pub fn is_progress_level(&self) -> bool {
        matches!(
            self,
            StateKey::CharacterLevel
                | StateKey::MiningLevel
                | StateKey::WoodcuttingLevel
                | StateKey::FishingLevel
                | StateKey::WeaponcraftingLevel
                | StateKey::GearcraftingLevel
                | StateKey::JewelrycraftingLevel
                | StateKey::CookingLevel
                | StateKey::AlchemyLevel
        )
    }

    /// Returns the skill-level key for a skill name, if the skill exists.
    pub fn skill_level(skill: &str) -> Option<StateKey> {
        match skill {
            "mining" => Some(StateKey::MiningLevel),
            "woodcutting" => Some(StateKey::WoodcuttingLevel),
            "fishing" => Some(StateKey::FishingLevel),
            "weaponcrafting" => Some(StateKey::WeaponcraftingLevel),
            "gearcrafting" => Some(StateKey::GearcraftingLevel),
            "jewelrycrafting" => Some(StateKey::JewelrycraftingLevel),
            "cooking" => Some(StateKey::CookingLevel),
            "alchemy" => Some(StateKey::AlchemyLevel),
            _ => None,
        }
    }
}

impl FromStr for StateKey {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        let key = match s {
            "character_level" => StateKey::CharacterLevel,
            "character_xp" => StateKey::CharacterXp,
            "gold_amount" => StateKey::GoldAmount,
            "hp_current" => StateKey::HpCurrent,
            "hp_max" => StateKey::HpMax,
            "hp_full" => StateKey::HpFull,
            "can_fight" => StateKey::CanFight,
            "can_move" => StateKey::CanMove,
            "can_gather" => StateKey::CanGather,
            "can_craft" => StateKey::CanCraft,
            "current_x" => StateKey::CurrentX,
            "current_y" => StateKey::CurrentY,
            "cooldown_ready" => StateKey::CooldownReady,
            "cooldown_seconds_remaining" => StateKey::CooldownSecondsRemaining,
            "mining_level" => StateKey::MiningLevel,
            "woodcutting_level" => StateKey::WoodcuttingLevel,
            "fishing_level" => StateKey::FishingLevel,
            "weaponcrafting_level" => StateKey::WeaponcraftingLevel,
            "gearcrafting_level" => StateKey::GearcraftingLevel,
            "jewelrycrafting_level" => StateKey::JewelrycraftingLevel,
            "cooking_level" => StateKey::CookingLevel,
            "alchemy_level" => StateKey::AlchemyLevel,
            "inventory_space_available" => StateKey::InventorySpaceAvailable,
            "inventory_count" => StateKey::InventoryCount,
            "inventory_max_items" => StateKey::InventoryMaxItems,
            "has_craft_materials" => StateKey::HasCraftMaterials,
            "has_weapon" => StateKey::HasWeapon,
            "best_weapon_available" => StateKey::BestWeaponAvailable,
            "weapon_equipped" => StateKey::WeaponEquipped,
            "equipped_weapon" => StateKey::EquippedWeapon,
            "tool_equipped" => StateKey::ToolEquipped,
            "equipped_tool" => StateKey::EquippedTool,
            "at_bank" => StateKey::AtBank,
            "at_monster_location" => StateKey::AtMonsterLocation,
            "at_resource_location" => StateKey::AtResourceLocation,
            "at_workshop_location" => StateKey::AtWorkshopLocation,
            "at_grand_exchange" => StateKey::AtGrandExchange,
            "at_safe_location" => StateKey::AtSafeLocation,
            other => return Err(AgentError::UnknownStateKey(other.to_string())),
        };
        Ok(key)
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed state value: boolean, integer, or string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl StateValue {
    /// Returns the boolean payload, if this value is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer payload, if this value is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StateValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the string payload, if this value is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StateValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Bool(b)
    }
}

impl From<i64> for StateValue {
    fn from(i: i64) -> Self {
        StateValue::Int(i)
    }
}

impl From<i32> for StateValue {
    fn from(i: i32) -> Self {
        StateValue::Int(i64::from(i))
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::Text(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::Text(s)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Bool(b) => write!(f, "{}", b),
            StateValue::Int(i) => write!(f, "{}", i),
            StateValue::Text(t) => write!(f, "{}", t),
        }
    }
}

/// `WorldState` maps [`StateKey`]s to [`StateValue`]s.
///
/// It represents current world snapshots, goal target states, action
/// preconditions, and action effects alike. Keys that are absent are
/// *unknown*, not false.
///
/// # Examples
///
/// ```
/// use goapbot::{StateKey, StateValue, WorldState};
///
/// let mut state = WorldState::new();
/// state.set(StateKey::CurrentX, 3);
/// state.set(StateKey::EquippedWeapon, "iron_sword");
///
/// assert_eq!(state.get_int(StateKey::CurrentX), Some(3));
/// assert_eq!(state.get_text(StateKey::EquippedWeapon), Some("iron_sword"));
/// assert_eq!(state.get(&StateKey::CooldownReady), None); // unknown, not false
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    facts: HashMap<StateKey, StateValue>,
}

impl WorldState {
    /// Creates a new empty world state.
    pub fn new() -> Self {
        Self {
            facts: HashMap::new(),
        }
    }

    /// Sets a fact, overwriting any previous value for the key.
    pub fn set(&mut self, key: StateKey, value: impl Into<StateValue>) {
        self.facts.insert(key, value.into());
    }

    /// Builder-style variant of [`WorldState::set`].
    pub fn with(mut self, key: StateKey, value: impl Into<StateValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Gets the value for a key, or `None` when the fact is unknown.
    pub fn get(&self, key: &StateKey) -> Option<&StateValue> {
        self.facts.get(key)
    }

    /// Gets a boolean fact. `None` when unknown or not a boolean.
    pub fn get_bool(&self, key: StateKey) -> Option<bool> {
        self.facts.get(&key).and_then(StateValue::as_bool)
    }

    /// Gets an integer fact. `None` when unknown or not an integer.
    pub fn get_int(&self, key: StateKey) -> Option<i64> {
        self.facts.get(&key).and_then(StateValue::as_int)
    }

    /// Gets a string fact. `None` when unknown or not a string.
    pub fn get_text(&self, key: StateKey) -> Option<&str> {
        self.facts.get(&key).and_then(StateValue::as_text)
    }

    /// Returns the number of known facts.
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Returns true when no facts are known.
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// Iterates over the known facts.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &StateValue)> {
        self.facts.iter()
    }

    /// Checks whether this state satisfies the requirements in `other`.
    ///
    /// Every (key, value) pair in `other` must be present here with an
    /// exactly equal value. Absent keys and differing values both fail.
    /// This state may carry additional facts not mentioned by `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use goapbot::{StateKey, WorldState};
    ///
    /// let current = WorldState::new()
    ///     .with(StateKey::HpFull, true)
    ///     .with(StateKey::CharacterLevel, 8);
    /// let goal = WorldState::new().with(StateKey::HpFull, true);
    ///
    /// assert!(current.satisfies(&goal));
    /// assert!(!goal.satisfies(&current));
    /// ```
    pub fn satisfies(&self, other: &WorldState) -> bool {
        other
            .facts
            .iter()
            .all(|(key, value)| self.facts.get(key) == Some(value))
    }

    /// Checks whether this state exactly matches another: same key set,
    /// same values. Stricter than [`WorldState::satisfies`].
    pub fn matches(&self, other: &WorldState) -> bool {
        self.facts.len() == other.facts.len() && self.satisfies(other)
    }

    /// Returns a new state with `changes` applied over this one.
    ///
    /// Used by the planner to simulate an action's declared effects without
    /// touching the original state.
    pub fn apply(&self, changes: &WorldState) -> Self {
        let mut next = self.clone();
        next.merge(changes);
        next
    }

    /// Merges `changes` into this state in place, overwriting on conflict.
    ///
    /// The executor uses this to fold observed `state_changes` into the live
    /// state; the merge is complete before any subsequent step reads it.
    pub fn merge(&mut self, changes: &WorldState) {
        for (key, value) in changes.facts.iter() {
            self.facts.insert(*key, value.clone());
        }
    }

    /// Returns the facts from `other` that differ from (or are missing in)
    /// this state.
    pub fn diff(&self, other: &WorldState) -> Self {
        let mut diff = WorldState::new();
        for (key, value) in other.facts.iter() {
            if self.facts.get(key) != Some(value) {
                diff.facts.insert(*key, value.clone());
            }
        }
        diff
    }

    /// Returns the facts sorted by key, for deterministic iteration.
    pub fn sorted_facts(&self) -> Vec<(&StateKey, &StateValue)> {
        let mut items: Vec<_> = self.facts.iter().collect();
        items.sort_by_key(|(key, _)| **key);
        items
    }
}

impl Hash for WorldState {
    /// Hashes the facts in sorted key order so that two states with the same
    /// content hash identically regardless of insertion order.
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        for (key, value) in self.sorted_facts() {
            key.hash(hasher);
            value.hash(hasher);
        }
    }
}

impl PartialEq for WorldState {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for WorldState {}

impl FromIterator<(StateKey, StateValue)> for WorldState {
    fn from_iter<I: IntoIterator<Item = (StateKey, StateValue)>>(iter: I) -> Self {
        Self {
            facts: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.sorted_facts().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// Validates an externally sourced state dictionary against the fixed
/// vocabulary.
///
/// This is the single gate through which any raw state dictionary (for
/// example one built from a live character snapshot) must pass before being
/// handed to the planner. The first unrecognized key fails the whole call;
/// nothing is silently dropped or coerced.
///
/// # Errors
///
/// * [`AgentError::UnknownStateKey`] for a key outside the vocabulary
/// * [`AgentError::InvalidStateValue`] for a value that is not a boolean,
///   integer, or string
pub fn validate_state_dict(raw: &serde_json::Map<String, Value>) -> Result<WorldState> {
    let mut state = WorldState::new();
    for (raw_key, raw_value) in raw {
        let key: StateKey = raw_key.parse()?;
        let value = match raw_value {
            Value::Bool(b) => StateValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => StateValue::Int(i),
                None => {
                    return Err(AgentError::InvalidStateValue {
                        key: raw_key.clone(),
                        detail: format!("number {} is not a valid integer", n),
                    })
                }
            },
            Value::String(s) => StateValue::Text(s.clone()),
            other => {
                return Err(AgentError::InvalidStateValue {
                    key: raw_key.clone(),
                    detail: format!("unsupported value type: {}", other),
                })
            }
        };
        state.facts.insert(key, value);
    }
    Ok(state)
}
