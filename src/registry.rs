//! The action factory registry: the planner's action universe at each call.
//!
//! The registry is an explicit object constructed once at process start and
//! passed by reference into the planner and executor — there is no ambient
//! global. After startup registration it is never mutated, so one registry
//! is safely shared (behind an `Arc`) across every character's control loop.

use std::collections::HashMap;
use std::sync::Arc;

use crate::action::Action;
use crate::error::Result;
use crate::state::WorldState;
use crate::world::WorldSnapshot;

/// Enumerates the concrete instances of one action type that are relevant
/// for a given state and world snapshot.
pub trait ActionFactory: Send + Sync {
    /// Stable identifier for the action type this factory produces.
    fn action_type(&self) -> &'static str;

    /// Builds every currently relevant concrete instance. Parameterized
    /// factories must never emit two actions with the same derived name in
    /// one call.
    fn create_instances(
        &self,
        world: &Arc<WorldSnapshot>,
        state: &WorldState,
    ) -> Result<Vec<Arc<dyn Action>>>;
}

/// Holds exactly one factory per action type.
#[derive(Default)]
pub struct ActionRegistry {
    factories: HashMap<&'static str, Box<dyn ActionFactory>>,
    /// Registration order, kept so action generation is deterministic.
    order: Vec<&'static str>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for its action type. Re-registering the same
    /// type overwrites the previous factory.
    pub fn register_factory(&mut self, factory: Box<dyn ActionFactory>) {
        let action_type = factory.action_type();
        if self.factories.insert(action_type, factory).is_none() {
            self.order.push(action_type);
        } else {
            log::debug!("registry: overwriting factory for '{}'", action_type);
        }
    }

    /// Registers the full set of built-in factories.
    pub fn with_default_factories() -> Self {
        use crate::actions::{
            BankDepositFactory, CraftFactory, EquipFactory, FightFactory, GatherFactory,
            MoveFactory, RestFactory, WaitForCooldownFactory,
        };
        let mut registry = Self::new();
        registry.register_factory(Box::new(MoveFactory));
        registry.register_factory(Box::new(FightFactory));
        registry.register_factory(Box::new(GatherFactory));
        registry.register_factory(Box::new(RestFactory));
        registry.register_factory(Box::new(CraftFactory));
        registry.register_factory(Box::new(EquipFactory));
        registry.register_factory(Box::new(BankDepositFactory));
        registry.register_factory(Box::new(WaitForCooldownFactory));
        registry
    }

    /// Invokes every registered factory and concatenates the results, in
    /// registration order.
    ///
    /// A factory error propagates to the caller untouched. Swallowing it
    /// would make an otherwise solvable goal look unsolvable, which is a
    /// far worse failure mode than a loud crash.
    pub fn generate_actions_for_state(
        &self,
        state: &WorldState,
        world: &Arc<WorldSnapshot>,
    ) -> Result<Vec<Arc<dyn Action>>> {
        let mut actions = Vec::new();
        for action_type in &self.order {
            let factory = &self.factories[action_type];
            let mut instances = factory.create_instances(world, state)?;
            log::debug!(
                "registry: factory '{}' produced {} action(s)",
                action_type,
                instances.len()
            );
            actions.append(&mut instances);
        }
        Ok(actions)
    }

    /// Finds a concrete action by name. Linear scan over a freshly
    /// generated universe; diagnostics only, not on the planning hot path.
    pub fn get_action_by_name(
        &self,
        name: &str,
        state: &WorldState,
        world: &Arc<WorldSnapshot>,
    ) -> Result<Option<Arc<dyn Action>>> {
        let actions = self.generate_actions_for_state(state, world)?;
        Ok(actions.into_iter().find(|a| a.name() == name))
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
