//! World state - the flag and fact stores the bark engine reads and writes.

mod definition;

pub use definition::*;

use std::collections::HashMap;

use crate::entities::{Actor, EntityId};
use crate::error::WorldError;
use crate::facts::FactStore;
use crate::flags::{FlagIndex, FlagRegistry, FlagSet};

/// The world the rule engine consults.
///
/// Flags live in fixed-width bitsets (one for the world, one per actor) whose
/// bit positions come from a single shared [`FlagRegistry`]. Facts live in a
/// [`FactStore`] per entity. `None` as an entity means "the world itself".
#[derive(Debug, Clone, Default)]
pub struct World {
    /// Flag name -> bit index, shared by the world and every actor.
    flag_names: FlagRegistry,

    /// World-level flags.
    flags: FlagSet,

    /// World-level facts.
    facts: FactStore,

    /// All actors by id.
    actors: HashMap<EntityId, Actor>,

    /// Reverse index for name lookups from rule text.
    actor_by_name: HashMap<String, EntityId>,
}

impl World {
    /// Create a new empty world.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag_registry(&self) -> &FlagRegistry {
        &self.flag_names
    }

    /// Declare a flag name so that rules may reference it.
    pub fn declare_flag(&mut self, name: &str) -> Result<FlagIndex, WorldError> {
        self.flag_names.declare(name)
    }

    /// Resolve a flag name to its bit.
    pub fn bit_index_of(&self, name: &str) -> Result<FlagIndex, WorldError> {
        self.flag_names.resolve(name)
    }

    /// Test a single bit on the world (`None`) or on an actor.
    pub fn is_set(&self, entity: Option<EntityId>, bit: FlagIndex) -> Result<bool, WorldError> {
        Ok(self.flag_set(entity)?.contains(bit))
    }

    /// True when every bit in `bits` is set on the world.
    pub fn all_set(&self, bits: &FlagSet) -> bool {
        self.flags.all_set(bits)
    }

    /// True when any bit in `bits` is set on the world.
    pub fn any_set(&self, bits: &FlagSet) -> bool {
        self.flags.any_set(bits)
    }

    pub fn world_flags(&self) -> &FlagSet {
        &self.flags
    }

    /// Set or clear a named flag on the world or an actor.
    pub fn set_flag(
        &mut self,
        entity: Option<EntityId>,
        name: &str,
        value: bool,
    ) -> Result<(), WorldError> {
        let bit = self.bit_index_of(name)?;
        let flags = match entity {
            None => &mut self.flags,
            Some(id) => {
                &mut self
                    .actors
                    .get_mut(&id)
                    .ok_or(WorldError::UnknownEntity(id))?
                    .flags
            }
        };
        flags.assign(bit, value);
        Ok(())
    }

    fn flag_set(&self, entity: Option<EntityId>) -> Result<&FlagSet, WorldError> {
        match entity {
            None => Ok(&self.flags),
            Some(id) => self
                .actors
                .get(&id)
                .map(|actor| &actor.flags)
                .ok_or(WorldError::UnknownEntity(id)),
        }
    }

    /// Create an actor with the given name.
    pub fn add_actor(&mut self, name: impl Into<String>) -> Result<EntityId, WorldError> {
        self.insert_actor(Actor::new(name))
    }

    /// Add a fully built actor to the world. Names must be unique.
    pub fn insert_actor(&mut self, actor: Actor) -> Result<EntityId, WorldError> {
        if self.actor_by_name.contains_key(&actor.name) {
            return Err(WorldError::DuplicateActor(actor.name));
        }
        let id = actor.id;
        self.actor_by_name.insert(actor.name.clone(), id);
        self.actors.insert(id, actor);
        Ok(id)
    }

    /// Get actor by ID.
    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Get mutable actor by ID.
    pub fn actor_mut(&mut self, id: EntityId) -> Option<&mut Actor> {
        self.actors.get_mut(&id)
    }

    /// Resolve an actor name (as written in rule text) to its id.
    pub fn actor_id(&self, name: &str) -> Result<EntityId, WorldError> {
        self.actor_by_name
            .get(name)
            .copied()
            .ok_or_else(|| WorldError::UnknownActor(name.to_string()))
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Facts of the world (`None`) or of an actor.
    pub fn facts(&self, entity: Option<EntityId>) -> Result<&FactStore, WorldError> {
        match entity {
            None => Ok(&self.facts),
            Some(id) => self
                .actors
                .get(&id)
                .map(|actor| &actor.facts)
                .ok_or(WorldError::UnknownEntity(id)),
        }
    }

    /// Mutable facts of the world (`None`) or of an actor.
    pub fn facts_mut(&mut self, entity: Option<EntityId>) -> Result<&mut FactStore, WorldError> {
        match entity {
            None => Ok(&mut self.facts),
            Some(id) => self
                .actors
                .get_mut(&id)
                .map(|actor| &mut actor.facts)
                .ok_or(WorldError::UnknownEntity(id)),
        }
    }
}
