//! Actor definitions.

use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::facts::FactStore;
use crate::flags::FlagSet;

/// An actor that can trigger events, speak barks and carry its own flags and facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: EntityId,
    pub name: String,

    /// Per-actor boolean flags, indexed through the world's flag registry.
    pub flags: FlagSet,

    /// Per-actor facts.
    #[serde(default)]
    pub facts: FactStore,
}

impl Actor {
    /// Create a new actor with the given name and no flags or facts.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            flags: FlagSet::empty(),
            facts: FactStore::new(),
        }
    }

    /// Set the actor's facts.
    pub fn with_facts(mut self, facts: FactStore) -> Self {
        self.facts = facts;
        self
    }
}
