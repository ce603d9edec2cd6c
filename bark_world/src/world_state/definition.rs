//! Declarative world setup loaded from TOML.
//!
//! ```toml
//! flags = ["alarm", "night", "alert"]
//! set_flags = ["night"]
//!
//! [facts]
//! gold = 120
//!
//! [[actors]]
//! name = "guard"
//! set_flags = ["alert"]
//! facts = { hunger = 3, mood = "grumpy" }
//! ```

use serde::{Deserialize, Serialize};

use super::World;
use crate::entities::Actor;
use crate::error::WorldError;
use crate::facts::FactStore;

/// Top-level world definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldDefinition {
    /// Every flag name rules may reference, in bit order.
    pub flags: Vec<String>,

    /// World flags that start set.
    pub set_flags: Vec<String>,

    /// Initial world facts.
    pub facts: FactStore,

    pub actors: Vec<ActorDefinition>,
}

/// Initial state of one actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorDefinition {
    pub name: String,

    #[serde(default)]
    pub set_flags: Vec<String>,

    #[serde(default)]
    pub facts: FactStore,
}

impl WorldDefinition {
    /// Parse a definition from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self, WorldError> {
        Ok(toml::from_str(source)?)
    }

    /// Build a world. Flags referenced in `set_flags` must be declared in `flags`.
    pub fn build(&self) -> Result<World, WorldError> {
        let mut world = World::new();

        for name in &self.flags {
            world.declare_flag(name)?;
        }
        for name in &self.set_flags {
            world.set_flag(None, name, true)?;
        }
        *world.facts_mut(None)? = self.facts.clone();

        for def in &self.actors {
            let id = world.insert_actor(Actor::new(&def.name).with_facts(def.facts.clone()))?;
            for name in &def.set_flags {
                world.set_flag(Some(id), name, true)?;
            }
        }

        Ok(world)
    }
}

impl World {
    /// Build a world straight from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self, WorldError> {
        WorldDefinition::from_toml_str(source)?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::FactValue;

    const SAMPLE: &str = r#"
flags = ["alarm", "night", "alert"]
set_flags = ["night"]

[facts]
gold = 120

[[actors]]
name = "guard"
set_flags = ["alert"]
facts = { hunger = 3, mood = "grumpy" }

[[actors]]
name = "cook"
"#;

    #[test]
    fn test_load_world_from_toml() {
        let world = World::from_toml_str(SAMPLE).unwrap();

        let night = world.bit_index_of("night").unwrap();
        let alert = world.bit_index_of("alert").unwrap();
        assert!(world.is_set(None, night).unwrap());

        let guard = world.actor_id("guard").unwrap();
        let cook = world.actor_id("cook").unwrap();
        assert!(world.is_set(Some(guard), alert).unwrap());
        assert!(!world.is_set(Some(cook), alert).unwrap());

        let guard_facts = world.facts(Some(guard)).unwrap();
        assert_eq!(guard_facts.get("hunger"), Some(&FactValue::Int(3)));
        assert_eq!(
            guard_facts.get("mood"),
            Some(&FactValue::Text("grumpy".into()))
        );
        assert_eq!(
            world.facts(None).unwrap().get("gold"),
            Some(&FactValue::Int(120))
        );
    }

    #[test]
    fn test_undeclared_flag_is_rejected() {
        let source = r#"
flags = ["alarm"]
set_flags = ["night"]
"#;
        assert!(matches!(
            World::from_toml_str(source),
            Err(WorldError::UnknownFlag(name)) if name == "night"
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            World::from_toml_str("flags = [1, "),
            Err(WorldError::Definition(_))
        ));
    }
}
