//! Flag watches - polled edge detectors that turn flag changes into events.

use bark_world::{EntityId, World, WorldError};

use crate::events::{ActionName, ThematicEvent};

/// Raises a [`ThematicEvent`] when a flag goes from clear to set.
///
/// Watches are polled once per engine `update`. A flag that is already set
/// when the watch is registered does not fire until it has been cleared and
/// set again.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagWatch {
    /// Actor whose flag is watched; `None` watches the world flag.
    pub actor: Option<String>,
    pub flag: String,
    pub action: ActionName,
    pub concept: String,
    was_set: bool,
}

impl FlagWatch {
    /// Watch a world flag.
    pub fn world(flag: impl Into<String>, action: ActionName, concept: impl Into<String>) -> Self {
        Self {
            actor: None,
            flag: flag.into(),
            action,
            concept: concept.into(),
            was_set: false,
        }
    }

    /// Watch a flag on a named actor. The raised event is attributed to that actor.
    pub fn actor(
        actor: impl Into<String>,
        flag: impl Into<String>,
        action: ActionName,
        concept: impl Into<String>,
    ) -> Self {
        Self {
            actor: Some(actor.into()),
            ..Self::world(flag, action, concept)
        }
    }

    fn entity(&self, world: &World) -> Result<Option<EntityId>, WorldError> {
        self.actor
            .as_deref()
            .map(|name| world.actor_id(name))
            .transpose()
    }

    /// Record the current flag state without raising anything.
    pub(crate) fn prime(&mut self, world: &World) -> Result<(), WorldError> {
        let entity = self.entity(world)?;
        self.was_set = world.is_set(entity, world.bit_index_of(&self.flag)?)?;
        Ok(())
    }

    /// Sample the flag; returns the event to raise on a rising edge.
    pub(crate) fn poll(&mut self, world: &World) -> Result<Option<ThematicEvent>, WorldError> {
        let entity = self.entity(world)?;
        let is_set = world.is_set(entity, world.bit_index_of(&self.flag)?)?;
        let rising = is_set && !self.was_set;
        self.was_set = is_set;

        Ok(rising.then(|| ThematicEvent {
            actor: entity,
            action: self.action,
            concept: self.concept.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rising_edge_only() {
        let mut world = World::new();
        world.declare_flag("alarm").unwrap();
        let mut watch = FlagWatch::world("alarm", ActionName::SAY, "alarm");
        watch.prime(&world).unwrap();

        assert_eq!(watch.poll(&world).unwrap(), None);
        world.set_flag(None, "alarm", true).unwrap();
        let event = watch.poll(&world).unwrap().unwrap();
        assert_eq!(event.concept, "alarm");
        assert_eq!(event.actor, None);

        // Still set: no new edge.
        assert_eq!(watch.poll(&world).unwrap(), None);

        world.set_flag(None, "alarm", false).unwrap();
        assert_eq!(watch.poll(&world).unwrap(), None);
        world.set_flag(None, "alarm", true).unwrap();
        assert!(watch.poll(&world).unwrap().is_some());
    }

    #[test]
    fn test_actor_watch_attributes_event() {
        let mut world = World::new();
        world.declare_flag("wounded").unwrap();
        let guard = world.add_actor("guard").unwrap();
        world.set_flag(Some(guard), "wounded", true).unwrap();

        let hurt = ActionName::new("HURT").unwrap();
        let mut watch = FlagWatch::actor("guard", "wounded", hurt, "pain");
        watch.prime(&world).unwrap();
        // Already set when registered.
        assert_eq!(watch.poll(&world).unwrap(), None);

        world.set_flag(Some(guard), "wounded", false).unwrap();
        watch.poll(&world).unwrap();
        world.set_flag(Some(guard), "wounded", true).unwrap();
        let event = watch.poll(&world).unwrap().unwrap();
        assert_eq!(event.actor, Some(guard));
        assert_eq!(event.action, hurt);
    }

    #[test]
    fn test_unknown_names_error() {
        let world = World::new();
        let mut watch = FlagWatch::world("missing", ActionName::SAY, "x");
        assert!(matches!(watch.prime(&world), Err(WorldError::UnknownFlag(_))));

        let mut watch = FlagWatch::actor("ghost", "missing", ActionName::SAY, "x");
        assert!(matches!(watch.poll(&world), Err(WorldError::UnknownActor(_))));
    }
}
