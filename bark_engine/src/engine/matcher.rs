//! Guard evaluation.
//!
//! Checks run in a fixed, short-circuiting order: action and object, world
//! flags, agent identity, per-actor flags, world facts, per-actor facts.
//! Firing state and the probability gate are handled by the engine.

use bark_world::{FlagSet, World, WorldError};

use crate::events::ThematicEvent;
use crate::rules::Rule;

/// Resolve flag names to a bit set against the world's registry.
pub(crate) fn flag_bits(world: &World, names: &[String]) -> Result<FlagSet, WorldError> {
    names.iter().map(|name| world.bit_index_of(name)).collect()
}

/// True when `rule`'s action and object accept `event`. Absent fields match anything.
pub(crate) fn matches_event(rule: &Rule, event: &ThematicEvent) -> bool {
    rule.action.map_or(true, |action| action == event.action)
        && rule
            .object
            .as_deref()
            .map_or(true, |object| object == event.concept)
}

/// Evaluate every deterministic guard of `rule` against `event` and `world`.
pub(crate) fn guards_pass(
    rule: &Rule,
    event: &ThematicEvent,
    world: &World,
) -> Result<bool, WorldError> {
    if !matches_event(rule, event) {
        return Ok(false);
    }

    if !world.all_set(&flag_bits(world, &rule.flags_set)?) {
        return Ok(false);
    }
    if world.any_set(&flag_bits(world, &rule.flags_clear)?) {
        return Ok(false);
    }

    if let Some(agent) = &rule.agent {
        if event.actor != Some(world.actor_id(agent)?) {
            return Ok(false);
        }
    }

    for filter in &rule.agent_flags {
        if !filter.evaluate(world)? {
            return Ok(false);
        }
    }

    let world_facts = world.facts(None)?;
    if !rule.world_filters.iter().all(|filter| filter.evaluate(world_facts)) {
        return Ok(false);
    }

    for filter in &rule.agent_filters {
        if !filter.evaluate(world)? {
            return Ok(false);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ActionName;
    use crate::rules::{ActorFactFilter, AgentStateFilter, CompareOp, FactFilter};
    use bark_world::FactValue;

    fn world() -> World {
        let mut world = World::new();
        world.declare_flag("night").unwrap();
        world.declare_flag("peace").unwrap();
        world.declare_flag("alert").unwrap();
        let guard = world.add_actor("guard").unwrap();
        world.set_flag(None, "night", true).unwrap();
        world.set_flag(Some(guard), "alert", true).unwrap();
        world.facts_mut(None).unwrap().set("gold", 50i64);
        world.facts_mut(Some(guard)).unwrap().set("courage", 3i64);
        world
    }

    fn greet(world: &World) -> ThematicEvent {
        ThematicEvent::new(ActionName::SAY, "greet").by(world.actor_id("guard").unwrap())
    }

    fn base_rule() -> Rule {
        let mut rule = Rule::new(1);
        rule.action = Some(ActionName::SAY);
        rule.object = Some("greet".into());
        rule
    }

    #[test]
    fn test_action_and_object() {
        let world = world();
        let event = greet(&world);
        assert!(guards_pass(&base_rule(), &event, &world).unwrap());

        let mut rule = base_rule();
        rule.object = Some("farewell".into());
        assert!(!guards_pass(&rule, &event, &world).unwrap());

        let mut rule = base_rule();
        rule.action = ActionName::new("SEE");
        assert!(!guards_pass(&rule, &event, &world).unwrap());

        // No action or object: matches anything.
        assert!(guards_pass(&Rule::new(1), &event, &world).unwrap());
    }

    #[test]
    fn test_world_flags() {
        let world = world();
        let event = greet(&world);

        let mut rule = base_rule();
        rule.flags_set = vec!["night".into()];
        rule.flags_clear = vec!["peace".into()];
        assert!(guards_pass(&rule, &event, &world).unwrap());

        rule.flags_clear = vec!["night".into()];
        assert!(!guards_pass(&rule, &event, &world).unwrap());

        rule.flags_set = vec!["undeclared".into()];
        assert!(matches!(
            guards_pass(&rule, &event, &world),
            Err(WorldError::UnknownFlag(_))
        ));
    }

    #[test]
    fn test_agent_identity() {
        let mut world = world();
        world.add_actor("cook").unwrap();
        let mut rule = base_rule();
        rule.agent = Some("guard".into());

        assert!(guards_pass(&rule, &greet(&world), &world).unwrap());

        let by_cook = ThematicEvent::new(ActionName::SAY, "greet").by(world.actor_id("cook").unwrap());
        assert!(!guards_pass(&rule, &by_cook, &world).unwrap());

        let anonymous = ThematicEvent::new(ActionName::SAY, "greet");
        assert!(!guards_pass(&rule, &anonymous, &world).unwrap());
    }

    #[test]
    fn test_actor_flags_and_facts() {
        let world = world();
        let event = greet(&world);

        let mut rule = base_rule();
        rule.agent_flags.push(AgentStateFilter {
            actor: "guard".into(),
            flag: "alert".into(),
            negated: false,
        });
        rule.world_filters
            .push(FactFilter::new("gold", CompareOp::Ge, Some(FactValue::Int(50))));
        rule.agent_filters.push(ActorFactFilter {
            actor: "guard".into(),
            filter: FactFilter::new("courage", CompareOp::Gt, Some(FactValue::Int(2))),
        });
        assert!(guards_pass(&rule, &event, &world).unwrap());

        rule.agent_filters[0].filter.value = Some(FactValue::Int(5));
        assert!(!guards_pass(&rule, &event, &world).unwrap());
    }

    #[test]
    fn test_short_circuit_skips_later_lookups() {
        let world = world();
        let event = ThematicEvent::new(ActionName::SAY, "farewell");

        // The unknown actor is never looked up because the object already failed.
        let mut rule = base_rule();
        rule.agent = Some("ghost".into());
        assert!(!guards_pass(&rule, &event, &world).unwrap());
    }
}
