//! Rule Engine - matches thematic events against a rule pack and runs the winner.
//!
//! One call to [`RuleEngine::try_match`] works like this:
//! 1. **Scan**: walk the pack in priority order, skipping rules that already fired
//! 2. **Guard**: evaluate each rule's predicates against the event and the world
//! 3. **Roll**: rules with a chance below 100% draw a random number
//! 4. **Fire**: the first survivor is marked fired and its program runs
//!
//! Commands with a delay go to the deferred queue and run from
//! [`RuleEngine::update`]. Speech with no duration re-enters matching
//! immediately, so one event can start a chain of barks; chains are bounded by
//! [`EngineConfig::max_chain_depth`].

mod config;
mod error;
mod matcher;
mod scheduler;
mod sink;
mod watch;

pub use config::*;
pub use error::*;
pub use scheduler::*;
pub use sink::*;
pub use watch::*;

use bark_world::{Clock, EntityId, World};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::borrow::BorrowMut;
use tracing::{debug, info, trace, warn};

use crate::events::ThematicEvent;
use crate::rules::{Command, FactTarget, RuleId, RulePack};

/// Everything the engine needs from the outside world.
pub struct BarkContext<W, C, S> {
    /// The world to read flags and facts from. Either an owned `World` or `&mut World`.
    pub world: W,
    pub clock: C,
    pub sink: S,
}

impl<W, C, S> BarkContext<W, C, S> {
    pub fn new(world: W, clock: C, sink: S) -> Self {
        Self { world, clock, sink }
    }
}

/// The bark rule engine.
pub struct RuleEngine<W, C, S> {
    pack: RulePack,
    world: W,
    clock: C,
    sink: S,
    config: EngineConfig,
    rng: SmallRng,
    pending: DeferredQueue,
    watches: Vec<FlagWatch>,

    /// Watch events raised but not yet matched.
    raised: Vec<ThematicEvent>,

    /// Rules whose programs are currently running, outermost first.
    chain: Vec<RuleId>,
}

impl<W, C, S> RuleEngine<W, C, S>
where
    W: BorrowMut<World>,
    C: Clock,
    S: BarkSink,
{
    /// Create an engine over `pack`. The pack is compiled if it is not already.
    ///
    /// A `max_chain_depth` of zero is raised to one so top-level matches can fire.
    pub fn new(
        mut pack: RulePack,
        context: BarkContext<W, C, S>,
        mut config: EngineConfig,
    ) -> Self {
        if !pack.is_compiled() {
            pack.compile();
        }
        if config.max_chain_depth == 0 {
            warn!("max_chain_depth of 0 would block every rule, using 1");
            config.max_chain_depth = 1;
        }
        let rng = match config.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        debug!(rules = pack.len(), "rule engine ready");

        Self {
            pack,
            world: context.world,
            clock: context.clock,
            sink: context.sink,
            config,
            rng,
            pending: DeferredQueue::new(),
            watches: Vec::new(),
            raised: Vec::new(),
            chain: Vec::new(),
        }
    }

    /// Create an engine with the default configuration.
    pub fn with_defaults(pack: RulePack, context: BarkContext<W, C, S>) -> Self {
        Self::new(pack, context, EngineConfig::default())
    }

    // --- matching -----------------------------------------------------------

    /// Match `event` against the pack and run the first rule that passes.
    ///
    /// Returns `Ok(false)` when nothing matched. Errors come from authored
    /// content referring to undefined flags or actors, or from runaway chains.
    pub fn try_match(&mut self, event: &ThematicEvent) -> Result<bool, EngineError> {
        match self.find_winner(event)? {
            Some(id) => {
                self.fire(id, event)?;
                Ok(true)
            }
            None => {
                trace!(action = %event.action, concept = %event.concept, "no rule matched");
                Ok(false)
            }
        }
    }

    fn find_winner(&mut self, event: &ThematicEvent) -> Result<Option<RuleId>, EngineError> {
        for index in 0..self.pack.len() {
            let id = RuleId(index);
            let Some(rule) = self.pack.get(id) else {
                break;
            };
            if rule.has_run || !matcher::guards_pass(rule, event, self.world())? {
                continue;
            }

            let (chance, no_retry, line) = (rule.probability, rule.no_retry, rule.line);
            if chance < 1.0 {
                let draw: f32 = self.rng.gen();
                if draw >= chance {
                    trace!(rule = %id, line, draw, chance, "chance roll failed");
                    if no_retry {
                        self.burn(id);
                    }
                    continue;
                }
            }

            return Ok(Some(id));
        }
        Ok(None)
    }

    fn burn(&mut self, id: RuleId) {
        if let Some(rule) = self.pack.get_mut(id) {
            rule.has_run = true;
        }
    }

    fn fire(&mut self, id: RuleId, event: &ThematicEvent) -> Result<(), EngineError> {
        let rule = self.pack.get(id).ok_or(EngineError::UnknownRule(id))?;
        if self.chain.contains(&id) {
            return Err(EngineError::ChainCycle {
                rule: id,
                line: rule.line,
            });
        }
        if self.chain.len() >= self.config.max_chain_depth {
            return Err(EngineError::ChainDepthExceeded {
                depth: self.config.max_chain_depth,
            });
        }

        let speaker = match &rule.observer {
            Some(name) => Some(self.world().actor_id(name)?),
            None => event.actor,
        };
        info!(rule = %id, line = rule.line, action = %event.action, concept = %event.concept, "rule fired");

        self.burn(id);
        self.chain.push(id);
        let result = self.run_program(id, speaker);
        self.chain.pop();
        result
    }

    fn run_program(&mut self, id: RuleId, speaker: Option<EntityId>) -> Result<(), EngineError> {
        let now = self.clock.now();
        let delays: Vec<f64> = self
            .pack
            .get(id)
            .ok_or(EngineError::UnknownRule(id))?
            .program
            .iter()
            .map(Command::delay)
            .collect();

        for (index, delay) in delays.into_iter().enumerate() {
            if delay > 0.0 {
                debug!(rule = %id, index, fire_at = now + delay, "command deferred");
                self.pending.push(
                    now + delay,
                    Deferred::Command {
                        rule: id,
                        index,
                        speaker,
                    },
                );
            } else {
                self.run_command(id, index, speaker)?;
            }
        }
        Ok(())
    }

    // --- commands -----------------------------------------------------------

    fn run_command(
        &mut self,
        id: RuleId,
        index: usize,
        speaker: Option<EntityId>,
    ) -> Result<(), EngineError> {
        let command = self
            .pack
            .get(id)
            .and_then(|rule| rule.program.get(index))
            .cloned()
            .ok_or(EngineError::UnknownRule(id))?;
        trace!(rule = %id, index, command = command.name(), "running command");

        match command {
            Command::Say {
                key,
                text,
                duration,
                ..
            } => {
                self.sink.on_say(speaker, &text);
                if duration > 0.0 {
                    let fire_at = self.clock.now() + duration;
                    self.pending.push(
                        fire_at,
                        Deferred::Followup {
                            concept: key,
                            speaker,
                        },
                    );
                } else {
                    self.try_match(&ThematicEvent::spoken(key, speaker))?;
                }
            }
            Command::Set {
                target,
                fact,
                value,
                ..
            } => {
                let entity = self.resolve_target(&target, speaker)?;
                self.world_mut().facts_mut(entity)?.set(fact, value);
            }
            Command::Add {
                target,
                fact,
                delta,
                ..
            } => {
                let entity = self.resolve_target(&target, speaker)?;
                self.world_mut().facts_mut(entity)?.add(&fact, &delta)?;
            }
            Command::Raise { event, .. } => {
                self.sink.on_event_raised(&event);
            }
            Command::Reset { .. } => {
                if let Some(rule) = self.pack.get_mut(id) {
                    rule.has_run = false;
                }
            }
            Command::Disable {
                actor,
                action,
                object,
            } => {
                self.world().actor_id(&actor)?;
                let target = self.pack.find(&actor, action, &object).ok_or(
                    EngineError::DisableTargetMissing {
                        actor,
                        action,
                        object,
                    },
                )?;
                debug!(rule = %id, disabled = %target, "rule disabled");
                self.burn(target);
            }
        }
        Ok(())
    }

    /// Whose facts a SET or ADD writes. `None` is the world.
    fn resolve_target(
        &self,
        target: &FactTarget,
        speaker: Option<EntityId>,
    ) -> Result<Option<EntityId>, EngineError> {
        Ok(match target {
            FactTarget::Subject => speaker,
            FactTarget::World => None,
            FactTarget::Actor(name) => Some(self.world().actor_id(name)?),
        })
    }

    // --- ticking ------------------------------------------------------------

    /// Advance the engine to the clock's current time.
    ///
    /// Polls flag watches, then runs every deferred entry that is due, in
    /// fire-time order. Entries queued while this runs wait for the next call.
    /// Returns the number of deferred entries executed.
    pub fn update(&mut self) -> Result<usize, EngineError> {
        self.poll_watches()?;

        let now = self.clock.now();
        let mut due = self.pending.drain_due(now).into_iter();
        let mut executed = 0;

        while let Some(entry) = due.next() {
            debug!(fire_at = entry.fire_at, now, "running deferred entry");
            let result = match entry.job {
                Deferred::Command {
                    rule,
                    index,
                    speaker,
                } => self.run_command(rule, index, speaker),
                Deferred::Followup { concept, speaker } => self
                    .try_match(&ThematicEvent::spoken(concept, speaker))
                    .map(|_| ()),
            };
            if let Err(err) = result {
                self.pending.restore(due);
                return Err(err);
            }
            executed += 1;
        }

        Ok(executed)
    }

    /// Match edges seen by the flag watches. When a match fails, the events
    /// after it stay in the backlog for the next update.
    fn poll_watches(&mut self) -> Result<(), EngineError> {
        for watch in &mut self.watches {
            if let Some(event) = watch.poll(self.world.borrow())? {
                debug!(flag = %watch.flag, concept = %event.concept, "flag watch raised");
                self.raised.push(event);
            }
        }

        let mut backlog = std::mem::take(&mut self.raised).into_iter();
        while let Some(event) = backlog.next() {
            if let Err(err) = self.try_match(&event) {
                self.raised.extend(backlog);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Register a flag watch. Its names are resolved now so typos fail early.
    pub fn watch_flag(&mut self, mut watch: FlagWatch) -> Result<(), EngineError> {
        watch.prime(self.world())?;
        self.watches.push(watch);
        Ok(())
    }

    /// Number of deferred commands and follow-ups waiting to run.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // --- pack management ----------------------------------------------------

    /// Swap in a new pack. Pending work refers to the old pack and is dropped.
    pub fn reload(&mut self, mut pack: RulePack) {
        if !pack.is_compiled() {
            pack.compile();
        }
        info!(rules = pack.len(), dropped = self.pending.len(), "rule pack reloaded");
        self.pack = pack;
        self.pending.clear();
    }

    /// Make a fired rule eligible again.
    pub fn reset_rule(&mut self, id: RuleId) -> Result<(), EngineError> {
        let rule = self.pack.get_mut(id).ok_or(EngineError::UnknownRule(id))?;
        rule.has_run = false;
        Ok(())
    }

    // --- accessors ----------------------------------------------------------

    pub fn pack(&self) -> &RulePack {
        &self.pack
    }

    pub fn world(&self) -> &World {
        self.world.borrow()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.world.borrow_mut()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Tear the engine down, returning the world, clock and sink.
    pub fn into_context(self) -> BarkContext<W, C, S> {
        BarkContext {
            world: self.world,
            clock: self.clock,
            sink: self.sink,
        }
    }
}
