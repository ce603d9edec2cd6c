//! Rule definitions - guards and the response program they unlock.

use bark_world::{FactStore, FactValue, World, WorldError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::events::ActionName;

/// Position of a rule inside a compiled [`RulePack`](super::RulePack).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleId(pub usize);

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Comparison operators available to fact filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Exists,
    NotExists,
}

/// Compares a named fact against a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactFilter {
    pub fact: String,
    pub op: CompareOp,
    /// Right-hand side; `None` for `Exists` / `NotExists`.
    pub value: Option<FactValue>,
}

impl FactFilter {
    pub fn new(fact: impl Into<String>, op: CompareOp, value: Option<FactValue>) -> Self {
        Self {
            fact: fact.into(),
            op,
            value,
        }
    }

    /// Evaluate against a fact store. A missing fact fails every comparison
    /// except `NotExists`.
    pub fn evaluate(&self, facts: &FactStore) -> bool {
        let current = facts.get(&self.fact);
        match (self.op, current, &self.value) {
            (CompareOp::Exists, current, _) => current.is_some(),
            (CompareOp::NotExists, current, _) => current.is_none(),
            (_, None, _) | (_, _, None) => false,
            (CompareOp::Eq, Some(a), Some(b)) => a.loose_eq(b),
            (CompareOp::Ne, Some(a), Some(b)) => !a.loose_eq(b),
            (op, Some(a), Some(b)) => match a.compare(b) {
                Some(ordering) => match op {
                    CompareOp::Lt => ordering == Ordering::Less,
                    CompareOp::Le => ordering != Ordering::Greater,
                    CompareOp::Gt => ordering == Ordering::Greater,
                    CompareOp::Ge => ordering != Ordering::Less,
                    _ => false,
                },
                None => false,
            },
        }
    }
}

/// A fact filter evaluated against a named actor's facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorFactFilter {
    pub actor: String,
    pub filter: FactFilter,
}

impl ActorFactFilter {
    pub fn evaluate(&self, world: &World) -> Result<bool, WorldError> {
        let id = world.actor_id(&self.actor)?;
        Ok(self.filter.evaluate(world.facts(Some(id))?))
    }
}

/// A flag test on a named actor: holds when `is_set XOR negated`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStateFilter {
    pub actor: String,
    pub flag: String,
    pub negated: bool,
}

impl AgentStateFilter {
    pub fn evaluate(&self, world: &World) -> Result<bool, WorldError> {
        let id = world.actor_id(&self.actor)?;
        let bit = world.bit_index_of(&self.flag)?;
        Ok(world.is_set(Some(id), bit)? != self.negated)
    }
}

/// Whose facts a SET or ADD command writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactTarget {
    /// The entity the firing acts for: the observer, else the event actor, else the world.
    Subject,
    World,
    Actor(String),
}

/// One instruction of a rule's response program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Say {
        /// Concept raised when the line finishes.
        key: String,
        text: String,
        duration: f64,
        delay: f64,
    },
    Set {
        target: FactTarget,
        fact: String,
        value: FactValue,
        delay: f64,
    },
    Add {
        target: FactTarget,
        fact: String,
        delta: FactValue,
        delay: f64,
    },
    Raise {
        event: String,
        delay: f64,
    },
    Reset {
        delay: f64,
    },
    /// Mark another rule as already fired without running it.
    Disable {
        actor: String,
        action: ActionName,
        object: String,
    },
}

impl Command {
    /// Seconds to wait before the command runs.
    pub fn delay(&self) -> f64 {
        match self {
            Command::Say { delay, .. }
            | Command::Set { delay, .. }
            | Command::Add { delay, .. }
            | Command::Raise { delay, .. }
            | Command::Reset { delay } => *delay,
            Command::Disable { .. } => 0.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Say { .. } => "SAY",
            Command::Set { .. } => "SET",
            Command::Add { .. } => "ADD",
            Command::Raise { .. } => "RAISE",
            Command::Reset { .. } => "RESET",
            Command::Disable { .. } => "DISABLE",
        }
    }
}

/// A compiled guard + response unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Source line of the `WHEN` keyword.
    pub line: usize,

    pub action: Option<ActionName>,
    pub object: Option<String>,

    /// Required originating actor.
    pub agent: Option<String>,

    /// Who speaks the response.
    pub observer: Option<String>,

    /// World flags that must all be set.
    pub flags_set: Vec<String>,

    /// World flags that must all be clear.
    pub flags_clear: Vec<String>,

    pub agent_flags: Vec<AgentStateFilter>,
    pub world_filters: Vec<FactFilter>,
    pub agent_filters: Vec<ActorFactFilter>,

    /// Chance to fire, 0.0 - 1.0.
    pub probability: f32,

    /// Burn the rule when its probability roll fails.
    pub no_retry: bool,

    pub has_run: bool,

    pub program: Vec<Command>,

    /// Specificity, fixed when the pack is compiled.
    pub priority: u32,
}

impl Rule {
    /// Create an empty rule defined at `line`.
    pub fn new(line: usize) -> Self {
        Self {
            line,
            action: None,
            object: None,
            agent: None,
            observer: None,
            flags_set: Vec::new(),
            flags_clear: Vec::new(),
            agent_flags: Vec::new(),
            world_filters: Vec::new(),
            agent_filters: Vec::new(),
            probability: 1.0,
            no_retry: false,
            has_run: false,
            program: Vec::new(),
            priority: 0,
        }
    }

    /// Count of guard components present. More specific rules are tried first.
    pub fn specificity(&self) -> u32 {
        let counted = self.flags_set.len()
            + self.flags_clear.len()
            + usize::from(self.agent.is_some())
            + usize::from(self.action.is_some())
            + usize::from(self.object.is_some())
            + self.agent_flags.len()
            + self.world_filters.len()
            + self.agent_filters.len()
            + usize::from(self.probability < 1.0);
        counted as u32
    }

    /// True when this is the rule a DISABLE command names.
    pub fn is_identified_by(&self, actor: &str, action: ActionName, object: &str) -> bool {
        self.agent.as_deref() == Some(actor)
            && self.action == Some(action)
            && self.object.as_deref() == Some(object)
    }
}
