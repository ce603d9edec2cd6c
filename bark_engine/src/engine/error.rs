//! Errors raised while matching events and executing response programs.

use bark_world::WorldError;
use thiserror::Error;

use crate::events::ActionName;
use crate::rules::RuleId;

/// A runtime failure in authored content or engine limits.
///
/// A failed probability roll or an event that matches nothing is not an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Undefined flag, unknown actor or a non-numeric ADD.
    #[error(transparent)]
    World(#[from] WorldError),

    #[error("no rule {0} in the loaded pack")]
    UnknownRule(RuleId),

    #[error("DISABLE {actor} {action} {object}: no such rule")]
    DisableTargetMissing {
        actor: String,
        action: ActionName,
        object: String,
    },

    #[error("rule chain exceeded {depth} nested firings")]
    ChainDepthExceeded { depth: usize },

    #[error("rule {rule} (line {line}) re-triggered itself through its own speech")]
    ChainCycle { rule: RuleId, line: usize },
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid engine config: {0}")]
    Invalid(String),
}
