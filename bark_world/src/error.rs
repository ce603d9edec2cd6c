//! Errors raised by world lookups and mutations.

use thiserror::Error;

use crate::entities::EntityId;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("unknown flag '{0}'")]
    UnknownFlag(String),

    #[error("cannot declare flag '{name}': registry is full ({capacity} flags)")]
    FlagCapacity { name: String, capacity: usize },

    #[error("unknown actor '{0}'")]
    UnknownActor(String),

    #[error("no actor with id {0}")]
    UnknownEntity(EntityId),

    #[error("actor '{0}' already exists")]
    DuplicateActor(String),

    #[error("fact '{name}' is not numeric: cannot add {delta} to {value}")]
    NotNumeric {
        name: String,
        value: String,
        delta: String,
    },

    #[error("fact '{name}' overflowed: cannot add {delta} to {value}")]
    Overflow {
        name: String,
        value: String,
        delta: String,
    },

    #[error("invalid world definition: {0}")]
    Definition(#[from] toml::de::Error),
}
