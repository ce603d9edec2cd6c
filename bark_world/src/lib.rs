//! # Bark World
//!
//! The world-side data the bark rule engine consults: actors, fixed-width flag
//! bitsets with a shared name registry, per-entity fact stores and the world
//! clock. This crate holds state only; it contains no rule logic.

pub mod clock;
pub mod entities;
pub mod error;
pub mod facts;
pub mod flags;
pub mod world_state;

pub use clock::*;
pub use entities::*;
pub use error::*;
pub use facts::*;
pub use flags::*;
pub use world_state::*;
