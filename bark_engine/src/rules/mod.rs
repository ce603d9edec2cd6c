//! Rule model - compiled rules, their predicates and response programs.
//!
//! - **Rule**: guard predicates plus an ordered response program
//! - **Command**: one instruction of a response program
//! - **RulePack**: the priority-ordered rule store

mod pack;
mod rule;

pub use pack::*;
pub use rule::*;
