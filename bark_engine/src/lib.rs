//! # Bark Engine
//!
//! A reactive rule engine for NPC "barks": short, context-triggered lines.
//! Designers write condition→response rules in a small text language; at
//! runtime gameplay raises thematic events, the engine picks the most specific
//! rule that matches and runs its response program.
//!
//! ## Core Components
//!
//! - **dsl**: Tokenizer and recursive-descent compiler for rule text
//! - **rules**: Rule model, predicates, commands and the priority-ordered pack
//! - **events**: Thematic events raised by gameplay
//! - **engine**: Matcher, deferred-command queue, flag watches and output sinks
//!
//! ## Example
//!
//! ```
//! use bark_engine::*;
//! use bark_world::{ManualClock, World};
//!
//! let pack = compile(r#"WHEN ACTION IS SAY, OBJECT IS greet DO SAY "Hi" ."#).unwrap();
//! let context = BarkContext::new(World::new(), ManualClock::new(), RecordingSink::new());
//! let mut engine = RuleEngine::with_defaults(pack, context);
//!
//! let greet = ThematicEvent::new(ActionName::SAY, "greet");
//! assert!(engine.try_match(&greet).unwrap());
//! assert!(!engine.try_match(&greet).unwrap());
//! assert_eq!(engine.sink().lines(), vec!["Hi"]);
//! ```

pub mod dsl;
pub mod engine;
pub mod events;
pub mod rules;

pub use dsl::*;
pub use engine::*;
pub use events::*;
pub use rules::*;
