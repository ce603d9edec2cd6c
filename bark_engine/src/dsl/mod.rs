//! Rule language - tokenizer, parser and compile errors.
//!
//! Rule text is compiled in one pass into a [`RulePack`](crate::rules::RulePack):
//!
//! ```text
//! ALIAS FLAG dark AS night.
//!
//! WHEN ACTION IS SAY, OBJECT IS greet, FLAG night
//! DO SAY "Evening." DURATION 2, SET world.greeted TO 1 .
//! ```

mod error;
mod lexer;
mod parser;

pub use error::*;
pub use lexer::{tokenize, RelOp, Token, TokenKind};
pub use parser::*;
