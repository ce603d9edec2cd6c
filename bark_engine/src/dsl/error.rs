//! Syntax errors raised while compiling rule text.

use thiserror::Error;

/// A malformed rule. Compilation stops at the first one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("line {line}: expected {expected}, found '{found}'")]
    UnexpectedToken {
        line: usize,
        found: String,
        expected: String,
    },

    #[error("line {line}: unexpected end of input, expected {expected}")]
    UnexpectedEof { line: usize, expected: String },

    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("line {line}: invalid character '{found}'")]
    InvalidCharacter { line: usize, found: char },

    #[error("line {line}: invalid number '{found}'")]
    InvalidNumber { line: usize, found: String },

    #[error("line {line}: invalid action name '{found}' (1-4 letters or digits)")]
    InvalidActionName { line: usize, found: String },

    #[error("line {line}: chance must be between 0 and 100, found '{found}'")]
    InvalidChance { line: usize, found: String },
}

impl ParseError {
    /// Line the error was detected on (1-based).
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnexpectedToken { line, .. }
            | ParseError::UnexpectedEof { line, .. }
            | ParseError::UnterminatedString { line }
            | ParseError::InvalidCharacter { line, .. }
            | ParseError::InvalidNumber { line, .. }
            | ParseError::InvalidActionName { line, .. }
            | ParseError::InvalidChance { line, .. } => *line,
        }
    }

    /// The offending lexeme, when there is one.
    pub fn lexeme(&self) -> Option<String> {
        match self {
            ParseError::UnexpectedToken { found, .. }
            | ParseError::InvalidNumber { found, .. }
            | ParseError::InvalidActionName { found, .. }
            | ParseError::InvalidChance { found, .. } => Some(found.clone()),
            ParseError::InvalidCharacter { found, .. } => Some(found.to_string()),
            ParseError::UnexpectedEof { .. } | ParseError::UnterminatedString { .. } => None,
        }
    }
}
