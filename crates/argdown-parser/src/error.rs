//! Syntax errors reported by the lexer and parser.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::token::Position;

/// A recoverable syntax error with the position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("syntax error at {position}: {message}")]
pub struct SyntaxError {
    pub message: String,
    pub position: Position,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Result type for fail-fast parsing.
pub type Result<T> = std::result::Result<T, SyntaxError>;
