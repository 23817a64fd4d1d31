//! Evaluator errors.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedChar(char, usize),

    #[error("unexpected end of expression")]
    UnexpectedEof,

    #[error("expected {expected}, found '{found}'")]
    Expected { expected: &'static str, found: String },

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("type error: {0}")]
    Type(String),

    #[error("trailing input after expression: '{0}'")]
    TrailingInput(String),
}
