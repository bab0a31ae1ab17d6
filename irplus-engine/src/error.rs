//! Engine error types

use thiserror::Error;

/// Errors from parsing and validating bindings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unknown action: \"{0}\"")]
    UnknownAction(String),

    #[error("Invalid signal code: \"{0}\"")]
    InvalidSignal(String),

    #[error("Not a keypad digit: {0}")]
    InvalidDigit(u8),

    #[error("Empty binding for signal {0}")]
    EmptyBinding(String),
}
