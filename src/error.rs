use thiserror::Error;

use crate::types::StreamField;

/// Errors raised by the context buffer, its adapters and the environment glue.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContextError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Shape mismatch for {field}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        field: StreamField,
        expected: usize,
        actual: usize,
    },

    #[error("Flat observation has {actual} values, expected {expected}")]
    FlatLength { expected: usize, actual: usize },

    #[error("Invalid {field} value {value} at position {index}")]
    InvalidValue {
        field: StreamField,
        index: usize,
        value: f64,
    },

    #[error("Context buffer has not been reset with an initial state")]
    NotReset,

    #[error("Cannot extract an action: window has no valid position")]
    EmptyWindow,

    #[error("Model inference failed: {0}")]
    Inference(String),

    #[error("Simulator failure: {0}")]
    Simulator(String),
}

impl ContextError {
    /// Shorthand for a [`ContextError::ShapeMismatch`].
    pub(crate) fn shape(field: StreamField, expected: usize, actual: usize) -> Self {
        ContextError::ShapeMismatch {
            field,
            expected,
            actual,
        }
    }
}

#[cfg(feature = "rl-nn")]
impl From<tch::TchError> for ContextError {
    fn from(err: tch::TchError) -> Self {
        ContextError::Inference(err.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ContextError>;
