//! Error types for lazyflow pipelines.
//!
//! Drain failures come in two flavours: errors returned by user-supplied
//! callbacks ([`PipelineError::Step`]) and errors raised by the engine for a
//! malformed operation ([`PipelineError::Engine`]). Neither is wrapped or
//! retried on its way out of a drain.

use std::collections::HashMap;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// The main error type for lazyflow operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A dequeue was attempted on an empty operation queue.
    #[error("{0}")]
    EmptyQueue(#[from] EmptyQueueError),

    /// A user-supplied callback failed. The error is passed through as-is.
    #[error(transparent)]
    Step(#[from] anyhow::Error),

    /// The engine rejected an operation.
    #[error("{0}")]
    Engine(#[from] EngineError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PipelineError {
    /// Wraps a callback failure.
    #[must_use]
    pub fn step(err: anyhow::Error) -> Self {
        Self::Step(err)
    }

    /// Returns the callback error if this is a step failure.
    #[must_use]
    pub fn as_step(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Step(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the engine error if this is an engine failure.
    #[must_use]
    pub fn as_engine(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true if a callback produced this error.
    #[must_use]
    pub fn is_step(&self) -> bool {
        matches!(self, Self::Step(_))
    }

    /// Short machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyQueue(_) => "EmptyQueue",
            Self::Step(_) => "StepFailure",
            Self::Engine(_) => "EngineFailure",
            Self::Serialization(_) => "Serialization",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("type".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        if let Self::Engine(err) = self {
            map.insert("operation".to_string(), serde_json::json!(err.operation()));
        }
        map
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Error raised when dequeuing from an empty operation queue.
#[derive(Debug, Clone, Copy, Default, Error, PartialEq, Eq)]
#[error("Operation queue is empty")]
pub struct EmptyQueueError;

/// Errors the engine raises for operations it cannot perform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine does not implement this operation.
    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation {
        /// The operation name.
        operation: String,
    },

    /// The operation payload is invalid.
    #[error("Invalid argument for '{operation}': {reason}")]
    InvalidArgument {
        /// The operation name.
        operation: String,
        /// What was wrong with the argument.
        reason: String,
    },

    /// An element has the wrong type for this operation.
    #[error("Type mismatch in '{operation}': expected {expected}, found {found}")]
    TypeMismatch {
        /// The operation name.
        operation: String,
        /// The expected element type.
        expected: String,
        /// The type that was found.
        found: String,
    },

    /// A sequence operation was applied to a terminal value.
    #[error("Operation '{operation}' requires a sequence, but the pipeline already resolved to {found}")]
    NotASequence {
        /// The operation name.
        operation: String,
        /// The type of the terminal value.
        found: String,
    },
}

impl EngineError {
    /// Creates an unsupported operation error.
    #[must_use]
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            operation: operation.into(),
        }
    }

    /// Creates an invalid argument error.
    #[must_use]
    pub fn invalid_argument(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(
        operation: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::TypeMismatch {
            operation: operation.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a not-a-sequence error.
    #[must_use]
    pub fn not_a_sequence(operation: impl Into<String>, found: impl Into<String>) -> Self {
        Self::NotASequence {
            operation: operation.into(),
            found: found.into(),
        }
    }

    /// Returns the name of the operation that failed.
    #[must_use]
    pub fn operation(&self) -> &str {
        match self {
            Self::UnsupportedOperation { operation }
            | Self::InvalidArgument { operation, .. }
            | Self::TypeMismatch { operation, .. }
            | Self::NotASequence { operation, .. } => operation,
        }
    }
}
