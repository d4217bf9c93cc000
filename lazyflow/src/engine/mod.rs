//! Sequence engines.
//!
//! An engine performs exactly one operation eagerly against a concrete
//! sequence. The pipeline drain calls it once per queued record.
//!
//! # Sequential callbacks
//!
//! Engines must await per-element callbacks one at a time, in ascending
//! index order, and never run them concurrently. Pipelines rely on this:
//! side effects inside callbacks are observed in the same order as a plain
//! loop would produce.

mod eager;
pub mod values;

pub use eager::EagerEngine;

use crate::errors::PipelineResult;
use crate::operation::Operation;
use async_trait::async_trait;
use serde_json::Value;

/// Result of a single engine operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A new sequence; the pipeline continues with it.
    Sequence(Vec<Value>),
    /// A terminal value; the pipeline is done.
    Value(Value),
    /// A single extracted element, or `None` when there was nothing to
    /// extract. Terminal, like [`Outcome::Value`].
    Element(Option<Value>),
}

impl Outcome {
    /// Unwraps to a plain value. Sequences become JSON arrays and a missing
    /// element becomes `null`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Sequence(items) => Value::Array(items),
            Self::Value(value) | Self::Element(Some(value)) => value,
            Self::Element(None) => Value::Null,
        }
    }

    /// Unwraps to an optional element.
    ///
    /// A plain `null` value from an engine that does not report elements
    /// separately counts as missing.
    #[must_use]
    pub fn into_element(self) -> Option<Value> {
        match self {
            Self::Element(element) => element,
            Self::Value(Value::Null) => None,
            other => Some(other.into_value()),
        }
    }

    /// Returns true if this is a sequence.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::Sequence(_))
    }
}

/// Performs single operations eagerly against an in-memory sequence.
///
/// Implementations must honour the sequential callback contract described
/// in the module docs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SequenceEngine: Send + Sync {
    /// Applies `operation` to `items`.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Step` when a callback fails and
    /// `PipelineError::Engine` when the operation is malformed.
    async fn invoke(&self, items: Vec<Value>, operation: Operation) -> PipelineResult<Outcome>;
}
