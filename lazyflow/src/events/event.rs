//! Typed pipeline lifecycle events.

use crate::errors::PipelineError;
use crate::utils::iso_timestamp;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Something that happened to a pipeline.
///
/// Serializes with a `type` field holding the event name, e.g.
/// `{"type": "pipeline.forked", "parent_id": "...", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    /// A drain is about to consume the queue.
    #[serde(rename = "pipeline.drain.started")]
    DrainStarted {
        /// Drained pipeline.
        pipeline_id: Uuid,
        /// Configured label, if any.
        label: Option<String>,
        /// Pending operation names, in execution order.
        pending: Vec<&'static str>,
        /// ISO 8601 time of the event.
        timestamp: String,
    },
    /// One operation finished successfully.
    #[serde(rename = "pipeline.operation.completed")]
    OperationCompleted {
        /// Drained pipeline.
        pipeline_id: Uuid,
        /// Operation name.
        operation: &'static str,
        /// Position of the operation within this drain.
        index: usize,
        /// Wall time spent in the engine.
        duration_ms: f64,
        /// Whether the result was a sequence rather than a terminal value.
        produced_sequence: bool,
        /// ISO 8601 time of the event.
        timestamp: String,
    },
    /// A drain consumed the whole queue.
    #[serde(rename = "pipeline.drain.completed")]
    DrainCompleted {
        /// Drained pipeline.
        pipeline_id: Uuid,
        /// Number of operations run.
        operations: usize,
        /// Wall time of the whole drain.
        duration_ms: f64,
        /// ISO 8601 time of the event.
        timestamp: String,
    },
    /// A drain stopped at a failing operation.
    #[serde(rename = "pipeline.drain.failed")]
    DrainFailed {
        /// Drained pipeline.
        pipeline_id: Uuid,
        /// Operation that failed.
        operation: &'static str,
        /// [`PipelineError::kind`] of the failure.
        error_type: &'static str,
        /// Rendered error message.
        error: String,
        /// Pending operations dropped after the failure.
        discarded: usize,
        /// ISO 8601 time of the event.
        timestamp: String,
    },
    /// A pipeline was forked.
    #[serde(rename = "pipeline.forked")]
    Forked {
        /// Source pipeline.
        parent_id: Uuid,
        /// The new fork.
        pipeline_id: Uuid,
        /// Pending operations copied into the fork.
        inherited_operations: usize,
        /// ISO 8601 time of the event.
        timestamp: String,
    },
}

impl PipelineEvent {
    /// A drain of `pipeline_id` is starting with `pending` operations.
    #[must_use]
    pub fn drain_started(pipeline_id: Uuid, label: Option<&str>, pending: Vec<&'static str>) -> Self {
        Self::DrainStarted {
            pipeline_id,
            label: label.map(str::to_owned),
            pending,
            timestamp: iso_timestamp(),
        }
    }

    /// Operation number `index` of a drain finished.
    #[must_use]
    pub fn operation_completed(
        pipeline_id: Uuid,
        operation: &'static str,
        index: usize,
        duration_ms: f64,
        produced_sequence: bool,
    ) -> Self {
        Self::OperationCompleted {
            pipeline_id,
            operation,
            index,
            duration_ms,
            produced_sequence,
            timestamp: iso_timestamp(),
        }
    }

    /// A drain ran `operations` operations to completion.
    #[must_use]
    pub fn drain_completed(pipeline_id: Uuid, operations: usize, duration_ms: f64) -> Self {
        Self::DrainCompleted {
            pipeline_id,
            operations,
            duration_ms,
            timestamp: iso_timestamp(),
        }
    }

    /// A drain failed at `operation`, dropping `discarded` pending records.
    #[must_use]
    pub fn drain_failed(pipeline_id: Uuid, operation: &'static str, error: &PipelineError, discarded: usize) -> Self {
        Self::DrainFailed {
            pipeline_id,
            operation,
            error_type: error.kind(),
            error: error.to_string(),
            discarded,
            timestamp: iso_timestamp(),
        }
    }

    /// `pipeline_id` was forked from `parent_id`.
    #[must_use]
    pub fn forked(parent_id: Uuid, pipeline_id: Uuid, inherited_operations: usize) -> Self {
        Self::Forked {
            parent_id,
            pipeline_id,
            inherited_operations,
            timestamp: iso_timestamp(),
        }
    }

    /// Returns the event name, one of the constants in [`crate::events`].
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::DrainStarted { .. } => super::DRAIN_STARTED,
            Self::OperationCompleted { .. } => super::OPERATION_COMPLETED,
            Self::DrainCompleted { .. } => super::DRAIN_COMPLETED,
            Self::DrainFailed { .. } => super::DRAIN_FAILED,
            Self::Forked { .. } => super::PIPELINE_FORKED,
        }
    }

    /// Returns the pipeline the event is about. For forks, that is the fork.
    #[must_use]
    pub fn pipeline_id(&self) -> Uuid {
        match self {
            Self::DrainStarted { pipeline_id, .. }
            | Self::OperationCompleted { pipeline_id, .. }
            | Self::DrainCompleted { pipeline_id, .. }
            | Self::DrainFailed { pipeline_id, .. }
            | Self::Forked { pipeline_id, .. } => *pipeline_id,
        }
    }

    /// Returns true for [`PipelineEvent::DrainFailed`].
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::DrainFailed { .. })
    }

    /// Converts to a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EngineError;
    use crate::events::{DRAIN_FAILED, PIPELINE_FORKED};
    use serde_json::json;

    #[test]
    fn test_json_carries_type_tag() {
        let id = Uuid::now_v7();
        let started = PipelineEvent::drain_started(id, Some("orders"), vec!["filter", "sum"]).to_json();

        assert_eq!(started["type"], json!("pipeline.drain.started"));
        assert_eq!(started["pending"], json!(["filter", "sum"]));
        assert_eq!(started["label"], json!("orders"));
        assert_eq!(started["pipeline_id"], json!(id.to_string()));
    }

    #[test]
    fn test_failure_event() {
        let id = Uuid::now_v7();
        let error = PipelineError::from(EngineError::invalid_argument("chunk", "size must be positive"));
        let event = PipelineEvent::drain_failed(id, "chunk", &error, 3);

        assert!(event.is_failure());
        assert_eq!(event.event_type(), DRAIN_FAILED);
        assert_eq!(event.to_json()["error_type"], json!("EngineFailure"));
        assert_eq!(event.to_json()["discarded"], json!(3));
    }

    #[test]
    fn test_fork_event_points_at_fork() {
        let parent = Uuid::now_v7();
        let fork = Uuid::now_v7();
        let event = PipelineEvent::forked(parent, fork, 2);

        assert_eq!(event.event_type(), PIPELINE_FORKED);
        assert_eq!(event.pipeline_id(), fork);
        assert_eq!(event.to_json()["parent_id"], json!(parent.to_string()));
    }
}
