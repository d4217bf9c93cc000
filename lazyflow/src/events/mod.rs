//! Pipeline lifecycle events.
//!
//! Drains report what they do to the pipeline's [`EventSink`]. Pipelines
//! created without an explicit sink use the process-wide default, which is
//! a [`NoOpEventSink`] unless [`set_default_event_sink`] was called.

mod event;
mod sink;

pub use event::PipelineEvent;
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

use parking_lot::RwLock;
use std::sync::Arc;

/// A drain is about to consume the queue.
pub const DRAIN_STARTED: &str = "pipeline.drain.started";
/// One operation finished successfully.
pub const OPERATION_COMPLETED: &str = "pipeline.operation.completed";
/// A drain consumed the whole queue.
pub const DRAIN_COMPLETED: &str = "pipeline.drain.completed";
/// A drain stopped at a failing operation.
pub const DRAIN_FAILED: &str = "pipeline.drain.failed";
/// A pipeline was forked.
pub const PIPELINE_FORKED: &str = "pipeline.forked";

static DEFAULT_EVENT_SINK: RwLock<Option<Arc<dyn EventSink>>> = RwLock::new(None);

/// Sets the sink used by pipelines created without one.
pub fn set_default_event_sink(sink: Arc<dyn EventSink>) {
    *DEFAULT_EVENT_SINK.write() = Some(sink);
}

/// Restores the no-op default sink.
pub fn clear_default_event_sink() {
    *DEFAULT_EVENT_SINK.write() = None;
}

/// Gets the default sink.
pub fn default_event_sink() -> Arc<dyn EventSink> {
    DEFAULT_EVENT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(NoOpEventSink))
}
