//! Destinations for pipeline events.

use super::PipelineEvent;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info, trace, warn, Level};
use uuid::Uuid;

/// Receives pipeline lifecycle events.
///
/// Drains deliver their events through [`EventSink::emit`] and await it.
/// Forking happens in synchronous code and goes through
/// [`EventSink::record`] directly.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Records an event. Must not block or fail.
    fn record(&self, event: &PipelineEvent);

    /// Delivers an event from a drain. Defaults to [`EventSink::record`].
    async fn emit(&self, event: PipelineEvent) {
        self.record(&event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn record(&self, _event: &PipelineEvent) {}
}

/// Writes events to `tracing`.
///
/// Failed drains are always logged at `WARN`; everything else at the
/// configured level.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::DEBUG }
    }
}

impl LoggingEventSink {
    /// Logs non-failure events at `level`.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl EventSink for LoggingEventSink {
    fn record(&self, event: &PipelineEvent) {
        let name = event.event_type();
        let pipeline_id = event.pipeline_id();
        let data = event.to_json();
        if event.is_failure() {
            warn!(event = name, %pipeline_id, %data, "Pipeline event");
            return;
        }
        match self.level {
            Level::TRACE => trace!(event = name, %pipeline_id, %data, "Pipeline event"),
            Level::DEBUG => debug!(event = name, %pipeline_id, %data, "Pipeline event"),
            _ => info!(event = name, %pipeline_id, %data, "Pipeline event"),
        }
    }
}

/// Keeps every event in memory; meant for tests.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every event, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().clone()
    }

    /// Returns the event names, oldest first.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(PipelineEvent::event_type).collect()
    }

    /// Returns the failed-drain events.
    #[must_use]
    pub fn failures(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.is_failure())
            .cloned()
            .collect()
    }

    /// Returns the events about one pipeline.
    #[must_use]
    pub fn for_pipeline(&self, pipeline_id: Uuid) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.pipeline_id() == pipeline_id)
            .cloned()
            .collect()
    }

    /// Returns the number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drops every event.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for CollectingEventSink {
    fn record(&self, event: &PipelineEvent) {
        self.events.lock().push(event.clone());
    }
}
