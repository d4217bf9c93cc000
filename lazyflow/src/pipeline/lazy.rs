//! The pipeline object and its in-place chain methods.

use crate::config::PipelineConfig;
use crate::engine::{EagerEngine, SequenceEngine};
use crate::errors::PipelineResult;
use crate::events::{default_event_sink, EventSink, PipelineEvent};
use crate::operation::{Inspector, KeySelector, Mapper, Operation, Predicate};
use crate::queue::OperationQueue;
use crate::utils::generate_pipeline_id;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// A lazy, chainable sequence pipeline.
///
/// Chain methods only record operations; nothing runs until the pipeline is
/// drained by a terminal method, by [`Pipeline::all`], or by awaiting it.
/// The receiver of each method tells what it does to the queue:
///
/// - `fn op(self, ..) -> Self` appends in place,
/// - `fn op(&self, ..) -> Pipeline` forks and leaves this pipeline alone,
/// - `fn op(&mut self, ..)` forks and also queues a mutation here,
/// - `async fn op(&mut self, ..)` appends and drains.
///
/// ```rust,ignore
/// use lazyflow::prelude::*;
///
/// let total = Pipeline::new(vec![json!(1), json!(2), json!(3)])
///     .filter(Predicate::new(|v, _| async move { Ok(v.as_i64() > Some(1)) }))
///     .sum()
///     .await?;
/// ```
pub struct Pipeline {
    pub(crate) id: Uuid,
    pub(crate) parent_id: Option<Uuid>,
    pub(crate) items: Vec<Value>,
    pub(crate) queue: OperationQueue,
    pub(crate) engine: Arc<dyn SequenceEngine>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline over `items` with an empty queue.
    #[must_use]
    pub fn new(items: Vec<Value>) -> Self {
        Self::with_operations(items, Vec::new())
    }

    /// Creates a pipeline whose queue is pre-seeded with `operations`.
    #[must_use]
    pub fn with_operations(items: Vec<Value>, operations: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            id: generate_pipeline_id(),
            parent_id: None,
            items,
            queue: OperationQueue::from_operations(operations),
            engine: Arc::new(EagerEngine::new()),
            sink: default_event_sink(),
            config: PipelineConfig::default(),
        }
    }

    /// Creates a pipeline from serializable elements.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if an element cannot be converted.
    pub fn from_serialize<T: Serialize>(items: impl IntoIterator<Item = T>) -> PipelineResult<Self> {
        let values = items
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(values))
    }

    /// Replaces the engine.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn SequenceEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Replaces the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the config.
    #[must_use]
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the pipeline id.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the id of the pipeline this one was forked from.
    #[must_use]
    pub fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    /// Returns the most recently materialized items.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    /// Returns the names of the pending operations, in execution order.
    #[must_use]
    pub fn pending(&self) -> Vec<&'static str> {
        self.queue.methods()
    }

    /// Returns the number of pending operations.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Returns the config.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Creates an independent copy with the current items and queue.
    ///
    /// The fork shares the engine, event sink and callbacks, but appending
    /// to or draining either pipeline never affects the other.
    #[must_use]
    pub fn fork(&self) -> Self {
        let fork = Self {
            id: generate_pipeline_id(),
            parent_id: Some(self.id),
            items: self.items.clone(),
            queue: OperationQueue::from_operations(self.queue.to_list()),
            engine: Arc::clone(&self.engine),
            sink: Arc::clone(&self.sink),
            config: self.config.clone(),
        };
        debug!(parent = %self.id, fork = %fork.id, pending = fork.queue.len(), "Forked pipeline");
        self.sink
            .record(&PipelineEvent::forked(self.id, fork.id, fork.queue.len()));
        fork
    }

    pub(crate) fn enqueue(&mut self, operation: Operation) {
        self.queue.enqueue(operation);
    }

    fn then(mut self, operation: Operation) -> Self {
        self.enqueue(operation);
        self
    }

    /// Splits the sequence into arrays of `size` elements.
    #[must_use]
    pub fn chunk(self, size: usize) -> Self {
        self.then(Operation::Chunk { size })
    }

    /// Flattens one level of nesting.
    #[must_use]
    pub fn collapse(self) -> Self {
        self.then(Operation::Collapse)
    }

    /// Same as [`Pipeline::collapse`]: flattens exactly one level.
    #[must_use]
    pub fn flatten(self) -> Self {
        self.collapse()
    }

    /// Drops `null`, `false`, `0` and empty strings.
    #[must_use]
    pub fn compact(self) -> Self {
        self.then(Operation::Compact)
    }

    /// Keeps elements not present in `values`.
    #[must_use]
    pub fn diff(self, values: Vec<Value>) -> Self {
        self.then(Operation::Diff(values))
    }

    /// Keeps elements the predicate accepts.
    #[must_use]
    pub fn filter(self, predicate: Predicate) -> Self {
        self.then(Operation::Filter(predicate))
    }

    /// Filters only when `condition` holds.
    #[must_use]
    pub fn filter_if(self, condition: bool, predicate: Predicate) -> Self {
        self.then(Operation::FilterIf { condition, predicate })
    }

    /// Maps each element, then splices array results in one level.
    #[must_use]
    pub fn flat_map(self, mapper: Mapper) -> Self {
        self.then(Operation::FlatMap(mapper))
    }

    /// Keeps elements also present in `values`.
    #[must_use]
    pub fn intersect(self, values: Vec<Value>) -> Self {
        self.then(Operation::Intersect(values))
    }

    /// Transforms each element.
    #[must_use]
    pub fn map(self, mapper: Mapper) -> Self {
        self.then(Operation::Map(mapper))
    }

    /// Appends values at the end.
    #[must_use]
    pub fn push(self, values: Vec<Value>) -> Self {
        self.then(Operation::Push(values))
    }

    /// Drops elements the predicate accepts.
    #[must_use]
    pub fn reject(self, predicate: Predicate) -> Self {
        self.then(Operation::Reject(predicate))
    }

    /// Lets `inspector` observe the sequence at this point.
    #[must_use]
    pub fn tap(self, inspector: Inspector) -> Self {
        self.then(Operation::Tap(inspector))
    }

    /// Drops repeated elements, comparing whole values or the selected key.
    #[must_use]
    pub fn unique(self, key: Option<KeySelector>) -> Self {
        self.then(Operation::Unique(key))
    }

    /// Drops elements whose mapped key was already seen.
    #[must_use]
    pub fn unique_by(self, mapper: Mapper) -> Self {
        self.then(Operation::UniqueBy(mapper))
    }

    /// Prepends values at the start, in the given order.
    #[must_use]
    pub fn unshift(self, values: Vec<Value>) -> Self {
        self.then(Operation::Unshift(values))
    }
}

impl Clone for Pipeline {
    fn clone(&self) -> Self {
        self.fork()
    }
}

impl FromIterator<Value> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("label", &self.config.label)
            .field("items", &self.items.len())
            .field("pending", &self.queue.methods())
            .finish()
    }
}
