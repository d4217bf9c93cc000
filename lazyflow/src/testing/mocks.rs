//! Engine doubles.

use crate::engine::{EagerEngine, Outcome, SequenceEngine};
use crate::errors::{EngineError, PipelineResult};
use crate::operation::Operation;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// Forwards to an inner engine and records each dispatched method name.
///
/// Methods listed in `rejected` are recorded but answered with
/// [`EngineError::UnsupportedOperation`] instead of being forwarded.
pub struct RecordingEngine {
    inner: Arc<dyn SequenceEngine>,
    rejected: Vec<&'static str>,
    methods: Mutex<Vec<&'static str>>,
}

impl RecordingEngine {
    /// Wraps the default [`EagerEngine`].
    #[must_use]
    pub fn new() -> Self {
        Self::wrapping(Arc::new(EagerEngine::new()))
    }

    /// Wraps `inner`.
    #[must_use]
    pub fn wrapping(inner: Arc<dyn SequenceEngine>) -> Self {
        Self {
            inner,
            rejected: Vec::new(),
            methods: Mutex::new(Vec::new()),
        }
    }

    /// Wraps the default engine and rejects the named methods as unsupported.
    #[must_use]
    pub fn rejecting(methods: &[&'static str]) -> Self {
        Self {
            rejected: methods.to_vec(),
            ..Self::new()
        }
    }

    /// Returns dispatched method names, in order.
    #[must_use]
    pub fn methods(&self) -> Vec<&'static str> {
        self.methods.lock().clone()
    }

    /// Returns the number of dispatched operations.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.methods.lock().len()
    }

    /// Clears the recorded methods.
    pub fn reset(&self) {
        self.methods.lock().clear();
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SequenceEngine for RecordingEngine {
    async fn invoke(&self, items: Vec<Value>, operation: Operation) -> PipelineResult<Outcome> {
        let method = operation.method();
        self.methods.lock().push(method);
        if self.rejected.contains(&method) {
            return Err(EngineError::unsupported(method).into());
        }
        self.inner.invoke(items, operation).await
    }
}
