//! Draining: running the queue, terminal methods, and `IntoFuture`.

use super::Pipeline;
use crate::engine::values::type_name;
use crate::engine::Outcome;
use crate::errors::{EngineError, PipelineError, PipelineResult};
use crate::events::PipelineEvent;
use crate::operation::{Effect, KeySelector, Needle, Operation, Predicate, Reducer};
use crate::utils::elapsed_ms;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use std::future::IntoFuture;
use std::time::Instant;
use tracing::{debug, debug_span, warn, Instrument};

impl Pipeline {
    /// Runs every pending operation and returns the result.
    ///
    /// Sequences come back as JSON arrays. After a successful drain the
    /// queue is empty and [`Pipeline::items`] holds the last sequence
    /// produced. On failure the remaining queue is discarded and the error
    /// is returned as is.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a callback or the engine.
    pub async fn all(&mut self) -> PipelineResult<Value> {
        self.resolve().await.map(Outcome::into_value)
    }

    /// Runs every pending operation and returns the last engine outcome.
    pub(crate) async fn resolve(&mut self) -> PipelineResult<Outcome> {
        let span = debug_span!(
            "pipeline.drain",
            pipeline_id = %self.id,
            label = self.config.label.as_deref().unwrap_or(""),
            pending = self.queue.len(),
        );
        self.drain().instrument(span).await
    }

    async fn drain(&mut self) -> PipelineResult<Outcome> {
        let started = Instant::now();
        self.sink
            .emit(PipelineEvent::drain_started(
                self.id,
                self.config.label.as_deref(),
                self.queue.methods(),
            ))
            .await;

        let mut current = Outcome::Sequence(self.items.clone());
        let mut completed = 0;

        while self.queue.is_not_empty() {
            let operation = self.queue.dequeue()?;
            let method = operation.method();
            let step_started = Instant::now();

            let result = match current {
                Outcome::Sequence(items) => self.engine.invoke(items, operation).await,
                terminal => Err(EngineError::not_a_sequence(method, type_name(&terminal.into_value())).into()),
            };

            match result {
                Ok(outcome) => {
                    let duration = elapsed_ms(step_started);
                    if let Outcome::Sequence(items) = &outcome {
                        self.items.clone_from(items);
                    }
                    debug!(operation = method, duration_ms = duration, "Operation completed");
                    if self.config.emit_operation_events {
                        self.sink
                            .emit(PipelineEvent::operation_completed(
                                self.id,
                                method,
                                completed,
                                duration,
                                outcome.is_sequence(),
                            ))
                            .await;
                    }
                    current = outcome;
                    completed += 1;
                }
                Err(error) => {
                    let discarded = self.queue.len();
                    self.queue.clear();
                    warn!(operation = method, error = %error, discarded, "Drain failed");
                    self.sink
                        .emit(PipelineEvent::drain_failed(self.id, method, &error, discarded))
                        .await;
                    return Err(error);
                }
            }
        }

        self.sink
            .emit(PipelineEvent::drain_completed(self.id, completed, elapsed_ms(started)))
            .await;
        Ok(current)
    }

    async fn terminal(&mut self, operation: Operation) -> PipelineResult<Value> {
        self.enqueue(operation);
        self.all().await
    }

    async fn extract(&mut self, operation: Operation) -> PipelineResult<Option<Value>> {
        self.enqueue(operation);
        self.resolve().await.map(Outcome::into_element)
    }

    /// Drains and returns the resulting sequence as a JSON array.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn to_json(&mut self) -> PipelineResult<Value> {
        self.terminal(Operation::ToJson).await
    }

    /// Drains and deserializes each element of the result into `T`.
    ///
    /// # Errors
    ///
    /// Returns the first drain error, or a serialization error if the
    /// result is not a sequence of `T`.
    pub async fn collect<T: DeserializeOwned>(&mut self) -> PipelineResult<Vec<T>> {
        let value = self.all().await?;
        if !value.is_array() {
            return Err(EngineError::type_mismatch("collect", "array", type_name(&value)).into());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Drains and returns the arithmetic mean, or `None` when empty.
    ///
    /// # Errors
    ///
    /// Fails if an element is not a number.
    pub async fn avg(&mut self) -> PipelineResult<Option<f64>> {
        let value = self.terminal(Operation::Avg).await?;
        optional_number("avg", value)
    }

    /// Drains and returns the median, or `None` when empty.
    ///
    /// # Errors
    ///
    /// Fails if an element is not a number.
    pub async fn median(&mut self) -> PipelineResult<Option<f64>> {
        let value = self.terminal(Operation::Median).await?;
        optional_number("median", value)
    }

    /// Drains and returns the sum; `0` when empty.
    ///
    /// # Errors
    ///
    /// Fails if an element is not a number.
    pub async fn sum(&mut self) -> PipelineResult<Number> {
        match self.terminal(Operation::Sum).await? {
            Value::Number(total) => Ok(total),
            other => Err(EngineError::type_mismatch("sum", "number", type_name(&other)).into()),
        }
    }

    /// Drains and returns the largest element.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn max(&mut self) -> PipelineResult<Option<Value>> {
        self.terminal(Operation::Max).await.map(non_null)
    }

    /// Drains and returns the smallest element.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn min(&mut self) -> PipelineResult<Option<Value>> {
        self.terminal(Operation::Min).await.map(non_null)
    }

    /// Drains and returns the number of elements.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn count(&mut self) -> PipelineResult<usize> {
        let value = self.terminal(Operation::Count(None)).await?;
        count_value("count", &value)
    }

    /// Drains and counts the elements `predicate` accepts.
    ///
    /// # Errors
    ///
    /// Returns the first drain or predicate error.
    pub async fn count_where(&mut self, predicate: Predicate) -> PipelineResult<usize> {
        let value = self
            .terminal(Operation::Count(Some(predicate)))
            .await?;
        count_value("count", &value)
    }

    /// Drains and returns the number of elements.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn size(&mut self) -> PipelineResult<usize> {
        let value = self.terminal(Operation::Size).await?;
        count_value("size", &value)
    }

    /// Drains and tells whether every element matches.
    ///
    /// # Errors
    ///
    /// Returns the first drain or predicate error.
    pub async fn every(&mut self, predicate: Predicate) -> PipelineResult<bool> {
        let value = self.terminal(Operation::Every(predicate)).await?;
        boolean("every", &value)
    }

    /// Drains and tells whether any element matches.
    ///
    /// # Errors
    ///
    /// Returns the first drain or predicate error.
    pub async fn some(&mut self, predicate: Predicate) -> PipelineResult<bool> {
        let value = self.terminal(Operation::Some(predicate)).await?;
        boolean("some", &value)
    }

    /// Drains and returns the first matching element.
    ///
    /// # Errors
    ///
    /// Returns the first drain or predicate error.
    pub async fn find(&mut self, predicate: Predicate) -> PipelineResult<Option<Value>> {
        self.extract(Operation::Find(predicate)).await
    }

    /// Drains and returns the first element.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn first(&mut self) -> PipelineResult<Option<Value>> {
        self.extract(Operation::First(None)).await
    }

    /// Drains and returns the first element `predicate` accepts.
    ///
    /// # Errors
    ///
    /// Returns the first drain or predicate error.
    pub async fn first_where(&mut self, predicate: Predicate) -> PipelineResult<Option<Value>> {
        self.extract(Operation::First(Some(predicate))).await
    }

    /// Drains and returns the last element.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn last(&mut self) -> PipelineResult<Option<Value>> {
        self.extract(Operation::Last(None)).await
    }

    /// Drains and returns the last element `predicate` accepts.
    ///
    /// # Errors
    ///
    /// Returns the first drain or predicate error.
    pub async fn last_where(&mut self, predicate: Predicate) -> PipelineResult<Option<Value>> {
        self.extract(Operation::Last(Some(predicate))).await
    }

    /// Drains and runs `effect` once per element, in order.
    ///
    /// # Errors
    ///
    /// Returns the first drain or effect error.
    pub async fn for_each(&mut self, effect: Effect) -> PipelineResult<()> {
        self.terminal(Operation::ForEach(effect)).await?;
        Ok(())
    }

    /// Drains and groups elements by key.
    ///
    /// # Errors
    ///
    /// Returns the first drain or key selector error.
    pub async fn group_by(&mut self, key: impl Into<KeySelector>) -> PipelineResult<Map<String, Value>> {
        match self
            .terminal(Operation::GroupBy(key.into()))
            .await?
        {
            Value::Object(groups) => Ok(groups),
            other => Err(EngineError::type_mismatch("groupBy", "object", type_name(&other)).into()),
        }
    }

    /// Drains and tells whether `value` is present.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn has(&mut self, value: Value) -> PipelineResult<bool> {
        let value = self
            .terminal(Operation::Has(Needle::Value(value)))
            .await?;
        boolean("has", &value)
    }

    /// Same as [`Pipeline::has`].
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn includes(&mut self, value: Value) -> PipelineResult<bool> {
        self.has(value).await
    }

    /// Drains and tells whether any element matches `predicate`.
    ///
    /// # Errors
    ///
    /// Returns the first drain or predicate error.
    pub async fn has_where(&mut self, predicate: Predicate) -> PipelineResult<bool> {
        let value = self
            .terminal(Operation::Has(Needle::Predicate(predicate)))
            .await?;
        boolean("has", &value)
    }

    /// Drains and tells whether any element occurs twice.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn has_duplicates(&mut self) -> PipelineResult<bool> {
        let value = self.terminal(Operation::HasDuplicates).await?;
        boolean("hasDuplicates", &value)
    }

    /// Drains and tells whether the result is empty.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn is_empty(&mut self) -> PipelineResult<bool> {
        let value = self.terminal(Operation::IsEmpty).await?;
        boolean("isEmpty", &value)
    }

    /// Drains and tells whether the result has elements.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn is_not_empty(&mut self) -> PipelineResult<bool> {
        let value = self.terminal(Operation::IsNotEmpty).await?;
        boolean("isNotEmpty", &value)
    }

    /// Drains and joins the elements' display forms.
    ///
    /// `None` uses the engine's configured separator.
    ///
    /// # Errors
    ///
    /// Returns the first drain error.
    pub async fn join(&mut self, separator: Option<&str>) -> PipelineResult<String> {
        let operation = Operation::Join(separator.map(str::to_owned));
        match self.terminal(operation).await? {
            Value::String(joined) => Ok(joined),
            other => Err(EngineError::type_mismatch("join", "string", type_name(&other)).into()),
        }
    }

    /// Drains and folds from the first element to the last.
    ///
    /// # Errors
    ///
    /// Returns the first drain or reducer error.
    pub async fn reduce(&mut self, reducer: Reducer, initial: Value) -> PipelineResult<Value> {
        self.terminal(Operation::Reduce { reducer, initial })
            .await
    }

    /// Drains and folds from the last element to the first.
    ///
    /// # Errors
    ///
    /// Returns the first drain or reducer error.
    pub async fn reduce_right(&mut self, reducer: Reducer, initial: Value) -> PipelineResult<Value> {
        self.terminal(Operation::ReduceRight { reducer, initial })
            .await
    }
}

impl IntoFuture for Pipeline {
    type Output = PipelineResult<Value>;
    type IntoFuture = BoxFuture<'static, PipelineResult<Value>>;

    fn into_future(mut self) -> Self::IntoFuture {
        Box::pin(async move { self.all().await })
    }
}

fn non_null(value: Value) -> Option<Value> {
    (!value.is_null()).then_some(value)
}

fn boolean(method: &str, value: &Value) -> PipelineResult<bool> {
    value
        .as_bool()
        .ok_or_else(|| EngineError::type_mismatch(method, "bool", type_name(value)).into())
}

fn count_value(method: &str, value: &Value) -> PipelineResult<usize> {
    value
        .as_u64()
        .and_then(|count| usize::try_from(count).ok())
        .ok_or_else(|| EngineError::type_mismatch(method, "unsigned integer", type_name(value)).into())
}

fn optional_number(method: &str, value: Value) -> PipelineResult<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => Ok(number.as_f64()),
        other => Err(PipelineError::from(EngineError::type_mismatch(
            method,
            "number",
            type_name(&other),
        ))),
    }
}
