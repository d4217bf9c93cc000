//! Operations that hand back a fork.
//!
//! A fork starts from the source's items and pending operations and then
//! diverges. Some of these also queue the complementary mutation on the
//! source, so that e.g. a popped element is gone from the source once it is
//! drained.

use super::Pipeline;
use crate::engine::Outcome;
use crate::errors::PipelineResult;
use crate::operation::{Comparator, Operation};
use serde_json::Value;
use std::future::Future;

impl Pipeline {
    fn fork_with(&self, operation: Operation) -> Self {
        let mut fork = self.fork();
        fork.enqueue(operation);
        fork
    }

    /// Forks and appends `values` to the fork, splicing arrays one level.
    #[must_use]
    pub fn concat(&self, values: Vec<Value>) -> Self {
        self.fork_with(Operation::Concat(values))
    }

    /// Forks and appends `values`, then drops duplicates on the fork.
    #[must_use]
    pub fn union(&self, values: Vec<Value>) -> Self {
        let mut fork = self.concat(values);
        fork.enqueue(Operation::Unique(None));
        fork
    }

    /// Forks and reverses the fork.
    #[must_use]
    pub fn reverse(&self) -> Self {
        self.fork_with(Operation::Reverse)
    }

    /// Forks and sorts the fork, by `comparator` or natural order.
    #[must_use]
    pub fn sort(&self, comparator: Option<Comparator>) -> Self {
        self.fork_with(Operation::Sort(comparator))
    }

    /// Forks and keeps `limit` elements from `start` on the fork.
    ///
    /// A negative `start` counts from the end; `None` keeps the rest.
    #[must_use]
    pub fn slice(&self, start: i64, limit: Option<usize>) -> Self {
        self.fork_with(Operation::Slice { start, limit })
    }

    /// Forks and replaces each element with the values at `keys`, flattened
    /// one level.
    #[must_use]
    pub fn pluck<K, I>(&self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut fork = self.fork_with(Operation::Pluck(keys.into_iter().map(Into::into).collect()));
        fork.enqueue(Operation::Collapse);
        fork
    }

    /// Forks and keeps the first `limit` elements, or the last `-limit`.
    #[must_use]
    pub fn take(&self, limit: i64) -> Self {
        if limit < 0 {
            self.slice(limit, None)
        } else {
            self.slice(0, Some(usize::try_from(limit).unwrap_or(usize::MAX)))
        }
    }

    /// Returns a fork holding the elements [`Pipeline::take`] would, and
    /// removes them from this pipeline.
    #[must_use]
    pub fn take_and_remove(&mut self, limit: i64) -> Self {
        let fork = self.take(limit);
        self.enqueue(Operation::TakeAndRemove(limit));
        fork
    }

    /// Returns a fork holding the window from `start`, and queues the
    /// removal plus `inserts` on this pipeline.
    ///
    /// A `limit` of `None` or `Some(0)` gives the fork the rest of the
    /// sequence. On this pipeline `Some(0)` removes nothing and only inserts.
    #[must_use]
    pub fn splice(&mut self, start: i64, limit: Option<usize>, inserts: Vec<Value>) -> Self {
        let fork = self.slice(start, limit.filter(|&count| count != 0));
        self.enqueue(Operation::Splice { start, limit, inserts });
        fork
    }

    /// Removes and resolves to the last element, or `None` when empty.
    ///
    /// The removal is queued on this pipeline before the future is returned,
    /// so it applies even if the future is never awaited.
    pub fn pop(&mut self) -> impl Future<Output = PipelineResult<Option<Value>>> + Send + 'static {
        self.extract_forked(-1, Operation::Pop)
    }

    /// Removes and resolves to the first element. See [`Pipeline::pop`].
    pub fn shift(&mut self) -> impl Future<Output = PipelineResult<Option<Value>>> + Send + 'static {
        self.extract_forked(0, Operation::Shift)
    }

    fn extract_forked(
        &mut self,
        start: i64,
        operation: Operation,
    ) -> impl Future<Output = PipelineResult<Option<Value>>> + Send + 'static {
        let mut fork = self.fork_with(operation);
        self.enqueue(Operation::Splice {
            start,
            limit: Some(1),
            inserts: Vec::new(),
        });
        async move { fork.resolve().await.map(Outcome::into_element) }
    }
}
