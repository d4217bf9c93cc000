//! FIFO queue of pending operations.

use crate::errors::EmptyQueueError;
use crate::operation::Operation;
use std::collections::VecDeque;

/// An ordered list of pending operations.
///
/// Insertion order is execution order. Records are never reordered or
/// deduplicated.
#[derive(Debug, Clone, Default)]
pub struct OperationQueue {
    records: VecDeque<Operation>,
}

impl OperationQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a queue pre-seeded with operations, in order.
    #[must_use]
    pub fn from_operations(operations: impl IntoIterator<Item = Operation>) -> Self {
        Self {
            records: operations.into_iter().collect(),
        }
    }

    /// Appends an operation to the tail.
    pub fn enqueue(&mut self, operation: Operation) {
        self.records.push_back(operation);
    }

    /// Removes and returns the head.
    ///
    /// # Errors
    ///
    /// Returns `EmptyQueueError` if there is nothing to dequeue.
    pub fn dequeue(&mut self) -> Result<Operation, EmptyQueueError> {
        self.records.pop_front().ok_or(EmptyQueueError)
    }

    /// Returns true if no operations are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns true if at least one operation is pending.
    #[must_use]
    pub fn is_not_empty(&self) -> bool {
        !self.is_empty()
    }

    /// Returns the number of pending operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns a copy of the pending operations without consuming them.
    #[must_use]
    pub fn to_list(&self) -> Vec<Operation> {
        self.records.iter().cloned().collect()
    }

    /// Returns the names of the pending operations.
    #[must_use]
    pub fn methods(&self) -> Vec<&'static str> {
        self.records.iter().map(Operation::method).collect()
    }

    /// Discards all pending operations.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}
