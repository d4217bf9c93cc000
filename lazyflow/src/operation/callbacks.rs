//! User-supplied step functions.
//!
//! Every callback is stored behind an `Arc` so that cloning an operation
//! record (as forking does) shares the closure without sharing any mutable
//! state. Callbacks are async and fallible; the engine awaits them one at a
//! time.

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Result type returned by step functions.
pub type StepResult<T> = anyhow::Result<T>;

type StepFuture<T> = BoxFuture<'static, StepResult<T>>;

/// Decides whether an element matches. Receives the element and its index.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(Value, usize) -> StepFuture<bool> + Send + Sync>);

impl Predicate {
    /// Creates a predicate from an async closure.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Value, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult<bool>> + Send + 'static,
    {
        Self(Arc::new(move |value, index| func(value, index).boxed()))
    }

    /// Creates an infallible predicate from a plain closure.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::new(move |value, _| future::ready(Ok(func(&value))))
    }

    /// Invokes the predicate.
    pub async fn call(&self, value: Value, index: usize) -> StepResult<bool> {
        (self.0)(value, index).await
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Transforms an element. Receives the element and its index.
#[derive(Clone)]
pub struct Mapper(Arc<dyn Fn(Value, usize) -> StepFuture<Value> + Send + Sync>);

impl Mapper {
    /// Creates a mapper from an async closure.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Value, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult<Value>> + Send + 'static,
    {
        Self(Arc::new(move |value, index| func(value, index).boxed()))
    }

    /// Creates an infallible mapper from a plain closure.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::new(move |value, _| future::ready(Ok(func(value))))
    }

    /// Invokes the mapper.
    pub async fn call(&self, value: Value, index: usize) -> StepResult<Value> {
        (self.0)(value, index).await
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Mapper(..)")
    }
}

/// Folds an element into an accumulator: `(carry, element, index)`.
#[derive(Clone)]
pub struct Reducer(Arc<dyn Fn(Value, Value, usize) -> StepFuture<Value> + Send + Sync>);

impl Reducer {
    /// Creates a reducer from an async closure.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Value, Value, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult<Value>> + Send + 'static,
    {
        Self(Arc::new(move |carry, value, index| func(carry, value, index).boxed()))
    }

    /// Creates an infallible reducer from a plain closure.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(Value, Value) -> Value + Send + Sync + 'static,
    {
        Self::new(move |carry, value, _| future::ready(Ok(func(carry, value))))
    }

    /// Invokes the reducer.
    pub async fn call(&self, carry: Value, value: Value, index: usize) -> StepResult<Value> {
        (self.0)(carry, value, index).await
    }
}

impl fmt::Debug for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reducer(..)")
    }
}

/// Orders two elements.
#[derive(Clone)]
pub struct Comparator(Arc<dyn Fn(Value, Value) -> StepFuture<Ordering> + Send + Sync>);

impl Comparator {
    /// Creates a comparator from an async closure.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult<Ordering>> + Send + 'static,
    {
        Self(Arc::new(move |left, right| func(left, right).boxed()))
    }

    /// Creates an infallible comparator from a plain closure.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        Self::new(move |left, right| future::ready(Ok(func(&left, &right))))
    }

    /// Invokes the comparator.
    pub async fn call(&self, left: Value, right: Value) -> StepResult<Ordering> {
        (self.0)(left, right).await
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Comparator(..)")
    }
}

/// Runs a side effect for one element.
#[derive(Clone)]
pub struct Effect(Arc<dyn Fn(Value, usize) -> StepFuture<()> + Send + Sync>);

impl Effect {
    /// Creates an effect from an async closure.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Value, usize) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult<()>> + Send + 'static,
    {
        Self(Arc::new(move |value, index| func(value, index).boxed()))
    }

    /// Creates an infallible effect from a plain closure.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(Value, usize) + Send + Sync + 'static,
    {
        Self::new(move |value, index| {
            func(value, index);
            future::ready(Ok(()))
        })
    }

    /// Invokes the effect.
    pub async fn call(&self, value: Value, index: usize) -> StepResult<()> {
        (self.0)(value, index).await
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Effect(..)")
    }
}

/// Observes the whole materialized sequence without changing it.
#[derive(Clone)]
pub struct Inspector(Arc<dyn Fn(Vec<Value>) -> StepFuture<()> + Send + Sync>);

impl Inspector {
    /// Creates an inspector from an async closure.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = StepResult<()>> + Send + 'static,
    {
        Self(Arc::new(move |items| func(items).boxed()))
    }

    /// Creates an infallible inspector from a plain closure.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        Self::new(move |items| {
            func(&items);
            future::ready(Ok(()))
        })
    }

    /// Invokes the inspector.
    pub async fn call(&self, items: Vec<Value>) -> StepResult<()> {
        (self.0)(items).await
    }
}

impl fmt::Debug for Inspector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Inspector(..)")
    }
}

/// Selects a grouping or uniqueness key for an element.
#[derive(Debug, Clone)]
pub enum KeySelector {
    /// Use the value of an object field.
    Field(String),
    /// Compute the key with a mapper.
    Callback(Mapper),
}

impl KeySelector {
    /// Selects an object field.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }
}

impl From<&str> for KeySelector {
    fn from(name: &str) -> Self {
        Self::Field(name.to_string())
    }
}

impl From<Mapper> for KeySelector {
    fn from(mapper: Mapper) -> Self {
        Self::Callback(mapper)
    }
}

/// What `has` looks for: a concrete value or any element matching a predicate.
#[derive(Debug, Clone)]
pub enum Needle {
    /// Match elements equal to this value.
    Value(Value),
    /// Match elements accepted by this predicate.
    Predicate(Predicate),
}
