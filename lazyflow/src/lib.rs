//! # Lazyflow
//!
//! Deferred, chainable pipelines over in-memory sequences with async step
//! functions.
//!
//! Lazyflow provides:
//!
//! - **Deferred execution**: chain methods only record operations
//! - **Fork semantics**: derived views and mutating extractions stay correct
//!   while nothing has run yet
//! - **Sequential callbacks**: step functions are awaited one at a time, in
//!   element order
//! - **Pluggable engines**: every operation is dispatched to a
//!   [`engine::SequenceEngine`]
//! - **Lifecycle events**: drains report to an [`events::EventSink`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lazyflow::prelude::*;
//!
//! let mut orders = Pipeline::from_serialize(load_orders())?
//!     .filter(Predicate::new(|order, _| async move { is_open(&order).await }))
//!     .map(Mapper::from_fn(|order| order["total"].clone()));
//!
//! let largest = orders.take(3);
//! let total = orders.sum().await?;
//! let top = largest.sort(None).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod operation;
pub mod pipeline;
pub mod queue;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{EngineConfig, PipelineConfig, SortMode};
    pub use crate::engine::{EagerEngine, Outcome, SequenceEngine};
    pub use crate::errors::{EmptyQueueError, EngineError, PipelineError, PipelineResult};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent};
    pub use crate::operation::{
        Comparator, Effect, Inspector, KeySelector, Mapper, Needle, Operation, Predicate, Reducer, StepResult,
    };
    pub use crate::pipeline::Pipeline;
    pub use crate::queue::OperationQueue;
    pub use serde_json::{json, Value};
}
