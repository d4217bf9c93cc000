//! Lazy pipelines over JSON sequences.
//!
//! This module provides:
//! - [`Pipeline`], the chainable, deferred sequence type
//! - Fork operations that copy the pending queue
//! - The drain loop behind every terminal method and `.await`

mod drain;
mod fork;
mod lazy;

#[cfg(test)]
mod integration_tests;

pub use lazy::Pipeline;
