//! Testing utilities for lazyflow pipelines.
//!
//! This module provides:
//! - A shared call recorder for observing callback order
//! - Callback builders that fail or sleep on demand
//! - An engine wrapper that records dispatched operations

mod mocks;
mod recorders;

pub use mocks::RecordingEngine;
pub use recorders::{delayed_effect, failing_predicate, recording_mapper, CallRecorder};

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber.
///
/// Honours `RUST_LOG` and falls back to `lazyflow=debug`. Safe to call from
/// every test; only the first call installs anything.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lazyflow=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
