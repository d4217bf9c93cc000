//! Utility functions for pipeline ids and timestamps.

mod ids;
pub mod timestamps;

pub use ids::generate_pipeline_id;
pub use timestamps::{elapsed_ms, iso_timestamp, now_utc, Timestamp};
