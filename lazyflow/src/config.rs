//! Configuration for engines and pipelines.

use crate::errors::PipelineResult;
use serde::{Deserialize, Serialize};

/// How `sort` orders elements when no comparator is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Numbers numerically, strings lexicographically, mixed types by kind.
    #[default]
    Natural,
    /// Compare the string forms of the elements.
    Lexicographic,
}

/// Configuration for the eager engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Separator used by `join` when none is given.
    pub join_separator: String,
    /// Default ordering for `sort`.
    pub sort_mode: SortMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            join_separator: ",".to_string(),
            sort_mode: SortMode::Natural,
        }
    }
}

impl EngineConfig {
    /// Creates a new engine config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default join separator.
    #[must_use]
    pub fn with_join_separator(mut self, separator: impl Into<String>) -> Self {
        self.join_separator = separator.into();
        self
    }

    /// Sets the default sort mode.
    #[must_use]
    pub fn with_sort_mode(mut self, mode: SortMode) -> Self {
        self.sort_mode = mode;
        self
    }

    /// Parses a config from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the JSON is malformed.
    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Configuration for a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Label attached to drain spans and events.
    pub label: Option<String>,
    /// Whether to report an event after every operation.
    pub emit_operation_events: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            label: None,
            emit_operation_events: true,
        }
    }
}

impl PipelineConfig {
    /// Creates a new pipeline config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Enables or disables per-operation events.
    #[must_use]
    pub fn with_operation_events(mut self, enabled: bool) -> Self {
        self.emit_operation_events = enabled;
        self
    }

    /// Parses a config from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the JSON is malformed.
    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
