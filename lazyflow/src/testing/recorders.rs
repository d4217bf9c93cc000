//! Call recording helpers for callback ordering tests.

use crate::operation::{Effect, Mapper, Predicate};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A cloneable, shared log of callback activity.
#[derive(Debug, Clone, Default)]
pub struct CallRecorder {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns all entries in recording order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Returns entries starting with `prefix`.
    #[must_use]
    pub fn entries_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Clears all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

/// A predicate that records `filter:{index}`, accepts every element, and
/// fails at `fail_at`.
#[must_use]
pub fn failing_predicate(fail_at: usize, recorder: CallRecorder) -> Predicate {
    Predicate::new(move |_, index| {
        let recorder = recorder.clone();
        async move {
            recorder.record(format!("filter:{index}"));
            if index == fail_at {
                anyhow::bail!("predicate failed at index {index}");
            }
            Ok(true)
        }
    })
}

/// A mapper that records `map:{index}` and returns the element unchanged.
#[must_use]
pub fn recording_mapper(recorder: CallRecorder) -> Mapper {
    Mapper::new(move |value, index| {
        let recorder = recorder.clone();
        async move {
            recorder.record(format!("map:{index}"));
            Ok(value)
        }
    })
}

/// An effect that records `start:{index}`, sleeps for `delay(index)`, then
/// records `end:{index}`.
#[must_use]
pub fn delayed_effect<D>(recorder: CallRecorder, delay: D) -> Effect
where
    D: Fn(usize) -> Duration + Send + Sync + 'static,
{
    Effect::new(move |_, index| {
        let recorder = recorder.clone();
        let pause = delay(index);
        async move {
            recorder.record(format!("start:{index}"));
            tokio::time::sleep(pause).await;
            recorder.record(format!("end:{index}"));
            Ok(())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_recorder_is_shared_between_clones() {
        let recorder = CallRecorder::new();
        let other = recorder.clone();
        other.record("a");
        recorder.record("b");

        assert_eq!(recorder.entries(), vec!["a", "b"]);
        assert_eq!(recorder.entries_with_prefix("b").len(), 1);

        recorder.clear();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_failing_predicate() {
        let recorder = CallRecorder::new();
        let predicate = failing_predicate(1, recorder.clone());

        assert!(predicate.call(json!(1), 0).await.unwrap());
        assert!(predicate.call(json!(2), 1).await.is_err());
        assert_eq!(recorder.entries(), vec!["filter:0", "filter:1"]);
    }

    #[tokio::test]
    async fn test_delayed_effect_records_both_edges() {
        let recorder = CallRecorder::new();
        let effect = delayed_effect(recorder.clone(), |_| Duration::from_millis(1));

        effect.call(json!(null), 4).await.unwrap();
        assert_eq!(recorder.entries(), vec!["start:4", "end:4"]);
    }
}
