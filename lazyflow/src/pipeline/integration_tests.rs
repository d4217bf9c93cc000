//! End-to-end behaviour of pipelines against the eager engine and doubles.

use super::Pipeline;
use crate::config::{EngineConfig, PipelineConfig, SortMode};
use crate::engine::{EagerEngine, MockSequenceEngine, Outcome};
use crate::errors::{EngineError, PipelineError};
use crate::events::{
    CollectingEventSink, PipelineEvent, DRAIN_COMPLETED, DRAIN_FAILED, DRAIN_STARTED, OPERATION_COMPLETED,
    PIPELINE_FORKED,
};
use crate::operation::{Comparator, Effect, Inspector, KeySelector, Mapper, Operation, Predicate, Reducer};
use crate::testing::{
    delayed_effect, failing_predicate, init_test_tracing, recording_mapper, CallRecorder, RecordingEngine,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn numbers(values: &[i64]) -> Pipeline {
    Pipeline::new(values.iter().map(|n| json!(n)).collect())
}

fn int(value: &Value) -> i64 {
    value.as_i64().unwrap_or_default()
}

#[tokio::test]
async fn test_chain_matches_plain_iteration() {
    init_test_tracing();
    let input: Vec<i64> = (1..=20).collect();

    let expected: i64 = input
        .iter()
        .filter(|n| *n % 3 != 0)
        .map(|n| n * n)
        .filter(|n| *n > 10)
        .sum();

    let total = numbers(&input)
        .reject(Predicate::from_fn(|v| int(v) % 3 == 0))
        .map(Mapper::from_fn(|v| json!(int(&v) * int(&v))))
        .filter(Predicate::new(|v, _| async move { Ok(int(&v) > 10) }))
        .sum()
        .await
        .unwrap();

    assert_eq!(total.as_i64(), Some(expected));
}

#[tokio::test]
async fn test_clone_isolation() {
    let original = numbers(&[1, 2, 3]);
    let copy = original.clone().push(vec![json!(4)]);
    let original = original.map(Mapper::from_fn(|v| json!(int(&v) * 2)));

    assert_eq!(copy.await.unwrap(), json!([1, 2, 3, 4]));
    assert_eq!(original.await.unwrap(), json!([2, 4, 6]));
}

#[tokio::test]
async fn test_fork_inherits_pending_operations() {
    let source = numbers(&[1, 2, 3, 4]).filter(Predicate::from_fn(|v| int(v) % 2 == 0));
    let reversed = source.reverse();

    assert_eq!(reversed.await.unwrap(), json!([4, 2]));
    assert_eq!(source.await.unwrap(), json!([2, 4]));
}

#[tokio::test]
async fn test_pop_and_shift() {
    let mut popped = numbers(&[1, 2, 3]);
    assert_eq!(popped.pop().await.unwrap(), Some(json!(3)));
    assert_eq!(popped.to_json().await.unwrap(), json!([1, 2]));

    let mut shifted = numbers(&[1, 2, 3]);
    assert_eq!(shifted.shift().await.unwrap(), Some(json!(1)));
    assert_eq!(shifted.to_json().await.unwrap(), json!([2, 3]));
}

#[tokio::test]
async fn test_pop_sees_earlier_chain() {
    let mut source = numbers(&[1, 2, 3, 4]).map(Mapper::from_fn(|v| json!(int(&v) + 10)));
    assert_eq!(source.pop().await.unwrap(), Some(json!(14)));
    assert_eq!(source.all().await.unwrap(), json!([11, 12, 13]));
}

#[tokio::test]
async fn test_splice_splits_fork_and_source() {
    let mut source = numbers(&[1, 2, 3]);
    let removed = source.splice(1, Some(1), vec![json!("x")]);

    assert_eq!(removed.await.unwrap(), json!([2]));
    assert_eq!(source.all().await.unwrap(), json!([1, "x", 3]));
}

#[tokio::test]
async fn test_splice_without_limit_takes_rest() {
    let mut source = numbers(&[1, 2, 3, 4]);
    let removed = source.splice(-3, None, Vec::new());

    assert_eq!(removed.await.unwrap(), json!([2, 3, 4]));
    assert_eq!(source.all().await.unwrap(), json!([1]));
}

#[tokio::test]
async fn test_splice_zero_limit_forks_rest_and_only_inserts() {
    let mut source = numbers(&[1, 2, 3]);
    let rest = source.splice(1, Some(0), vec![json!(9)]);

    assert_eq!(rest.await.unwrap(), json!([2, 3]));
    assert_eq!(source.all().await.unwrap(), json!([1, 9, 2, 3]));
}

#[tokio::test]
async fn test_null_elements_are_not_absence() {
    let mut source = Pipeline::new(vec![json!(null), json!(1), json!(null)]);
    assert_eq!(source.first().await.unwrap(), Some(json!(null)));
    assert_eq!(source.find(Predicate::from_fn(Value::is_null)).await.unwrap(), Some(json!(null)));
    assert_eq!(source.pop().await.unwrap(), Some(json!(null)));
    assert_eq!(source.shift().await.unwrap(), Some(json!(null)));
    assert_eq!(source.to_json().await.unwrap(), json!([1]));

    let mut empty = Pipeline::new(Vec::new());
    assert_eq!(empty.first().await.unwrap(), None);
    assert_eq!(empty.pop().await.unwrap(), None);
}

#[tokio::test]
async fn test_take_leaves_source_intact() {
    let source = numbers(&[1, 2, 3, 4]);
    assert_eq!(source.take(2).await.unwrap(), json!([1, 2]));
    assert_eq!(source.take(-2).await.unwrap(), json!([3, 4]));
    assert_eq!(source.await.unwrap(), json!([1, 2, 3, 4]));
}

#[tokio::test]
async fn test_take_and_remove() {
    let mut source = numbers(&[1, 2, 3, 4, 5]);
    let head = source.take_and_remove(2);
    let mut tail = source.take_and_remove(-1);

    assert_eq!(head.await.unwrap(), json!([1, 2]));
    assert_eq!(tail.all().await.unwrap(), json!([5]));
    assert_eq!(source.all().await.unwrap(), json!([3, 4]));
}

#[tokio::test]
async fn test_failing_predicate_stops_drain() {
    let recorder = CallRecorder::new();
    let mut pipeline = numbers(&[1, 2, 3])
        .filter(failing_predicate(1, recorder.clone()))
        .map(recording_mapper(recorder.clone()));

    let error = assert_err!(pipeline.all().await);

    assert!(error.is_step());
    assert_eq!(error.to_string(), "predicate failed at index 1");
    assert_eq!(recorder.entries(), vec!["filter:0", "filter:1"]);
    assert!(recorder.entries_with_prefix("map:").is_empty());
    assert_eq!(pipeline.pending_len(), 0);

    // The queue was discarded, so the next drain returns the untouched items.
    assert_eq!(assert_ok!(pipeline.all().await), json!([1, 2, 3]));
}

#[tokio::test]
async fn test_step_error_keeps_its_source() {
    #[derive(Debug, thiserror::Error)]
    #[error("lookup failed for {0}")]
    struct LookupError(i64);

    let mut pipeline = numbers(&[7]).map(Mapper::new(|v, _| async move {
        Err::<Value, _>(LookupError(int(&v)).into())
    }));

    let error = pipeline.all().await.unwrap_err();
    let step = error.as_step().expect("step error");
    assert_eq!(step.downcast_ref::<LookupError>().map(|e| e.0), Some(7));
}

#[tokio::test(start_paused = true)]
async fn test_for_each_runs_sequentially() {
    let recorder = CallRecorder::new();
    let effect = delayed_effect(recorder.clone(), |index| Duration::from_millis(50 - 10 * index as u64));

    numbers(&[1, 2, 3, 4]).for_each(effect).await.unwrap();

    assert_eq!(
        recorder.entries(),
        vec!["start:0", "end:0", "start:1", "end:1", "start:2", "end:2", "start:3", "end:3"]
    );
}

#[tokio::test]
async fn test_map_callbacks_see_ascending_indices() {
    let recorder = CallRecorder::new();
    numbers(&[5, 6, 7])
        .map(recording_mapper(recorder.clone()))
        .to_json()
        .await
        .unwrap();

    assert_eq!(recorder.entries(), vec!["map:0", "map:1", "map:2"]);
}

#[tokio::test]
async fn test_await_equals_all() {
    let build = || numbers(&[3, 1, 2]).sort(None).map(Mapper::from_fn(|v| json!(int(&v) + 1)));
    let mut explicit = build();
    assert_eq!(build().await.unwrap(), explicit.all().await.unwrap());

    let failing = || numbers(&[1]).filter(failing_predicate(0, CallRecorder::new()));
    let mut explicit = failing();
    let awaited = failing().await.unwrap_err();
    let drained = explicit.all().await.unwrap_err();
    assert_eq!(awaited.to_string(), drained.to_string());
    assert_eq!(awaited.kind(), drained.kind());
}

#[tokio::test]
async fn test_custom_comparator_sort() {
    let descending = Comparator::from_fn(|a, b| int(b).cmp(&int(a)));
    let source = numbers(&[2, 9, 4]);
    assert_eq!(source.sort(Some(descending)).await.unwrap(), json!([9, 4, 2]));
    assert_eq!(source.await.unwrap(), json!([2, 9, 4]));
}

#[tokio::test]
async fn test_lexicographic_sort_mode() {
    let engine = EagerEngine::with_config(EngineConfig::new().with_sort_mode(SortMode::Lexicographic));
    let source = numbers(&[10, 9, 1]).with_engine(Arc::new(engine));
    assert_eq!(source.sort(None).await.unwrap(), json!([1, 10, 9]));
}

#[tokio::test]
async fn test_pluck_and_union() {
    let rows = Pipeline::new(vec![json!({"id": 1, "tag": "a"}), json!({"id": 2, "tag": "b"})]);
    assert_eq!(rows.pluck(["id"]).await.unwrap(), json!([1, 2]));
    assert_eq!(rows.pluck(["id", "tag"]).await.unwrap(), json!([1, "a", 2, "b"]));

    let merged = numbers(&[1, 2]).union(vec![json!(2), json!([3, 1])]);
    assert_eq!(merged.await.unwrap(), json!([1, 2, 3]));
}

#[tokio::test]
async fn test_set_operations_and_uniqueness() {
    let kept = numbers(&[1, 2, 3, 4]).diff(vec![json!(2.0)]).intersect(vec![json!(1), json!(4)]);
    assert_eq!(kept.await.unwrap(), json!([1, 4]));

    let rows = Pipeline::new(vec![json!({"k": 1}), json!({"k": 2}), json!({"k": 1})]);
    assert_eq!(rows.unique(Some(KeySelector::from("k"))).await.unwrap(), json!([{"k": 1}, {"k": 2}]));

    let parity = numbers(&[1, 2, 3, 4]).unique_by(Mapper::from_fn(|v| json!(int(&v) % 2)));
    assert_eq!(parity.await.unwrap(), json!([1, 2]));
}

#[tokio::test]
async fn test_large_integers_keep_their_identity() {
    let ids = || Pipeline::new(vec![json!(9_007_199_254_740_993_i64), json!(9_007_199_254_740_992_i64)]);

    assert_eq!(ids().unique(None).await.unwrap(), json!([9_007_199_254_740_993_i64, 9_007_199_254_740_992_i64]));
    assert!(!ids().has_duplicates().await.unwrap());
    assert_eq!(
        ids().diff(vec![json!(9_007_199_254_740_992_i64)]).await.unwrap(),
        json!([9_007_199_254_740_993_i64])
    );
    assert_eq!(ids().sort(None).await.unwrap(), json!([9_007_199_254_740_992_i64, 9_007_199_254_740_993_i64]));
}

#[tokio::test]
async fn test_structural_operations() {
    let nested = numbers(&[1, 2, 3, 4, 5]).chunk(2);
    assert_eq!(nested.await.unwrap(), json!([[1, 2], [3, 4], [5]]));

    let flat = numbers(&[1, 2, 3, 4]).chunk(3).flatten();
    assert_eq!(flat.await.unwrap(), json!([1, 2, 3, 4]));

    let expanded = numbers(&[1, 2]).flat_map(Mapper::from_fn(|v| json!([v, v])));
    assert_eq!(expanded.await.unwrap(), json!([1, 1, 2, 2]));

    let padded = numbers(&[2]).unshift(vec![json!(0), json!(1)]).push(vec![json!(3)]);
    assert_eq!(padded.await.unwrap(), json!([0, 1, 2, 3]));

    let compacted = Pipeline::new(vec![json!(0), json!(null), json!("x"), json!(false)]).compact();
    assert_eq!(compacted.await.unwrap(), json!(["x"]));

    let concatenated = numbers(&[1]).concat(vec![json!([2, 3])]);
    assert_eq!(concatenated.await.unwrap(), json!([1, 2, 3]));
}

#[tokio::test]
async fn test_filter_if_respects_condition() {
    let even = Predicate::from_fn(|v| int(v) % 2 == 0);
    assert_eq!(numbers(&[1, 2]).filter_if(false, even.clone()).await.unwrap(), json!([1, 2]));
    assert_eq!(numbers(&[1, 2]).filter_if(true, even).await.unwrap(), json!([2]));
}

#[tokio::test]
async fn test_tap_sees_intermediate_sequence() {
    let recorder = CallRecorder::new();
    let seen = recorder.clone();
    let pipeline = numbers(&[1, 2, 3])
        .filter(Predicate::from_fn(|v| int(v) > 1))
        .tap(Inspector::from_fn(move |items| seen.record(Value::from(items.to_vec()).to_string())))
        .map(Mapper::from_fn(|v| json!(int(&v) * 10)));

    assert_eq!(pipeline.await.unwrap(), json!([20, 30]));
    assert_eq!(recorder.entries(), vec!["[2,3]"]);
}

#[tokio::test]
async fn test_reducers_receive_carry_and_index() {
    let weighted = Reducer::new(|carry, value, index| async move {
        Ok(json!(int(&carry) + int(&value) * index as i64))
    });
    assert_eq!(numbers(&[5, 6, 7]).reduce(weighted, json!(0)).await.unwrap(), json!(20));
}

#[tokio::test]
async fn test_effects_run_once_per_element() {
    let recorder = CallRecorder::new();
    let seen = recorder.clone();
    numbers(&[4, 5])
        .for_each(Effect::from_fn(move |v, index| seen.record(format!("{index}={v}"))))
        .await
        .unwrap();
    assert_eq!(recorder.entries(), vec!["0=4", "1=5"]);
}

#[tokio::test]
async fn test_dispatch_order_through_recording_engine() {
    let engine = Arc::new(RecordingEngine::new());
    let mut pipeline = numbers(&[3, 1, 2])
        .with_engine(engine.clone())
        .compact()
        .unique(None);
    pipeline.sum().await.unwrap();

    assert_eq!(engine.methods(), vec!["compact", "unique", "sum"]);
}

#[tokio::test]
async fn test_each_drain_dispatches_only_its_queue() {
    let engine = Arc::new(RecordingEngine::new());
    let mut pipeline = numbers(&[1, 2]).with_engine(engine.clone()).reverse().compact();

    pipeline.all().await.unwrap();
    assert_eq!(engine.call_count(), 2);

    engine.reset();
    assert_eq!(pipeline.count().await.unwrap(), 2);
    assert_eq!(engine.call_count(), 1);
    assert_eq!(engine.methods(), vec!["count"]);
}

#[tokio::test]
async fn test_unsupported_operation_stops_drain() {
    let engine = Arc::new(RecordingEngine::rejecting(&["chunk"]));
    let mut pipeline = numbers(&[1, 2, 3]).with_engine(engine.clone()).reverse().chunk(2).compact();

    let error = pipeline.all().await.unwrap_err();

    assert!(matches!(
        error,
        PipelineError::Engine(EngineError::UnsupportedOperation { ref operation }) if operation == "chunk"
    ));
    assert_eq!(engine.methods(), vec!["reverse", "chunk"]);
    assert_eq!(pipeline.pending_len(), 0);
}

#[tokio::test]
async fn test_mock_engine_failure_is_propagated_unchanged() {
    let mut engine = MockSequenceEngine::new();
    engine
        .expect_invoke()
        .withf(|_, operation| operation.method() == "reverse")
        .times(1)
        .returning(|items, _| Ok(Outcome::Sequence(items)));
    engine
        .expect_invoke()
        .withf(|_, operation| operation.method() == "median")
        .times(1)
        .returning(|_, _| Err(EngineError::unsupported("median").into()));

    let mut pipeline = numbers(&[1, 2]).with_engine(Arc::new(engine)).reverse();
    let error = pipeline.median().await.unwrap_err();

    assert!(matches!(
        error,
        PipelineError::Engine(EngineError::UnsupportedOperation { ref operation }) if operation == "median"
    ));
}

#[tokio::test]
async fn test_mock_engine_not_called_after_failure() {
    let mut engine = MockSequenceEngine::new();
    engine
        .expect_invoke()
        .times(1)
        .returning(|_, _| Err(EngineError::invalid_argument("chunk", "size must be positive").into()));

    let mut pipeline = numbers(&[1])
        .with_engine(Arc::new(engine))
        .chunk(0)
        .reverse()
        .compact();

    assert_eq!(pipeline.all().await.unwrap_err().kind(), "EngineFailure");
    assert_eq!(pipeline.pending_len(), 0);
}

#[tokio::test]
async fn test_drain_events() {
    let sink = Arc::new(CollectingEventSink::new());
    let mut pipeline = numbers(&[1, 2])
        .with_event_sink(sink.clone())
        .with_config(PipelineConfig::new().with_label("events"))
        .reverse()
        .compact();

    pipeline.all().await.unwrap();

    assert_eq!(
        sink.event_types(),
        vec![DRAIN_STARTED, OPERATION_COMPLETED, OPERATION_COMPLETED, DRAIN_COMPLETED]
    );
    match &sink.events()[0] {
        PipelineEvent::DrainStarted { pipeline_id, label, pending, .. } => {
            assert_eq!(*pipeline_id, pipeline.id());
            assert_eq!(label.as_deref(), Some("events"));
            assert_eq!(pending, &vec!["reverse", "compact"]);
        }
        other => panic!("expected drain start, got {other:?}"),
    }
    let completed = sink.events()[3].to_json();
    assert_eq!(completed["operations"], json!(2));
}

#[tokio::test]
async fn test_operation_events_can_be_disabled() {
    let sink = Arc::new(CollectingEventSink::new());
    let mut pipeline = numbers(&[1])
        .with_event_sink(sink.clone())
        .with_config(PipelineConfig::new().with_operation_events(false))
        .reverse();

    pipeline.all().await.unwrap();
    assert_eq!(sink.event_types(), vec![DRAIN_STARTED, DRAIN_COMPLETED]);
}

#[tokio::test]
async fn test_failure_and_fork_events() {
    let sink = Arc::new(CollectingEventSink::new());
    let mut pipeline = numbers(&[1, 2])
        .with_event_sink(sink.clone())
        .filter(failing_predicate(0, CallRecorder::new()))
        .reverse();
    let _fork = pipeline.fork();

    assert!(pipeline.all().await.is_err());

    assert_eq!(sink.event_types(), vec![PIPELINE_FORKED, DRAIN_STARTED, DRAIN_FAILED]);
    let failures = sink.failures();
    assert_eq!(failures.len(), 1);
    let failed = failures[0].to_json();
    assert_eq!(failed["type"], json!(DRAIN_FAILED));
    assert_eq!(failed["operation"], json!("filter"));
    assert_eq!(failed["error_type"], json!("StepFailure"));
    assert_eq!(failed["discarded"], json!(1));
    assert_eq!(sink.for_pipeline(pipeline.id()).len(), 2);
}

#[tokio::test]
async fn test_seeded_operations_run_first() {
    let pipeline = Pipeline::with_operations(vec![json!(2), json!(1)], [Operation::Reverse])
        .push(vec![json!(3)]);
    assert_eq!(pipeline.await.unwrap(), json!([1, 2, 3]));
}

#[tokio::test]
async fn test_pipeline_is_send() {
    let pipeline = numbers(&[1, 2, 3]).map(Mapper::from_fn(|v| json!(int(&v) * 3)));
    let handle = tokio::spawn(async move { pipeline.await });
    assert_eq!(handle.await.unwrap().unwrap(), json!([3, 6, 9]));
}
