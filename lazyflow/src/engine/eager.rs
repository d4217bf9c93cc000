//! The built-in eager engine.

use super::values::{
    as_number, compare, display_value, flatten_one, identity_key, is_truthy, key_string,
    pluck_key, same_value, take_window, window,
};
use super::{Outcome, SequenceEngine};
use crate::config::EngineConfig;
use crate::errors::{EngineError, PipelineResult};
use crate::operation::{
    Comparator, Effect, KeySelector, Mapper, Needle, Operation, Predicate, Reducer,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::trace;

/// Engine that performs every operation in memory, awaiting callbacks one
/// element at a time.
#[derive(Debug, Clone, Default)]
pub struct EagerEngine {
    config: EngineConfig,
}

impl EagerEngine {
    /// Creates an engine with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine with the given config.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Returns the engine config.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[async_trait]
impl SequenceEngine for EagerEngine {
    async fn invoke(&self, items: Vec<Value>, operation: Operation) -> PipelineResult<Outcome> {
        let method = operation.method();
        trace!(operation = method, len = items.len(), "Applying operation");

        let mut items = items;
        let outcome = match operation {
            Operation::Avg => Outcome::Value(average(method, &items)?),
            Operation::Chunk { size } => Outcome::Sequence(chunk(method, &items, size)?),
            Operation::Collapse => Outcome::Sequence(flatten_one(items)),
            Operation::Compact => Outcome::Sequence(items.into_iter().filter(is_truthy).collect()),
            Operation::Concat(values) => {
                items.extend(flatten_one(values));
                Outcome::Sequence(items)
            }
            Operation::Count(None) | Operation::Size => Outcome::Value(Value::from(items.len())),
            Operation::Count(Some(predicate)) => {
                Outcome::Value(Value::from(filter(items, &predicate, true).await?.len()))
            }
            Operation::Diff(values) => Outcome::Sequence(retain_members(items, &values, false)),
            Operation::Every(predicate) => Outcome::Value(Value::Bool(every(items, &predicate).await?)),
            Operation::Filter(predicate) => Outcome::Sequence(filter(items, &predicate, true).await?),
            Operation::FilterIf { condition, predicate } => {
                if condition {
                    Outcome::Sequence(filter(items, &predicate, true).await?)
                } else {
                    Outcome::Sequence(items)
                }
            }
            Operation::Find(predicate) | Operation::First(Some(predicate)) => {
                Outcome::Element(find(items, &predicate).await?)
            }
            Operation::First(None) | Operation::Shift => Outcome::Element(items.into_iter().next()),
            Operation::FlatMap(mapper) => Outcome::Sequence(flatten_one(map(items, &mapper).await?)),
            Operation::ForEach(effect) => {
                for_each(items, &effect).await?;
                Outcome::Value(Value::Null)
            }
            Operation::GroupBy(selector) => Outcome::Value(group_by(items, &selector).await?),
            Operation::Has(Needle::Value(needle)) => {
                Outcome::Value(Value::Bool(items.iter().any(|item| same_value(item, &needle))))
            }
            Operation::Has(Needle::Predicate(predicate)) | Operation::Some(predicate) => {
                Outcome::Value(Value::Bool(find(items, &predicate).await?.is_some()))
            }
            Operation::HasDuplicates => {
                let mut seen = HashSet::new();
                let all_distinct = items.iter().all(|item| seen.insert(identity_key(item)));
                Outcome::Value(Value::Bool(!all_distinct))
            }
            Operation::Intersect(values) => Outcome::Sequence(retain_members(items, &values, true)),
            Operation::IsEmpty => Outcome::Value(Value::Bool(items.is_empty())),
            Operation::IsNotEmpty => Outcome::Value(Value::Bool(!items.is_empty())),
            Operation::Join(separator) => {
                let separator = separator
                    .as_deref()
                    .unwrap_or(self.config.join_separator.as_str());
                let parts: Vec<String> = items.iter().map(display_value).collect();
                Outcome::Value(Value::String(parts.join(separator)))
            }
            Operation::Last(None) | Operation::Pop => Outcome::Element(items.pop()),
            Operation::Last(Some(predicate)) => {
                let mut matches = filter(items, &predicate, true).await?;
                Outcome::Element(matches.pop())
            }
            Operation::Map(mapper) => Outcome::Sequence(map(items, &mapper).await?),
            Operation::Max => Outcome::Value(extreme(method, items, Ordering::Greater)?),
            Operation::Median => Outcome::Value(median(method, &items)?),
            Operation::Min => Outcome::Value(extreme(method, items, Ordering::Less)?),
            Operation::Pluck(keys) => Outcome::Sequence(
                items
                    .iter()
                    .map(|item| Value::Array(keys.iter().map(|key| pluck_key(item, key)).collect()))
                    .collect(),
            ),
            Operation::Push(values) => {
                items.extend(values);
                Outcome::Sequence(items)
            }
            Operation::Reduce { reducer, initial } => {
                Outcome::Value(fold(items.into_iter().enumerate(), &reducer, initial).await?)
            }
            Operation::ReduceRight { reducer, initial } => {
                Outcome::Value(fold(items.into_iter().enumerate().rev(), &reducer, initial).await?)
            }
            Operation::Reject(predicate) => Outcome::Sequence(filter(items, &predicate, false).await?),
            Operation::Reverse => {
                items.reverse();
                Outcome::Sequence(items)
            }
            Operation::Slice { start, limit } => {
                let range = window(start, limit, items.len());
                Outcome::Sequence(items.drain(range).collect())
            }
            Operation::Sort(None) => {
                let mode = self.config.sort_mode;
                items.sort_by(|left, right| compare(mode, left, right));
                Outcome::Sequence(items)
            }
            Operation::Sort(Some(comparator)) => Outcome::Sequence(merge_sort(items, &comparator).await?),
            Operation::Splice { start, limit, inserts } => {
                let range = window(start, limit, items.len());
                let _removed: Vec<Value> = items.splice(range, inserts).collect();
                Outcome::Sequence(items)
            }
            Operation::Sum => Outcome::Value(sum(method, &items)?),
            Operation::Take(limit) => {
                let range = take_window(limit, items.len());
                Outcome::Sequence(items.drain(range).collect())
            }
            Operation::TakeAndRemove(limit) => {
                let range = take_window(limit, items.len());
                items.drain(range);
                Outcome::Sequence(items)
            }
            Operation::Tap(inspector) => {
                inspector.call(items.clone()).await?;
                Outcome::Sequence(items)
            }
            Operation::ToJson => Outcome::Value(Value::Array(items)),
            Operation::Unique(None) => {
                let mut seen = HashSet::new();
                Outcome::Sequence(
                    items
                        .into_iter()
                        .filter(|item| seen.insert(identity_key(item)))
                        .collect(),
                )
            }
            Operation::Unique(Some(selector)) => Outcome::Sequence(unique_by_key(items, &selector).await?),
            Operation::UniqueBy(mapper) => {
                Outcome::Sequence(unique_by_key(items, &KeySelector::Callback(mapper)).await?)
            }
            Operation::Unshift(values) => {
                let mut prefixed = values;
                prefixed.extend(items);
                Outcome::Sequence(prefixed)
            }
        };

        Ok(outcome)
    }
}

async fn filter(items: Vec<Value>, predicate: &Predicate, keep: bool) -> PipelineResult<Vec<Value>> {
    let mut kept = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        if predicate.call(item.clone(), index).await? == keep {
            kept.push(item);
        }
    }
    Ok(kept)
}

async fn every(items: Vec<Value>, predicate: &Predicate) -> PipelineResult<bool> {
    for (index, item) in items.into_iter().enumerate() {
        if !predicate.call(item, index).await? {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn find(items: Vec<Value>, predicate: &Predicate) -> PipelineResult<Option<Value>> {
    for (index, item) in items.into_iter().enumerate() {
        if predicate.call(item.clone(), index).await? {
            return Ok(Some(item));
        }
    }
    Ok(None)
}

async fn map(items: Vec<Value>, mapper: &Mapper) -> PipelineResult<Vec<Value>> {
    let mut mapped = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        mapped.push(mapper.call(item, index).await?);
    }
    Ok(mapped)
}

async fn for_each(items: Vec<Value>, effect: &Effect) -> PipelineResult<()> {
    for (index, item) in items.into_iter().enumerate() {
        effect.call(item, index).await?;
    }
    Ok(())
}

async fn fold(
    indexed: impl Iterator<Item = (usize, Value)> + Send,
    reducer: &Reducer,
    initial: Value,
) -> PipelineResult<Value> {
    let mut carry = initial;
    for (index, item) in indexed {
        carry = reducer.call(carry, item, index).await?;
    }
    Ok(carry)
}

async fn select_key(selector: &KeySelector, item: &Value, index: usize) -> PipelineResult<Value> {
    match selector {
        KeySelector::Field(field) => Ok(pluck_key(item, field)),
        KeySelector::Callback(mapper) => Ok(mapper.call(item.clone(), index).await?),
    }
}

async fn group_by(items: Vec<Value>, selector: &KeySelector) -> PipelineResult<Value> {
    let mut groups = Map::new();
    for (index, item) in items.into_iter().enumerate() {
        let key = key_string(&select_key(selector, &item, index).await?);
        if let Value::Array(group) = groups.entry(key).or_insert_with(|| Value::Array(Vec::new())) {
            group.push(item);
        }
    }
    Ok(Value::Object(groups))
}

async fn unique_by_key(items: Vec<Value>, selector: &KeySelector) -> PipelineResult<Vec<Value>> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let key = select_key(selector, &item, index).await?;
        if seen.insert(identity_key(&key)) {
            kept.push(item);
        }
    }
    Ok(kept)
}

// Bottom-up merge sort so that comparator calls are awaited one at a time.
async fn merge_sort(items: Vec<Value>, comparator: &Comparator) -> PipelineResult<Vec<Value>> {
    let mut runs: Vec<Vec<Value>> = items.into_iter().map(|item| vec![item]).collect();
    while runs.len() > 1 {
        let mut merged = Vec::with_capacity(runs.len().div_ceil(2));
        let mut pending = runs.into_iter();
        while let Some(left) = pending.next() {
            match pending.next() {
                Some(right) => merged.push(merge(left, right, comparator).await?),
                None => merged.push(left),
            }
        }
        runs = merged;
    }
    Ok(runs.pop().unwrap_or_default())
}

async fn merge(
    left: Vec<Value>,
    right: Vec<Value>,
    comparator: &Comparator,
) -> PipelineResult<Vec<Value>> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(a), Some(b)) = (left.peek(), right.peek()) {
        let ordering = comparator.call(a.clone(), b.clone()).await?;
        // Ties take from the left run, which keeps the sort stable.
        let next = if ordering == Ordering::Greater {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

fn retain_members(items: Vec<Value>, values: &[Value], keep_members: bool) -> Vec<Value> {
    let members: HashSet<String> = values.iter().map(identity_key).collect();
    items
        .into_iter()
        .filter(|item| members.contains(&identity_key(item)) == keep_members)
        .collect()
}

fn chunk(method: &str, items: &[Value], size: usize) -> Result<Vec<Value>, EngineError> {
    if size == 0 {
        return Err(EngineError::invalid_argument(method, "chunk size must be greater than zero"));
    }
    Ok(items.chunks(size).map(|chunk| Value::Array(chunk.to_vec())).collect())
}

fn numbers(method: &str, items: &[Value]) -> Result<Vec<f64>, EngineError> {
    items.iter().map(|item| as_number(method, item)).collect()
}

#[allow(clippy::cast_precision_loss)]
fn average(method: &str, items: &[Value]) -> Result<Value, EngineError> {
    let values = numbers(method, items)?;
    if values.is_empty() {
        return Ok(Value::Null);
    }
    Ok(Value::from(values.iter().sum::<f64>() / values.len() as f64))
}

fn median(method: &str, items: &[Value]) -> Result<Value, EngineError> {
    let mut values = numbers(method, items)?;
    if values.is_empty() {
        return Ok(Value::Null);
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };
    Ok(Value::from(median))
}

// Integer inputs keep an integer total until it would overflow.
fn sum(method: &str, items: &[Value]) -> Result<Value, EngineError> {
    let mut int_total = Some(0_i64);
    let mut float_total = 0.0;
    for item in items {
        float_total += as_number(method, item)?;
        int_total = match (int_total, item.as_i64()) {
            (Some(total), Some(value)) => total.checked_add(value),
            _ => None,
        };
    }
    Ok(int_total.map_or_else(|| Value::from(float_total), Value::from))
}

fn extreme(method: &str, items: Vec<Value>, wanted: Ordering) -> Result<Value, EngineError> {
    let mut best: Option<(f64, Value)> = None;
    for item in items {
        let value = as_number(method, &item)?;
        let replace = best
            .as_ref()
            .map_or(true, |(current, _)| value.total_cmp(current) == wanted);
        if replace {
            best = Some((value, item));
        }
    }
    Ok(best.map_or(Value::Null, |(_, item)| item))
}
