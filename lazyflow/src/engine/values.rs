//! Value semantics shared by the eager operations: identity, truthiness,
//! ordering, string forms and index windows.

use crate::config::SortMode;
use crate::errors::EngineError;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::ops::Range;

/// Returns a short name for the JSON type of a value.
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Falsy values are `null`, `false`, `0` and the empty string.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// Integers stay exact; integral floats in range become integers so that
// 1 and 1.0 share an identity.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn canonical_number(number: &Number) -> Value {
    if number.is_i64() || number.is_u64() {
        return Value::Number(number.clone());
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < -(i64::MIN as f64) => Value::from(f as i64),
        Some(f) if f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64 => Value::from(f as u64),
        _ => Value::Number(number.clone()),
    }
}

fn canonical(value: &Value) -> Value {
    match value {
        Value::Number(n) => canonical_number(n),
        Value::Array(values) => Value::Array(values.iter().map(canonical).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), canonical(value)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Returns a string that is equal for two values iff they are the same value.
///
/// Used for `unique`, `diff`, `intersect`, `has` and `hasDuplicates`.
#[must_use]
pub fn identity_key(value: &Value) -> String {
    canonical(value).to_string()
}

/// Structural equality with numbers compared by numeric value.
#[must_use]
pub fn same_value(left: &Value, right: &Value) -> bool {
    canonical(left) == canonical(right)
}

/// String form used by `join` and lexicographic sorting. `null` is empty.
#[must_use]
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// String form used for `groupBy` keys.
#[must_use]
pub fn key_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads a number or fails with a type mismatch naming the operation.
pub fn as_number(operation: &str, value: &Value) -> Result<f64, EngineError> {
    value
        .as_f64()
        .ok_or_else(|| EngineError::type_mismatch(operation, "number", type_name(value)))
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Natural ordering: by type first, then by value within the type.
#[must_use]
pub fn compare_natural(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| compare_natural(x, y))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.len().cmp(&b.len())),
        (Value::Object(_), Value::Object(_)) => left.to_string().cmp(&right.to_string()),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn exact_integer(number: &Number) -> Option<i128> {
    number
        .as_i64()
        .map(i128::from)
        .or_else(|| number.as_u64().map(i128::from))
}

fn compare_numbers(left: &Number, right: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (exact_integer(left), exact_integer(right)) {
        return a.cmp(&b);
    }
    let a = left.as_f64().unwrap_or(f64::NAN);
    let b = right.as_f64().unwrap_or(f64::NAN);
    a.total_cmp(&b)
}

/// Orders by string form.
#[must_use]
pub fn compare_lexicographic(left: &Value, right: &Value) -> Ordering {
    display_value(left).cmp(&display_value(right))
}

/// Default comparison for the given sort mode.
#[must_use]
pub fn compare(mode: SortMode, left: &Value, right: &Value) -> Ordering {
    match mode {
        SortMode::Natural => compare_natural(left, right),
        SortMode::Lexicographic => compare_lexicographic(left, right),
    }
}

/// Splices array elements in one level; other values are kept as-is.
#[must_use]
pub fn flatten_one(values: Vec<Value>) -> Vec<Value> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Array(inner) => out.extend(inner),
            other => out.push(other),
        }
    }
    out
}

/// Extracts `key` from an object field or an array index.
#[must_use]
pub fn pluck_key(item: &Value, key: &str) -> Value {
    match item {
        Value::Object(map) => map.get(key).cloned().unwrap_or(Value::Null),
        Value::Array(values) => key
            .parse::<usize>()
            .ok()
            .and_then(|index| values.get(index))
            .cloned()
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn resolve_start(start: i64, len: usize) -> usize {
    let offset = usize::try_from(start.unsigned_abs()).unwrap_or(usize::MAX);
    if start < 0 {
        len.saturating_sub(offset)
    } else {
        offset.min(len)
    }
}

/// Index range selected by `start` and an optional element count.
///
/// A negative `start` counts from the end; `None` runs to the end.
#[must_use]
pub fn window(start: i64, limit: Option<usize>, len: usize) -> Range<usize> {
    let begin = resolve_start(start, len);
    let end = limit.map_or(len, |limit| begin.saturating_add(limit).min(len));
    begin..end
}

/// Index range for `take`: the first `limit` elements, or the last `-limit`.
#[must_use]
pub fn take_window(limit: i64, len: usize) -> Range<usize> {
    if limit < 0 {
        window(limit, None, len)
    } else {
        window(0, Some(usize::try_from(limit).unwrap_or(usize::MAX)), len)
    }
}
