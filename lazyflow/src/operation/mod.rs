//! Deferred operation records.
//!
//! An [`Operation`] is one queued step: the variant selects what the engine
//! does, and its fields carry the callback and/or data payload that step
//! needs. Records are immutable once enqueued and consumed exactly once.

mod callbacks;

pub use callbacks::{
    Comparator, Effect, Inspector, KeySelector, Mapper, Needle, Predicate, Reducer, StepResult,
};

use serde_json::Value;

/// One deferred pipeline step.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Average of numeric elements.
    Avg,
    /// Split into arrays of `size` elements.
    Chunk {
        /// Elements per chunk.
        size: usize,
    },
    /// Flatten one level of nesting.
    Collapse,
    /// Drop falsy elements.
    Compact,
    /// Append values, splicing arrays in one level.
    Concat(Vec<Value>),
    /// Count elements, optionally only those matching.
    Count(Option<Predicate>),
    /// Keep elements not present in the given values.
    Diff(Vec<Value>),
    /// True when every element matches.
    Every(Predicate),
    /// Keep matching elements.
    Filter(Predicate),
    /// Filter only when `condition` holds.
    FilterIf {
        /// Whether to apply the predicate at all.
        condition: bool,
        /// The predicate.
        predicate: Predicate,
    },
    /// First matching element.
    Find(Predicate),
    /// First element, optionally the first matching.
    First(Option<Predicate>),
    /// Map, then flatten array results one level.
    FlatMap(Mapper),
    /// Run an effect per element.
    ForEach(Effect),
    /// Group elements into an object keyed by the selector.
    GroupBy(KeySelector),
    /// True when the needle is present.
    Has(Needle),
    /// True when any value occurs twice.
    HasDuplicates,
    /// Keep elements also present in the given values.
    Intersect(Vec<Value>),
    /// True when there are no elements.
    IsEmpty,
    /// True when there is at least one element.
    IsNotEmpty,
    /// Join string forms with a separator.
    Join(Option<String>),
    /// Last element, optionally the last matching.
    Last(Option<Predicate>),
    /// Transform each element.
    Map(Mapper),
    /// Largest numeric element.
    Max,
    /// Median of numeric elements.
    Median,
    /// Smallest numeric element.
    Min,
    /// Extract the given keys from each element.
    Pluck(Vec<String>),
    /// Last element.
    Pop,
    /// Append values as-is.
    Push(Vec<Value>),
    /// Fold from the left.
    Reduce {
        /// The reducer.
        reducer: Reducer,
        /// The starting accumulator.
        initial: Value,
    },
    /// Fold from the right.
    ReduceRight {
        /// The reducer.
        reducer: Reducer,
        /// The starting accumulator.
        initial: Value,
    },
    /// Drop matching elements.
    Reject(Predicate),
    /// Reverse the order.
    Reverse,
    /// First element.
    Shift,
    /// Number of elements.
    Size,
    /// Sub-range starting at `start`, at most `limit` elements.
    Slice {
        /// Start index; negative counts from the end.
        start: i64,
        /// Number of elements, or the rest when `None`.
        limit: Option<usize>,
    },
    /// True when any element matches.
    Some(Predicate),
    /// Stable sort, natural order when no comparator is given.
    Sort(Option<Comparator>),
    /// Remove a range and insert values in its place.
    Splice {
        /// Start index; negative counts from the end.
        start: i64,
        /// Number of elements to remove, or the rest when `None`.
        limit: Option<usize>,
        /// Values inserted at `start`.
        inserts: Vec<Value>,
    },
    /// Sum of numeric elements.
    Sum,
    /// First `limit` elements, or the last `-limit` when negative.
    Take(i64),
    /// Everything except what `Take` with the same limit would return.
    TakeAndRemove(i64),
    /// Observe the sequence.
    Tap(Inspector),
    /// Resolve to the sequence as a JSON array.
    ToJson,
    /// Drop repeated elements, optionally compared by key.
    Unique(Option<KeySelector>),
    /// Drop elements whose mapped key was already seen.
    UniqueBy(Mapper),
    /// Prepend values.
    Unshift(Vec<Value>),
}

impl Operation {
    /// Returns the operation name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Avg => "avg",
            Self::Chunk { .. } => "chunk",
            Self::Collapse => "collapse",
            Self::Compact => "compact",
            Self::Concat(_) => "concat",
            Self::Count(_) => "count",
            Self::Diff(_) => "diff",
            Self::Every(_) => "every",
            Self::Filter(_) => "filter",
            Self::FilterIf { .. } => "filterIf",
            Self::Find(_) => "find",
            Self::First(_) => "first",
            Self::FlatMap(_) => "flatMap",
            Self::ForEach(_) => "forEach",
            Self::GroupBy(_) => "groupBy",
            Self::Has(_) => "has",
            Self::HasDuplicates => "hasDuplicates",
            Self::Intersect(_) => "intersect",
            Self::IsEmpty => "isEmpty",
            Self::IsNotEmpty => "isNotEmpty",
            Self::Join(_) => "join",
            Self::Last(_) => "last",
            Self::Map(_) => "map",
            Self::Max => "max",
            Self::Median => "median",
            Self::Min => "min",
            Self::Pluck(_) => "pluck",
            Self::Pop => "pop",
            Self::Push(_) => "push",
            Self::Reduce { .. } => "reduce",
            Self::ReduceRight { .. } => "reduceRight",
            Self::Reject(_) => "reject",
            Self::Reverse => "reverse",
            Self::Shift => "shift",
            Self::Size => "size",
            Self::Slice { .. } => "slice",
            Self::Some(_) => "some",
            Self::Sort(_) => "sort",
            Self::Splice { .. } => "splice",
            Self::Sum => "sum",
            Self::Take(_) => "take",
            Self::TakeAndRemove(_) => "takeAndRemove",
            Self::Tap(_) => "tap",
            Self::ToJson => "toJSON",
            Self::Unique(_) => "unique",
            Self::UniqueBy(_) => "uniqueBy",
            Self::Unshift(_) => "unshift",
        }
    }
}
