//! Iteration sources and loop status.

use std::fmt;
use std::iter;

use crate::value::Value;

/// How an iterated value was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratedKind {
    Null,
    List,
    Map,
    Array,
    Iterable,
    Cursor,
    /// Any other value, iterated as a one-item sequence.
    Single,
}

impl IteratedKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IteratedKind::Null => "null",
            IteratedKind::List => "list",
            IteratedKind::Map => "map",
            IteratedKind::Array => "array",
            IteratedKind::Iterable => "iterable",
            IteratedKind::Cursor => "cursor",
            IteratedKind::Single => "single",
        }
    }
}

impl fmt::Display for IteratedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lazy sequence of loop items, with the size when it is known up front.
pub struct IterationSource {
    kind: IteratedKind,
    size: Option<usize>,
    items: Box<dyn Iterator<Item = Value>>,
}

impl IterationSource {
    /// Classify a value. Classification happens once, when the loop starts.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Null => Self::new(IteratedKind::Null, Some(0), iter::empty()),
            Value::List(items) => Self::new(IteratedKind::List, Some(items.len()), items.into_iter()),
            Value::Map(map) => Self::new(
                IteratedKind::Map,
                Some(map.len()),
                map.into_iter().map(|(key, value)| Value::entry(key, value)),
            ),
            Value::Array(items) => Self::new(
                IteratedKind::Array,
                Some(items.len()),
                items.into_vec().into_iter(),
            ),
            Value::Iterable(sequence) => Self {
                kind: IteratedKind::Iterable,
                size: None,
                items: sequence.iter(),
            },
            Value::Cursor(cursor) => Self::new(
                IteratedKind::Cursor,
                None,
                iter::from_fn(move || cursor.next_item()),
            ),
            other => Self::new(IteratedKind::Single, Some(1), iter::once(other)),
        }
    }

    fn new<I>(kind: IteratedKind, size: Option<usize>, items: I) -> Self
    where
        I: Iterator<Item = Value> + 'static,
    {
        Self {
            kind,
            size,
            items: Box::new(items),
        }
    }

    pub fn kind(&self) -> IteratedKind {
        self.kind
    }

    /// Number of items, if known before iterating.
    pub fn size(&self) -> Option<usize> {
        self.size
    }
}

impl Iterator for IterationSource {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        self.items.next()
    }
}

impl fmt::Debug for IterationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterationSource")
            .field("kind", &self.kind)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Loop status bound to the status variable on every iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationStatus {
    /// Zero-based.
    pub index: usize,
    /// One-based.
    pub count: usize,
    pub size: Option<usize>,
    pub current: Value,
}

impl IterationStatus {
    pub fn new(index: usize, size: Option<usize>, current: Value) -> Self {
        Self {
            index,
            count: index + 1,
            size,
            current,
        }
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    /// Only ever true when the size is known.
    pub fn is_last(&self) -> bool {
        self.size.is_some_and(|size| self.index + 1 == size)
    }

    pub fn is_even(&self) -> bool {
        self.index % 2 == 0
    }

    pub fn is_odd(&self) -> bool {
        !self.is_even()
    }

    /// Named property access, as used by expressions like `itemStat.last`.
    pub fn property(&self, name: &str) -> Option<Value> {
        let value = match name {
            "index" => Value::from(self.index),
            "count" => Value::from(self.count),
            "size" => self.size.map_or(Value::Null, Value::from),
            "current" => self.current.clone(),
            "first" => Value::Bool(self.is_first()),
            "last" => Value::Bool(self.is_last()),
            "even" => Value::Bool(self.is_even()),
            "odd" => Value::Bool(self.is_odd()),
            _ => return None,
        };
        Some(value)
    }
}
