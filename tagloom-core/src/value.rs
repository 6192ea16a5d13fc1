//! Values bound to template variables.
//!
//! The engine itself only needs values for two things: storing them in the
//! variable scope, and iterating over them when a processor asks for an
//! element to be repeated. Everything else (expression evaluation,
//! conversions) belongs to the processors.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::iteration::IterationStatus;

/// A dynamically typed template value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (`null`)
    Null,

    Bool(bool),

    Integer(i64),

    Float(f64),

    String(String),

    /// Ordered collection with known size.
    List(Vec<Value>),

    /// Fixed-size array, iterated in index order.
    Array(Box<[Value]>),

    /// Key-value map; iterating it yields `Entry` values.
    Map(BTreeMap<String, Value>),

    /// One entry of a map, as produced by iteration.
    Entry(Box<MapEntry>),

    /// Re-iterable sequence of unknown length.
    Iterable(Sequence),

    /// Forward-only cursor; consumed by the first iteration over it.
    Cursor(Cursor),

    /// Iteration status, bound to the status variable of a loop.
    Status(Box<IterationStatus>),
}

/// Key/value pair produced when iterating a `Value::Map`.
#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: String,
    pub value: Value,
}

impl Value {
    /// Check if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as boolean.
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get as integer.
    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get as string slice.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as iteration status.
    #[inline]
    pub fn as_status(&self) -> Option<&IterationStatus> {
        match self {
            Value::Status(status) => Some(status),
            _ => None,
        }
    }

    /// Try to get as map entry.
    #[inline]
    pub fn as_entry(&self) -> Option<&MapEntry> {
        match self {
            Value::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    /// Truthiness as used by conditional processors.
    ///
    /// `Null`, `false`, `0`, `0.0`, `""`, `"false"`, `"off"` and `"no"` are false;
    /// everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !(s.is_empty() || s == "false" || s == "off" || s == "no"),
            _ => true,
        }
    }

    /// Navigate one property of a composite value (`entry.key`, `stat.index`, `map.k`).
    pub fn property(&self, name: &str) -> Option<Value> {
        match self {
            Value::Map(map) => map.get(name).cloned(),
            Value::Entry(entry) => match name {
                "key" => Some(Value::String(entry.key.clone())),
                "value" => Some(entry.value.clone()),
                _ => None,
            },
            Value::Status(status) => status.property(name),
            _ => None,
        }
    }

    /// Build a map entry value.
    pub fn entry(key: impl Into<String>, value: Value) -> Self {
        Value::Entry(Box::new(MapEntry {
            key: key.into(),
            value,
        }))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::List(items) => write_seq(f, items),
            Value::Array(items) => write_seq(f, items),
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}={}", key, value)?;
                }
                f.write_str("}")
            }
            Value::Entry(entry) => write!(f, "{}={}", entry.key, entry.value),
            Value::Iterable(_) => f.write_str("<iterable>"),
            Value::Cursor(_) => f.write_str("<cursor>"),
            Value::Status(status) => write!(
                f,
                "{{index={}, count={}, size={}}}",
                status.index,
                status.count,
                status.size.map_or_else(|| "?".to_string(), |s| s.to_string())
            ),
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Integer(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

// ============================================================================
// Lazy sequences
// ============================================================================

type SequenceFactory = dyn Fn() -> Box<dyn Iterator<Item = Value>>;

/// Re-iterable lazy sequence. Each call to [`Sequence::iter`] starts over.
///
/// Equality is identity: two sequences are equal only if they share a factory.
#[derive(Clone)]
pub struct Sequence(Rc<SequenceFactory>);

impl Sequence {
    pub fn new<F, I>(factory: F) -> Self
    where
        F: Fn() -> I + 'static,
        I: Iterator<Item = Value> + 'static,
    {
        Self(Rc::new(move || Box::new(factory()) as Box<dyn Iterator<Item = Value>>))
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = Value>> {
        (self.0)()
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sequence(..)")
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Forward-only cursor shared between clones; whatever one clone consumes is
/// gone for all of them.
#[derive(Clone)]
pub struct Cursor(Rc<RefCell<Box<dyn Iterator<Item = Value>>>>);

impl Cursor {
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Value> + 'static,
    {
        Self(Rc::new(RefCell::new(Box::new(iter))))
    }

    /// Take the next item off the cursor.
    pub fn next_item(&self) -> Option<Value> {
        self.0.borrow_mut().next()
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cursor(..)")
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
