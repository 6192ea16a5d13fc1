//! Variable maps seen by processors.
//!
//! Two capabilities are distinguished:
//!
//! - [`VariablesMap`] - read access, enough for processors that only look
//!   variables up.
//! - [`LocalVariablesMap`] - a stack of scope levels. Bindings made at a
//!   level disappear when that level is popped. Required for local
//!   variables and iteration.
//!
//! The engine discovers the second capability at runtime through
//! [`VariablesMap::as_local_mut`], so a context can be built over either.

use std::collections::HashMap;

use crate::value::Value;

pub trait VariablesMap {
    /// Look up a visible variable.
    fn get(&self, name: &str) -> Option<&Value>;

    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Local-scope capability, if this map has one.
    fn as_local(&self) -> Option<&dyn LocalVariablesMap> {
        None
    }

    fn as_local_mut(&mut self) -> Option<&mut dyn LocalVariablesMap> {
        None
    }
}

/// A variables map with nested scope levels.
///
/// Level 0 holds the global variables. Every `increase_level` opens a new
/// level; `put` and `remove` only ever affect the current level, shadowing
/// (never modifying) bindings made at outer levels.
pub trait LocalVariablesMap: VariablesMap {
    fn increase_level(&mut self);

    /// Drop the current level and every binding made in it. No-op at level 0.
    fn decrease_level(&mut self);

    fn level(&self) -> usize;

    /// Bind `name` at the current level.
    fn put(&mut self, name: String, value: Value);

    /// Hide `name` at the current level. Outer bindings reappear when the level is popped.
    fn remove(&mut self, name: &str);

    /// Whether the visible binding of `name` was made above level 0.
    fn is_local(&self, name: &str) -> bool {
        self.local_level(name).is_some()
    }

    /// Level at which the visible local binding of `name` was made.
    fn local_level(&self, name: &str) -> Option<usize>;
}

// ============================================================================
// ScopedVariables
// ============================================================================

#[derive(Debug, Clone)]
struct Frame {
    level: usize,
    /// `None` hides an outer binding.
    bindings: Vec<(String, Option<Value>)>,
}

impl Frame {
    fn lookup(&self, name: &str) -> Option<&Option<Value>> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == name)
            .map(|(_, value)| value)
    }

    fn bind(&mut self, name: String, value: Option<Value>) {
        match self.bindings.iter_mut().find(|(bound, _)| *bound == name) {
            Some(slot) => slot.1 = value,
            None => self.bindings.push((name, value)),
        }
    }
}

/// Reference [`LocalVariablesMap`]: global variables plus a stack of frames.
///
/// Frames are created lazily. Increasing the level is a counter bump, and a
/// frame is only allocated once something is bound at that level, which keeps
/// the per-element cost of scope bookkeeping near zero.
#[derive(Debug, Clone, Default)]
pub struct ScopedVariables {
    globals: HashMap<String, Value>,
    frames: Vec<Frame>,
    level: usize,
}

impl ScopedVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style global binding.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.insert(name.into(), value.into());
        self
    }

    pub fn insert_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.globals.insert(name.into(), value.into());
    }

    /// Find the visible binding in the frames, top-down.
    fn lookup_local(&self, name: &str) -> Option<(usize, Option<&Value>)> {
        self.frames.iter().rev().find_map(|frame| {
            frame
                .lookup(name)
                .map(|value| (frame.level, value.as_ref()))
        })
    }

    fn current_frame(&mut self) -> &mut Frame {
        let level = self.level;
        let needs_frame = self.frames.last().map_or(true, |top| top.level != level);
        if needs_frame {
            self.frames.push(Frame {
                level,
                bindings: Vec::new(),
            });
        }
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }
}

impl VariablesMap for ScopedVariables {
    fn get(&self, name: &str) -> Option<&Value> {
        match self.lookup_local(name) {
            Some((_, value)) => value,
            None => self.globals.get(name),
        }
    }

    fn as_local(&self) -> Option<&dyn LocalVariablesMap> {
        Some(self)
    }

    fn as_local_mut(&mut self) -> Option<&mut dyn LocalVariablesMap> {
        Some(self)
    }
}

impl LocalVariablesMap for ScopedVariables {
    fn increase_level(&mut self) {
        self.level += 1;
    }

    fn decrease_level(&mut self) {
        if self.level == 0 {
            return;
        }
        if self.frames.last().is_some_and(|top| top.level == self.level) {
            self.frames.pop();
        }
        self.level -= 1;
    }

    fn level(&self) -> usize {
        self.level
    }

    fn put(&mut self, name: String, value: Value) {
        if self.level == 0 {
            self.globals.insert(name, value);
        } else {
            self.current_frame().bind(name, Some(value));
        }
    }

    fn remove(&mut self, name: &str) {
        if self.level == 0 {
            self.globals.remove(name);
        } else if self.contains(name) {
            self.current_frame().bind(name.to_string(), None);
        }
    }

    fn local_level(&self, name: &str) -> Option<usize> {
        match self.lookup_local(name) {
            Some((level, Some(_))) => Some(level),
            _ => None,
        }
    }
}

// ============================================================================
// PlainVariables
// ============================================================================

/// Flat variables map without local scopes.
///
/// A context built over this map can run processors that only read
/// variables; local variables and iteration are unavailable.
#[derive(Debug, Clone, Default)]
pub struct PlainVariables {
    values: HashMap<String, Value>,
}

impl PlainVariables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl VariablesMap for PlainVariables {
    fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}
