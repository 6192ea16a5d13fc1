//! Saved engine state: suspended processor chains and iterations being gathered.

use crate::processor_iter::ProcessorIterator;
use crate::queue::EventQueue;
use crate::value::Value;

/// A processor chain stopped partway through.
///
/// Holds everything the execution loop needs to continue the chain when the
/// next element event arrives: the content produced so far, the flags, and
/// which processors already ran. At most one chain is suspended at a time.
#[derive(Debug, Clone, Default)]
pub struct SuspensionState {
    pub body_removed: bool,
    pub queue_processable: bool,
    pub queue: EventQueue,
    pub iterator: ProcessorIterator,
}

/// An iteration whose body is being gathered.
///
/// Every event at or deeper than `from_level` is appended to `queue` until
/// the close tag that brings the markup level back below `from_level`.
#[derive(Debug, Clone)]
pub struct IterationState {
    pub from_level: usize,
    pub item_variable: String,
    pub status_variable: Option<String>,
    pub iterated: Value,
    pub queue: EventQueue,
}

impl IterationState {
    pub fn new(
        from_level: usize,
        item_variable: String,
        status_variable: Option<String>,
        iterated: Value,
    ) -> Self {
        Self {
            from_level,
            item_variable,
            status_variable,
            iterated,
            queue: EventQueue::new(),
        }
    }

    /// Status variable name: the explicit one if non-blank, else the item name plus `suffix`.
    pub fn resolve_status_variable(&self, suffix: &str) -> String {
        match self.status_variable.as_deref() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => format!("{}{}", self.item_variable, suffix),
        }
    }
}
