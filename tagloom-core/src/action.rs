//! What a processor asks the engine to do.

use std::mem;

use crate::event::{Position, Text};
use crate::queue::EventQueue;
use crate::value::Value;

/// Content installed by a body or replacement request.
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Literal text, emitted as one text event at the element's position.
    Text(String),
    Events(EventQueue),
}

impl Content {
    /// Write this content into `queue`, which is assumed empty.
    pub(crate) fn fill(self, queue: &mut EventQueue, position: Position) {
        match self {
            Content::Text(text) => queue.push(Text::new(text, position)),
            Content::Events(mut events) => queue.extend(&mut events),
        }
    }
}

/// The primary effect requested by one processor invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ElementAction {
    #[default]
    None,
    /// Repeat the element once per item of `iterated`.
    Iterate {
        item_variable: String,
        status_variable: Option<String>,
        iterated: Value,
    },
    /// Replace the element's body, keeping the tag.
    SetBody { content: Content, processable: bool },
    /// Replace the whole element, tag and body.
    ReplaceWith { content: Content, processable: bool },
    /// Drop the element and its body.
    RemoveElement,
    /// Drop the tag, keep the body.
    RemoveTag,
}

impl ElementAction {
    /// Whether this effect ends the processor chain of the element.
    pub fn stops_chain(&self) -> bool {
        matches!(
            self,
            ElementAction::ReplaceWith { .. } | ElementAction::RemoveElement | ElementAction::RemoveTag
        )
    }
}

/// Requests accumulated during one processor invocation.
///
/// Variable changes accumulate; for the primary effect the last request wins.
/// The engine resets the request before every invocation.
#[derive(Debug, Clone, Default)]
pub struct ActionRequest {
    pub(crate) set_variables: Vec<(String, Value)>,
    pub(crate) removed_variables: Vec<String>,
    pub(crate) action: ElementAction,
}

impl ActionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.set_variables.clear();
        self.removed_variables.clear();
        self.action = ElementAction::None;
    }

    /// Bind a variable in the element's scope, visible to its later processors and its body.
    pub fn set_local_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.set_variables.push((name.into(), value.into()));
    }

    pub fn remove_local_variable(&mut self, name: impl Into<String>) {
        self.removed_variables.push(name.into());
    }

    /// Repeat the element once per item of `iterated`. A missing or blank
    /// status variable name defaults to the item name plus the configured suffix.
    pub fn iterate_element(
        &mut self,
        item_variable: impl Into<String>,
        status_variable: Option<String>,
        iterated: impl Into<Value>,
    ) {
        self.action = ElementAction::Iterate {
            item_variable: item_variable.into(),
            status_variable,
            iterated: iterated.into(),
        };
    }

    pub fn set_body_text(&mut self, text: impl Into<String>, processable: bool) {
        self.action = ElementAction::SetBody {
            content: Content::Text(text.into()),
            processable,
        };
    }

    pub fn set_body_queue(&mut self, queue: EventQueue, processable: bool) {
        self.action = ElementAction::SetBody {
            content: Content::Events(queue),
            processable,
        };
    }

    pub fn replace_with_text(&mut self, text: impl Into<String>, processable: bool) {
        self.action = ElementAction::ReplaceWith {
            content: Content::Text(text.into()),
            processable,
        };
    }

    pub fn replace_with_queue(&mut self, queue: EventQueue, processable: bool) {
        self.action = ElementAction::ReplaceWith {
            content: Content::Events(queue),
            processable,
        };
    }

    pub fn remove_element(&mut self) {
        self.action = ElementAction::RemoveElement;
    }

    pub fn remove_tag(&mut self) {
        self.action = ElementAction::RemoveTag;
    }

    pub fn action(&self) -> &ElementAction {
        &self.action
    }

    pub(crate) fn take_action(&mut self) -> ElementAction {
        mem::take(&mut self.action)
    }
}
