//! Reusable event buffer.

use crate::error::Result;
use crate::event::TemplateEvent;
use crate::handler::TemplateHandler;

/// Ordered, owned sequence of events.
///
/// Queues are scratch storage: the engine keeps one per re-entrancy level and
/// resets it between uses, so the backing allocation is paid once per
/// document rather than once per element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQueue {
    events: Vec<TemplateEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    /// Empty the queue, keeping its allocation.
    #[inline]
    pub fn reset(&mut self) {
        self.events.clear();
    }

    /// Make this queue an independent copy of `other`, reusing this queue's allocation.
    pub fn reset_as_clone_of(&mut self, other: &EventQueue) {
        self.events.clone_from(&other.events);
    }

    #[inline]
    pub fn push(&mut self, event: impl Into<TemplateEvent>) {
        self.events.push(event.into());
    }

    /// Move all events of `other` to the end of this queue.
    pub fn extend(&mut self, other: &mut EventQueue) {
        self.events.append(&mut other.events);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateEvent> {
        self.events.iter()
    }

    /// Drain every event, in order, into `handler`. The queue is left empty.
    ///
    /// On error the remaining events are dropped.
    pub fn process<H: TemplateHandler + ?Sized>(&mut self, handler: &mut H) -> Result<()> {
        for event in self.events.drain(..) {
            handler.handle_event(event)?;
        }
        Ok(())
    }

    /// Dispatch a copy of every event, in order, into `handler`. The queue is left intact.
    pub fn replay<H: TemplateHandler + ?Sized>(&self, handler: &mut H) -> Result<()> {
        for event in &self.events {
            handler.handle_event(event.clone())?;
        }
        Ok(())
    }
}

impl From<Vec<TemplateEvent>> for EventQueue {
    fn from(events: Vec<TemplateEvent>) -> Self {
        Self { events }
    }
}

impl FromIterator<TemplateEvent> for EventQueue {
    fn from_iter<I: IntoIterator<Item = TemplateEvent>>(iter: I) -> Self {
        Self {
            events: iter.into_iter().collect(),
        }
    }
}
