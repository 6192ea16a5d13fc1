//! Processor registry and matching.
//!
//! Registration and precedence are set up by the dialect that owns the
//! processors; the engine only asks two questions of the registry:
//! "does anything match this tag?" (once, when the tag is created) and
//! "what matches this tag *now*?" (every time a processor chain advances,
//! since earlier processors may have changed the attributes).

use crate::event::{Attributes, ElementTag, Position};
use crate::processor::Processor;

/// Registration handle. Later registrations get larger ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessorId(usize);

/// What a processor is attached to. Names compare ASCII case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Any tag with this element name.
    Element(String),
    /// Any tag carrying this attribute.
    Attribute(String),
    /// Tags with this element name carrying this attribute.
    ElementAttribute { element: String, attribute: String },
}

impl Matcher {
    pub fn element(name: impl Into<String>) -> Self {
        Matcher::Element(name.into())
    }

    pub fn attribute(name: impl Into<String>) -> Self {
        Matcher::Attribute(name.into())
    }

    pub fn matches(&self, tag: &ElementTag) -> bool {
        match self {
            Matcher::Element(name) => tag.name().eq_ignore_ascii_case(name),
            Matcher::Attribute(attr) => tag.attributes.contains(attr),
            Matcher::ElementAttribute { element, attribute } => {
                tag.name().eq_ignore_ascii_case(element) && tag.attributes.contains(attribute)
            }
        }
    }
}

#[derive(Debug)]
struct Entry {
    id: ProcessorId,
    precedence: i32,
    matcher: Matcher,
    processor: Processor,
}

/// Processors ordered by precedence (lower runs first), ties broken by
/// registration order.
#[derive(Debug, Default)]
pub struct ProcessorRegistry {
    entries: Vec<Entry>,
    next_id: usize,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, matcher: Matcher, precedence: i32, processor: Processor) -> ProcessorId {
        let id = ProcessorId(self.next_id);
        self.next_id += 1;
        let at = self
            .entries
            .partition_point(|entry| entry.precedence <= precedence);
        self.entries.insert(
            at,
            Entry {
                id,
                precedence,
                matcher,
                processor,
            },
        );
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any processor matches the tag as it is now.
    pub fn has_processors(&self, tag: &ElementTag) -> bool {
        self.entries.iter().any(|entry| entry.matcher.matches(tag))
    }

    /// Processors matching the tag's current name and attributes, in execution order.
    pub fn matching<'a>(
        &'a self,
        tag: &'a ElementTag,
    ) -> impl Iterator<Item = (ProcessorId, &'a Processor)> + 'a {
        self.entries
            .iter()
            .filter(move |entry| entry.matcher.matches(tag))
            .map(|entry| (entry.id, &entry.processor))
    }

    /// Create an element tag with its processor flag computed.
    pub fn element(
        &self,
        name: impl Into<String>,
        attributes: Attributes,
        position: Position,
    ) -> ElementTag {
        self.prepare(ElementTag::new(name, attributes, position))
    }

    /// Recompute the processor flag of an existing tag.
    pub fn prepare(&self, tag: ElementTag) -> ElementTag {
        let has_processors = self.has_processors(&tag);
        tag.with_processors(has_processors)
    }
}
