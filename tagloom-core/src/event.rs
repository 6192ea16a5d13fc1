//! Markup events - the unit of input and output of the engine.
//!
//! This is a SAX-style event model: a document arrives as a flat sequence of
//! events, never as a tree. Structure is represented by open/close pairs.
//!
//! ```text
//! <ul t:each="x : ${items}">     OpenElement { name: "ul", attributes: [t:each] }
//!   <li>hi</li>                  OpenElement { "li" }, Text("hi"), CloseElement { "li" }
//!   <br/>                        StandaloneElement { "br" }
//! </ul>                          CloseElement { "ul" }
//! ```
//!
//! Events own their data. Cloning an event therefore always yields an
//! independent copy that can be buffered and replayed later.

use std::fmt;

/// Source position of an event (1-based line and column).
///
/// Synthesized events (e.g. the open/close pair made out of a standalone tag)
/// carry the position of the event they were derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl Position {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// A single attribute. `value` is `None` for minimized attributes (`<input disabled>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

/// Ordered attribute list of an element tag.
///
/// Attributes are kept in encounter order. Setting an existing attribute
/// replaces its value in place; names compare ASCII case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    items: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.items.iter()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Value of an attribute. Minimized attributes yield `Some("")`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .map(|idx| self.items[idx].value.as_deref().unwrap_or(""))
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set_value(name.into(), Some(value.into()));
    }

    /// Set a minimized (valueless) attribute.
    pub fn set_minimized(&mut self, name: impl Into<String>) {
        self.set_value(name.into(), None);
    }

    fn set_value(&mut self, name: String, value: Option<String>) {
        match self.position(&name) {
            Some(idx) => self.items[idx].value = value,
            None => self.items.push(Attribute { name, value }),
        }
    }

    /// Remove an attribute, returning whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.items.remove(idx);
                true
            }
            None => false,
        }
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.set(name, value);
        }
        attributes
    }
}

// ============================================================================
// Element tags
// ============================================================================

/// An element tag: standalone (`<br/>`), open (`<div>`) or auto-open.
///
/// `has_processors` is computed once, when the tag is created, by the
/// processor registry. The engine uses it only to decide whether the tag can
/// skip processor execution entirely; processor resolution itself always
/// looks at the tag's *current* attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTag {
    name: String,
    pub attributes: Attributes,
    position: Position,
    has_processors: bool,
}

impl ElementTag {
    pub fn new(name: impl Into<String>, attributes: Attributes, position: Position) -> Self {
        Self {
            name: name.into(),
            attributes,
            position,
            has_processors: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn has_processors(&self) -> bool {
        self.has_processors
    }

    pub fn with_processors(mut self, has_processors: bool) -> Self {
        self.has_processors = has_processors;
        self
    }

    /// Close tag matching this element (same name and position).
    pub fn close_tag(&self) -> CloseTag {
        CloseTag::new(self.name.clone(), self.position)
    }
}

/// A close tag: regular, auto-close (implied by the parser) or unmatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseTag {
    name: String,
    position: Position,
}

impl CloseTag {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }
}

// ============================================================================
// Non-element payloads
// ============================================================================

/// Character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub content: String,
    pub position: Position,
}

impl Text {
    pub fn new(content: impl Into<String>, position: Position) -> Self {
        Self {
            content: content.into(),
            position,
        }
    }
}

/// Comment: `<!-- content -->`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub content: String,
    pub position: Position,
}

/// CDATA section: `<![CDATA[ content ]]>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdataSection {
    pub content: String,
    pub position: Position,
}

/// Document type clause: `<!DOCTYPE root PUBLIC "pub" "sys">`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocType {
    pub root_element: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub position: Position,
}

/// XML declaration: `<?xml version="1.0" encoding="UTF-8"?>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
    pub position: Position,
}

/// Processing instruction: `<?target content?>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstruction {
    pub target: String,
    pub content: Option<String>,
    pub position: Position,
}

// ============================================================================
// TemplateEvent
// ============================================================================

/// Markup events, as pushed by the upstream producer and forwarded downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateEvent {
    // ========== Content Events ==========
    Text(Text),
    Comment(Comment),
    CdataSection(CdataSection),

    // ========== Prolog Events ==========
    DocType(DocType),
    XmlDeclaration(XmlDeclaration),
    ProcessingInstruction(ProcessingInstruction),

    // ========== Element Events ==========
    /// `<br/>` - no body, does not change depth.
    StandaloneElement(ElementTag),
    /// `<div>` - increases depth for its body.
    OpenElement(ElementTag),
    /// `</div>` - matches the most recent open.
    CloseElement(CloseTag),
    /// Open tag implied by the parser (e.g. a missing `<tbody>`).
    AutoOpenElement(ElementTag),
    /// Close tag implied by the parser.
    AutoCloseElement(CloseTag),
    /// Close tag with no matching open. Never changes depth.
    UnmatchedCloseElement(CloseTag),
}

impl TemplateEvent {
    /// Get the source position of this event.
    pub fn position(&self) -> Position {
        match self {
            TemplateEvent::Text(text) => text.position,
            TemplateEvent::Comment(comment) => comment.position,
            TemplateEvent::CdataSection(cdata) => cdata.position,
            TemplateEvent::DocType(doc_type) => doc_type.position,
            TemplateEvent::XmlDeclaration(decl) => decl.position,
            TemplateEvent::ProcessingInstruction(pi) => pi.position,
            TemplateEvent::StandaloneElement(tag)
            | TemplateEvent::OpenElement(tag)
            | TemplateEvent::AutoOpenElement(tag) => tag.position(),
            TemplateEvent::CloseElement(tag)
            | TemplateEvent::AutoCloseElement(tag)
            | TemplateEvent::UnmatchedCloseElement(tag) => tag.position(),
        }
    }

    /// Element tag carried by this event, if it opens or is a standalone element.
    pub fn element_tag(&self) -> Option<&ElementTag> {
        match self {
            TemplateEvent::StandaloneElement(tag)
            | TemplateEvent::OpenElement(tag)
            | TemplateEvent::AutoOpenElement(tag) => Some(tag),
            _ => None,
        }
    }

    /// Check if this event increases the markup depth.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            TemplateEvent::OpenElement(_) | TemplateEvent::AutoOpenElement(_)
        )
    }

    /// Check if this event decreases the markup depth.
    pub fn is_close(&self) -> bool {
        matches!(
            self,
            TemplateEvent::CloseElement(_) | TemplateEvent::AutoCloseElement(_)
        )
    }
}

impl From<Text> for TemplateEvent {
    fn from(text: Text) -> Self {
        TemplateEvent::Text(text)
    }
}
