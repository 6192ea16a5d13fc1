//! Processor interfaces.

use std::fmt;
use std::rc::Rc;

use crate::action::ActionRequest;
use crate::context::ProcessingContext;
use crate::error::ProcessorError;
use crate::event::ElementTag;

/// A rule executed against element tags.
///
/// A processor may mutate the tag's attributes directly and requests
/// everything else (variables, body changes, removal, iteration) through
/// `actions`. The engine applies the request once `process` returns.
pub trait ElementProcessor {
    fn name(&self) -> &str;

    fn process(
        &self,
        context: &ProcessingContext,
        tag: &mut ElementTag,
        actions: &mut ActionRequest,
    ) -> Result<(), ProcessorError>;
}

/// A processor that operates on whole nodes rather than on element tags.
///
/// The engine does not execute these; matching one on an element is an error.
pub trait NodeProcessor {
    fn name(&self) -> &str;
}

/// A registered processor of either kind.
#[derive(Clone)]
pub enum Processor {
    Element(Rc<dyn ElementProcessor>),
    Node(Rc<dyn NodeProcessor>),
}

impl Processor {
    pub fn element(processor: impl ElementProcessor + 'static) -> Self {
        Processor::Element(Rc::new(processor))
    }

    pub fn node(processor: impl NodeProcessor + 'static) -> Self {
        Processor::Node(Rc::new(processor))
    }

    pub fn name(&self) -> &str {
        match self {
            Processor::Element(p) => p.name(),
            Processor::Node(p) => p.name(),
        }
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Processor::Element(p) => write!(f, "Element({})", p.name()),
            Processor::Node(p) => write!(f, "Node({})", p.name()),
        }
    }
}

/// Element processor backed by a closure.
pub struct FnProcessor<F> {
    name: String,
    func: F,
}

impl<F> FnProcessor<F>
where
    F: Fn(&ProcessingContext, &mut ElementTag, &mut ActionRequest) -> Result<(), ProcessorError>,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> ElementProcessor for FnProcessor<F>
where
    F: Fn(&ProcessingContext, &mut ElementTag, &mut ActionRequest) -> Result<(), ProcessorError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn process(
        &self,
        context: &ProcessingContext,
        tag: &mut ElementTag,
        actions: &mut ActionRequest,
    ) -> Result<(), ProcessorError> {
        (self.func)(context, tag, actions)
    }
}
