//! Tagloom Core
//!
//! Streaming, processor-driven transformation of markup events.
//! Consumes a document as a flat sequence of events and emits a transformed
//! sequence to the next handler, without ever building a tree.
//!
//! # Architecture
//!
//! - **event.rs** - TemplateEvent enum, element/close tags, attributes
//! - **handler.rs** - TemplateHandler chain interface, EventCollector sink
//! - **engine.rs** - ProcessorTemplateHandler: skip/gather/execute dispatch,
//!   suspension and iteration
//! - **processor.rs**, **registry.rs**, **processor_iter.rs** - processors,
//!   matching by tag/attribute, per-tag processor cursor
//! - **action.rs** - ActionRequest vocabulary processors answer with
//! - **variables.rs** - variable maps with nested scope levels
//! - **iteration.rs**, **value.rs** - iterated values and loop status
//! - **queue.rs**, **levels.rs**, **state.rs** - engine scratch state
//! - **context.rs**, **config.rs**, **error.rs** - setup and failure reporting
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use tagloom_core::{
//!     Attributes, EngineConfig, EventCollector, FnProcessor, Matcher, Position,
//!     ProcessingContext, Processor, ProcessorRegistry, ProcessorTemplateHandler,
//!     ScopedVariables, TemplateEvent, TemplateHandler, Text,
//! };
//!
//! let mut registry = ProcessorRegistry::new();
//! registry.register(
//!     Matcher::attribute("t:remove"),
//!     1600,
//!     Processor::element(FnProcessor::new("t:remove", |_, _, actions| {
//!         actions.remove_element();
//!         Ok(())
//!     })),
//! );
//! let context = ProcessingContext::builder()
//!     .config(EngineConfig::default())
//!     .registry(Rc::new(registry))
//!     .variables(ScopedVariables::new())
//!     .build()?;
//!
//! let attrs: Attributes = [("t:remove", "all")].into_iter().collect();
//! let div = context.registry().element("div", attrs, Position::new(1, 1));
//! let mut engine = ProcessorTemplateHandler::new(context, EventCollector::new());
//!
//! engine.handle_document_start()?;
//! engine.handle_open_element(div.clone())?;
//! engine.handle_text(Text::new("gone", Position::new(1, 24)))?;
//! engine.handle_close_element(div.close_tag())?;
//! engine.handle_text(Text::new("kept", Position::new(1, 34)))?;
//! engine.handle_document_end()?;
//!
//! let out = engine.into_next();
//! assert_eq!(out.events(), &[TemplateEvent::Text(Text::new("kept", Position::new(1, 34)))]);
//! # Ok::<(), tagloom_core::EngineError>(())
//! ```

pub mod action;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod handler;
pub mod iteration;
pub mod levels;
pub mod processor;
pub mod processor_iter;
pub mod queue;
pub mod registry;
pub mod state;
pub mod value;
pub mod variables;

pub use action::{ActionRequest, Content, ElementAction};
pub use config::{EngineConfig, TemplateMode};
pub use context::{ProcessingContext, ProcessingContextBuilder};
pub use engine::ProcessorTemplateHandler;
pub use error::{EngineError, ProcessorError, Result};
pub use event::{
    Attribute, Attributes, CdataSection, CloseTag, Comment, DocType, ElementTag, Position,
    ProcessingInstruction, TemplateEvent, Text, XmlDeclaration,
};
pub use handler::{EventCollector, TemplateHandler};
pub use iteration::{IteratedKind, IterationSource, IterationStatus};
pub use levels::LevelStack;
pub use processor::{ElementProcessor, FnProcessor, NodeProcessor, Processor};
pub use processor_iter::ProcessorIterator;
pub use queue::EventQueue;
pub use registry::{Matcher, ProcessorId, ProcessorRegistry};
pub use state::{IterationState, SuspensionState};
pub use value::{Cursor, MapEntry, Sequence, Value};
pub use variables::{LocalVariablesMap, PlainVariables, ScopedVariables, VariablesMap};
