//! Template handler chain.
//!
//! A handler is one stage of a pipeline. The upstream producer calls the
//! handler's entry points in document order; a stage forwards (possibly
//! transformed) events by calling the same entry points on the next stage.

use crate::error::Result;
use crate::event::{
    CdataSection, CloseTag, Comment, DocType, ElementTag, ProcessingInstruction, TemplateEvent,
    Text, XmlDeclaration,
};

/// One stage of the event pipeline: one entry point per event variant, plus
/// the document start/end bracket.
pub trait TemplateHandler {
    fn handle_document_start(&mut self) -> Result<()>;
    fn handle_document_end(&mut self) -> Result<()>;

    fn handle_text(&mut self, text: Text) -> Result<()>;
    fn handle_comment(&mut self, comment: Comment) -> Result<()>;
    fn handle_cdata_section(&mut self, cdata: CdataSection) -> Result<()>;
    fn handle_doc_type(&mut self, doc_type: DocType) -> Result<()>;
    fn handle_xml_declaration(&mut self, decl: XmlDeclaration) -> Result<()>;
    fn handle_processing_instruction(&mut self, pi: ProcessingInstruction) -> Result<()>;

    fn handle_standalone_element(&mut self, tag: ElementTag) -> Result<()>;
    fn handle_open_element(&mut self, tag: ElementTag) -> Result<()>;
    fn handle_close_element(&mut self, tag: CloseTag) -> Result<()>;
    fn handle_auto_open_element(&mut self, tag: ElementTag) -> Result<()>;
    fn handle_auto_close_element(&mut self, tag: CloseTag) -> Result<()>;
    fn handle_unmatched_close_element(&mut self, tag: CloseTag) -> Result<()>;

    /// Route an event to its entry point.
    fn handle_event(&mut self, event: TemplateEvent) -> Result<()> {
        match event {
            TemplateEvent::Text(text) => self.handle_text(text),
            TemplateEvent::Comment(comment) => self.handle_comment(comment),
            TemplateEvent::CdataSection(cdata) => self.handle_cdata_section(cdata),
            TemplateEvent::DocType(doc_type) => self.handle_doc_type(doc_type),
            TemplateEvent::XmlDeclaration(decl) => self.handle_xml_declaration(decl),
            TemplateEvent::ProcessingInstruction(pi) => self.handle_processing_instruction(pi),
            TemplateEvent::StandaloneElement(tag) => self.handle_standalone_element(tag),
            TemplateEvent::OpenElement(tag) => self.handle_open_element(tag),
            TemplateEvent::CloseElement(tag) => self.handle_close_element(tag),
            TemplateEvent::AutoOpenElement(tag) => self.handle_auto_open_element(tag),
            TemplateEvent::AutoCloseElement(tag) => self.handle_auto_close_element(tag),
            TemplateEvent::UnmatchedCloseElement(tag) => self.handle_unmatched_close_element(tag),
        }
    }
}

/// Terminal stage that records everything it receives.
#[derive(Debug, Clone, Default)]
pub struct EventCollector {
    pub events: Vec<TemplateEvent>,
    pub document_starts: usize,
    pub document_ends: usize,
}

impl EventCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[TemplateEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<TemplateEvent> {
        self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.document_starts = 0;
        self.document_ends = 0;
    }

    fn record(&mut self, event: TemplateEvent) -> Result<()> {
        self.events.push(event);
        Ok(())
    }
}

impl TemplateHandler for EventCollector {
    fn handle_document_start(&mut self) -> Result<()> {
        self.document_starts += 1;
        Ok(())
    }

    fn handle_document_end(&mut self) -> Result<()> {
        self.document_ends += 1;
        Ok(())
    }

    fn handle_text(&mut self, text: Text) -> Result<()> {
        self.record(TemplateEvent::Text(text))
    }

    fn handle_comment(&mut self, comment: Comment) -> Result<()> {
        self.record(TemplateEvent::Comment(comment))
    }

    fn handle_cdata_section(&mut self, cdata: CdataSection) -> Result<()> {
        self.record(TemplateEvent::CdataSection(cdata))
    }

    fn handle_doc_type(&mut self, doc_type: DocType) -> Result<()> {
        self.record(TemplateEvent::DocType(doc_type))
    }

    fn handle_xml_declaration(&mut self, decl: XmlDeclaration) -> Result<()> {
        self.record(TemplateEvent::XmlDeclaration(decl))
    }

    fn handle_processing_instruction(&mut self, pi: ProcessingInstruction) -> Result<()> {
        self.record(TemplateEvent::ProcessingInstruction(pi))
    }

    fn handle_standalone_element(&mut self, tag: ElementTag) -> Result<()> {
        self.record(TemplateEvent::StandaloneElement(tag))
    }

    fn handle_open_element(&mut self, tag: ElementTag) -> Result<()> {
        self.record(TemplateEvent::OpenElement(tag))
    }

    fn handle_close_element(&mut self, tag: CloseTag) -> Result<()> {
        self.record(TemplateEvent::CloseElement(tag))
    }

    fn handle_auto_open_element(&mut self, tag: ElementTag) -> Result<()> {
        self.record(TemplateEvent::AutoOpenElement(tag))
    }

    fn handle_auto_close_element(&mut self, tag: CloseTag) -> Result<()> {
        self.record(TemplateEvent::AutoCloseElement(tag))
    }

    fn handle_unmatched_close_element(&mut self, tag: CloseTag) -> Result<()> {
        self.record(TemplateEvent::UnmatchedCloseElement(tag))
    }
}
