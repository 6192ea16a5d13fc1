//! Minimal markup tokenizer and renderer for tests
//!
//! Just enough markup to write fixtures by hand: tags with double-quoted or
//! minimized attributes, text, comments, CDATA, doctype and processing
//! instructions. No entity handling, no validation of tag balance.

use tagloom_core::{
    Attributes, CdataSection, Comment, CloseTag, DocType, Position, ProcessingInstruction,
    ProcessorRegistry, TemplateEvent, Text,
};

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0, line: 1, col: 1 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }

    fn advance(&mut self, len: usize) -> &'a str {
        let taken = &self.input[self.pos..self.pos + len];
        for c in taken.chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.pos += len;
        taken
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if self.rest().starts_with(prefix) {
            self.advance(prefix.len());
            true
        } else {
            false
        }
    }

    /// Consume up to and including `delim`, returning what came before it.
    fn until(&mut self, delim: &str) -> &'a str {
        let idx = self
            .rest()
            .find(delim)
            .unwrap_or_else(|| panic!("unterminated markup, expected {:?} at {}", delim, self.position()));
        let taken = self.advance(idx);
        self.advance(delim.len());
        taken
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let len = self
            .rest()
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.rest().len(), |(i, _)| i);
        self.advance(len)
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }
}

/// Tokenize markup into events, computing each tag's processor flag with `registry`.
pub fn tokenize(input: &str, registry: &ProcessorRegistry) -> Vec<TemplateEvent> {
    let mut lexer = Lexer::new(input);
    let mut events = Vec::new();

    while !lexer.at_end() {
        let position = lexer.position();
        if lexer.eat("<!--") {
            let content = lexer.until("-->").to_string();
            events.push(TemplateEvent::Comment(Comment { content, position }));
        } else if lexer.eat("<![CDATA[") {
            let content = lexer.until("]]>").to_string();
            events.push(TemplateEvent::CdataSection(CdataSection { content, position }));
        } else if lexer.eat("<!DOCTYPE ") {
            let root_element = lexer.until(">").trim().to_string();
            events.push(TemplateEvent::DocType(DocType {
                root_element,
                public_id: None,
                system_id: None,
                position,
            }));
        } else if lexer.eat("<?") {
            let body = lexer.until("?>");
            let (target, content) = match body.split_once(char::is_whitespace) {
                Some((target, content)) => (target, Some(content.to_string())),
                None => (body, None),
            };
            events.push(TemplateEvent::ProcessingInstruction(ProcessingInstruction {
                target: target.to_string(),
                content,
                position,
            }));
        } else if lexer.eat("</") {
            let name = lexer.until(">").trim();
            events.push(TemplateEvent::CloseElement(CloseTag::new(name, position)));
        } else if lexer.eat("<") {
            events.push(tag(&mut lexer, registry, position));
        } else {
            let content = lexer.take_while(|c| c != '<');
            events.push(TemplateEvent::Text(Text::new(content, position)));
        }
    }
    events
}

fn tag(lexer: &mut Lexer<'_>, registry: &ProcessorRegistry, position: Position) -> TemplateEvent {
    let name = lexer.take_while(|c| !c.is_whitespace() && c != '>' && c != '/');
    let mut attributes = Attributes::new();
    loop {
        lexer.skip_whitespace();
        if lexer.eat("/>") {
            return TemplateEvent::StandaloneElement(registry.element(name, attributes, position));
        }
        if lexer.eat(">") {
            return TemplateEvent::OpenElement(registry.element(name, attributes, position));
        }
        assert!(!lexer.at_end(), "unterminated tag <{} at {}", name, position);
        let attr = lexer.take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/');
        if lexer.eat("=\"") {
            let value = lexer.until("\"");
            attributes.set(attr, value);
        } else {
            attributes.set_minimized(attr);
        }
    }
}

fn render_attributes(out: &mut String, attributes: &Attributes) {
    for attr in attributes.iter() {
        out.push(' ');
        out.push_str(&attr.name);
        if let Some(value) = &attr.value {
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }
    }
}

/// Render events back to markup. Positions and processor flags are not rendered.
pub fn render(events: &[TemplateEvent]) -> String {
    let mut out = String::new();
    for event in events {
        match event {
            TemplateEvent::Text(text) => out.push_str(&text.content),
            TemplateEvent::Comment(comment) => {
                out.push_str(&format!("<!--{}-->", comment.content));
            }
            TemplateEvent::CdataSection(cdata) => {
                out.push_str(&format!("<![CDATA[{}]]>", cdata.content));
            }
            TemplateEvent::DocType(doc_type) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(&doc_type.root_element);
                if let Some(public_id) = &doc_type.public_id {
                    out.push_str(&format!(" PUBLIC \"{}\"", public_id));
                }
                if let Some(system_id) = &doc_type.system_id {
                    out.push_str(&format!(" \"{}\"", system_id));
                }
                out.push('>');
            }
            TemplateEvent::XmlDeclaration(decl) => {
                out.push_str(&format!("<?xml version=\"{}\"", decl.version));
                if let Some(encoding) = &decl.encoding {
                    out.push_str(&format!(" encoding=\"{}\"", encoding));
                }
                if let Some(standalone) = &decl.standalone {
                    out.push_str(&format!(" standalone=\"{}\"", standalone));
                }
                out.push_str("?>");
            }
            TemplateEvent::ProcessingInstruction(pi) => {
                out.push_str("<?");
                out.push_str(&pi.target);
                if let Some(content) = &pi.content {
                    out.push(' ');
                    out.push_str(content);
                }
                out.push_str("?>");
            }
            TemplateEvent::StandaloneElement(tag) => {
                out.push('<');
                out.push_str(tag.name());
                render_attributes(&mut out, &tag.attributes);
                out.push_str("/>");
            }
            TemplateEvent::OpenElement(tag) | TemplateEvent::AutoOpenElement(tag) => {
                out.push('<');
                out.push_str(tag.name());
                render_attributes(&mut out, &tag.attributes);
                out.push('>');
            }
            TemplateEvent::CloseElement(tag)
            | TemplateEvent::AutoCloseElement(tag)
            | TemplateEvent::UnmatchedCloseElement(tag) => {
                out.push_str("</");
                out.push_str(tag.name());
                out.push('>');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_render_identity() {
        let registry = ProcessorRegistry::new();
        let input = "<!DOCTYPE html><p class=\"a\" hidden>hi<br/><!--c--></p><?pi x?><![CDATA[<b>]]>";
        let events = tokenize(input, &registry);
        assert_eq!(events.len(), 8);
        assert_eq!(render(&events), input);
    }

    #[test]
    fn test_positions() {
        let registry = ProcessorRegistry::new();
        let events = tokenize("<a>\n  <b/></a>", &registry);
        assert_eq!(events[0].position(), Position::new(1, 1));
        assert_eq!(events[2].position(), Position::new(2, 3));
    }
}
