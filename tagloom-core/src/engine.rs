//! The processor-driven dispatch engine.
//!
//! `ProcessorTemplateHandler` sits in a handler chain. For every incoming
//! event it decides, in this order:
//!
//! 1. **Discard** - the event is inside a body that a processor removed.
//! 2. **Gather** - the event is inside the body of an element being iterated;
//!    it is buffered and replayed once per item when the element closes.
//! 3. **Forward / execute** - non-element events, and element events with no
//!    processors, go straight to the next stage. Element events with
//!    processors run their processor chain first.
//!
//! # Suspension
//!
//! Some requests cannot be completed on the event that made them:
//!
//! ```text
//! <img t:text="${x}"/>      standalone asks for a body
//!   -> chain suspended, <img> re-fired as open + close
//!   -> chain resumes on the open tag, body text queued, close forwarded
//!
//! <li t:each="i : ${xs}">   open asks for iteration
//!   -> chain suspended, body gathered until </li>
//!   -> per item: chain resumes on a copy of <li>, gathered body replayed
//! ```
//!
//! The suspended chain is a plain value (queue + processor cursor + flags)
//! stored on the engine and picked up by the next execution. Re-firing is
//! ordinary recursion through the engine's own entry points.
//!
//! # Levels
//!
//! `markup_level` counts open elements. The variables map gets one scope
//! level per processor execution and one per element opened through the
//! fast path; a close tag pops the level its open tag pushed.

use std::mem;

use log::{debug, trace, warn};

use crate::action::{ActionRequest, ElementAction};
use crate::context::ProcessingContext;
use crate::error::{EngineError, Result};
use crate::event::{
    CdataSection, CloseTag, Comment, DocType, ElementTag, Position, ProcessingInstruction,
    TemplateEvent, Text, XmlDeclaration,
};
use crate::handler::TemplateHandler;
use crate::iteration::{IterationSource, IterationStatus};
use crate::levels::LevelStack;
use crate::processor::Processor;
use crate::processor_iter::ProcessorIterator;
use crate::queue::EventQueue;
use crate::state::{IterationState, SuspensionState};
use crate::value::Value;

const TARGET: &str = "tagloom.engine";

/// Scratch storage for one level of processor execution.
#[derive(Debug, Default)]
struct ExecSlot {
    queue: EventQueue,
    iterator: ProcessorIterator,
}

/// One in-flight processor execution.
struct Execution {
    slot: ExecSlot,
    queue_processable: bool,
    body_removed: bool,
    tag_removed: bool,
}

/// Requests that end the execution of a chain early.
enum Interrupt {
    Iterate {
        item_variable: String,
        status_variable: Option<String>,
        iterated: Value,
    },
    /// A standalone tag needs a body: re-fire it as open + close.
    Resynthesize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Standalone,
    Open,
}

enum Route {
    Discard,
    Gather,
    Forward,
}

/// Handler stage that runs processors over element events.
///
/// One instance processes one document at a time; it can be reused for a
/// following document, since `handle_document_start` resets all state.
pub struct ProcessorTemplateHandler<N: TemplateHandler> {
    context: ProcessingContext,
    next: N,
    actions: ActionRequest,

    markup_level: usize,
    /// Events at or deeper than this level are discarded.
    skip_from: Option<usize>,
    /// Levels whose close tag is swallowed (tag removed, body kept).
    skip_close: LevelStack,

    exec_level: usize,
    slots: Vec<ExecSlot>,

    suspended: Option<SuspensionState>,
    gathering: Option<IterationState>,
}

impl<N: TemplateHandler> ProcessorTemplateHandler<N> {
    pub fn new(context: ProcessingContext, next: N) -> Self {
        if !context.has_local_variables() {
            warn!(
                target: "tagloom.context",
                "variables map has no local scopes: local variables are ignored and iteration will fail"
            );
        }
        let slots = (0..context.config().initial_exec_slots)
            .map(|_| ExecSlot::default())
            .collect();
        Self {
            context,
            next,
            actions: ActionRequest::new(),
            markup_level: 0,
            skip_from: None,
            skip_close: LevelStack::new(),
            exec_level: 0,
            slots,
            suspended: None,
            gathering: None,
        }
    }

    pub fn context(&self) -> &ProcessingContext {
        &self.context
    }

    pub fn next(&self) -> &N {
        &self.next
    }

    pub fn next_mut(&mut self) -> &mut N {
        &mut self.next
    }

    pub fn into_next(self) -> N {
        self.next
    }

    /// Number of currently open elements.
    pub fn markup_level(&self) -> usize {
        self.markup_level
    }

    /// Number of processor executions currently in progress.
    pub fn exec_level(&self) -> usize {
        self.exec_level
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.is_some()
    }

    pub fn is_gathering(&self) -> bool {
        self.gathering.is_some()
    }

    fn reset_state(&mut self) {
        self.markup_level = 0;
        self.skip_from = None;
        self.skip_close.clear();
        self.exec_level = 0;
        self.suspended = None;
        self.gathering = None;
        self.actions.reset();
        for slot in &mut self.slots {
            slot.queue.reset();
            slot.iterator.reset();
        }
        // A failed document can leave scopes pushed.
        if let Some(variables) = self.context.local_variables_mut() {
            while variables.level() > 0 {
                variables.decrease_level();
            }
        }
    }

    // ========================================================================
    // Routing
    // ========================================================================

    fn is_skipping(&self) -> bool {
        self.skip_from.is_some_and(|from| self.markup_level >= from)
    }

    fn route(&self) -> Route {
        if self.is_skipping() {
            Route::Discard
        } else if self
            .gathering
            .as_ref()
            .is_some_and(|gathering| self.markup_level >= gathering.from_level)
        {
            Route::Gather
        } else {
            Route::Forward
        }
    }

    fn gather(&mut self, event: TemplateEvent) {
        if let Some(gathering) = self.gathering.as_mut() {
            gathering.queue.push(event);
        }
    }

    /// Non-element events: discard, gather or forward.
    fn pass(&mut self, event: TemplateEvent) -> Result<()> {
        match self.route() {
            Route::Discard => Ok(()),
            Route::Gather => {
                self.gather(event);
                Ok(())
            }
            Route::Forward => self.next.handle_event(event),
        }
    }

    // ========================================================================
    // Variable scope
    // ========================================================================

    fn increase_scope(&mut self) {
        if let Some(variables) = self.context.local_variables_mut() {
            variables.increase_level();
        }
    }

    fn decrease_scope(&mut self) {
        if let Some(variables) = self.context.local_variables_mut() {
            variables.decrease_level();
        }
    }

    fn apply_variables(&mut self) {
        if self.actions.set_variables.is_empty() && self.actions.removed_variables.is_empty() {
            return;
        }
        match self.context.local_variables_mut() {
            Some(variables) => {
                for (name, value) in self.actions.set_variables.drain(..) {
                    variables.put(name, value);
                }
                for name in self.actions.removed_variables.drain(..) {
                    variables.remove(&name);
                }
            }
            None => debug!(
                target: TARGET,
                "ignoring local variable changes: variables map has no local scopes"
            ),
        }
    }

    // ========================================================================
    // Processor execution
    // ========================================================================

    fn enter_execution(&mut self) -> Execution {
        if self.exec_level >= self.slots.len() {
            let grow = self.context.config().initial_exec_slots.max(1);
            self.slots
                .resize_with(self.slots.len() + grow, ExecSlot::default);
        }
        let mut slot = mem::take(&mut self.slots[self.exec_level]);
        self.exec_level += 1;
        self.increase_scope();

        match self.suspended.take() {
            Some(suspension) => {
                trace!(
                    target: TARGET,
                    "resuming suspended chain ({} processors already run)",
                    suspension.iterator.executed()
                );
                slot.queue = suspension.queue;
                slot.iterator = suspension.iterator;
                Execution {
                    slot,
                    queue_processable: suspension.queue_processable,
                    body_removed: suspension.body_removed,
                    tag_removed: false,
                }
            }
            None => {
                slot.queue.reset();
                slot.iterator.reset();
                Execution {
                    slot,
                    queue_processable: false,
                    body_removed: false,
                    tag_removed: false,
                }
            }
        }
    }

    fn leave_execution(&mut self, exec: Execution) {
        let mut slot = exec.slot;
        slot.queue.reset();
        self.exec_level -= 1;
        self.slots[self.exec_level] = slot;
    }

    fn suspend(&mut self, exec: &mut Execution) {
        trace!(
            target: TARGET,
            "suspending chain ({} processors run, {} queued events)",
            exec.slot.iterator.executed(),
            exec.slot.queue.len()
        );
        self.suspended = Some(SuspensionState {
            body_removed: exec.body_removed,
            queue_processable: exec.queue_processable,
            queue: mem::take(&mut exec.slot.queue),
            iterator: mem::take(&mut exec.slot.iterator),
        });
    }

    /// Send the execution's queue on: back through this engine if processable,
    /// else straight to the next stage.
    fn flush_queue(&mut self, exec: &mut Execution) -> Result<()> {
        if exec.slot.queue.is_empty() {
            return Ok(());
        }
        if exec.queue_processable {
            exec.slot.queue.process(self)
        } else {
            exec.slot.queue.process(&mut self.next)
        }
    }

    /// Run the remaining processors matching `tag`.
    fn run_chain(
        &mut self,
        tag: &mut ElementTag,
        kind: TagKind,
        exec: &mut Execution,
    ) -> Result<Option<Interrupt>> {
        while !exec.tag_removed {
            let Some(processor) = exec.slot.iterator.next(self.context.registry(), tag) else {
                break;
            };
            let processor = match processor {
                Processor::Element(processor) => processor,
                Processor::Node(processor) => {
                    return Err(EngineError::UnsupportedProcessor {
                        processor: processor.name().to_string(),
                        tag: tag.name().to_string(),
                        position: tag.position(),
                    });
                }
            };

            trace!(target: TARGET, "running '{}' on <{}>", processor.name(), tag.name());
            self.actions.reset();
            processor
                .process(&self.context, tag, &mut self.actions)
                .map_err(|source| EngineError::Processor {
                    processor: processor.name().to_string(),
                    tag: tag.name().to_string(),
                    position: tag.position(),
                    source,
                })?;
            self.apply_variables();

            match self.actions.take_action() {
                ElementAction::None => {}
                ElementAction::Iterate {
                    item_variable,
                    status_variable,
                    iterated,
                } => {
                    if !self.context.has_local_variables() {
                        return Err(EngineError::IterationUnavailable {
                            tag: tag.name().to_string(),
                            position: tag.position(),
                        });
                    }
                    return Ok(Some(Interrupt::Iterate {
                        item_variable,
                        status_variable,
                        iterated,
                    }));
                }
                ElementAction::SetBody {
                    content,
                    processable,
                } => {
                    exec.slot.queue.reset();
                    content.fill(&mut exec.slot.queue, tag.position());
                    exec.queue_processable = processable;
                    exec.body_removed = true;
                    if kind == TagKind::Standalone {
                        return Ok(Some(Interrupt::Resynthesize));
                    }
                }
                ElementAction::ReplaceWith {
                    content,
                    processable,
                } => {
                    exec.slot.queue.reset();
                    content.fill(&mut exec.slot.queue, tag.position());
                    exec.queue_processable = processable;
                    exec.tag_removed = true;
                    exec.body_removed = kind == TagKind::Open;
                }
                ElementAction::RemoveElement => {
                    exec.slot.queue.reset();
                    exec.tag_removed = true;
                    exec.body_removed = kind == TagKind::Open;
                }
                ElementAction::RemoveTag => {
                    exec.tag_removed = true;
                }
            }
        }
        Ok(None)
    }

    fn execute_standalone(&mut self, mut tag: ElementTag) -> Result<()> {
        let mut exec = self.enter_execution();

        match self.run_chain(&mut tag, TagKind::Standalone, &mut exec)? {
            None => {}
            Some(Interrupt::Iterate {
                item_variable,
                status_variable,
                iterated,
            }) => {
                // Nothing to gather: the tag itself is the whole body.
                let mut iteration =
                    IterationState::new(self.markup_level, item_variable, status_variable, iterated);
                iteration.queue.push(TemplateEvent::StandaloneElement(tag));
                self.suspend(&mut exec);
                self.leave_execution(exec);
                self.process_iteration(iteration)?;
                self.decrease_scope();
                return Ok(());
            }
            Some(Interrupt::Resynthesize) => {
                debug!(
                    target: TARGET,
                    "re-firing <{}/> at {} as open and close tags",
                    tag.name(),
                    tag.position()
                );
                let close = tag.close_tag();
                self.suspend(&mut exec);
                self.leave_execution(exec);
                self.handle_open_element(tag)?;
                self.handle_close_element(close)?;
                self.decrease_scope();
                return Ok(());
            }
        }

        if !exec.tag_removed {
            self.next.handle_standalone_element(tag)?;
        }
        self.flush_queue(&mut exec)?;
        self.decrease_scope();
        self.leave_execution(exec);
        Ok(())
    }

    fn execute_open(&mut self, mut tag: ElementTag) -> Result<()> {
        let mut exec = self.enter_execution();

        match self.run_chain(&mut tag, TagKind::Open, &mut exec)? {
            None => {}
            Some(Interrupt::Iterate {
                item_variable,
                status_variable,
                iterated,
            }) => {
                debug!(
                    target: TARGET,
                    "gathering body of <{}> at {} for iteration over '{}'",
                    tag.name(),
                    tag.position(),
                    item_variable
                );
                let mut iteration = IterationState::new(
                    self.markup_level + 1,
                    item_variable,
                    status_variable,
                    iterated,
                );
                iteration.queue.push(TemplateEvent::OpenElement(tag));
                self.gathering = Some(iteration);
                self.suspend(&mut exec);
                self.markup_level += 1;
                // The scope level stays pushed until the matching close runs the iteration.
                self.leave_execution(exec);
                return Ok(());
            }
            Some(Interrupt::Resynthesize) => {
                return Err(EngineError::invariant(
                    format!("open tag <{}> cannot be re-fired", tag.name()),
                    tag.position(),
                ));
            }
        }

        if !exec.tag_removed {
            self.next.handle_open_element(tag)?;
        }
        self.markup_level += 1;
        self.flush_queue(&mut exec)?;
        if exec.body_removed {
            self.skip_from = Some(self.markup_level);
        }
        if exec.tag_removed {
            self.skip_close.push(self.markup_level - 1);
        }
        self.leave_execution(exec);
        Ok(())
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    fn process_iteration(&mut self, iteration: IterationState) -> Result<()> {
        let (tag, position) = iteration
            .queue
            .iter()
            .next()
            .and_then(TemplateEvent::element_tag)
            .map_or((String::new(), Position::default()), |tag| {
                (tag.name().to_string(), tag.position())
            });
        if !self.context.has_local_variables() {
            return Err(EngineError::IterationUnavailable { tag, position });
        }
        let status_variable =
            iteration.resolve_status_variable(&self.context.config().status_variable_suffix);
        let template = self.suspended.take().ok_or_else(|| {
            EngineError::invariant(
                format!("iteration over <{}> has no suspended chain", tag),
                position,
            )
        })?;

        let source = IterationSource::from_value(iteration.iterated);
        let size = source.size();
        debug!(
            target: TARGET,
            "iterating <{}> at {}: {} -> '{}' / '{}' (size {:?})",
            tag,
            position,
            source.kind(),
            iteration.item_variable,
            status_variable,
            size
        );

        for (index, item) in source.enumerate() {
            let status = IterationStatus::new(index, size, item.clone());
            let variables = self
                .context
                .local_variables_mut()
                .ok_or_else(|| EngineError::IterationUnavailable {
                    tag: tag.clone(),
                    position,
                })?;
            variables.increase_level();
            variables.put(iteration.item_variable.clone(), item);
            variables.put(status_variable.clone(), Value::Status(Box::new(status)));

            self.suspended = Some(template.clone());
            iteration.queue.replay(self)?;
            self.decrease_scope();
        }

        self.suspended = None;
        Ok(())
    }

    // ========================================================================
    // Depth-changing events
    // ========================================================================

    fn open(&mut self, tag: ElementTag, auto: bool) -> Result<()> {
        let event = |tag| {
            if auto {
                TemplateEvent::AutoOpenElement(tag)
            } else {
                TemplateEvent::OpenElement(tag)
            }
        };
        match self.route() {
            Route::Discard => {
                self.markup_level += 1;
                return Ok(());
            }
            Route::Gather => {
                self.gather(event(tag));
                self.markup_level += 1;
                return Ok(());
            }
            Route::Forward => {}
        }
        if auto || (self.suspended.is_none() && !tag.has_processors()) {
            self.next.handle_event(event(tag))?;
            self.markup_level += 1;
            self.increase_scope();
            return Ok(());
        }
        self.execute_open(tag)
    }

    fn close(&mut self, tag: CloseTag, auto: bool) -> Result<()> {
        let event = |tag| {
            if auto {
                TemplateEvent::AutoCloseElement(tag)
            } else {
                TemplateEvent::CloseElement(tag)
            }
        };
        self.markup_level = match self.markup_level.checked_sub(1) {
            Some(level) => level,
            None => {
                return Err(EngineError::invariant(
                    format!("close tag </{}> with no open element", tag.name()),
                    tag.position(),
                ));
            }
        };
        if self.is_skipping() {
            return Ok(());
        }

        let level = self.markup_level;
        if let Some(gathering) = self.gathering.as_mut() {
            if level >= gathering.from_level {
                gathering.queue.push(event(tag));
                return Ok(());
            }
            if level + 1 == gathering.from_level {
                gathering.queue.push(event(tag));
                if let Some(iteration) = self.gathering.take() {
                    self.process_iteration(iteration)?;
                }
                self.decrease_scope();
                return Ok(());
            }
        }

        self.decrease_scope();
        if self.skip_from == Some(level + 1) {
            self.skip_from = None;
        }
        if self.skip_close.match_and_pop(level) {
            return Ok(());
        }
        self.next.handle_event(event(tag))
    }
}

impl<N: TemplateHandler> TemplateHandler for ProcessorTemplateHandler<N> {
    fn handle_document_start(&mut self) -> Result<()> {
        debug!(target: TARGET, "document start");
        self.reset_state();
        self.next.handle_document_start()
    }

    fn handle_document_end(&mut self) -> Result<()> {
        if self.markup_level != 0 {
            warn!(
                target: TARGET,
                "document ended with {} unclosed element(s)",
                self.markup_level
            );
        }
        if let Some(gathering) = &self.gathering {
            warn!(
                target: TARGET,
                "document ended while gathering an iteration over '{}' ({} events dropped)",
                gathering.item_variable,
                gathering.queue.len()
            );
        }
        debug!(target: TARGET, "document end");
        self.next.handle_document_end()
    }

    fn handle_text(&mut self, text: Text) -> Result<()> {
        self.pass(TemplateEvent::Text(text))
    }

    fn handle_comment(&mut self, comment: Comment) -> Result<()> {
        self.pass(TemplateEvent::Comment(comment))
    }

    fn handle_cdata_section(&mut self, cdata: CdataSection) -> Result<()> {
        self.pass(TemplateEvent::CdataSection(cdata))
    }

    fn handle_doc_type(&mut self, doc_type: DocType) -> Result<()> {
        self.pass(TemplateEvent::DocType(doc_type))
    }

    fn handle_xml_declaration(&mut self, decl: XmlDeclaration) -> Result<()> {
        self.pass(TemplateEvent::XmlDeclaration(decl))
    }

    fn handle_processing_instruction(&mut self, pi: ProcessingInstruction) -> Result<()> {
        self.pass(TemplateEvent::ProcessingInstruction(pi))
    }

    fn handle_standalone_element(&mut self, tag: ElementTag) -> Result<()> {
        match self.route() {
            Route::Discard => Ok(()),
            Route::Gather => {
                self.gather(TemplateEvent::StandaloneElement(tag));
                Ok(())
            }
            Route::Forward if self.suspended.is_none() && !tag.has_processors() => {
                self.next.handle_standalone_element(tag)
            }
            Route::Forward => self.execute_standalone(tag),
        }
    }

    fn handle_open_element(&mut self, tag: ElementTag) -> Result<()> {
        self.open(tag, false)
    }

    fn handle_close_element(&mut self, tag: CloseTag) -> Result<()> {
        self.close(tag, false)
    }

    fn handle_auto_open_element(&mut self, tag: ElementTag) -> Result<()> {
        self.open(tag, true)
    }

    fn handle_auto_close_element(&mut self, tag: CloseTag) -> Result<()> {
        self.close(tag, true)
    }

    fn handle_unmatched_close_element(&mut self, tag: CloseTag) -> Result<()> {
        self.pass(TemplateEvent::UnmatchedCloseElement(tag))
    }
}
