//! Cursor over the processors of one tag.

use smallvec::SmallVec;

use crate::event::ElementTag;
use crate::processor::Processor;
use crate::registry::{ProcessorId, ProcessorRegistry};

/// Walks the processors matching a tag, re-resolving the match on every step.
///
/// The cursor only remembers which processors have already run. Each call to
/// [`next`](Self::next) asks the registry for the processors matching the
/// tag's *current* attributes and returns the first one not yet executed, so
/// attributes added or removed by an earlier processor are honoured. Cloning
/// the record is enough to snapshot and restore the cursor.
#[derive(Debug, Clone, Default)]
pub struct ProcessorIterator {
    executed: SmallVec<[ProcessorId; 4]>,
}

impl ProcessorIterator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, registry: &ProcessorRegistry, tag: &ElementTag) -> Option<Processor> {
        let (id, processor) = registry
            .matching(tag)
            .find(|(id, _)| !self.executed.contains(id))?;
        self.executed.push(id);
        Some(processor.clone())
    }

    pub fn reset(&mut self) {
        self.executed.clear();
    }

    pub fn reset_as_clone_of(&mut self, other: &ProcessorIterator) {
        self.executed.clone_from(&other.executed);
    }

    /// Number of processors handed out since the last reset.
    pub fn executed(&self) -> usize {
        self.executed.len()
    }
}
