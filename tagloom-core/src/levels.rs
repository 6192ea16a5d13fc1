//! Stack of markup levels whose close tag must be suppressed.

use smallvec::SmallVec;

/// Ordered markup levels, most recent on top.
///
/// A level is pushed when a tag is removed but its body kept; the close tag
/// arriving back at that level pops it and is swallowed. Nesting is shallow in
/// practice, so the first few levels live inline.
#[derive(Debug, Clone, Default)]
pub struct LevelStack {
    levels: SmallVec<[usize; 5]>,
}

impl LevelStack {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, level: usize) {
        self.levels.push(level);
    }

    /// Pop the top level if it equals `level`. Returns whether it did.
    #[inline]
    pub fn match_and_pop(&mut self, level: usize) -> bool {
        if self.levels.last() == Some(&level) {
            self.levels.pop();
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn peek(&self) -> Option<usize> {
        self.levels.last().copied()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.levels.len()
    }
}
