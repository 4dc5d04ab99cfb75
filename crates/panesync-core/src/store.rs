//! Hunk store: the current line diff of one pane relation

use crate::diff::DiffEngine;
use crate::document::TextBuffer;
use crate::hunk::{Hunk, HunkSequence};
use std::hash::Hash;

/// Owns the hunk sequence for one source/target pair.
///
/// Recomputing always installs a whole new sequence (with a new generation),
/// so anything keyed on the old generation stops matching.
#[derive(Debug)]
pub struct HunkStore {
    engine: DiffEngine,
    sequence: HunkSequence,
}

impl HunkStore {
    pub fn new(engine: DiffEngine) -> Self {
        Self {
            engine,
            sequence: HunkSequence::empty(),
        }
    }

    /// Re-diff two buffers. A missing side yields an empty sequence.
    pub fn recompute(
        &mut self,
        source: Option<&dyn TextBuffer>,
        target: Option<&dyn TextBuffer>,
    ) -> &HunkSequence {
        let source = source.map(|b| b.lines());
        let target = target.map(|b| b.lines());
        self.recompute_tokens(source.as_deref(), target.as_deref())
    }

    /// Re-diff two pre-split line (or token) lists
    pub fn recompute_tokens<T: Hash + Eq>(
        &mut self,
        source: Option<&[T]>,
        target: Option<&[T]>,
    ) -> &HunkSequence {
        let hunks = match (source, target) {
            (Some(source), Some(target)) => self.engine.diff(source, target),
            _ => Vec::new(),
        };
        self.sequence = HunkSequence::new(hunks);
        tracing::debug!(
            generation = self.sequence.generation(),
            hunks = self.sequence.len(),
            "recomputed line diff"
        );
        &self.sequence
    }

    pub fn sequence(&self) -> &HunkSequence {
        &self.sequence
    }

    pub fn get(&self, index: usize) -> Option<Hunk> {
        self.sequence.get(index)
    }

    pub fn count(&self) -> usize {
        self.sequence.len()
    }

    pub fn contains(&self, hunk: &Hunk) -> bool {
        self.sequence.contains(hunk)
    }

    pub fn generation(&self) -> u64 {
        self.sequence.generation()
    }
}
