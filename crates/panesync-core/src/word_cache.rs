//! Memoized word-level refinement of line hunks

use crate::diff::DiffEngine;
use crate::document::TextBuffer;
use crate::geometry::{DiffPath, ViewMetrics};
use crate::hunk::{Hunk, HunkSequence, Side};
use crate::words::{words_in_lines, Word};
use rustc_hash::FxHashMap;

/// A pane as seen by the word cache: its text and how it is laid out
#[derive(Clone, Copy)]
pub struct PaneView<'a> {
    pub buffer: &'a dyn TextBuffer,
    pub metrics: &'a ViewMetrics,
}

impl<'a> PaneView<'a> {
    pub fn new(buffer: &'a dyn TextBuffer, metrics: &'a ViewMetrics) -> Self {
        Self { buffer, metrics }
    }
}

/// Source-side and target-side highlight paths of one hunk
pub type HunkPaths = (DiffPath, DiffPath);

/// Caches word-diff paths per `(sequence generation, hunk)`.
///
/// There is no partial invalidation: [`clear`](WordDiffCache::clear) drops
/// everything and is called whenever a sequence is replaced or the
/// presentation metrics change.
#[derive(Debug, Default)]
pub struct WordDiffCache {
    engine: DiffEngine,
    entries: FxHashMap<u64, FxHashMap<Hunk, HunkPaths>>,
    computations: usize,
}

impl WordDiffCache {
    pub fn new(engine: DiffEngine) -> Self {
        Self {
            engine,
            ..Self::default()
        }
    }

    /// Paths for `hunk` of `sequence`, computing them on first use
    pub fn get_paths(
        &mut self,
        sequence: &HunkSequence,
        hunk: Hunk,
        source: PaneView<'_>,
        target: PaneView<'_>,
    ) -> &HunkPaths {
        let engine = self.engine;
        let computations = &mut self.computations;
        self.entries
            .entry(sequence.generation())
            .or_default()
            .entry(hunk)
            .or_insert_with(|| {
                *computations += 1;
                tracing::debug!(
                    generation = sequence.generation(),
                    ?hunk,
                    "computing word diff"
                );
                compute_paths(&engine, hunk, source, target)
            })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cache misses so far
    pub fn computations(&self) -> usize {
        self.computations
    }

    /// Number of memoized hunks
    pub fn len(&self) -> usize {
        self.entries.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn compute_paths(
    engine: &DiffEngine,
    hunk: Hunk,
    source: PaneView<'_>,
    target: PaneView<'_>,
) -> HunkPaths {
    let source_words = words_in_lines(source.buffer, hunk.lines(Side::Source));
    let target_words = words_in_lines(target.buffer, hunk.lines(Side::Target));

    let source_texts: Vec<&str> = source_words.iter().map(|w| w.text.as_str()).collect();
    let target_texts: Vec<&str> = target_words.iter().map(|w| w.text.as_str()).collect();
    let word_hunks = engine.diff(&source_texts, &target_texts);

    (
        chunk_path(source, &word_hunks, &source_words, Side::Source),
        chunk_path(target, &word_hunks, &target_words, Side::Target),
    )
}

/// Merge the changed words of one side into as few rectangles as possible:
/// a rectangle keeps growing while the next changed word starts where the
/// previous one ended.
fn chunk_path(view: PaneView<'_>, word_hunks: &[Hunk], words: &[Word], side: Side) -> DiffPath {
    let mut rects = Vec::new();
    let mut span: Option<(usize, usize)> = None;

    let changed = word_hunks
        .iter()
        .flat_map(|h| words.get(h.lines(side)).unwrap_or_default());
    for word in changed {
        if let Some((_, end)) = span.as_mut() {
            if *end == word.range.start {
                *end = word.range.end;
                continue;
            }
        }
        if let Some((start, end)) = span.replace((word.range.start, word.range.end)) {
            rects.push(view.metrics.span_rect(view.buffer, start, end));
        }
    }
    if let Some((start, end)) = span {
        rects.push(view.metrics.span_rect(view.buffer, start, end));
    }

    DiffPath::new(rects)
}
