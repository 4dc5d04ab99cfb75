//! Line-level hunks and the sequences a diff produces

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Which side of a diff relation a hunk range refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The pane lines are removed from (`remove_start`/`removed`)
    Source,
    /// The pane lines are inserted into (`insert_start`/`inserted`)
    Target,
}

/// Highlight tone of a hunk on one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    Added,
    Removed,
}

/// A contiguous block of source lines replaced by a block of target lines.
///
/// Hunks are plain values: a re-diff produces new hunks, nothing is ever
/// patched in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hunk {
    pub remove_start: usize,
    pub removed: usize,
    pub insert_start: usize,
    pub inserted: usize,
}

impl Hunk {
    /// Sentinel for "no hunk". Never equal to a hunk produced by a diff.
    pub const EMPTY: Hunk = Hunk {
        remove_start: usize::MAX,
        removed: 0,
        insert_start: usize::MAX,
        inserted: 0,
    };

    pub fn new(remove_start: usize, removed: usize, insert_start: usize, inserted: usize) -> Self {
        Self {
            remove_start,
            removed,
            insert_start,
            inserted,
        }
    }

    /// True for the sentinel and for hunks that change nothing
    pub fn is_empty(&self) -> bool {
        self.removed == 0 && self.inserted == 0
    }

    pub fn start(&self, side: Side) -> usize {
        match side {
            Side::Source => self.remove_start,
            Side::Target => self.insert_start,
        }
    }

    pub fn count(&self, side: Side) -> usize {
        match side {
            Side::Source => self.removed,
            Side::Target => self.inserted,
        }
    }

    /// Line range covered on one side
    pub fn lines(&self, side: Side) -> Range<usize> {
        let start = self.start(side);
        start..start.saturating_add(self.count(side))
    }

    /// Whether this hunk touches `lines` on the given side.
    ///
    /// A zero-length hunk is an insertion point and counts as touching the
    /// line it sits in front of.
    pub fn touches(&self, side: Side, lines: &Range<usize>) -> bool {
        if self.is_empty() || lines.start >= lines.end {
            return false;
        }
        let range = self.lines(side);
        if range.is_empty() {
            return lines.contains(&range.start);
        }
        range.start < lines.end && lines.start < range.end
    }

    /// Highlight tone when painting `side`: a side without lines shows the
    /// opposite colour of the side that has them.
    pub fn tone(&self, side: Side) -> Tone {
        match side {
            Side::Source if self.removed > 0 => Tone::Removed,
            Side::Source => Tone::Added,
            Side::Target if self.inserted > 0 => Tone::Added,
            Side::Target => Tone::Removed,
        }
    }
}

impl Default for Hunk {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Ordered hunks of one diff, tagged with a unique generation.
///
/// Each recompute builds a new sequence; caches keyed on the generation go
/// stale as soon as the sequence they were built from is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkSequence {
    generation: u64,
    hunks: Vec<Hunk>,
}

impl HunkSequence {
    pub fn new(hunks: Vec<Hunk>) -> Self {
        Self {
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            hunks,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    pub fn get(&self, index: usize) -> Option<Hunk> {
        self.hunks.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.hunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    pub fn contains(&self, hunk: &Hunk) -> bool {
        self.hunks.contains(hunk)
    }

    pub fn iter(&self) -> impl Iterator<Item = Hunk> + '_ {
        self.hunks.iter().copied()
    }

    /// Hunks touching `lines` on `side`, in order
    pub fn touching(&self, side: Side, lines: Range<usize>) -> impl Iterator<Item = Hunk> + '_ {
        // Hunk starts are non-decreasing, so everything past the window can be skipped
        let end = lines.end;
        self.hunks
            .iter()
            .copied()
            .take_while(move |h| h.start(side) <= end)
            .filter(move |h| h.touches(side, &lines))
    }
}
