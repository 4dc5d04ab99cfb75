//! Reverting a hunk from one pane onto another

use crate::document::TextBuffer;
use crate::hunk::Hunk;
use std::ops::{Deref, DerefMut, Range};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("Target buffer is read-only")]
    ReadOnly,
}

/// Atomic undo scope over a buffer.
///
/// Edits made through the scope become one undo step on [`commit`]; if the
/// scope is dropped without committing they are rolled back.
///
/// [`commit`]: AtomicScope::commit
pub struct AtomicScope<'a, B: TextBuffer + ?Sized> {
    buffer: &'a mut B,
    committed: bool,
}

impl<'a, B: TextBuffer + ?Sized> AtomicScope<'a, B> {
    pub fn begin(buffer: &'a mut B) -> Self {
        buffer.begin_atomic();
        Self {
            buffer,
            committed: false,
        }
    }

    pub fn commit(mut self) {
        self.committed = true;
        self.buffer.commit_atomic();
    }
}

impl<B: TextBuffer + ?Sized> Deref for AtomicScope<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.buffer
    }
}

impl<B: TextBuffer + ?Sized> DerefMut for AtomicScope<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.buffer
    }
}

impl<B: TextBuffer + ?Sized> Drop for AtomicScope<'_, B> {
    fn drop(&mut self) {
        if !self.committed {
            self.buffer.abort_atomic();
        }
    }
}

/// The single replace a revert boils down to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertPlan {
    /// Target bytes to delete; the insertion anchor is `remove.start`
    pub remove: Range<usize>,
    pub insert: String,
}

impl RevertPlan {
    pub fn is_noop(&self) -> bool {
        self.remove.is_empty() && self.insert.is_empty()
    }
}

/// Work out how to make the target's hunk region equal the source's.
///
/// Line indices past either buffer's end are clamped. When the target block
/// runs to the end of the document there is no delimiter after it, so the
/// delimiter before the block is replaced together with it; that keeps the
/// resulting line count equal to the source block's.
pub fn plan_revert(source: &dyn TextBuffer, target: &dyn TextBuffer, hunk: Hunk) -> RevertPlan {
    let target_lines = target.line_count();
    let insert_start = hunk.insert_start.min(target_lines);
    let insert_end = hunk.insert_start.saturating_add(hunk.inserted).min(target_lines);

    let source_lines = source.line_count();
    let remove_start = hunk.remove_start.min(source_lines);
    let remove_end = hunk.remove_start.saturating_add(hunk.removed).min(source_lines);

    let block = if remove_end > remove_start {
        let first = source.line(remove_start);
        let last = source.line(remove_end - 1);
        match (first, last) {
            (Some(first), Some(last)) => {
                let text = source.text_between(first.offset..last.end_offset());
                let eol = source
                    .line_delimiter(remove_end - 1)
                    .unwrap_or_else(|| target.eol_marker().to_string());
                Some((text, eol))
            }
            _ => None,
        }
    } else {
        None
    };

    if insert_end < target_lines {
        // A line follows the block, so every block line carries a delimiter
        let anchor = line_offset(target, insert_start);
        let end = line_offset(target, insert_end);
        let insert = block.map(|(text, eol)| text + &eol).unwrap_or_default();
        return RevertPlan {
            remove: anchor..end,
            insert,
        };
    }

    if insert_start == 0 {
        return RevertPlan {
            remove: 0..target.len(),
            insert: block.map(|(text, _)| text).unwrap_or_default(),
        };
    }

    // The block ends the document: take over the delimiter of the line before it
    let before = insert_start - 1;
    let anchor = target
        .line(before)
        .map(|span| span.end_offset())
        .unwrap_or_else(|| target.len());
    let eol = target
        .line_delimiter(before)
        .unwrap_or_else(|| target.eol_marker().to_string());
    RevertPlan {
        remove: anchor..target.len(),
        insert: block.map(|(text, _)| eol + &text).unwrap_or_default(),
    }
}

fn line_offset(buffer: &dyn TextBuffer, line: usize) -> usize {
    buffer
        .line(line)
        .map(|span| span.offset)
        .unwrap_or_else(|| buffer.len())
}

/// Revert `hunk`: replace the target's lines with the source's, as a single
/// undo step on the target.
///
/// Returns `Ok(false)` when there was nothing to change. Re-diffing is left
/// to whoever observes the target's change notifications.
pub fn revert(
    source: &dyn TextBuffer,
    target: &mut dyn TextBuffer,
    hunk: Hunk,
) -> Result<bool, MergeError> {
    if hunk.is_empty() {
        return Ok(false);
    }
    if target.is_read_only() {
        return Err(MergeError::ReadOnly);
    }

    let plan = plan_revert(source, target, hunk);
    if plan.is_noop() {
        return Ok(false);
    }

    tracing::debug!(?hunk, remove = ?plan.remove, inserted = plan.insert.len(), "reverting hunk");
    let mut scope = AtomicScope::begin(target);
    if !plan.remove.is_empty() {
        scope.remove(plan.remove.start, plan.remove.len());
    }
    if !plan.insert.is_empty() {
        scope.insert(plan.remove.start, &plan.insert);
    }
    scope.commit();

    Ok(true)
}
