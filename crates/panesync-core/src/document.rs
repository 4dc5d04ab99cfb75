//! Text buffer interface consumed by the engine, plus an in-memory document

use std::ops::Range;

use ropey::Rope;

/// A text change as reported to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub offset: usize,
    pub removed_len: usize,
    pub inserted: String,
}

/// Location of one line inside a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    /// Offset of the first byte of the line
    pub offset: usize,
    /// Length of the line content, delimiter excluded
    pub length: usize,
    /// Length of the trailing delimiter (0 for the last line)
    pub delimiter: usize,
}

impl LineSpan {
    /// End of the line content
    pub fn end_offset(&self) -> usize {
        self.offset + self.length
    }

    /// End of the line including its delimiter
    pub fn end_with_delimiter(&self) -> usize {
        self.offset + self.length + self.delimiter
    }
}

/// What the engine needs from an editor pane.
///
/// A buffer always has at least one line; an empty buffer is one empty line.
/// Every mutation is queued as a [`ChangeEvent`] until [`take_changes`]
/// drains it.
///
/// [`take_changes`]: TextBuffer::take_changes
pub trait TextBuffer {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn line_count(&self) -> usize;

    fn line(&self, index: usize) -> Option<LineSpan>;

    /// Index of the line containing `offset` (clamped to the last line)
    fn line_at_offset(&self, offset: usize) -> usize;

    fn text_between(&self, range: Range<usize>) -> String;

    fn insert(&mut self, offset: usize, text: &str);

    fn remove(&mut self, offset: usize, len: usize);

    /// Open an atomic undo scope. Scopes nest; only the outermost commit
    /// closes the undo step.
    fn begin_atomic(&mut self);

    fn commit_atomic(&mut self);

    /// Roll back every edit made since the outermost `begin_atomic`
    fn abort_atomic(&mut self);

    fn is_read_only(&self) -> bool;

    fn eol_marker(&self) -> &str;

    fn take_changes(&mut self) -> Vec<ChangeEvent>;

    fn line_text(&self, index: usize) -> Option<String> {
        self.line(index)
            .map(|span| self.text_between(span.offset..span.end_offset()))
    }

    /// Delimiter text following a line, if it has one
    fn line_delimiter(&self, index: usize) -> Option<String> {
        self.line(index)
            .filter(|span| span.delimiter > 0)
            .map(|span| self.text_between(span.end_offset()..span.end_with_delimiter()))
    }

    fn lines(&self) -> Vec<String> {
        (0..self.line_count())
            .filter_map(|i| self.line_text(i))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Edit {
    offset: usize,
    removed: String,
    inserted: String,
}

/// In-memory [`TextBuffer`] backed by a rope, with undo groups.
///
/// Only `\n` breaks lines; a `\r` in front of it is reported as part of the
/// delimiter.
#[derive(Debug, Clone)]
pub struct Document {
    rope: Rope,
    eol: String,
    read_only: bool,
    pending: Vec<ChangeEvent>,
    undo_stack: Vec<Vec<Edit>>,
    open_group: Vec<Edit>,
    atomic_depth: usize,
}

impl Document {
    pub fn new(text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        Self {
            rope: Rope::from_str(text),
            eol: detect_eol(text).to_string(),
            read_only: false,
            pending: Vec::new(),
            undo_stack: Vec::new(),
            open_group: Vec::new(),
            atomic_depth: 0,
        }
    }

    /// Build a document by joining lines with `\n`
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let joined: Vec<&str> = lines.iter().map(AsRef::as_ref).collect();
        Self::new(joined.join("\n"))
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole content as one undo step
    pub fn set_text(&mut self, text: &str) {
        self.replace(0, self.rope.len_bytes(), text);
    }

    /// Replace the whole content without recording undo.
    ///
    /// Pending changes and undo history are discarded; the document reads as
    /// freshly opened.
    pub fn load(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.eol = detect_eol(text).to_string();
        self.pending.clear();
        self.undo_stack.clear();
        self.open_group.clear();
        self.atomic_depth = 0;
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// Replace `removed_len` bytes at `offset` with `text`.
    ///
    /// Offsets past the end are clamped, and both ends snap back to the
    /// nearest character boundary.
    pub fn replace(&mut self, offset: usize, removed_len: usize, text: &str) {
        let start = self.floor_boundary(offset);
        let end = self.floor_boundary(start.saturating_add(removed_len)).max(start);
        if start == end && text.is_empty() {
            return;
        }

        let removed = self.splice(start, end, text);
        let edit = Edit {
            offset: start,
            removed,
            inserted: text.to_string(),
        };
        self.pending.push(ChangeEvent {
            offset: start,
            removed_len: edit.removed.len(),
            inserted: edit.inserted.clone(),
        });
        if self.atomic_depth > 0 {
            self.open_group.push(edit);
        } else {
            self.undo_stack.push(vec![edit]);
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Revert the most recent undo step. Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(group) => {
                self.revert_edits(group);
                true
            }
            None => false,
        }
    }

    fn revert_edits(&mut self, edits: Vec<Edit>) {
        for edit in edits.into_iter().rev() {
            let end = edit.offset + edit.inserted.len();
            self.splice(edit.offset, end, &edit.removed);
            self.pending.push(ChangeEvent {
                offset: edit.offset,
                removed_len: edit.inserted.len(),
                inserted: edit.removed,
            });
        }
    }

    /// Swap the bytes in `start..end` for `text`, returning what was removed.
    /// Both ends must already sit on character boundaries.
    fn splice(&mut self, start: usize, end: usize, text: &str) -> String {
        let start_char = self.rope.byte_to_char(start);
        let end_char = self.rope.byte_to_char(end);
        let removed = self.rope.slice(start_char..end_char).to_string();
        if start_char < end_char {
            self.rope.remove(start_char..end_char);
        }
        if !text.is_empty() {
            self.rope.insert(start_char, text);
        }
        removed
    }

    fn floor_boundary(&self, offset: usize) -> usize {
        let offset = offset.min(self.rope.len_bytes());
        self.rope.char_to_byte(self.rope.byte_to_char(offset))
    }
}

fn detect_eol(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("")
    }
}

impl TextBuffer for Document {
    fn len(&self) -> usize {
        self.rope.len_bytes()
    }

    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line(&self, index: usize) -> Option<LineSpan> {
        if index >= self.rope.len_lines() {
            return None;
        }
        let offset = self.rope.line_to_byte(index);
        let (length, delimiter) = if index + 1 < self.rope.len_lines() {
            let next = self.rope.line_to_byte(index + 1);
            let crlf = next >= offset + 2 && self.rope.byte(next - 2) == b'\r';
            let delimiter = if crlf { 2 } else { 1 };
            (next - offset - delimiter, delimiter)
        } else {
            (self.rope.len_bytes() - offset, 0)
        };
        Some(LineSpan {
            offset,
            length,
            delimiter,
        })
    }

    fn line_at_offset(&self, offset: usize) -> usize {
        self.rope.byte_to_line(offset.min(self.rope.len_bytes()))
    }

    fn text_between(&self, range: Range<usize>) -> String {
        let start = self.rope.byte_to_char(self.floor_boundary(range.start));
        let end = self.rope.byte_to_char(self.floor_boundary(range.end)).max(start);
        self.rope.slice(start..end).to_string()
    }

    fn insert(&mut self, offset: usize, text: &str) {
        self.replace(offset, 0, text);
    }

    fn remove(&mut self, offset: usize, len: usize) {
        self.replace(offset, len, "");
    }

    fn begin_atomic(&mut self) {
        self.atomic_depth += 1;
    }

    fn commit_atomic(&mut self) {
        if self.atomic_depth == 0 {
            return;
        }
        self.atomic_depth -= 1;
        if self.atomic_depth == 0 && !self.open_group.is_empty() {
            let group = std::mem::take(&mut self.open_group);
            self.undo_stack.push(group);
        }
    }

    fn abort_atomic(&mut self) {
        self.atomic_depth = 0;
        let group = std::mem::take(&mut self.open_group);
        self.revert_edits(group);
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn eol_marker(&self) -> &str {
        &self.eol
    }

    fn take_changes(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_spans() {
        let doc = Document::new("ab\r\ncd\nef");
        assert_eq!(doc.line_count(), 3);
        assert_eq!(
            doc.line(0),
            Some(LineSpan {
                offset: 0,
                length: 2,
                delimiter: 2,
            })
        );
        assert_eq!(
            doc.line(1),
            Some(LineSpan {
                offset: 4,
                length: 2,
                delimiter: 1,
            })
        );
        assert_eq!(
            doc.line(2),
            Some(LineSpan {
                offset: 7,
                length: 2,
                delimiter: 0,
            })
        );
        assert_eq!(doc.line(3), None);
        assert_eq!(doc.eol_marker(), "\r\n");
        assert_eq!(doc.lines(), vec!["ab", "cd", "ef"]);
    }

    #[test]
    fn test_empty_document_has_one_line() {
        let doc = Document::default();
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.line_text(0).as_deref(), Some(""));
        let trailing = Document::new("a\n");
        assert_eq!(trailing.lines(), vec!["a", ""]);
    }

    #[test]
    fn test_line_at_offset() {
        let doc = Document::new("ab\ncd\n");
        assert_eq!(doc.line_at_offset(0), 0);
        assert_eq!(doc.line_at_offset(2), 0);
        assert_eq!(doc.line_at_offset(3), 1);
        assert_eq!(doc.line_at_offset(6), 2);
        assert_eq!(doc.line_at_offset(100), 2);
    }

    #[test]
    fn test_changes_are_reported() {
        let mut doc = Document::new("hello");
        doc.insert(5, " world");
        doc.remove(0, 1);
        let changes = doc.take_changes();
        assert_eq!(
            changes,
            vec![
                ChangeEvent {
                    offset: 5,
                    removed_len: 0,
                    inserted: " world".into(),
                },
                ChangeEvent {
                    offset: 0,
                    removed_len: 1,
                    inserted: String::new(),
                },
            ]
        );
        assert!(doc.take_changes().is_empty());
    }

    #[test]
    fn test_atomic_group_is_one_undo_step() {
        let mut doc = Document::new("a\nb\nc");
        doc.begin_atomic();
        doc.remove(2, 2);
        doc.insert(2, "x\ny\n");
        doc.commit_atomic();
        assert_eq!(doc.text(), "a\nx\ny\nc");
        assert_eq!(doc.undo_depth(), 1);

        assert!(doc.undo());
        assert_eq!(doc.text(), "a\nb\nc");
        assert!(!doc.undo());
    }

    #[test]
    fn test_abort_rolls_back() {
        let mut doc = Document::new("one\ntwo");
        doc.begin_atomic();
        doc.insert(0, "zero\n");
        doc.remove(5, 4);
        doc.abort_atomic();
        assert_eq!(doc.text(), "one\ntwo");
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_offsets_clamp_to_char_boundaries() {
        let mut doc = Document::new("héllo");
        doc.insert(2, "X");
        assert_eq!(doc.text(), "hXéllo");
        doc.insert(100, "!");
        assert_eq!(doc.text(), "hXéllo!");
    }

    #[test]
    fn test_load_discards_history() {
        let mut doc = Document::new("draft");
        doc.insert(0, "x");
        doc.load("a\r\nb");
        assert!(!doc.can_undo());
        assert!(doc.take_changes().is_empty());
        assert_eq!(doc.text(), "a\r\nb");
        assert_eq!(doc.eol_marker(), "\r\n");
        assert!(!doc.undo());
    }

    #[test]
    fn test_lone_carriage_return_does_not_break_lines() {
        let doc = Document::new("a\rb\nc");
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.lines(), vec!["a\rb", "c"]);
        assert_eq!(doc.line_at_offset(2), 0);
    }
}
