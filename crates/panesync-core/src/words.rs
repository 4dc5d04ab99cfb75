//! Word tokenization for intra-line diffs

use crate::document::TextBuffer;
use std::ops::Range;

/// One token of a buffer, with its absolute byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub range: Range<usize>,
    pub text: String,
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Split `text` into word byte ranges.
///
/// A word is a maximal run of alphanumerics and underscores; any other
/// character is a word on its own.
pub fn split_words(text: &str) -> Vec<Range<usize>> {
    let mut words = Vec::new();
    let mut run_start: Option<usize> = None;

    for (i, ch) in text.char_indices() {
        if is_word_char(ch) {
            run_start.get_or_insert(i);
            continue;
        }
        if let Some(start) = run_start.take() {
            words.push(start..i);
        }
        words.push(i..i + ch.len_utf8());
    }
    if let Some(start) = run_start {
        words.push(start..text.len());
    }

    words
}

/// Tokenize a block of buffer lines. Lines past the end are ignored and
/// line delimiters never become tokens.
pub fn words_in_lines(buffer: &dyn TextBuffer, lines: Range<usize>) -> Vec<Word> {
    let end = lines.end.min(buffer.line_count());
    let mut words = Vec::new();

    for index in lines.start.min(end)..end {
        let Some(span) = buffer.line(index) else {
            continue;
        };
        let content = buffer.text_between(span.offset..span.end_offset());
        words.extend(split_words(&content).into_iter().map(|range| Word {
            text: content[range.clone()].to_string(),
            range: span.offset + range.start..span.offset + range.end,
        }));
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn tokens(text: &str) -> Vec<&str> {
        split_words(text).into_iter().map(|r| &text[r]).collect()
    }

    #[test]
    fn test_identifier_and_punctuation() {
        assert_eq!(tokens("foo_bar, baz"), vec!["foo_bar", ",", " ", "baz"]);
    }

    #[test]
    fn test_runs_of_punctuation_split_per_char() {
        assert_eq!(tokens("a->b"), vec!["a", "-", ">", "b"]);
        assert_eq!(tokens("  "), vec![" ", " "]);
        assert!(tokens("").is_empty());
    }

    #[test]
    fn test_unicode_letters_join_words() {
        assert_eq!(tokens("naïve café!"), vec!["naïve", " ", "café", "!"]);
    }

    #[test]
    fn test_reproducible() {
        let text = "let x1 = y_2 + (z);";
        assert_eq!(split_words(text), split_words(text));
    }

    #[test]
    fn test_words_in_lines_use_absolute_offsets() {
        let doc = Document::new("skip me\nab cd\nx");
        let words = words_in_lines(&doc, 1..3);
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["ab", " ", "cd", "x"]);
        assert_eq!(words[0].range, 8..10);
        assert_eq!(words[3].range, 14..15);
    }

    #[test]
    fn test_words_in_lines_clamps_stale_range() {
        let doc = Document::new("only");
        assert_eq!(words_in_lines(&doc, 0..10).len(), 1);
        assert!(words_in_lines(&doc, 5..10).is_empty());
    }
}
