//! Line diff provider backed by imara-diff

use crate::hunk::Hunk;
use imara_diff::{Diff, InternedInput, TokenSource};
use serde::Deserialize;
use std::hash::Hash;

/// Diff algorithm used for both line and word granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffAlgorithm {
    #[default]
    Histogram,
    Myers,
    MyersMinimal,
}

impl From<DiffAlgorithm> for imara_diff::Algorithm {
    fn from(algorithm: DiffAlgorithm) -> Self {
        match algorithm {
            DiffAlgorithm::Histogram => imara_diff::Algorithm::Histogram,
            DiffAlgorithm::Myers => imara_diff::Algorithm::Myers,
            DiffAlgorithm::MyersMinimal => imara_diff::Algorithm::MyersMinimal,
        }
    }
}

/// Feeds an already split token list to the interner
struct Tokens<'a, T>(&'a [T]);

impl<'a, T: Hash + Eq> TokenSource for Tokens<'a, T> {
    type Token = &'a T;
    type Tokenizer = std::slice::Iter<'a, T>;

    fn tokenize(&self) -> Self::Tokenizer {
        self.0.iter()
    }

    fn estimate_tokens(&self) -> u32 {
        self.0.len() as u32
    }
}

/// Computes ordered hunks between two token sequences.
///
/// The engine is a pure function of its input: the same pair always yields
/// the same hunks, and empty or identical inputs yield none.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffEngine {
    algorithm: DiffAlgorithm,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_algorithm(mut self, algorithm: DiffAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn algorithm(&self) -> DiffAlgorithm {
        self.algorithm
    }

    /// Diff two token sequences (lines, words, anything hashable)
    pub fn diff<T: Hash + Eq>(&self, before: &[T], after: &[T]) -> Vec<Hunk> {
        if before == after {
            return Vec::new();
        }

        let input = InternedInput::new(Tokens(before), Tokens(after));
        let diff = Diff::compute(self.algorithm.into(), &input);
        diff.hunks()
            .map(|h| {
                Hunk::new(
                    h.before.start as usize,
                    h.before.len(),
                    h.after.start as usize,
                    h.after.len(),
                )
            })
            .collect()
    }

    /// Diff two texts line by line. Line delimiters are not compared.
    pub fn diff_strings(&self, before: &str, after: &str) -> Vec<Hunk> {
        let before: Vec<&str> = split_lines(before).collect();
        let after: Vec<&str> = split_lines(after).collect();
        self.diff(&before, &after)
    }
}

/// Split text into lines the same way [`crate::Document`] does: a trailing
/// delimiter leaves a final empty line, and `\r\n` counts as one delimiter.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_replacement() {
        let engine = DiffEngine::new();
        let hunks = engine.diff(&["a", "b", "c"], &["a", "x", "c"]);
        assert_eq!(hunks, vec![Hunk::new(1, 1, 1, 1)]);
    }

    #[test]
    fn test_insert_and_delete() {
        let engine = DiffEngine::new();
        let hunks = engine.diff(&["a", "b", "c"], &["a", "c", "d"]);
        assert_eq!(hunks, vec![Hunk::new(1, 1, 1, 0), Hunk::new(3, 0, 2, 1)]);
    }

    #[test]
    fn test_degenerate_inputs() {
        let engine = DiffEngine::new();
        let empty: [&str; 0] = [];
        assert!(engine.diff(&empty, &empty).is_empty());
        assert!(engine.diff(&["same", "lines"], &["same", "lines"]).is_empty());
        assert_eq!(engine.diff(&empty, &["new"]), vec![Hunk::new(0, 0, 0, 1)]);
    }

    #[test]
    fn test_deterministic() {
        let before = ["fn main() {", "    let x = 1;", "    println!(x);", "}", ""];
        let after = ["fn main() {", "    let y = 2;", "    let x = 1;", "}", "// end"];
        for algorithm in [
            DiffAlgorithm::Histogram,
            DiffAlgorithm::Myers,
            DiffAlgorithm::MyersMinimal,
        ] {
            let engine = DiffEngine::new().with_algorithm(algorithm);
            assert_eq!(engine.diff(&before, &after), engine.diff(&before, &after));
        }
    }

    #[test]
    fn test_hunks_are_ordered() {
        let engine = DiffEngine::new();
        let hunks = engine.diff_strings("a\nb\nc\nd\ne\nf", "a\nB\nc\nd\nE\nf\ng");
        assert_eq!(hunks.len(), 3);
        for pair in hunks.windows(2) {
            assert!(pair[0].remove_start + pair[0].removed <= pair[1].remove_start);
            assert!(pair[0].insert_start + pair[0].inserted <= pair[1].insert_start);
        }
    }

    #[test]
    fn test_split_lines_keeps_trailing_empty_line() {
        let lines: Vec<_> = split_lines("a\r\nb\n").collect();
        assert_eq!(lines, vec!["a", "b", ""]);
    }
}
