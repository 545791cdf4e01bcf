//! Word-window chunking.

use super::{validate_window, window_ranges, Chunker};
use crate::error::Result;

/// Splits text into windows of whole words.
///
/// Each chunk after the first repeats the trailing `overlap` words of the previous one.
#[derive(Debug, Clone)]
pub struct WordChunker {
    target_size: usize,
    overlap: usize,
}

impl WordChunker {
    /// Create a word chunker. `overlap` must be smaller than `target_size`.
    pub fn new(target_size: usize, overlap: usize) -> Result<Self> {
        validate_window(target_size, overlap)?;
        Ok(Self { target_size, overlap })
    }
}

impl Chunker for WordChunker {
    fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();

        window_ranges(words.len(), self.target_size, self.overlap)
            .into_iter()
            .map(|range| words[range].join(" "))
            .collect()
    }
}
