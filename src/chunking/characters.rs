//! Character-window chunking.
//!
//! Windows are counted in Unicode scalar values, so multi-byte text is never
//! split inside a character.

use super::{validate_window, window_ranges, Chunker};
use crate::error::Result;

/// Splits text into fixed-size character windows.
#[derive(Debug, Clone)]
pub struct CharacterChunker {
    target_size: usize,
    overlap: usize,
}

impl CharacterChunker {
    pub fn new(target_size: usize, overlap: usize) -> Result<Self> {
        validate_window(target_size, overlap)?;
        Ok(Self { target_size, overlap })
    }
}

impl Chunker for CharacterChunker {
    fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();

        window_ranges(chars.len(), self.target_size, self.overlap)
            .into_iter()
            .map(|range| chars[range].iter().collect())
            .collect()
    }
}
