//! Content chunking strategies for breaking documents into searchable segments.
//!
//! Both strategies use the same sliding window: windows of `target_size` units
//! advance by `target_size - overlap` units, and stop once a window reaches the
//! end of the text.

mod characters;
mod words;

pub use characters::CharacterChunker;
pub use words::WordChunker;

use crate::config::ChunkingSettings;
use crate::error::{DocentError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A contiguous span of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// Identifier of the originating document.
    pub source_id: String,
    /// Position of this chunk within the document.
    pub index: usize,
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Word windows (never cuts a word in half).
    Words,
    /// Raw character windows.
    Characters,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "words" | "word" => Ok(ChunkingStrategy::Words),
            "characters" | "chars" => Ok(ChunkingStrategy::Characters),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

/// Trait for text chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split text into ordered chunk texts. Empty text yields no chunks.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Create a chunker from settings.
pub fn create_chunker(settings: &ChunkingSettings) -> Result<Box<dyn Chunker>> {
    let strategy: ChunkingStrategy = settings
        .strategy
        .parse()
        .map_err(DocentError::Config)?;

    Ok(match strategy {
        ChunkingStrategy::Words => {
            Box::new(WordChunker::new(settings.chunk_size, settings.chunk_overlap)?)
        }
        ChunkingStrategy::Characters => {
            Box::new(CharacterChunker::new(settings.chunk_size, settings.chunk_overlap)?)
        }
    })
}

/// Split `text` into word windows of `target_size` words overlapping by `overlap` words.
pub fn chunk_words(text: &str, target_size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(WordChunker::new(target_size, overlap)?.split(text))
}

/// Split `text` into character windows of `target_size` characters overlapping by `overlap`.
pub fn chunk_characters(text: &str, target_size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(CharacterChunker::new(target_size, overlap)?.split(text))
}

/// Chunk a document and tag each piece with its source and position.
pub fn chunk_document(chunker: &dyn Chunker, source_id: &str, text: &str) -> Vec<Chunk> {
    chunker
        .split(text)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            text,
            source_id: source_id.to_string(),
            index,
        })
        .collect()
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn validate_window(target_size: usize, overlap: usize) -> Result<()> {
    if target_size == 0 {
        return Err(DocentError::Config("chunk size must be greater than zero".to_string()));
    }
    if overlap >= target_size {
        return Err(DocentError::Config(format!(
            "chunk overlap ({}) must be smaller than chunk size ({})",
            overlap, target_size
        )));
    }
    Ok(())
}

/// Window ranges over `len` units.
fn window_ranges(len: usize, target_size: usize, overlap: usize) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    if len == 0 {
        return ranges;
    }

    let step = target_size - overlap;
    let mut start = 0;
    loop {
        let end = (start + target_size).min(len);
        ranges.push(start..end);
        if end == len {
            break;
        }
        start += step;
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_ranges() {
        assert_eq!(window_ranges(1000, 500, 100), vec![0..500, 400..900, 800..1000]);
        assert_eq!(window_ranges(900, 500, 100), vec![0..500, 400..900]);
        assert_eq!(window_ranges(10, 500, 100), vec![0..10]);
        assert_eq!(window_ranges(6, 3, 0), vec![0..3, 3..6]);
        assert!(window_ranges(0, 3, 1).is_empty());
    }

    #[test]
    fn test_invalid_windows_rejected() {
        assert!(matches!(chunk_words("a b", 0, 0), Err(DocentError::Config(_))));
        assert!(matches!(chunk_words("a b", 5, 5), Err(DocentError::Config(_))));
        assert!(matches!(chunk_characters("ab", 3, 7), Err(DocentError::Config(_))));
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a\n\n b\t\tc  "), "a b c");
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn test_chunk_document_assigns_indices() {
        let chunker = WordChunker::new(2, 0).unwrap();
        let chunks = chunk_document(&chunker, "notes.txt", "one two three four five");

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "one two");
        assert_eq!(chunks[2].text, "five");
        assert!(chunks.iter().all(|c| c.source_id == "notes.txt"));
        assert_eq!(chunks.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_create_chunker_from_settings() {
        let mut settings = ChunkingSettings {
            chunk_size: 4,
            chunk_overlap: 0,
            ..Default::default()
        };
        let chunker = create_chunker(&settings).unwrap();
        assert_eq!(chunker.split("abcdefgh ijk"), vec!["abcdefgh ijk"]);

        settings.strategy = "characters".to_string();
        let chunker = create_chunker(&settings).unwrap();
        assert_eq!(chunker.split("abcdefgh"), vec!["abcd", "efgh"]);

        settings.strategy = "sentences".to_string();
        assert!(create_chunker(&settings).is_err());
    }
}
