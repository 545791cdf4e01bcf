//! Retrieval and context building for RAG responses.

use super::ContextChunk;
use crate::config::RagSettings;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{QueryMatch, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Finds the stored chunks nearest to a question.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

impl Retriever {
    /// Create a new retriever.
    pub fn new(embedder: Arc<dyn Embedder>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            vector_store,
        }
    }

    /// Embed `question` and return the `top_k` nearest records, closest first.
    ///
    /// No distance threshold is applied.
    #[instrument(skip(self, question))]
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<QueryMatch>> {
        let query_embedding = self.embedder.embed_one(question).await?;
        let matches = self.vector_store.query(&query_embedding, top_k).await?;
        debug!(
            "Retrieved {} chunks from '{}'",
            matches.len(),
            self.vector_store.collection()
        );
        Ok(matches)
    }
}

/// Bounds how much retrieved text goes into a prompt.
#[derive(Debug, Clone, Copy)]
pub struct ContextWindow {
    /// Maximum number of chunks.
    pub max_chunks: usize,
    /// Maximum number of words across all chunks.
    pub max_words: usize,
}

impl ContextWindow {
    pub fn from_settings(settings: &RagSettings) -> Self {
        Self {
            max_chunks: settings.max_context_chunks,
            max_words: settings.max_context_words,
        }
    }

    /// Keep the closest chunks that fit, whichever limit binds first.
    ///
    /// The closest chunk is always kept so a single oversized chunk still produces an answer.
    pub fn fit(&self, matches: Vec<QueryMatch>) -> Vec<QueryMatch> {
        let mut kept = Vec::new();
        let mut words = 0;

        for m in matches {
            if kept.len() >= self.max_chunks.max(1) {
                break;
            }
            let chunk_words = m.text.split_whitespace().count();
            if !kept.is_empty() && words + chunk_words > self.max_words {
                break;
            }
            words += chunk_words;
            kept.push(m);
        }

        kept
    }
}

/// Prefix each chunk with its position and source document.
pub fn label_chunks(chunks: &[ContextChunk]) -> Vec<String> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "Document Chunk {} (Source: {}):\n{}",
                i + 1,
                chunk.source,
                chunk.text
            )
        })
        .collect()
}

/// Format context chunks for display to the user.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "{} #{} (distance: {:.3})",
                chunk.source, chunk.chunk_index, chunk.distance
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::HashEmbedder;
    use crate::vector_store::{MemoryVectorStore, RecordMetadata, StoredRecord};
    use chrono::Utc;

    fn query_match(id: &str, text: &str) -> QueryMatch {
        QueryMatch {
            id: id.to_string(),
            text: text.to_string(),
            metadata: RecordMetadata {
                source: "a.txt".to_string(),
                chunk_index: 0,
                indexed_at: Utc::now(),
            },
            distance: 0.5,
        }
    }

    #[tokio::test]
    async fn test_retrieve_returns_closest_first() {
        let embedder = Arc::new(HashEmbedder::new());
        let store = Arc::new(MemoryVectorStore::default());

        let texts = ["exam is in room 12", "assignment two is due friday", "lab safety rules"];
        let embeddings = embedder
            .embed(&texts.iter().map(|t| t.to_string()).collect::<Vec<_>>())
            .await
            .unwrap();
        let records: Vec<StoredRecord> = texts
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (t, e))| {
                StoredRecord::new(format!("c{}", i), t.to_string(), "a.txt".to_string(), i, e)
            })
            .collect();
        store.upsert(&records).await.unwrap();

        let retriever = Retriever::new(embedder, store);
        let matches = retriever.retrieve("when is assignment two due", 2).await.unwrap();

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].text, "assignment two is due friday");
    }

    #[tokio::test]
    async fn test_retrieve_from_empty_store() {
        let retriever = Retriever::new(
            Arc::new(HashEmbedder::new()),
            Arc::new(MemoryVectorStore::default()),
        );
        assert!(retriever.retrieve("anything", 7).await.unwrap().is_empty());
    }

    #[test]
    fn test_window_limits_chunk_count() {
        let window = ContextWindow {
            max_chunks: 2,
            max_words: 100,
        };
        let kept = window.fit(vec![
            query_match("a", "one"),
            query_match("b", "two"),
            query_match("c", "three"),
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_window_limits_words() {
        let window = ContextWindow {
            max_chunks: 10,
            max_words: 5,
        };
        let kept = window.fit(vec![
            query_match("a", "one two three"),
            query_match("b", "four five"),
            query_match("c", "six"),
        ]);
        let ids: Vec<&str> = kept.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_window_keeps_oversized_first_chunk() {
        let window = ContextWindow {
            max_chunks: 3,
            max_words: 2,
        };
        let kept = window.fit(vec![query_match("a", "one two three four"), query_match("b", "x")]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "a");
    }

    #[test]
    fn test_label_chunks() {
        let chunks: Vec<ContextChunk> = vec![query_match("a", "Assignment 2 is due March 5th").into()];
        assert_eq!(
            label_chunks(&chunks),
            vec!["Document Chunk 1 (Source: a.txt):\nAssignment 2 is due March 5th"]
        );
    }
}
