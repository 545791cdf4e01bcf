//! Vector store abstraction for Docent.
//!
//! Provides a trait-based interface for different vector database backends.
//! Every backend ranks records by cosine distance (`1 - cosine similarity`),
//! closest first. Vectors produced by different embedding models must not be
//! mixed in one collection; backends only check that lengths agree.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::chunking::Chunk;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the distance metric used by every collection.
pub const DISTANCE_METRIC: &str = "cosine";

/// Metadata persisted alongside each record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// File name of the originating document.
    pub source: String,
    /// Position of the chunk within its document.
    pub chunk_index: usize,
    /// When this record was written.
    pub indexed_at: DateTime<Utc>,
}

/// A chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Unique record ID (`{source}_chunk_{index}` for ingested chunks).
    pub id: String,
    /// Text content of this chunk.
    pub text: String,
    pub metadata: RecordMetadata,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl StoredRecord {
    /// Create a new record.
    pub fn new(
        id: String,
        text: String,
        source: String,
        chunk_index: usize,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            id,
            text,
            metadata: RecordMetadata {
                source,
                chunk_index,
                indexed_at: Utc::now(),
            },
            embedding,
        }
    }

    /// Build the record for an embedded chunk.
    pub fn from_chunk(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self::new(
            record_id(&chunk.source_id, chunk.index),
            chunk.text,
            chunk.source_id,
            chunk.index,
            embedding,
        )
    }
}

/// Record ID for chunk `index` of `source`.
pub fn record_id(source: &str, index: usize) -> String {
    format!("{}_chunk_{}", source, index)
}

/// A nearest-neighbour match.
#[derive(Debug, Clone, Serialize)]
pub struct QueryMatch {
    pub id: String,
    pub text: String,
    pub metadata: RecordMetadata,
    /// Cosine distance to the query (lower is closer).
    pub distance: f32,
}

/// Summary of the records indexed from one source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSummary {
    pub source: String,
    pub chunk_count: usize,
    pub last_indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace records by id. Returns the number of records written.
    async fn upsert(&self, records: &[StoredRecord]) -> Result<usize>;

    /// Return at most `top_k` records closest to `vector`, closest first.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>>;

    /// Get total record count.
    async fn count(&self) -> Result<usize>;

    /// List indexed source documents.
    async fn sources(&self) -> Result<Vec<SourceSummary>>;

    /// Name of the collection this store reads and writes.
    fn collection(&self) -> &str;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Cosine distance between two vectors.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Rank candidates by distance to `vector` and keep the closest `top_k`.
pub(crate) fn rank_matches<I>(vector: &[f32], candidates: I, top_k: usize) -> Vec<QueryMatch>
where
    I: IntoIterator<Item = StoredRecord>,
{
    let mut matches: Vec<QueryMatch> = candidates
        .into_iter()
        .map(|record| QueryMatch {
            distance: cosine_distance(vector, &record.embedding),
            id: record.id,
            text: record.text,
            metadata: record.metadata,
        })
        .collect();

    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance).then_with(|| a.id.cmp(&b.id)));
    matches.truncate(top_k);
    matches
}

/// Check that every record carries a vector of the collection's dimension.
///
/// Returns the dimension the collection has after the batch is written.
pub(crate) fn check_dimensions(
    current: Option<usize>,
    records: &[StoredRecord],
) -> std::result::Result<Option<usize>, String> {
    let mut dimensions = current;
    for record in records {
        if record.embedding.is_empty() {
            return Err(format!("record '{}' has an empty embedding", record.id));
        }
        match dimensions {
            Some(d) if d != record.embedding.len() => {
                return Err(format!(
                    "record '{}' has {} dimensions, collection expects {}",
                    record.id,
                    record.embedding.len(),
                    d
                ));
            }
            Some(_) => {}
            None => dimensions = Some(record.embedding.len()),
        }
    }
    Ok(dimensions)
}
