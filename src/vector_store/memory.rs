//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{check_dimensions, rank_matches, QueryMatch, SourceSummary, StoredRecord, VectorStore};
use crate::error::{DocentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct Inner {
    records: HashMap<String, StoredRecord>,
    dimensions: Option<usize>,
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    collection: String,
    inner: RwLock<Inner>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new("documents")
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> DocentError {
    DocentError::VectorStore(format!("Lock poisoned: {}", e))
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert(&self, records: &[StoredRecord]) -> Result<usize> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| DocentError::StoreWrite(format!("Lock poisoned: {}", e)))?;

        inner.dimensions =
            check_dimensions(inner.dimensions, records).map_err(DocentError::StoreWrite)?;

        for record in records {
            inner.records.insert(record.id.clone(), record.clone());
        }
        Ok(records.len())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let inner = self.inner.read().map_err(poisoned)?;

        if let Some(d) = inner.dimensions {
            if d != vector.len() {
                return Err(DocentError::VectorStore(format!(
                    "query vector has {} dimensions, collection '{}' expects {}",
                    vector.len(),
                    self.collection,
                    d
                )));
            }
        }

        Ok(rank_matches(vector, inner.records.values().cloned(), top_k))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().map_err(poisoned)?.records.len())
    }

    async fn sources(&self) -> Result<Vec<SourceSummary>> {
        let inner = self.inner.read().map_err(poisoned)?;

        let mut by_source: HashMap<String, SourceSummary> = HashMap::new();
        for record in inner.records.values() {
            let entry = by_source
                .entry(record.metadata.source.clone())
                .or_insert_with(|| SourceSummary {
                    source: record.metadata.source.clone(),
                    chunk_count: 0,
                    last_indexed_at: record.metadata.indexed_at,
                });

            entry.chunk_count += 1;
            if record.metadata.indexed_at > entry.last_indexed_at {
                entry.last_indexed_at = record.metadata.indexed_at;
            }
        }

        let mut sources: Vec<SourceSummary> = by_source.into_values().collect();
        sources.sort_by(|a, b| a.source.cmp(&b.source));
        Ok(sources)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, source: &str, text: &str, embedding: Vec<f32>) -> StoredRecord {
        StoredRecord::new(id.to_string(), text.to_string(), source.to_string(), 0, embedding)
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new("test");

        store
            .upsert(&[
                record("a_chunk_0", "a.txt", "Hello world", vec![1.0, 0.0, 0.0]),
                record("a_chunk_1", "a.txt", "Goodbye world", vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);

        let results = store.query(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "Hello world");
        assert!(results[0].distance < results[1].distance);

        let sources = store.sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].chunk_count, 2);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_id() {
        let store = MemoryVectorStore::default();
        store.upsert(&[record("x", "a.txt", "old", vec![1.0, 0.0])]).await.unwrap();
        store.upsert(&[record("x", "a.txt", "new", vec![0.0, 1.0])]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let results = store.query(&[0.0, 1.0], 5).await.unwrap();
        assert_eq!(results[0].text, "new");
        assert!(results[0].distance.abs() < 0.001);
    }

    #[tokio::test]
    async fn test_empty_store_query() {
        let store = MemoryVectorStore::default();
        assert!(store.query(&[1.0, 2.0], 7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = MemoryVectorStore::default();
        store.upsert(&[record("a", "a.txt", "a", vec![1.0, 0.0])]).await.unwrap();

        let err = store
            .upsert(&[record("b", "a.txt", "b", vec![1.0, 0.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, DocentError::StoreWrite(_)));
        assert_eq!(store.count().await.unwrap(), 1);

        assert!(store.query(&[1.0], 1).await.is_err());
    }
}
