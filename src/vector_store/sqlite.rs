//! SQLite-based vector store implementation.
//!
//! Records live in a single database file inside the persist directory, keyed
//! by `(collection, id)`. Distances are computed in Rust over every record of
//! the collection, which is fine for document sets of a few thousand chunks.
//!
//! One connection is shared behind a mutex, so concurrent readers (e.g. HTTP
//! requests) are serialized safely. Ingesting into a store while another
//! process serves queries from it is not supported: readers get no isolation
//! from a half-finished ingestion run beyond SQLite's per-transaction guarantees.

use super::{
    check_dimensions, rank_matches, QueryMatch, RecordMetadata, SourceSummary, StoredRecord,
    VectorStore, DISTANCE_METRIC,
};
use crate::error::{DocentError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

/// File name of the database inside the persist directory.
pub const DATABASE_FILE: &str = "docent.db";

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS collections (
        name TEXT PRIMARY KEY,
        metric TEXT NOT NULL,
        dimensions INTEGER,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS records (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        text TEXT NOT NULL,
        source TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL,
        PRIMARY KEY (collection, id)
    );

    CREATE INDEX IF NOT EXISTS idx_records_source ON records(collection, source);
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
    collection: String,
}

impl SqliteVectorStore {
    /// Open (or create) the store in `persist_dir` and select `collection`.
    #[instrument(skip_all, fields(collection = %collection))]
    pub fn open(persist_dir: &Path, collection: &str) -> Result<Self> {
        std::fs::create_dir_all(persist_dir)?;
        let path = persist_dir.join(DATABASE_FILE);

        let conn = Connection::open(&path)?;

        // WAL lets readers proceed while a write transaction is open
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self::init(conn, collection)?;
        info!("Opened SQLite vector store at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory(collection: &str) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, collection)
    }

    fn init(conn: Connection, collection: &str) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;

        conn.execute(
            "INSERT OR IGNORE INTO collections (name, metric, dimensions, created_at)
             VALUES (?1, ?2, NULL, ?3)",
            params![collection, DISTANCE_METRIC, Utc::now().to_rfc3339()],
        )?;

        let metric: String = conn.query_row(
            "SELECT metric FROM collections WHERE name = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        if metric != DISTANCE_METRIC {
            return Err(DocentError::Config(format!(
                "collection '{}' uses the '{}' metric, expected '{}'",
                collection, metric, DISTANCE_METRIC
            )));
        }

        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DocentError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn dimensions(conn: &Connection, collection: &str) -> rusqlite::Result<Option<usize>> {
        let dims: Option<i64> = conn.query_row(
            "SELECT dimensions FROM collections WHERE name = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(dims.map(|d| d as usize))
    }

    fn write_records(conn: &Connection, collection: &str, records: &[StoredRecord]) -> Result<()> {
        let write_err = |e: rusqlite::Error| DocentError::StoreWrite(e.to_string());

        let tx = conn.unchecked_transaction().map_err(write_err)?;

        let current = Self::dimensions(&tx, collection).map_err(write_err)?;
        let dimensions = check_dimensions(current, records).map_err(DocentError::StoreWrite)?;
        if dimensions != current {
            tx.execute(
                "UPDATE collections SET dimensions = ?1 WHERE name = ?2",
                params![dimensions.map(|d| d as i64), collection],
            )
            .map_err(write_err)?;
        }

        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT OR REPLACE INTO records
                    (collection, id, text, source, chunk_index, embedding, indexed_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                )
                .map_err(write_err)?;

            for record in records {
                stmt.execute(params![
                    collection,
                    record.id,
                    record.text,
                    record.metadata.source,
                    record.metadata.chunk_index as i64,
                    Self::embedding_to_bytes(&record.embedding),
                    record.metadata.indexed_at.to_rfc3339(),
                ])
                .map_err(write_err)?;
            }
        }

        tx.commit().map_err(write_err)
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, records), fields(count = records.len()))]
    async fn upsert(&self, records: &[StoredRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let conn = self
            .conn
            .lock()
            .map_err(|e| DocentError::StoreWrite(format!("Failed to acquire lock: {}", e)))?;

        Self::write_records(&conn, &self.collection, records)?;

        info!("Upserted {} records into '{}'", records.len(), self.collection);
        Ok(records.len())
    }

    #[instrument(skip(self, vector))]
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryMatch>> {
        let conn = self.lock()?;

        if let Some(d) = Self::dimensions(&conn, &self.collection)? {
            if d != vector.len() {
                return Err(DocentError::VectorStore(format!(
                    "query vector has {} dimensions, collection '{}' expects {}",
                    vector.len(),
                    self.collection,
                    d
                )));
            }
        }

        let mut stmt = conn.prepare(
            r#"
            SELECT id, text, source, chunk_index, embedding, indexed_at
            FROM records
            WHERE collection = ?1
            "#,
        )?;

        let records = stmt
            .query_map(params![self.collection], |row| {
                let chunk_index: i64 = row.get(3)?;
                let embedding_bytes: Vec<u8> = row.get(4)?;
                let indexed_at: String = row.get(5)?;

                Ok(StoredRecord {
                    id: row.get(0)?,
                    text: row.get(1)?,
                    metadata: RecordMetadata {
                        source: row.get(2)?,
                        chunk_index: chunk_index as usize,
                        indexed_at: Self::parse_timestamp(&indexed_at),
                    },
                    embedding: Self::bytes_to_embedding(&embedding_bytes),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let matches = rank_matches(vector, records, top_k);
        debug!("Found {} matching records", matches.len());
        Ok(matches)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn sources(&self) -> Result<Vec<SourceSummary>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source, COUNT(*) AS chunk_count, MAX(indexed_at) AS last_indexed_at
            FROM records
            WHERE collection = ?1
            GROUP BY source
            ORDER BY source
            "#,
        )?;

        let sources = stmt
            .query_map(params![self.collection], |row| {
                let chunk_count: i64 = row.get(1)?;
                let last_indexed_at: String = row.get(2)?;
                Ok(SourceSummary {
                    source: row.get(0)?,
                    chunk_count: chunk_count as usize,
                    last_indexed_at: Self::parse_timestamp(&last_indexed_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(sources)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
impl SqliteVectorStore {
    /// Fetch a single record by id.
    fn get(&self, id: &str) -> Result<Option<StoredRecord>> {
        use rusqlite::OptionalExtension;

        let conn = self.lock()?;

        let record = conn
            .query_row(
                "SELECT id, text, source, chunk_index, embedding, indexed_at
                 FROM records WHERE collection = ?1 AND id = ?2",
                params![self.collection, id],
                |row| {
                    let chunk_index: i64 = row.get(3)?;
                    let embedding_bytes: Vec<u8> = row.get(4)?;
                    let indexed_at: String = row.get(5)?;
                    Ok(StoredRecord {
                        id: row.get(0)?,
                        text: row.get(1)?,
                        metadata: RecordMetadata {
                            source: row.get(2)?,
                            chunk_index: chunk_index as usize,
                            indexed_at: Self::parse_timestamp(&indexed_at),
                        },
                        embedding: Self::bytes_to_embedding(&embedding_bytes),
                    })
                },
            )
            .optional()?;

        Ok(record)
    }
}
