//! Document ingestion: read, chunk, embed, and store.

use crate::chunking::{chunk_document, create_chunker, normalize_whitespace, Chunker};
use crate::config::ChunkingSettings;
use crate::embedding::Embedder;
use crate::error::{DocentError, Result};
use crate::vector_store::{StoredRecord, VectorStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    /// Source name the chunks were stored under.
    pub source: String,
    /// Number of chunks written.
    pub chunks_added: usize,
}

/// A file that could not be ingested.
#[derive(Debug, Clone, Serialize)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of ingesting a directory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DirectoryReport {
    pub ingested: Vec<IngestReport>,
    pub failed: Vec<IngestFailure>,
}

impl DirectoryReport {
    /// Total chunks written across all files.
    pub fn total_chunks(&self) -> usize {
        self.ingested.iter().map(|r| r.chunks_added).sum()
    }
}

/// Reads text documents into the vector store.
pub struct Ingestor {
    chunker: Box<dyn Chunker>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    normalize: bool,
    extensions: Vec<String>,
}

impl Ingestor {
    /// Create an ingestor from chunking settings.
    pub fn new(
        settings: &ChunkingSettings,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        Ok(Self {
            chunker: create_chunker(settings)?,
            embedder,
            vector_store,
            normalize: settings.normalize_whitespace,
            extensions: settings
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        })
    }

    /// Ingest a single text file. Chunks are stored under the file's name.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                DocentError::InvalidInput(format!("Not a file path: {}", path.display()))
            })?;

        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DocentError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;

        self.ingest_text(&source, &text).await
    }

    /// Ingest raw text under `source`.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub async fn ingest_text(&self, source: &str, text: &str) -> Result<IngestReport> {
        let text = if self.normalize {
            normalize_whitespace(text)
        } else {
            text.to_string()
        };

        let chunks = chunk_document(self.chunker.as_ref(), source, &text);
        if chunks.is_empty() {
            warn!("No content to index in {}", source);
            return Ok(IngestReport {
                source: source.to_string(),
                chunks_added: 0,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(DocentError::Embedding(format!(
                "Expected {} embeddings for {}, received {}",
                chunks.len(),
                source,
                embeddings.len()
            )));
        }

        let records: Vec<StoredRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| StoredRecord::from_chunk(chunk, embedding))
            .collect();

        let chunks_added = self.vector_store.upsert(&records).await?;
        info!("Added {} chunks from {}", chunks_added, source);

        Ok(IngestReport {
            source: source.to_string(),
            chunks_added,
        })
    }

    /// Ingest every matching file directly inside `dir`.
    ///
    /// A file that fails is recorded in the report and the remaining files are still ingested.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn ingest_directory(&self, dir: &Path) -> Result<DirectoryReport> {
        if !dir.is_dir() {
            return Err(DocentError::InvalidInput(format!(
                "{} is not a valid directory",
                dir.display()
            )));
        }

        let files = self.list_files(dir)?;
        info!("Found {} files to ingest", files.len());

        let mut report = DirectoryReport::default();
        for path in files {
            match self.ingest_file(&path).await {
                Ok(file_report) => report.ingested.push(file_report),
                Err(e) => {
                    warn!("Error adding {}: {}", path.display(), e);
                    report.failed.push(IngestFailure {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    /// Files in `dir` with an accepted extension, in path order.
    pub fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && self.accepts(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }
}
