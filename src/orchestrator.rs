//! Pipeline orchestrator for Docent.
//!
//! Builds every component from [`Settings`] and exposes the operations used by
//! the CLI and the HTTP server.

use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{DocentError, Result};
use crate::ingest::{DirectoryReport, IngestReport, Ingestor};
use crate::openai::create_client;
use crate::rag::{
    AnswerGenerator, ChatModel, OpenAIChatModel, RagEngine, RagResponse, Retriever,
};
use crate::vector_store::{QueryMatch, SourceSummary, SqliteVectorStore, VectorStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// The main orchestrator for the Docent pipeline.
pub struct Orchestrator {
    settings: Settings,
    vector_store: Arc<dyn VectorStore>,
    ingestor: Ingestor,
    engine: RagEngine,
}

impl Orchestrator {
    /// Create an orchestrator backed by OpenAI and the on-disk store.
    pub fn new(settings: Settings) -> Result<Self> {
        let client = create_client(&settings.openai)?;

        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::new(client.clone(), &settings.embedding));
        let chat_model: Arc<dyn ChatModel> =
            Arc::new(OpenAIChatModel::new(client, &settings.rag.model));

        let persist_path = settings.persist_path();
        let vector_store: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::open(
            &persist_path,
            &settings.vector_store.collection_name,
        )?);
        info!(
            "Using collection '{}' in {}",
            settings.vector_store.collection_name,
            persist_path.display()
        );

        Self::with_components(settings, embedder, chat_model, vector_store)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        settings.rag.validate()?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let ingestor = Ingestor::new(&settings.chunking, embedder.clone(), vector_store.clone())?;
        let engine = RagEngine::new(
            Retriever::new(embedder, vector_store.clone()),
            AnswerGenerator::new(chat_model, prompts, &settings.rag),
            &settings.rag,
        );

        debug!(
            "Answering with '{}' over collection '{}'",
            engine.generator().model(),
            vector_store.collection()
        );

        Ok(Self {
            settings,
            vector_store,
            ingestor,
            engine,
        })
    }

    /// Ingest a single text file.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        self.ingestor.ingest_file(path).await
    }

    /// Ingest every accepted file in a directory.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<DirectoryReport> {
        self.ingestor.ingest_directory(dir).await
    }

    /// Answer a question from the indexed documents.
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        self.engine.ask(question).await
    }

    /// Retrieve the `limit` closest chunks without generating an answer.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<QueryMatch>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DocentError::Validation("No query provided".to_string()));
        }

        let matches = self.engine.retriever().retrieve(query, limit).await?;
        for m in &matches {
            debug!("{} distance={:.4}", m.id, m.distance);
        }
        Ok(matches)
    }

    /// Number of records in the collection.
    pub async fn count(&self) -> Result<usize> {
        self.vector_store.count().await
    }

    /// Indexed source documents.
    pub async fn sources(&self) -> Result<Vec<SourceSummary>> {
        self.vector_store.sources().await
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::NO_RELEVANT_DOCUMENTS;
    use crate::test_support::{HashEmbedder, ScriptedChatModel};
    use crate::vector_store::MemoryVectorStore;

    fn orchestrator(model: ScriptedChatModel) -> Orchestrator {
        let mut settings = Settings::default();
        settings.chunking.chunk_size = 20;
        settings.chunking.chunk_overlap = 5;
        Orchestrator::with_components(
            settings,
            Arc::new(HashEmbedder::new()),
            Arc::new(model),
            Arc::new(MemoryVectorStore::new("lectures")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_ingest_then_ask() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("week1.txt"),
            "Welcome to the course. Assignment 2 is due March 5th. Late work loses ten percent.",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("week2.txt"),
            "Today we cover cardiac physiology and the conduction system.",
        )
        .unwrap();

        let orchestrator = orchestrator(ScriptedChatModel::replying(
            "Assignment 2 is due on March 5th.",
        ));

        assert_eq!(orchestrator.ask("When is it due?").await.unwrap().answer, NO_RELEVANT_DOCUMENTS);

        let report = orchestrator.ingest_directory(dir.path()).await.unwrap();
        assert_eq!(report.ingested.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(orchestrator.count().await.unwrap(), report.total_chunks());

        let response = orchestrator.ask("When is assignment 2 due?").await.unwrap();
        assert!(response.answer.contains("March 5th"));
        assert!(response.context[0].contains("Assignment 2 is due March 5th"));

        let sources = orchestrator.sources().await.unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.source.as_str()).collect();
        assert!(names.contains(&"week1.txt"));
        assert!(names.contains(&"week2.txt"));
    }

    #[tokio::test]
    async fn test_search_limits_results() {
        let orchestrator = orchestrator(ScriptedChatModel::replying("unused answer"));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let words: Vec<String> = (0..100).map(|i| format!("w{}", i)).collect();
        std::fs::write(&path, words.join(" ")).unwrap();

        let report = orchestrator.ingest_file(&path).await.unwrap();
        assert!(report.chunks_added > 2);

        let matches = orchestrator.search("w3 w4", 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert!(matches[0].distance <= matches[1].distance);

        assert!(orchestrator.search("  ", 2).await.unwrap_err().is_validation());
    }

    #[test]
    fn test_zero_retrieval_limits_rejected() {
        for zero_top_k in [true, false] {
            let mut settings = Settings::default();
            if zero_top_k {
                settings.rag.top_k = 0;
            } else {
                settings.rag.max_context_chunks = 0;
            }

            let result = Orchestrator::with_components(
                settings,
                Arc::new(HashEmbedder::new()),
                Arc::new(ScriptedChatModel::replying("unused answer")),
                Arc::new(MemoryVectorStore::default()),
            );
            assert!(matches!(result, Err(DocentError::Config(_))));
        }
    }

    #[test]
    fn test_vector_store_collection() {
        let orchestrator = orchestrator(ScriptedChatModel::replying("unused answer"));
        assert_eq!(orchestrator.vector_store().collection(), "lectures");
    }
}
