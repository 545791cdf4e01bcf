//! Configuration settings for Docent.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAISettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkingSettings,
    pub vector_store: VectorStoreSettings,
    pub rag: RagSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.docent".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Connection settings for the OpenAI-compatible API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// API key. Falls back to `OPENAI_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Alternative API base URL (for compatible servers).
    pub api_base: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            timeout_secs: 300,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Requested output dimensions. `None` keeps the model's native size.
    pub dimensions: Option<u32>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
        }
    }
}

/// Document chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Chunking strategy (words, characters).
    pub strategy: String,
    /// Target chunk size, in units of the strategy.
    pub chunk_size: usize,
    /// Units repeated from the end of the previous chunk.
    pub chunk_overlap: usize,
    /// Collapse runs of whitespace before chunking.
    pub normalize_whitespace: bool,
    /// File extensions picked up when ingesting a directory.
    pub extensions: Vec<String>,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: "words".to_string(),
            chunk_size: 500,
            chunk_overlap: 100,
            normalize_whitespace: true,
            extensions: vec!["txt".to_string()],
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Directory holding the persisted store. Defaults to `store` inside the data directory.
    pub persist_path: Option<String>,
    /// Name of the collection to read and write.
    pub collection_name: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            persist_path: None,
            collection_name: "documents".to_string(),
        }
    }
}

/// RAG (Retrieval-Augmented Generation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for answer generation.
    pub model: String,
    /// Number of nearest chunks retrieved per question.
    pub top_k: usize,
    /// Sampling temperature for generation.
    pub temperature: f32,
    /// Maximum tokens in a generated answer.
    pub max_tokens: u32,
    /// Answers shorter than this are replaced by the fallback answer.
    pub min_answer_chars: usize,
    /// Maximum number of chunks placed in the prompt.
    pub max_context_chunks: usize,
    /// Maximum number of words placed in the prompt.
    pub max_context_words: usize,
    /// Prefix each context chunk with its source document.
    pub label_sources: bool,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            top_k: 7,
            temperature: 0.4,
            max_tokens: 1500,
            min_answer_chars: 10,
            max_context_chunks: 7,
            max_context_words: 4000,
            label_sources: true,
        }
    }
}

impl RagSettings {
    /// Reject limits that would leave no context for any question.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.top_k == 0 {
            return Err(crate::error::DocentError::Config(
                "rag.top_k must be at least 1".to_string(),
            ));
        }
        if self.max_context_chunks == 0 {
            return Err(crate::error::DocentError::Config(
                "rag.max_context_chunks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::DocentError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docent")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded vector store directory.
    pub fn persist_path(&self) -> PathBuf {
        match &self.vector_store.persist_path {
            Some(path) => Self::expand_path(path),
            None => self.data_dir().join("store"),
        }
    }
}
