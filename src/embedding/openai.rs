//! OpenAI embeddings implementation.

use super::Embedder;
use crate::config::EmbeddingSettings;
use crate::error::{DocentError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{CreateEmbeddingRequestArgs, Embedding, EmbeddingInput};
use async_openai::Client;
use async_trait::async_trait;
use std::ops::Range;
use tracing::{debug, instrument};

/// Maximum number of inputs the embeddings endpoint accepts per request.
const MAX_BATCH_INPUTS: usize = 2048;

/// Maximum total tokens the embeddings endpoint accepts per request.
const MAX_BATCH_TOKENS: usize = 300_000;

/// OpenAI-based embedder.
pub struct OpenAIEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: Option<u32>,
    max_batch_inputs: usize,
    max_batch_tokens: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder for the configured model.
    pub fn new(client: Client<OpenAIConfig>, settings: &EmbeddingSettings) -> Self {
        Self {
            client,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            max_batch_inputs: MAX_BATCH_INPUTS,
            max_batch_tokens: MAX_BATCH_TOKENS,
        }
    }

    /// Override the per-request input and token limits.
    pub fn with_batch_limits(mut self, max_inputs: usize, max_tokens: usize) -> Self {
        self.max_batch_inputs = max_inputs.max(1);
        self.max_batch_tokens = max_tokens.max(1);
        self
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, texts), fields(count = texts.len(), model = %self.model))]
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        let batches = plan_batches(texts, self.max_batch_inputs, self.max_batch_tokens);
        debug!("Sending {} embedding requests", batches.len());

        for range in batches {
            let batch = &texts[range];
            let mut args = CreateEmbeddingRequestArgs::default();
            args.model(&self.model)
                .input(EmbeddingInput::StringArray(batch.to_vec()));
            if let Some(dimensions) = self.dimensions {
                args.dimensions(dimensions);
            }
            let request = args
                .build()
                .map_err(|e| DocentError::Embedding(format!("Failed to build request: {}", e)))?;

            let response = self
                .client
                .embeddings()
                .create(request)
                .await
                .map_err(|e| DocentError::Embedding(format!("Embedding API error: {}", e)))?;

            all_embeddings.extend(order_embeddings(response.data, batch.len())?);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Rough upper bound on the token count of `text`.
///
/// English averages about four characters per token; three leaves headroom.
fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(3).max(1)
}

/// Split `texts` into consecutive ranges that respect both request limits.
///
/// A text whose estimate alone exceeds `max_tokens` is sent on its own.
fn plan_batches(texts: &[String], max_inputs: usize, max_tokens: usize) -> Vec<Range<usize>> {
    let mut batches = Vec::new();
    let mut start = 0;
    let mut tokens = 0;

    for (i, text) in texts.iter().enumerate() {
        let estimate = estimate_tokens(text);
        let full = i - start >= max_inputs || tokens + estimate > max_tokens;
        if i > start && full {
            batches.push(start..i);
            start = i;
            tokens = 0;
        }
        tokens += estimate;
    }

    if start < texts.len() {
        batches.push(start..texts.len());
    }
    batches
}

/// Sort response items by index and check that every input got exactly one vector.
fn order_embeddings(mut data: Vec<Embedding>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(DocentError::Embedding(format!(
            "Expected {} embeddings, received {}",
            expected,
            data.len()
        )));
    }

    data.sort_by_key(|e| e.index);
    if data.iter().enumerate().any(|(i, e)| e.index as usize != i) {
        return Err(DocentError::Embedding(
            "Embedding response indices do not match inputs".to_string(),
        ));
    }

    Ok(data.into_iter().map(|e| e.embedding).collect())
}
