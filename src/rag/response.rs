//! RAG response generation.

use super::context::{format_context_for_display, label_chunks};
use super::{
    AnswerGenerator, ContextChunk, ContextWindow, Retriever, NO_QUESTION, NO_RELEVANT_DOCUMENTS,
};
use crate::config::RagSettings;
use crate::error::{DocentError, Result};
use serde::Serialize;
use tracing::{info, instrument};

/// RAG engine for question answering.
pub struct RagEngine {
    retriever: Retriever,
    generator: AnswerGenerator,
    window: ContextWindow,
    top_k: usize,
    label_sources: bool,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(retriever: Retriever, generator: AnswerGenerator, settings: &RagSettings) -> Self {
        Self {
            retriever,
            generator,
            window: ContextWindow::from_settings(settings),
            top_k: settings.top_k,
            label_sources: settings.label_sources,
        }
    }

    /// Answer a question from the indexed documents.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Result<RagResponse> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DocentError::Validation(NO_QUESTION.to_string()));
        }

        info!("Processing question: {}", question);

        let matches = self.retriever.retrieve(question, self.top_k).await?;
        if matches.is_empty() {
            return Ok(RagResponse {
                answer: NO_RELEVANT_DOCUMENTS.to_string(),
                context: Vec::new(),
                sources: Vec::new(),
            });
        }

        let sources: Vec<ContextChunk> = self
            .window
            .fit(matches)
            .into_iter()
            .map(ContextChunk::from)
            .collect();

        let prompt_context = if self.label_sources {
            label_chunks(&sources)
        } else {
            sources.iter().map(|c| c.text.clone()).collect()
        };

        let answer = self.generator.generate(question, &prompt_context).await?;

        Ok(RagResponse {
            answer,
            context: sources.iter().map(|c| c.text.clone()).collect(),
            sources,
        })
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }
}

/// Response from the RAG engine.
#[derive(Debug, Clone, Serialize)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Retrieved chunk texts, closest first.
    pub context: Vec<String>,
    /// Retrieved chunks with their provenance.
    #[serde(skip)]
    pub sources: Vec<ContextChunk>,
}

impl RagResponse {
    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n---\nSources:\n");
            output.push_str(&format_context_for_display(&self.sources));
        }

        output
    }
}
