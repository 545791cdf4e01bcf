//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Provides the ability to ask questions and get answers from the document store.

pub mod context;
pub mod generator;
mod response;

pub use context::{ContextWindow, Retriever};
pub use generator::{
    AnswerGenerator, ChatMessage, ChatModel, ChatRole, CompletionRequest, OpenAIChatModel,
};
pub use response::{RagEngine, RagResponse};

use crate::vector_store::QueryMatch;
use serde::Serialize;

/// Answer returned when retrieval finds nothing; generation is skipped.
pub const NO_RELEVANT_DOCUMENTS: &str = "No relevant documents found in the database.";

/// Answer substituted when the model's reply is empty or too short.
pub const FALLBACK_ANSWER: &str = "I couldn't find specific information about this in the documents. The context might be too limited.";

/// Validation message for an empty question.
pub const NO_QUESTION: &str = "No question provided";

/// A retrieved chunk prepared for prompting and display.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    /// Record ID.
    pub id: String,
    /// Source document name.
    pub source: String,
    /// Position within the source document.
    pub chunk_index: usize,
    /// Text content.
    pub text: String,
    /// Cosine distance to the question.
    pub distance: f32,
}

impl From<QueryMatch> for ContextChunk {
    fn from(m: QueryMatch) -> Self {
        Self {
            id: m.id,
            source: m.metadata.source,
            chunk_index: m.metadata.chunk_index,
            text: m.text,
            distance: m.distance,
        }
    }
}
