//! Answer generation with a chat completion model.

use super::FALLBACK_ANSWER;
use crate::config::{Prompts, RagSettings};
use crate::error::{DocentError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Who a prompt message comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A single chat completion call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Trait for chat completion backends.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run the request and return the first reply's text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Get the model name.
    fn model(&self) -> &str;
}

/// Chat completions through the OpenAI API.
pub struct OpenAIChatModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }

    fn to_openai(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let built: std::result::Result<ChatCompletionRequestMessage, _> = match message.role {
            ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map(Into::into),
            ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.as_str())
                .build()
                .map(Into::into),
        };
        built.map_err(|e| DocentError::Generation(format!("Failed to build message: {}", e)))
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let messages = request
            .messages
            .iter()
            .map(Self::to_openai)
            .collect::<Result<Vec<_>>>()?;

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens)
            .build()
            .map_err(|e| DocentError::Generation(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| DocentError::Generation(format!("Failed to generate response: {}", e)))?;

        // A reply without content counts as empty and triggers the fallback.
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Turns a question and its context into an answer.
pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    temperature: f32,
    max_tokens: u32,
    min_answer_chars: usize,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn ChatModel>, prompts: Prompts, settings: &RagSettings) -> Self {
        Self {
            model,
            prompts,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            min_answer_chars: settings.min_answer_chars,
        }
    }

    /// Build the two-message request for `question` over `context`.
    pub fn build_request(&self, question: &str, context: &[String]) -> CompletionRequest {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context.join("\n\n"));
        vars.insert("question".to_string(), question.to_string());

        let system = self
            .prompts
            .render_with_custom(&self.prompts.rag.system, &HashMap::new());
        let user = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);

        CompletionRequest {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Generate an answer. Replies shorter than the configured minimum are replaced by
    /// [`FALLBACK_ANSWER`].
    #[instrument(skip(self, context), fields(chunks = context.len()))]
    pub async fn generate(&self, question: &str, context: &[String]) -> Result<String> {
        let request = self.build_request(question, context);
        let reply = self.model.complete(&request).await?;
        let answer = reply.trim();

        if answer.chars().count() < self.min_answer_chars.max(1) {
            warn!("Model returned a short answer ({} chars), using fallback", answer.len());
            return Ok(FALLBACK_ANSWER.to_string());
        }

        debug!("Generated answer of {} chars", answer.len());
        Ok(answer.to_string())
    }

    pub fn model(&self) -> &str {
        self.model.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedChatModel;

    fn generator(model: Arc<ScriptedChatModel>) -> AnswerGenerator {
        AnswerGenerator::new(model, Prompts::default(), &RagSettings::default())
    }

    #[test]
    fn test_build_request() {
        let generator = generator(Arc::new(ScriptedChatModel::replying("ok")));
        let request = generator.build_request(
            "When is it due?",
            &["first chunk".to_string(), "second chunk".to_string()],
        );

        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.messages[1].role, ChatRole::User);
        let user = &request.messages[1].content;
        assert!(user.contains("first chunk\n\nsecond chunk"));
        assert!(user.contains("Specific Question: When is it due?"));
        assert!(!user.contains("{{"));
        assert_eq!(request.temperature, 0.4);
        assert_eq!(request.max_tokens, 1500);
    }

    #[test]
    fn test_custom_variables_in_system_prompt() {
        let mut prompts = Prompts::default();
        prompts.rag.system = "You help with {{course}}.".to_string();
        prompts
            .variables
            .insert("course".to_string(), "NURS 204".to_string());
        let generator = AnswerGenerator::new(
            Arc::new(ScriptedChatModel::replying("ok")),
            prompts,
            &RagSettings::default(),
        );

        let request = generator.build_request("q", &[]);
        assert_eq!(request.messages[0].content, "You help with NURS 204.");
    }

    #[test]
    fn test_context_with_placeholder_syntax_is_verbatim() {
        let chunk = "Template syntax: write {{question}} and {{course}} literally.";
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("course".to_string(), "NURS 204".to_string());
        let generator = AnswerGenerator::new(
            Arc::new(ScriptedChatModel::replying("ok")),
            prompts,
            &RagSettings::default(),
        );

        // Map iteration order varies between builds.
        for _ in 0..50 {
            let request = generator.build_request("How do I cite a template?", &[chunk.to_string()]);
            let user = &request.messages[1].content;
            assert!(user.contains(chunk));
            assert!(user.contains("Specific Question: How do I cite a template?"));
            assert!(!user.contains("NURS 204"));
        }
    }

    #[tokio::test]
    async fn test_answer_is_trimmed() {
        let model = Arc::new(ScriptedChatModel::replying("  Assignment 2 is due March 5th.\n"));
        let answer = generator(model.clone())
            .generate("When is assignment 2 due?", &["ctx".to_string()])
            .await
            .unwrap();

        assert_eq!(answer, "Assignment 2 is due March 5th.");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_short_answer_falls_back() {
        for reply in ["", "   ", "Yes."] {
            let answer = generator(Arc::new(ScriptedChatModel::replying(reply)))
                .generate("q", &["ctx".to_string()])
                .await
                .unwrap();
            assert_eq!(answer, FALLBACK_ANSWER);
        }
    }

    #[tokio::test]
    async fn test_generation_error_propagates() {
        let model = Arc::new(ScriptedChatModel::new(|_| {
            Err(DocentError::Generation("rate limited".to_string()))
        }));
        let err = generator(model).generate("q", &[]).await.unwrap_err();
        assert!(matches!(err, DocentError::Generation(_)));
    }
}
