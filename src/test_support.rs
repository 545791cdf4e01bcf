//! Deterministic stand-ins for the embedding and generation services.

use crate::embedding::Embedder;
use crate::error::{DocentError, Result};
use crate::rag::{ChatModel, CompletionRequest};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const DIMENSIONS: usize = 256;

/// Bag-of-words embedder: texts sharing words get close vectors.
pub struct HashEmbedder {
    calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSIONS];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            vector[(hasher.finish() % DIMENSIONS as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model(&self) -> &str {
        "hash-bow"
    }
}

/// Embedder whose service is always down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(DocentError::Embedding("service unavailable".to_string()))
    }

    fn model(&self) -> &str {
        "failing"
    }
}

/// Chat model that records requests and answers from a closure.
pub struct ScriptedChatModel {
    reply: Box<dyn Fn(&CompletionRequest) -> Result<String> + Send + Sync>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedChatModel {
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `answer`.
    pub fn replying(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::new(move |_| Ok(answer.clone()))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        (self.reply)(request)
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
