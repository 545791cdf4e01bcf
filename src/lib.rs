//! Docent - Question answering over your own documents
//!
//! A local CLI tool and HTTP service that indexes plain-text documents and
//! answers questions about them with retrieval-augmented generation.
//!
//! # Overview
//!
//! Docent allows you to:
//! - Ingest text files (lecture transcripts, notes) into a persistent vector store
//! - Ask questions and get answers grounded in the retrieved chunks
//! - Search the store directly to inspect what retrieval finds
//! - Serve the same question answering over HTTP
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `chunking` - Splitting documents into overlapping chunks
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `ingest` - File and directory ingestion
//! - `rag` - Retrieval, answer generation and the `ask` operation
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use docent::config::Settings;
//! use docent::orchestrator::Orchestrator;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     orchestrator.ingest_directory(Path::new("transcripts")).await?;
//!     let response = orchestrator.ask("When is Assignment 2 due?").await?;
//!     println!("{}", response.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod vector_store;

#[cfg(test)]
mod test_support;

pub use error::{DocentError, Result};
