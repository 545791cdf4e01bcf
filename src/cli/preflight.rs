//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::Result;
use crate::openai::resolve_api_key;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion embeds every chunk.
    Ingest,
    /// Asking questions embeds the question and calls the chat model.
    Ask,
    /// Search embeds the query.
    Search,
    /// Listing only reads the local store.
    List,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ingest | Operation::Ask | Operation::Search => {
            check_api_key(settings)?;
        }
        Operation::List => {}
    }
    Ok(())
}

/// Check that an OpenAI API key is configured, in the config file or the environment.
fn check_api_key(settings: &Settings) -> Result<()> {
    resolve_api_key(&settings.openai).map(|_| ())
}
