//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::{SqliteVectorStore, VectorStore};
use anyhow::Result;

/// Run the list command.
///
/// Reads the store directly so no API key is needed.
pub async fn run_list(settings: Settings) -> Result<()> {
    let store = SqliteVectorStore::open(
        &settings.persist_path(),
        &settings.vector_store.collection_name,
    )?;

    match store.sources().await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("No documents indexed yet. Use 'docent ingest <path>' to add content.");
            } else {
                Output::header(&format!("Indexed Documents ({})", sources.len()));
                println!();

                for source in &sources {
                    Output::source_info(
                        &source.source,
                        source.chunk_count,
                        &source.last_indexed_at.format("%Y-%m-%d %H:%M").to_string(),
                    );
                }

                println!();
                Output::kv("Collection", store.collection());
                Output::kv("Total documents", &sources.len().to_string());
                Output::kv("Total chunks", &store.count().await?.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list documents: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
