//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: Option<usize>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Search, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let limit = limit.unwrap_or(settings.rag.top_k);
    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(matches) => {
            if matches.is_empty() {
                Output::warning("No documents indexed yet. Use 'docent ingest <path>' to add content.");
            } else {
                Output::success(&format!("Found {} results", matches.len()));

                for (i, m) in matches.iter().enumerate() {
                    Output::search_result(i + 1, &m.id, m.distance, &m.text);
                }
                println!();
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
