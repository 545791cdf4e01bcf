//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.rag.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner("Searching documents...");
    let result = orchestrator.ask(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(response) => {
            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for (i, source) in response.sources.iter().enumerate() {
                    Output::search_result(i + 1, &source.id, source.distance, &source.text);
                }
                println!();
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
