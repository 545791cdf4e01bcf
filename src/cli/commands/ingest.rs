//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::{bail, Result};
use std::path::Path;

/// Run the ingest command on a file or a directory.
pub async fn run_ingest(path: &Path, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ingest, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    if !path.exists() {
        Output::error(&format!("Path not found: {}", path.display()));
        bail!("Path not found: {}", path.display());
    }

    let orchestrator = Orchestrator::new(settings)?;

    if path.is_dir() {
        let spinner = Output::spinner(&format!("Ingesting files in {}...", path.display()));
        let report = orchestrator.ingest_directory(path).await;
        spinner.finish_and_clear();
        let report = report?;

        for file in &report.ingested {
            Output::kv(&file.source, &format!("{} chunks", file.chunks_added));
        }
        for failure in &report.failed {
            Output::warning(&format!("Skipped {}: {}", failure.path.display(), failure.error));
        }

        Output::success(&format!(
            "Ingested {} files ({} chunks), {} failed",
            report.ingested.len(),
            report.total_chunks(),
            report.failed.len()
        ));
    } else {
        let spinner = Output::spinner(&format!("Ingesting {}...", path.display()));
        let report = orchestrator.ingest_file(path).await;
        spinner.finish_and_clear();

        match report {
            Ok(report) if report.chunks_added == 0 => {
                Output::warning(&format!("No content found in {}", report.source));
            }
            Ok(report) => {
                Output::success(&format!(
                    "Added {} chunks from {}",
                    report.chunks_added, report.source
                ));
            }
            Err(e) => {
                Output::error(&format!("Failed to ingest {}: {}", path.display(), e));
                return Err(e.into());
            }
        }
    }

    Output::kv("Chunks in collection", &orchestrator.count().await?.to_string());

    Ok(())
}
