//! Interactive question loop.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Inputs that end the session.
const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "q"];

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.rag.model = model;
    }

    let orchestrator = Orchestrator::new(settings)?;
    let count = orchestrator.count().await?;

    println!("\n{}", style("Docent").bold().cyan());
    println!(
        "{}\n",
        style(format!(
            "{} chunks indexed. Type your questions, or 'exit' to quit.",
            count
        ))
        .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("Question:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        // End of input closes the session like an exit command.
        if stdin.lock().read_line(&mut input)? == 0 {
            println!();
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if is_exit(input) {
            Output::info("Goodbye!");
            break;
        }

        let spinner = Output::spinner("Thinking...");
        let result = orchestrator.ask(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                println!("\n{} {}\n", style("Answer:").cyan().bold(), response.answer);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

fn is_exit(input: &str) -> bool {
    EXIT_COMMANDS
        .iter()
        .any(|command| input.eq_ignore_ascii_case(command))
}
