//! CLI module for Docent.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Docent - Question answering over your own documents
///
/// Index plain-text documents and ask questions about them.
#[derive(Parser, Debug)]
#[command(name = "docent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "DOCENT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a text file, or every text file in a directory
    Ingest {
        /// File or directory to ingest
        path: PathBuf,
    },

    /// Ask a question and get an answer from your documents
    Ask {
        /// The question to ask
        question: String,

        /// Chat model to use for answer generation
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Start an interactive question session
    Chat {
        /// Chat model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Show the chunks retrieval finds for a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short = 'k', long)]
        limit: Option<usize>,
    },

    /// List indexed documents
    List,

    /// Start the HTTP question answering server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search_with_limit() {
        let cli = Cli::try_parse_from(["docent", "-vv", "search", "due dates", "-k", "3"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Search { query, limit } => {
                assert_eq!(query, "due dates");
                assert_eq!(limit, Some(3));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_serve_defaults_to_config() {
        let cli = Cli::try_parse_from(["docent", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve {
                host: None,
                port: None
            }
        ));
    }
}
