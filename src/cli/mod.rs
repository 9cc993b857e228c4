//! CLI module for Pdfcast.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{format_duration, Output};

use clap::{Parser, Subcommand};

/// Pdfcast - ask questions of a PDF and listen to the answers
///
/// Upload a document, ask a list of questions, and get each answer both as
/// text and as speech, with one combined audio track per document.
#[derive(Parser, Debug)]
#[command(name = "pdfcast")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PDFCAST_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the interactive page
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Answer questions about a PDF and store the combined audio
    Process {
        /// Path to the PDF document
        pdf: String,

        /// File with one question per line (defaults to general.questions_file)
        #[arg(short, long)]
        questions: Option<String>,
    },

    /// Show or manage stored documents and audio
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// List stored documents with their audio
    List,

    /// Delete a document and its audio
    Delete {
        /// Document file name, as shown by `history list`
        name: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process() {
        let cli = Cli::try_parse_from(["pdfcast", "-vv", "process", "doc.pdf", "-q", "qs.txt"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Process { pdf, questions } => {
                assert_eq!(pdf, "doc.pdf");
                assert_eq!(questions.as_deref(), Some("qs.txt"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_history_delete() {
        let cli = Cli::try_parse_from(["pdfcast", "history", "delete", "a b.pdf"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::History {
                action: HistoryAction::Delete { ref name }
            } if name == "a b.pdf"
        ));
    }

    #[test]
    fn test_serve_defaults_to_settings() {
        let cli = Cli::try_parse_from(["pdfcast", "serve"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve {
                host: None,
                port: None
            }
        ));
    }
}
