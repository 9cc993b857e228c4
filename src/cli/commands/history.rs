//! History command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{HistoryAction, Output};
use crate::config::Settings;
use crate::storage::{FileRemoval, Storage};
use anyhow::Result;

/// Run the history command.
pub fn run_history(action: &HistoryAction, settings: Settings) -> Result<()> {
    preflight::check(Operation::History, &settings)?;
    let storage = Storage::open(&settings.data_dir())?;

    match action {
        HistoryAction::List => list(&storage)?,
        HistoryAction::Delete { name } => delete(&storage, name)?,
    }

    Ok(())
}

fn list(storage: &Storage) -> Result<()> {
    let history = storage.history()?;

    if history.is_empty() {
        Output::info("No documents yet. Use 'pdfcast process <pdf>' or 'pdfcast serve' to add one.");
    } else {
        Output::header(&format!("Documents ({})", history.len()));
        println!();
        for entry in &history {
            Output::history_entry(entry);
        }
    }

    let orphans = storage.orphaned_audio()?;
    if !orphans.is_empty() {
        Output::header("Audio without document");
        for path in &orphans {
            Output::list_item(&path.display().to_string());
        }
    }

    println!();
    Output::kv("Documents", &storage.documents_dir().display().to_string());
    Output::kv("Audio", &storage.audio_dir().display().to_string());

    Ok(())
}

fn delete(storage: &Storage, name: &str) -> Result<()> {
    let report = storage.delete(name);

    for (label, removal) in [("Document", &report.document), ("Audio", &report.audio)] {
        match removal {
            FileRemoval::Removed(path) => {
                Output::success(&format!("{} removed: {}", label, path.display()))
            }
            FileRemoval::Failed(e) => Output::error(&format!("{} not removed: {}", label, e)),
        }
    }

    report.into_result()?;
    Ok(())
}
