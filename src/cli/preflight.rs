//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials and storage are available before starting a
//! submission that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{PdfcastError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Processing a document calls every remote service and writes storage.
    Process,
    /// Serving the page needs the same as processing.
    Serve,
    /// Reading or deleting history only touches storage.
    History,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Process | Operation::Serve => {
            check_api_key()?;
            check_data_dir(settings)?;
        }
        Operation::History => {
            check_data_dir(settings)?;
        }
    }
    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(PdfcastError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(PdfcastError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that the data directory exists or can be created.
fn check_data_dir(settings: &Settings) -> Result<()> {
    let data_dir = settings.data_dir();
    std::fs::create_dir_all(&data_dir).map_err(|e| PdfcastError::storage("create", &data_dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_needs_only_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().join("data").to_string_lossy().to_string();

        assert!(check(Operation::History, &settings).is_ok());
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn test_unwritable_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let mut settings = Settings::default();
        settings.general.data_dir = blocker.join("data").to_string_lossy().to_string();

        assert!(matches!(
            check(Operation::History, &settings),
            Err(PdfcastError::Storage(_))
        ));
    }
}
