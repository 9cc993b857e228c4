//! Default question list.

use crate::error::{PdfcastError, Result};
use std::path::Path;
use tracing::warn;

/// Read the default questions file as editable text.
///
/// A missing file yields an empty list so the page still opens; any other
/// read failure is reported.
pub fn load_default_questions(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Questions file {} not found, starting with no default questions", path.display());
            Ok(String::new())
        }
        Err(e) => Err(PdfcastError::Config(format!(
            "Failed to read questions file {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Split edited question text into the question list: one question per non-empty line.
pub fn parse_questions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
