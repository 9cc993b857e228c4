//! Error types for Pdfcast.

use thiserror::Error;

/// Library-level error type for Pdfcast operations.
#[derive(Error, Debug)]
pub enum PdfcastError {
    #[error("Document format error: {0}")]
    Format(String),

    #[error("Remote service error: {0}")]
    RemoteService(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Audio processing error: {0}")]
    Audio(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// The failure categories shown to the user when a submission aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The uploaded document could not be read.
    Format,
    /// Embedding, language model or speech synthesis call failed.
    RemoteService,
    /// Writing or removing a stored file failed.
    Storage,
    /// Anything else (bad input, configuration, local audio processing).
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Format => write!(f, "FormatError"),
            ErrorKind::RemoteService => write!(f, "RemoteServiceError"),
            ErrorKind::Storage => write!(f, "StorageError"),
            ErrorKind::Other => write!(f, "Error"),
        }
    }
}

impl PdfcastError {
    /// Classify this error into one of the user-facing kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfcastError::Format(_) => ErrorKind::Format,
            PdfcastError::RemoteService(_) | PdfcastError::Http(_) => ErrorKind::RemoteService,
            PdfcastError::Storage(_) | PdfcastError::Io(_) => ErrorKind::Storage,
            _ => ErrorKind::Other,
        }
    }

    /// Wrap an IO failure on a stored file with the path that failed.
    pub fn storage(action: &str, path: &std::path::Path, err: std::io::Error) -> Self {
        PdfcastError::Storage(format!("failed to {} {}: {}", action, path.display(), err))
    }
}

/// Result type alias for Pdfcast operations.
pub type Result<T> = std::result::Result<T, PdfcastError>;
