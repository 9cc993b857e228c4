//! Text chunking for retrieval.
//!
//! Splits extracted document text into bounded, overlapping chunks.

mod character;

pub use character::CharacterSplitter;

use serde::{Deserialize, Serialize};

/// A bounded-length piece of document text used as a unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Position of this chunk in the document.
    pub order: usize,
}

impl TextChunk {
    pub fn new(content: String, order: usize) -> Self {
        Self { content, order }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkingConfig {
    /// Boundary to split on.
    pub separator: String,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Maximum overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            separator: "\n".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl From<&crate::config::ChunkingSettings> for ChunkingConfig {
    fn from(settings: &crate::config::ChunkingSettings) -> Self {
        Self {
            separator: settings.separator.clone(),
            chunk_size: settings.chunk_size,
            chunk_overlap: settings.chunk_overlap,
        }
    }
}

/// Trait for text chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split text into ordered, non-empty chunks.
    fn chunk(&self, text: &str) -> Vec<TextChunk>;
}
