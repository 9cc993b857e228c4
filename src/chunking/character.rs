//! Separator-based character chunking.
//!
//! Splits on a separator and greedily merges the pieces back into chunks of at
//! most `chunk_size` characters, carrying up to `chunk_overlap` characters of
//! trailing pieces into the next chunk.

use super::{Chunker, ChunkingConfig, TextChunk};
use crate::error::{PdfcastError, Result};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Chunker that only cuts at separator boundaries.
#[derive(Debug, Clone)]
pub struct CharacterSplitter {
    config: ChunkingConfig,
}

impl CharacterSplitter {
    /// Create a splitter, rejecting configurations that cannot produce overlapping chunks.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.separator.is_empty() {
            return Err(PdfcastError::Config("Chunk separator must not be empty".into()));
        }
        if config.chunk_size == 0 {
            return Err(PdfcastError::Config("Chunk size must be positive".into()));
        }
        if config.chunk_overlap > config.chunk_size {
            return Err(PdfcastError::Config(format!(
                "Chunk overlap ({}) is larger than chunk size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split text into raw chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let pieces: Vec<&str> = text
            .split(self.config.separator.as_str())
            .filter(|piece| !piece.is_empty())
            .collect();
        self.merge_pieces(&pieces)
    }

    fn join(&self, window: &VecDeque<(&str, usize)>) -> Option<String> {
        let joined = window
            .iter()
            .map(|(piece, _)| *piece)
            .collect::<Vec<_>>()
            .join(&self.config.separator);
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;
        let sep_len = self.config.separator.chars().count();

        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = piece.chars().count();
            let joiner = if window.is_empty() { 0 } else { sep_len };

            if total + len + joiner > size && !window.is_empty() {
                if total > size {
                    warn!("Created a chunk of {} characters, longer than {}", total, size);
                }
                if let Some(chunk) = self.join(&window) {
                    chunks.push(chunk);
                }

                // Keep at most `overlap` characters, and make room for the next piece.
                while let Some(&(_, front_len)) = window.front() {
                    let must_shrink =
                        total > overlap || (total + len + sep_len > size && total > 0);
                    if !must_shrink {
                        break;
                    }
                    total -= front_len + if window.len() > 1 { sep_len } else { 0 };
                    window.pop_front();
                }
            }

            window.push_back((piece, len));
            total += len + if window.len() > 1 { sep_len } else { 0 };
        }

        if let Some(chunk) = self.join(&window) {
            chunks.push(chunk);
        }

        chunks
    }
}

impl Chunker for CharacterSplitter {
    fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let chunks: Vec<TextChunk> = self
            .split_text(text)
            .into_iter()
            .enumerate()
            .map(|(order, content)| TextChunk::new(content, order))
            .collect();
        debug!("Split {} characters into {} chunks", text.chars().count(), chunks.len());
        chunks
    }
}
