//! Similarity index over embedded chunks.
//!
//! The index for a document is built from scratch for each submission and
//! dropped afterwards; nothing here is persisted.

mod memory;

pub use memory::MemoryVectorStore;

use crate::chunking::TextChunk;
use crate::embedding::Embedder;
use crate::error::{PdfcastError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A chunk stored in the index together with its embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Order of this chunk in the document.
    pub order: usize,
    /// Embedding vector.
    pub embedding: Vec<f32>,
}

impl IndexedChunk {
    pub fn new(chunk: TextChunk, embedding: Vec<f32>) -> Self {
        Self {
            content: chunk.content,
            order: chunk.order,
            embedding,
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: IndexedChunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk insert chunks.
    async fn upsert_batch(&self, chunks: &[IndexedChunk]) -> Result<usize>;

    /// Return the `limit` chunks most similar to the query embedding, best first.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Get total chunk count.
    async fn chunk_count(&self) -> Result<usize>;
}

/// Embed every chunk and load it into a fresh in-memory index.
#[instrument(skip_all, fields(chunks = chunks.len()))]
pub async fn build_index(
    chunks: Vec<TextChunk>,
    embedder: &dyn Embedder,
) -> Result<MemoryVectorStore> {
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    if embeddings.len() != chunks.len() {
        return Err(PdfcastError::RemoteService(format!(
            "Expected {} embeddings, got {}",
            chunks.len(),
            embeddings.len()
        )));
    }

    let dimensions = embedder.dimensions();
    if let Some(bad) = embeddings.iter().find(|e| e.len() != dimensions) {
        return Err(PdfcastError::RemoteService(format!(
            "Expected embeddings of {} dimensions, got {}",
            dimensions,
            bad.len()
        )));
    }

    let indexed: Vec<IndexedChunk> = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| IndexedChunk::new(chunk, embedding))
        .collect();

    let store = MemoryVectorStore::new();
    let count = store.upsert_batch(&indexed).await?;
    debug!("Inserted {} chunks", count);

    Ok(store)
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
