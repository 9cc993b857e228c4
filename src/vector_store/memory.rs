//! In-memory vector store implementation.

use super::{cosine_similarity, IndexedChunk, SearchResult, VectorStore};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::RwLock;

/// In-memory vector store with exhaustive cosine search.
pub struct MemoryVectorStore {
    chunks: RwLock<Vec<IndexedChunk>>,
}

impl MemoryVectorStore {
    /// Create a new, empty in-memory vector store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, chunks: &[IndexedChunk]) -> Result<usize> {
        let mut store = self.chunks.write().unwrap_or_else(|e| e.into_inner());
        for chunk in chunks {
            match store.iter_mut().find(|c| c.order == chunk.order) {
                Some(existing) => *existing = chunk.clone(),
                None => store.push(chunk.clone()),
            }
        }
        Ok(chunks.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let chunks = self.chunks.read().unwrap_or_else(|e| e.into_inner());

        let mut results: Vec<SearchResult> = chunks
            .iter()
            .map(|chunk| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(query_embedding, &chunk.embedding),
            })
            .collect();

        // Ties keep document order so retrieval is deterministic.
        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.chunk.order.cmp(&b.chunk.order))
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let chunks = self.chunks.read().unwrap_or_else(|e| e.into_inner());
        Ok(chunks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, order: usize, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            content: content.to_string(),
            order,
            embedding,
        }
    }

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        let chunks = vec![
            chunk("Hello world", 0, vec![1.0, 0.0, 0.0]),
            chunk("Goodbye world", 1, vec![0.0, 1.0, 0.0]),
            chunk("Hello again", 2, vec![0.9, 0.1, 0.0]),
        ];
        store.upsert_batch(&chunks).await.unwrap();

        assert_eq!(store.chunk_count().await.unwrap(), 3);

        let results = store.search(&[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "Hello world");
        assert_eq!(results[1].chunk.content, "Hello again");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_order() {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[chunk("old", 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert_batch(&[chunk("new", 0, vec![0.0, 1.0])])
            .await
            .unwrap();

        assert_eq!(store.chunk_count().await.unwrap(), 1);
        let results = store.search(&[0.0, 1.0], 5).await.unwrap();
        assert_eq!(results[0].chunk.content, "new");
    }

    #[test]
    fn test_search_on_empty_store() {
        let store = MemoryVectorStore::new();
        let results = tokio_test::block_on(store.search(&[1.0, 0.0], 4)).unwrap();
        assert!(results.is_empty());
    }
}
