//! Context building for RAG responses.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;
use tracing::debug;

/// Retrieves the most relevant chunks of a document index for a query.
pub struct ContextBuilder {
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
}

impl ContextBuilder {
    /// Create a new context builder.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            max_chunks: 4,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    pub fn max_chunks(&self) -> usize {
        self.max_chunks
    }

    /// Build context for a query against one document's index.
    pub async fn build(&self, index: &dyn VectorStore, query: &str) -> Result<Vec<ContextChunk>> {
        let query_embedding = self.embedder.embed(query).await?;

        let results = index.search(&query_embedding, self.max_chunks).await?;
        debug!("Retrieved {} chunks for query", results.len());

        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

/// Stuff every retrieved chunk into one context block.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::TextChunk;
    use crate::testing::KeywordEmbedder;
    use crate::vector_store::build_index;

    #[tokio::test]
    async fn test_build_returns_most_relevant_first() {
        let embedder = Arc::new(KeywordEmbedder::default());
        let chunks = vec![
            TextChunk::new("Berlin is the capital of Germany".to_string(), 0),
            TextChunk::new("Cats sleep most of the day".to_string(), 1),
            TextChunk::new("The capital of France is Paris".to_string(), 2),
        ];
        let index = build_index(chunks, embedder.as_ref()).await.unwrap();

        let builder = ContextBuilder::new(embedder).with_max_chunks(2);
        let context = builder
            .build(&index, "What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(context.len(), 2);
        assert!(context[0].content.contains("Paris"));
        assert_eq!(context[0].order, 2);
    }

    #[test]
    fn test_format_context_joins_chunks() {
        let chunks = vec![
            ContextChunk {
                content: "first".to_string(),
                order: 0,
                score: 0.9,
            },
            ContextChunk {
                content: "second".to_string(),
                order: 1,
                score: 0.5,
            },
        ];
        assert_eq!(format_context_for_prompt(&chunks), "first\n\nsecond");
    }
}
