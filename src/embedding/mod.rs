//! Embedding generation for similarity search.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::{PdfcastError, Result};
use async_trait::async_trait;

/// Maps text to vectors whose cosine similarity tracks relatedness.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed many texts; the output has one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text, such as a question.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PdfcastError::RemoteService("Empty embedding response".to_string()))
    }

    /// Length of every vector this embedder returns.
    fn dimensions(&self) -> usize;
}
