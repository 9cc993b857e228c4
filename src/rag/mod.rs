//! RAG (Retrieval-Augmented Generation) for answering questions about a document.

pub mod context;
mod response;

pub use context::ContextBuilder;
pub use response::{AnswerGenerator, OpenAIAnswerer, RagEngine, RagResponse};

use crate::vector_store::SearchResult;
use serde::Serialize;

/// A retrieved chunk handed to the language model as context.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    /// Text content.
    pub content: String,
    /// Position of the chunk in the document.
    pub order: usize,
    /// Similarity score.
    pub score: f32,
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self {
            content: result.chunk.content,
            order: result.chunk.order,
            score: result.score,
        }
    }
}
