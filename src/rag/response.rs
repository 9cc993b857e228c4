//! Answer generation for retrieved context.

use super::{context::format_context_for_prompt, ContextBuilder, ContextChunk};
use crate::config::Prompts;
use crate::embedding::Embedder;
use crate::error::{PdfcastError, Result};
use crate::openai::create_client;
use crate::vector_store::VectorStore;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Produces an answer to a question from retrieved document excerpts.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn answer(&self, question: &str, context: &[ContextChunk]) -> Result<String>;
}

/// Hosted chat model answering with all excerpts stuffed into one prompt.
pub struct OpenAIAnswerer {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    prompts: Prompts,
}

impl OpenAIAnswerer {
    pub fn new(model: &str) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            temperature: 0.7,
            prompts: Prompts::default(),
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    fn build_user_prompt(&self, question: &str, context: &[ContextChunk]) -> String {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(context));
        self.prompts.render_with_custom(&self.prompts.rag.user, &vars)
    }
}

#[async_trait]
impl AnswerGenerator for OpenAIAnswerer {
    #[instrument(skip(self, context), fields(model = %self.model, context_chunks = context.len()))]
    async fn answer(&self, question: &str, context: &[ContextChunk]) -> Result<String> {
        let user_prompt = self.build_user_prompt(question, context);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.rag.system.clone())
                .build()
                .map_err(|e| PdfcastError::RemoteService(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| PdfcastError::RemoteService(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| PdfcastError::RemoteService(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            PdfcastError::RemoteService(format!("Failed to generate answer: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| PdfcastError::RemoteService("Empty response from LLM".to_string()))?;

        Ok(answer)
    }
}

/// Retrieves context for a question and asks the answer generator.
pub struct RagEngine {
    context_builder: ContextBuilder,
    generator: Arc<dyn AnswerGenerator>,
}

impl RagEngine {
    /// Create a new RAG engine retrieving `top_k` chunks per question.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn AnswerGenerator>,
        top_k: usize,
    ) -> Self {
        Self {
            context_builder: ContextBuilder::new(embedder).with_max_chunks(top_k),
            generator,
        }
    }

    /// Ask a single question about the indexed document.
    #[instrument(skip(self, index), fields(question = %question))]
    pub async fn ask(&self, index: &dyn VectorStore, question: &str) -> Result<RagResponse> {
        info!("Processing question: {}", question);

        let sources = self.context_builder.build(index, question).await?;
        let answer = self.generator.answer(question, &sources).await?;

        debug!("Generated answer from {} chunks", sources.len());

        Ok(RagResponse {
            question: question.to_string(),
            answer,
            sources,
        })
    }
}

/// An answer with the chunks it was generated from.
#[derive(Debug, Clone)]
pub struct RagResponse {
    pub question: String,
    /// The generated answer.
    pub answer: String,
    /// Source chunks used for the answer.
    pub sources: Vec<ContextChunk>,
}
