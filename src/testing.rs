//! In-memory stand-ins for the remote services, shared by unit tests.

use crate::audio::{AudioSegment, SPEECH_SAMPLE_RATE};
use crate::embedding::Embedder;
use crate::error::{PdfcastError, Result};
use crate::rag::{AnswerGenerator, ContextChunk};
use crate::speech::SpeechSynthesizer;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

const KEYWORD_DIMENSIONS: usize = 1024;

/// Bag-of-words embedder: every distinct lowercase word gets its own axis.
#[derive(Default)]
pub struct KeywordEmbedder {
    vocabulary: Mutex<HashMap<String, usize>>,
    fail: bool,
}

impl KeywordEmbedder {
    /// An embedder whose every call fails like an unreachable service.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vocabulary = self.vocabulary.lock().unwrap();
        let mut vector = vec![0.0; KEYWORD_DIMENSIONS];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let next = vocabulary.len();
            let axis = *vocabulary.entry(word.to_lowercase()).or_insert(next);
            vector[axis % KEYWORD_DIMENSIONS] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.fail {
            return Err(PdfcastError::RemoteService("embedding service down".to_string()));
        }
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        KEYWORD_DIMENSIONS
    }
}

/// Answers with the best-ranked excerpt verbatim.
pub struct EchoAnswerer;

#[async_trait]
impl AnswerGenerator for EchoAnswerer {
    async fn answer(&self, _question: &str, context: &[ContextChunk]) -> Result<String> {
        Ok(context
            .first()
            .map(|c| c.content.clone())
            .unwrap_or_else(|| "I don't know.".to_string()))
    }
}

pub struct FailingAnswerer;

#[async_trait]
impl AnswerGenerator for FailingAnswerer {
    async fn answer(&self, _question: &str, _context: &[ContextChunk]) -> Result<String> {
        Err(PdfcastError::RemoteService("quota exceeded".to_string()))
    }
}

/// Produces 50 ms of silence per character and records what it was asked to say.
#[derive(Default)]
pub struct SilenceSynthesizer {
    calls: Mutex<Vec<String>>,
}

impl SilenceSynthesizer {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for SilenceSynthesizer {
    async fn synthesize(&self, text: &str, _language: &str) -> Result<AudioSegment> {
        self.calls.lock().unwrap().push(text.to_string());
        let secs = text.chars().count() as f64 * 0.05;
        AudioSegment::silent(secs, SPEECH_SAMPLE_RATE, 1)
    }
}

pub struct FailingSynthesizer;

#[async_trait]
impl SpeechSynthesizer for FailingSynthesizer {
    async fn synthesize(&self, _text: &str, _language: &str) -> Result<AudioSegment> {
        Err(PdfcastError::RemoteService("speech service unauthorized".to_string()))
    }
}
