//! Pdfcast - ask questions of a PDF and listen to the answers
//!
//! Upload a document, ask it a list of questions, and get every answer as
//! text and as speech, together with one combined audio track per document.
//!
//! # Overview
//!
//! For each submission Pdfcast:
//! - Extracts the document text page by page
//! - Splits it into overlapping chunks and indexes them by embedding
//! - Answers every question from the most relevant chunks
//! - Voices each question followed by its answer, sped up for listening
//! - Concatenates the per-question audio and stores it next to the document
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Settings, prompts and the default question list
//! - `extraction` - PDF text extraction
//! - `chunking` - Fixed-size overlapping text chunks
//! - `embedding` - Embedding generation
//! - `vector_store` - In-memory similarity index
//! - `rag` - Retrieval and answer generation
//! - `speech` - Text-to-speech synthesis
//! - `audio` - PCM segments, speed adjustment and WAV export
//! - `storage` - Stored documents, audio and history
//! - `orchestrator` - Pipeline coordination
//! - `web` - The interactive page
//!
//! # Example
//!
//! ```rust,no_run
//! use pdfcast::config::Settings;
//! use pdfcast::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let bytes = std::fs::read("report.pdf")?;
//!     let questions = vec!["What is this document about?".to_string()];
//!     let result = orchestrator.process_upload("report.pdf", bytes, &questions).await?;
//!
//!     println!("{}", result.answers[0].answer);
//!     println!("Audio at {}", result.audio_path.display());
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod speech;
pub mod storage;
pub mod vector_store;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ErrorKind, PdfcastError, Result};
