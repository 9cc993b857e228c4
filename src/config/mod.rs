//! Configuration module for Pdfcast.
//!
//! Handles loading application settings, prompt templates and the default question list.

mod prompts;
mod questions;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use questions::{load_default_questions, parse_questions};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, PipelineSettings, PromptSettings,
    RagSettings, ServerSettings, Settings, SpeechSettings,
};
