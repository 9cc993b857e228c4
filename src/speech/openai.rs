//! OpenAI text-to-speech implementation.

use super::{split_for_synthesis, SpeechSynthesizer};
use crate::audio::{AudioSegment, SPEECH_SAMPLE_RATE};
use crate::error::{PdfcastError, Result};
use crate::openai::create_client;
use async_openai::types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Longest input the speech endpoint accepts in one request.
const MAX_INPUT_CHARS: usize = 4096;

/// OpenAI speech synthesizer returning raw 24 kHz mono PCM.
///
/// The voice models pick up the language from the text itself, so `language`
/// is only recorded on the request span.
pub struct OpenAISpeech {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
}

impl OpenAISpeech {
    /// Create a synthesizer with the `tts-1` model and the `alloy` voice.
    pub fn new() -> Result<Self> {
        Self::with_config("tts-1", "alloy")
    }

    pub fn with_config(model: &str, voice: &str) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: parse_model(model),
            voice: parse_voice(voice)?,
        })
    }

    async fn synthesize_piece(&self, text: &str) -> Result<AudioSegment> {
        let request = CreateSpeechRequestArgs::default()
            .input(text)
            .model(self.model.clone())
            .voice(self.voice.clone())
            .response_format(SpeechResponseFormat::Pcm)
            .build()
            .map_err(|e| {
                PdfcastError::RemoteService(format!("Failed to build speech request: {}", e))
            })?;

        let response = self.client.audio().speech(request).await.map_err(|e| {
            PdfcastError::RemoteService(format!("Speech API error: {}", e))
        })?;

        AudioSegment::from_pcm16le(&response.bytes, SPEECH_SAMPLE_RATE, 1).map_err(|e| {
            PdfcastError::RemoteService(format!("Malformed speech response: {}", e))
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAISpeech {
    #[instrument(skip(self, text), fields(chars = text.chars().count(), language = %language))]
    async fn synthesize(&self, text: &str, language: &str) -> Result<AudioSegment> {
        let mut audio = AudioSegment::empty();
        for piece in split_for_synthesis(text, MAX_INPUT_CHARS) {
            let segment = self.synthesize_piece(&piece).await?;
            audio.append(&segment);
        }
        debug!("Synthesized {:.1}s of speech", audio.duration_secs());
        Ok(audio)
    }
}

fn parse_model(model: &str) -> SpeechModel {
    match model {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

fn parse_voice(voice: &str) -> Result<Voice> {
    match voice.to_lowercase().as_str() {
        "alloy" => Ok(Voice::Alloy),
        "echo" => Ok(Voice::Echo),
        "fable" => Ok(Voice::Fable),
        "onyx" => Ok(Voice::Onyx),
        "nova" => Ok(Voice::Nova),
        "shimmer" => Ok(Voice::Shimmer),
        other => Err(PdfcastError::Config(format!("Unknown voice: {}", other))),
    }
}
