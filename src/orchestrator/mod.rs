//! Pipeline orchestrator for Pdfcast.
//!
//! Coordinates one submission from the uploaded document to the stored
//! combined audio: extract, chunk, index, then answer and voice every
//! question, and finally concatenate the per-question audio.

mod stage;

pub use stage::{StageObserver, StageTracker, SubmissionStage};

use crate::audio::AudioSegment;
use crate::chunking::{Chunker, ChunkingConfig, CharacterSplitter};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{PdfcastError, Result};
use crate::extraction::extract_text;
use crate::rag::{AnswerGenerator, ContextChunk, OpenAIAnswerer, RagEngine, RagResponse};
use crate::speech::{synthesize_pair, OpenAISpeech, SpeechSynthesizer};
use crate::storage::{Document, Storage};
use crate::vector_store::{build_index, VectorStore};
use futures::future::FutureExt;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// The main orchestrator for the Pdfcast pipeline.
pub struct Orchestrator {
    settings: Settings,
    storage: Storage,
    chunker: CharacterSplitter,
    embedder: Arc<dyn Embedder>,
    rag: RagEngine,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Orchestrator {
    /// Create an orchestrator backed by the OpenAI services.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let embedder = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        )?);

        let answerer = Arc::new(
            OpenAIAnswerer::new(&settings.rag.model)?
                .with_temperature(settings.rag.temperature)
                .with_prompts(prompts),
        );

        let synthesizer = Arc::new(OpenAISpeech::with_config(
            &settings.speech.model,
            &settings.speech.voice,
        )?);

        Self::with_components(settings, embedder, answerer, synthesizer)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        answerer: Arc<dyn AnswerGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Result<Self> {
        settings.validate()?;

        let storage = Storage::open(&settings.data_dir())?;
        let chunker = CharacterSplitter::new(ChunkingConfig::from(&settings.chunking))?;
        let rag = RagEngine::new(embedder.clone(), answerer, settings.rag.top_k);

        Ok(Self {
            settings,
            storage,
            chunker,
            embedder,
            rag,
            synthesizer,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the document and audio storage.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Store an uploaded document and run the full pipeline on it.
    pub async fn process_upload(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        questions: &[String],
    ) -> Result<SubmissionResult> {
        self.process_upload_observed(filename, bytes, questions, &|_| {})
            .await
    }

    /// Like [`process_upload`](Self::process_upload), reporting each stage to `observer`.
    ///
    /// The document stays stored even if a later stage fails.
    #[instrument(skip(self, bytes, questions, observer), fields(size = bytes.len(), questions = questions.len()))]
    pub async fn process_upload_observed(
        &self,
        filename: &str,
        bytes: Vec<u8>,
        questions: &[String],
        observer: StageObserver<'_>,
    ) -> Result<SubmissionResult> {
        validate_upload(filename, questions)?;

        let document = self.storage.save_document(filename, bytes)?;
        let mut tracker = StageTracker::new().with_observer(observer);

        match self.run(&document, questions, &mut tracker).await {
            Ok((answers, audio, audio_path)) => Ok(SubmissionResult {
                document,
                answers,
                audio_path,
                duration_secs: audio.duration_secs(),
                stages: tracker.history().to_vec(),
            }),
            Err(e) => {
                error!(
                    "Submission of {} failed while {}: {}",
                    document.filename,
                    tracker.current(),
                    e
                );
                tracker.fail();
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        document: &Document,
        questions: &[String],
        tracker: &mut StageTracker<'_>,
    ) -> Result<(Vec<AnsweredQuestion>, AudioSegment, PathBuf)> {
        tracker.advance(SubmissionStage::Extracting)?;
        let text = extract_text(&document.bytes)?;

        tracker.advance(SubmissionStage::Chunking)?;
        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return Err(PdfcastError::Format(format!(
                "{} contains no extractable text",
                document.filename
            )));
        }
        info!("Created {} chunks from {} characters", chunks.len(), text.chars().count());

        tracker.advance(SubmissionStage::Indexing)?;
        let index = build_index(chunks, self.embedder.as_ref()).await?;
        info!("Index ready with {} chunks", index.chunk_count().await?);

        let answers = if self.settings.pipeline.max_concurrent_questions > 1 {
            self.answer_concurrently(&index, questions, tracker).await?
        } else {
            self.answer_sequentially(&index, questions, tracker).await?
        };

        tracker.advance(SubmissionStage::Combining)?;
        let mut combined = AudioSegment::empty();
        for answered in &answers {
            combined.append(&answered.audio);
        }

        let audio_path = self.storage.write_audio(document, &combined)?;
        tracker.advance(SubmissionStage::Persisted)?;

        Ok((answers, combined, audio_path))
    }

    async fn answer_sequentially(
        &self,
        index: &dyn VectorStore,
        questions: &[String],
        tracker: &mut StageTracker<'_>,
    ) -> Result<Vec<AnsweredQuestion>> {
        let mut answers = Vec::with_capacity(questions.len());

        for (position, question) in questions.iter().enumerate() {
            tracker.advance(SubmissionStage::Answering(position))?;
            let response = self.rag.ask(index, question).await?;

            tracker.advance(SubmissionStage::Synthesizing(position))?;
            answers.push(self.voice(position, response).await?);
        }

        Ok(answers)
    }

    /// Questions run with bounded concurrency; results keep question order
    /// and the first failure in that order aborts the submission.
    async fn answer_concurrently(
        &self,
        index: &dyn VectorStore,
        questions: &[String],
        tracker: &mut StageTracker<'_>,
    ) -> Result<Vec<AnsweredQuestion>> {
        let limit = self.settings.pipeline.max_concurrent_questions;
        info!("Answering {} questions, {} at a time", questions.len(), limit);

        tracker.advance(SubmissionStage::Answering(0))?;
        let answers: Vec<AnsweredQuestion> = stream::iter(questions.iter().enumerate())
            .map(|(position, question)| async move {
                let response = self.rag.ask(index, question).await?;
                self.voice(position, response).await
            })
            .buffered(limit)
            .try_collect()
            .boxed()
            .await?;
        tracker.advance(SubmissionStage::Synthesizing(questions.len().saturating_sub(1)))?;

        Ok(answers)
    }

    async fn voice(&self, position: usize, response: RagResponse) -> Result<AnsweredQuestion> {
        let audio = synthesize_pair(
            self.synthesizer.as_ref(),
            &response.question,
            &response.answer,
            &self.settings.speech.language,
            self.settings.speech.speed,
        )
        .await?;

        Ok(AnsweredQuestion {
            position,
            question: response.question,
            answer: response.answer,
            sources: response.sources,
            audio,
        })
    }
}

/// Reject submissions that cannot produce anything before touching storage.
fn validate_upload(filename: &str, questions: &[String]) -> Result<()> {
    let is_pdf = Path::new(filename)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return Err(PdfcastError::InvalidInput(format!(
            "Only PDF documents are accepted, got {:?}",
            filename
        )));
    }
    if questions.is_empty() {
        return Err(PdfcastError::InvalidInput(
            "At least one question is required".to_string(),
        ));
    }
    Ok(())
}

/// One question with its answer and voiced audio.
#[derive(Debug, Clone)]
pub struct AnsweredQuestion {
    /// Zero-based position in the question list.
    pub position: usize,
    pub question: String,
    pub answer: String,
    /// Chunks the answer was generated from.
    pub sources: Vec<ContextChunk>,
    /// Question followed by answer, speed adjusted.
    pub audio: AudioSegment,
}

/// Result of a completed submission.
#[derive(Debug)]
pub struct SubmissionResult {
    /// The stored document.
    pub document: Document,
    /// Answers in question order.
    pub answers: Vec<AnsweredQuestion>,
    /// Where the combined audio was written.
    pub audio_path: PathBuf,
    /// Length of the combined audio.
    pub duration_secs: f64,
    /// Stages the submission went through.
    pub stages: Vec<SubmissionStage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::extraction::tests::build_pdf;
    use crate::testing::{
        EchoAnswerer, FailingAnswerer, FailingSynthesizer, KeywordEmbedder, SilenceSynthesizer,
    };
    use std::sync::Mutex;

    fn settings(data_dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = data_dir.to_string_lossy().to_string();
        settings
    }

    fn orchestrator(
        settings: Settings,
        answerer: Arc<dyn AnswerGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Orchestrator {
        Orchestrator::with_components(
            settings,
            Arc::new(KeywordEmbedder::default()),
            answerer,
            synthesizer,
        )
        .unwrap()
    }

    fn questions(list: &[&str]) -> Vec<String> {
        list.iter().map(|q| q.to_string()).collect()
    }

    #[tokio::test]
    async fn test_end_to_end_answers_from_document() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            settings(dir.path()),
            Arc::new(EchoAnswerer),
            Arc::new(SilenceSynthesizer::default()),
        );
        let pdf = build_pdf(&["Bananas are yellow.", "the capital of France is Paris"]);

        let result = orchestrator
            .process_upload("geo.pdf", pdf, &questions(&["What is the capital of France?"]))
            .await
            .unwrap();

        assert_eq!(result.answers.len(), 1);
        assert!(result.answers[0].answer.contains("Paris"));
        assert!(result.answers[0].sources[0].content.contains("Paris"));

        assert!(result.audio_path.ends_with("audios/geo.pdf.wav"));
        let stored = std::fs::read(&result.audio_path).unwrap();
        assert!(!stored.is_empty());
        let decoded = AudioSegment::from_wav_bytes(&stored).unwrap();
        assert!(decoded.duration_secs() > 0.0);
        assert!((decoded.duration_secs() - result.duration_secs).abs() < 0.001);

        let history = orchestrator.storage().history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].audio_name().as_deref(), Some("geo.pdf.wav"));
    }

    #[tokio::test]
    async fn test_combined_audio_is_sum_of_pairs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let synth = Arc::new(SilenceSynthesizer::default());
        let orchestrator = orchestrator(settings(dir.path()), Arc::new(EchoAnswerer), synth.clone());
        let pdf = build_pdf(&["Rust is a systems language.\nCargo builds Rust code."]);

        let result = orchestrator
            .process_upload("rust.pdf", pdf, &questions(&["What is Rust?", "What builds code?"]))
            .await
            .unwrap();

        let total: f64 = result.answers.iter().map(|a| a.audio.duration_secs()).sum();
        assert!((result.duration_secs - total).abs() < 0.001);

        let calls = synth.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], "What is Rust?");
        assert_eq!(calls[2], "What builds code?");
        assert_eq!(result.answers[1].position, 1);
    }

    #[tokio::test]
    async fn test_stages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            settings(dir.path()),
            Arc::new(EchoAnswerer),
            Arc::new(SilenceSynthesizer::default()),
        );
        let seen = Mutex::new(Vec::new());
        let observer = |stage: SubmissionStage| seen.lock().unwrap().push(stage);

        let result = orchestrator
            .process_upload_observed(
                "doc.pdf",
                build_pdf(&["Some text here."]),
                &questions(&["First?", "Second?"]),
                &observer,
            )
            .await
            .unwrap();

        let expected = vec![
            SubmissionStage::Extracting,
            SubmissionStage::Chunking,
            SubmissionStage::Indexing,
            SubmissionStage::Answering(0),
            SubmissionStage::Synthesizing(0),
            SubmissionStage::Answering(1),
            SubmissionStage::Synthesizing(1),
            SubmissionStage::Combining,
            SubmissionStage::Persisted,
        ];
        assert_eq!(seen.into_inner().unwrap(), expected);
        assert_eq!(result.stages[0], SubmissionStage::Idle);
        assert_eq!(&result.stages[1..], expected.as_slice());
    }

    #[tokio::test]
    async fn test_concurrent_questions_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.pipeline.max_concurrent_questions = 3;
        let orchestrator = orchestrator(
            settings,
            Arc::new(EchoAnswerer),
            Arc::new(SilenceSynthesizer::default()),
        );
        let asked = questions(&["Who?", "What?", "Where?", "When?"]);

        let result = orchestrator
            .process_upload("doc.pdf", build_pdf(&["Facts about things."]), &asked)
            .await
            .unwrap();

        let answered: Vec<_> = result.answers.iter().map(|a| a.question.clone()).collect();
        assert_eq!(answered, asked);
        assert_eq!(*result.stages.last().unwrap(), SubmissionStage::Persisted);
    }

    #[tokio::test]
    async fn test_remote_failure_aborts_but_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            settings(dir.path()),
            Arc::new(FailingAnswerer),
            Arc::new(SilenceSynthesizer::default()),
        );
        let seen = Mutex::new(Vec::new());
        let observer = |stage: SubmissionStage| seen.lock().unwrap().push(stage);

        let err = orchestrator
            .process_upload_observed(
                "doc.pdf",
                build_pdf(&["Some text."]),
                &questions(&["Anything?"]),
                &observer,
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RemoteService);
        assert_eq!(seen.into_inner().unwrap().last(), Some(&SubmissionStage::Failed));

        let history = orchestrator.storage().history().unwrap();
        assert_eq!(history.len(), 1);
        assert!(history[0].audio_path.is_none());
    }

    #[tokio::test]
    async fn test_synthesis_failure_writes_no_audio() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            settings(dir.path()),
            Arc::new(EchoAnswerer),
            Arc::new(FailingSynthesizer),
        );

        let err = orchestrator
            .process_upload("doc.pdf", build_pdf(&["Some text."]), &questions(&["Q?"]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RemoteService);
        assert!(!orchestrator.storage().audio_dir().join("doc.pdf.wav").exists());
    }

    #[tokio::test]
    async fn test_malformed_document_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            settings(dir.path()),
            Arc::new(EchoAnswerer),
            Arc::new(SilenceSynthesizer::default()),
        );

        let err = orchestrator
            .process_upload("broken.pdf", b"not a pdf".to_vec(), &questions(&["Q?"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        let err = orchestrator
            .process_upload("blank.pdf", build_pdf(&[""]), &questions(&["Q?"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[tokio::test]
    async fn test_rejected_before_storing() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator(
            settings(dir.path()),
            Arc::new(EchoAnswerer),
            Arc::new(SilenceSynthesizer::default()),
        );

        let no_questions = orchestrator
            .process_upload("doc.pdf", build_pdf(&["text"]), &[])
            .await;
        assert!(matches!(no_questions, Err(PdfcastError::InvalidInput(_))));

        let not_pdf = orchestrator
            .process_upload("notes.txt", b"text".to_vec(), &questions(&["Q?"]))
            .await;
        assert!(matches!(not_pdf, Err(PdfcastError::InvalidInput(_))));

        assert!(orchestrator.storage().history().unwrap().is_empty());
    }

    #[test]
    fn test_validate_upload_extension_case() {
        assert!(validate_upload("REPORT.PDF", &questions(&["Q?"])).is_ok());
        assert!(validate_upload("report", &questions(&["Q?"])).is_err());
    }
}
