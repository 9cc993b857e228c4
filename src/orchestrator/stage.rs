//! Submission progress as a forward-only state machine.

use crate::error::{PdfcastError, Result};
use serde::Serialize;
use std::fmt;
use tracing::info;

/// Where a submission is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "question", rename_all = "snake_case")]
pub enum SubmissionStage {
    Idle,
    Extracting,
    Chunking,
    Indexing,
    /// Retrieving context and generating the answer for question `i`.
    Answering(usize),
    /// Voicing question `i` and its answer.
    Synthesizing(usize),
    Combining,
    Persisted,
    Failed,
}

impl SubmissionStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStage::Persisted | SubmissionStage::Failed)
    }

    /// Position in pipeline order. `Failed` sorts after everything.
    fn rank(&self) -> (u8, usize, u8) {
        match *self {
            SubmissionStage::Idle => (0, 0, 0),
            SubmissionStage::Extracting => (1, 0, 0),
            SubmissionStage::Chunking => (2, 0, 0),
            SubmissionStage::Indexing => (3, 0, 0),
            SubmissionStage::Answering(i) => (4, i, 0),
            SubmissionStage::Synthesizing(i) => (4, i, 1),
            SubmissionStage::Combining => (5, 0, 0),
            SubmissionStage::Persisted => (6, 0, 0),
            SubmissionStage::Failed => (7, 0, 0),
        }
    }

    /// Whether moving from `self` to `next` goes strictly forward.
    pub fn can_advance_to(&self, next: SubmissionStage) -> bool {
        !self.is_terminal() && next.rank() > self.rank()
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStage::Idle => write!(f, "idle"),
            SubmissionStage::Extracting => write!(f, "extracting text"),
            SubmissionStage::Chunking => write!(f, "chunking"),
            SubmissionStage::Indexing => write!(f, "indexing"),
            SubmissionStage::Answering(i) => write!(f, "answering question {}", i + 1),
            SubmissionStage::Synthesizing(i) => write!(f, "voicing question {}", i + 1),
            SubmissionStage::Combining => write!(f, "combining audio"),
            SubmissionStage::Persisted => write!(f, "saved"),
            SubmissionStage::Failed => write!(f, "failed"),
        }
    }
}

/// Callback told about every stage a submission enters.
pub type StageObserver<'a> = &'a (dyn Fn(SubmissionStage) + Send + Sync);

/// Records the stages of one submission and rejects backward moves.
pub struct StageTracker<'a> {
    current: SubmissionStage,
    history: Vec<SubmissionStage>,
    observer: Option<StageObserver<'a>>,
}

impl<'a> StageTracker<'a> {
    pub fn new() -> Self {
        Self {
            current: SubmissionStage::Idle,
            history: vec![SubmissionStage::Idle],
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: StageObserver<'a>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn current(&self) -> SubmissionStage {
        self.current
    }

    /// Every stage entered so far, starting with `Idle`.
    pub fn history(&self) -> &[SubmissionStage] {
        &self.history
    }

    pub fn advance(&mut self, next: SubmissionStage) -> Result<()> {
        if !self.current.can_advance_to(next) {
            return Err(PdfcastError::InvalidInput(format!(
                "Illegal stage transition: {} -> {}",
                self.current, next
            )));
        }
        info!("Submission stage: {} -> {}", self.current, next);
        self.enter(next);
        Ok(())
    }

    /// Move to `Failed` unless the submission already finished.
    pub fn fail(&mut self) {
        if !self.current.is_terminal() {
            info!("Submission stage: {} -> {}", self.current, SubmissionStage::Failed);
            self.enter(SubmissionStage::Failed);
        }
    }

    fn enter(&mut self, stage: SubmissionStage) {
        self.current = stage;
        self.history.push(stage);
        if let Some(observer) = self.observer {
            observer(stage);
        }
    }
}

impl Default for StageTracker<'_> {
    fn default() -> Self {
        Self::new()
    }
}
