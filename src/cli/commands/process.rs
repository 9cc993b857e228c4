//! Process command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{format_duration, Output};
use crate::config::{load_default_questions, parse_questions, Settings};
use crate::orchestrator::{Orchestrator, SubmissionStage};
use anyhow::Result;
use std::path::Path;

/// Run one submission from the command line.
pub async fn run_process(
    pdf: &str,
    questions_file: Option<String>,
    settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Process, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'pdfcast doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let pdf_path = Settings::expand_path(pdf);
    let bytes = std::fs::read(&pdf_path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", pdf_path.display(), e))?;
    let filename = file_name(&pdf_path)?;

    let questions_path = questions_file
        .map(|q| Settings::expand_path(&q))
        .unwrap_or_else(|| settings.questions_file());
    let questions = parse_questions(&load_default_questions(&questions_path)?);
    if questions.is_empty() {
        Output::error(&format!("No questions found in {}", questions_path.display()));
        anyhow::bail!("at least one question is required");
    }

    let orchestrator = Orchestrator::new(settings)?;

    Output::info(&format!(
        "Processing {} with {} question(s)",
        filename,
        questions.len()
    ));
    let spinner = Output::spinner("Starting...");
    let observer =
        |stage: SubmissionStage| spinner.set_message(stage_message(stage, questions.len()));

    let result = orchestrator
        .process_upload_observed(&filename, bytes, &questions, &observer)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            for answered in &result.answers {
                Output::answer(
                    answered.position,
                    &answered.question,
                    &answered.answer,
                    answered.audio.duration_secs(),
                );
                for source in &answered.sources {
                    Output::source(source.order, source.score, &source.content);
                }
            }
            println!();
            Output::success(&format!(
                "Combined audio written to {}",
                result.audio_path.display()
            ));
            Output::kv("Duration", &format_duration(result.duration_secs));
        }
        Err(e) => {
            Output::error(&format!("{}: {}", e.kind(), e));
            return Err(e.into());
        }
    }

    Ok(())
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| anyhow::anyhow!("Not a file: {}", path.display()))
}

fn stage_message(stage: SubmissionStage, total: usize) -> String {
    match stage {
        SubmissionStage::Answering(_) | SubmissionStage::Synthesizing(_) => {
            format!("{} of {}...", capitalize(&stage.to_string()), total)
        }
        other => format!("{}...", capitalize(&other.to_string())),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_message() {
        assert_eq!(
            stage_message(SubmissionStage::Answering(1), 5),
            "Answering question 2 of 5..."
        );
        assert_eq!(stage_message(SubmissionStage::Indexing, 5), "Indexing...");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name(Path::new("/tmp/report.pdf")).unwrap(), "report.pdf");
        assert!(file_name(Path::new("/")).is_err());
    }
}
