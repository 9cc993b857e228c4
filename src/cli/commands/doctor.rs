//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{load_default_questions, parse_questions, Settings};
use crate::storage::Storage;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Pdfcast Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let sections = [
        ("API Configuration", vec![check_openai_api_key()]),
        ("Directories", check_directories(settings)),
        ("Questions", vec![check_questions_file(&settings.questions_file())]),
        ("Configuration", check_config(settings, config_path)),
    ];

    let mut checks = Vec::new();
    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Pdfcast.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Pdfcast is ready to use.");
    }

    Ok(())
}

/// Check if OpenAI API key is configured.
fn check_openai_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.chars().count() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask_key(&key)))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// First 7 and last 4 characters of a key.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let head: String = chars.iter().take(7).collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Check data directories and what they hold.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let data_dir = settings.data_dir();
    if !data_dir.exists() {
        results.push(CheckResult::warning(
            "Data directory",
            &format!("{} (will be created)", data_dir.display()),
            "Directory will be created on first use",
        ));
        return results;
    }
    results.push(CheckResult::ok("Data directory", &data_dir.display().to_string()));

    match Storage::open(&data_dir).and_then(|storage| {
        let history = storage.history()?;
        let orphans = storage.orphaned_audio()?;
        Ok((history, orphans))
    }) {
        Ok((history, orphans)) => {
            let without_audio = history.iter().filter(|e| e.audio_path.is_none()).count();
            results.push(CheckResult::ok(
                "Documents",
                &format!("{} stored, {} without audio", history.len(), without_audio),
            ));
            if !orphans.is_empty() {
                results.push(CheckResult::warning(
                    "Audio",
                    &format!("{} file(s) without a document", orphans.len()),
                    "Remove them from the audios directory if no longer needed",
                ));
            }
        }
        Err(e) => results.push(CheckResult::error(
            "Storage",
            &e.to_string(),
            "Check permissions on the data directory",
        )),
    }

    results
}

/// Check the default questions file.
fn check_questions_file(path: &Path) -> CheckResult {
    if !path.exists() {
        return CheckResult::warning(
            "Questions file",
            &format!("{} not found", path.display()),
            "Create it with one question per line, or type questions on the page",
        );
    }

    match load_default_questions(path) {
        Ok(text) => {
            let count = parse_questions(&text).len();
            if count == 0 {
                CheckResult::warning(
                    "Questions file",
                    &format!("{} has no questions", path.display()),
                    "Add one question per line",
                )
            } else {
                CheckResult::ok(
                    "Questions file",
                    &format!("{} ({} questions)", path.display(), count),
                )
            }
        }
        Err(e) => CheckResult::error("Questions file", &e.to_string(), "Check file permissions"),
    }
}

/// Check the config file and the values loaded from it.
fn check_config(settings: &Settings, config_path: &Path) -> Vec<CheckResult> {
    let file = if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: pdfcast config edit",
        )
    };

    let values = match settings.validate() {
        Ok(()) => CheckResult::ok(
            "Models",
            &format!(
                "{} / {} / {} ({}, {}x)",
                settings.embedding.model,
                settings.rag.model,
                settings.speech.model,
                settings.speech.voice,
                settings.speech.speed
            ),
        ),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix the value in the config file"),
    };

    vec![file, values]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key_counts_characters() {
        assert_eq!(mask_key("sk-abcdefghijklmnopqrstuvwxyz"), "sk-abcd...wxyz");
        assert_eq!(mask_key("sk-ééééééééééééééééééé"), "sk-éééé...éééé");
        assert_eq!(mask_key("sk-ab🔑cdefghijklmnopq🔑xyz"), "sk-ab🔑c...🔑xyz");
    }

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_questions_file_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("questions.txt");

        assert_eq!(check_questions_file(&path).status, CheckStatus::Warning);

        std::fs::write(&path, "\n  \n").unwrap();
        assert_eq!(check_questions_file(&path).status, CheckStatus::Warning);

        std::fs::write(&path, "What is it?\nWho wrote it?\n").unwrap();
        let result = check_questions_file(&path);
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.message.contains("2 questions"));
    }

    #[test]
    fn test_directories_report_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.general.data_dir = dir.path().to_string_lossy().to_string();

        let storage = Storage::open(dir.path()).unwrap();
        storage.save_document("a.pdf", b"pdf".to_vec()).unwrap();
        std::fs::write(storage.audio_dir().join("gone.wav"), b"x").unwrap();

        let results = check_directories(&settings);
        assert!(results
            .iter()
            .any(|r| r.name == "Documents" && r.message.contains("1 stored, 1 without audio")));
        assert!(results
            .iter()
            .any(|r| r.name == "Audio" && r.status == CheckStatus::Warning));
    }
}
