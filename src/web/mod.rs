//! The interactive page: upload, questions, answers, audio and history.

mod page;

pub use page::{
    escape_html, path_link, render_page, AnswerView, Notice, PageView, SubmissionView,
};

use crate::config::parse_questions;
use crate::error::{ErrorKind, PdfcastError};
use crate::orchestrator::{Orchestrator, SubmissionResult};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::path::{Path as FsPath, PathBuf};
use std::sync::{Arc, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    orchestrator: Orchestrator,
    /// Default questions, read once at startup.
    default_questions: String,
    /// Per-question clips of the latest submission.
    clips_dir: PathBuf,
    /// Held while the clips directory is replaced.
    clips_lock: Mutex<()>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, default_questions: String) -> crate::Result<Self> {
        let clips_dir = orchestrator.settings().temp_dir().join("clips");
        std::fs::create_dir_all(&clips_dir)
            .map_err(|e| PdfcastError::storage("create", &clips_dir, e))?;
        clear_clips(&clips_dir)?;

        Ok(Self {
            orchestrator,
            default_questions,
            clips_dir,
            clips_lock: Mutex::new(()),
        })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.orchestrator.settings().max_upload_bytes();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/submit", post(submit))
        .route("/documents/{name}", get(download_document))
        .route("/audio/{name}", get(download_audio))
        .route("/clips/{name}", get(download_clip))
        .route("/history/{name}/delete", post(delete_entry))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// HTTP status for a failed operation.
pub fn status_for(err: &PdfcastError) -> StatusCode {
    match (err, err.kind()) {
        (PdfcastError::InvalidInput(_), _) => StatusCode::BAD_REQUEST,
        (_, ErrorKind::Format) => StatusCode::UNPROCESSABLE_ENTITY,
        (_, ErrorKind::RemoteService) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_notice(err: &PdfcastError) -> Notice {
    Notice::Error {
        kind: err.kind().to_string(),
        message: err.to_string(),
    }
}

/// Render the page around the current history.
fn page(
    state: &AppState,
    questions_text: &str,
    submission: Option<SubmissionView>,
    mut notices: Vec<Notice>,
) -> Html<String> {
    let storage = state.orchestrator.storage();

    let history = storage.history().unwrap_or_else(|e| {
        notices.push(error_notice(&e));
        Vec::new()
    });
    let orphaned_audio = storage.orphaned_audio().unwrap_or_else(|e| {
        warn!("Failed to list orphaned audio: {}", e);
        Vec::new()
    });

    Html(render_page(&PageView {
        questions_text,
        history: &history,
        orphaned_audio: &orphaned_audio,
        submission,
        notices,
    }))
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    page(&state, &state.default_questions, None, Vec::new())
}

/// Fields of the submission form.
#[derive(Default)]
struct SubmitForm {
    filename: Option<String>,
    document: Option<Bytes>,
    questions: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<SubmitForm, PdfcastError> {
    let mut form = SubmitForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PdfcastError::InvalidInput(format!("Malformed upload: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("document") => {
                form.filename = field.file_name().map(|n| n.to_string());
                form.document = Some(field.bytes().await.map_err(|e| {
                    PdfcastError::InvalidInput(format!("Failed to read upload: {}", e))
                })?);
            }
            Some("questions") => {
                form.questions = Some(field.text().await.map_err(|e| {
                    PdfcastError::InvalidInput(format!("Failed to read questions: {}", e))
                })?);
            }
            _ => {}
        }
    }
    Ok(form)
}

async fn submit(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            let html = page(&state, &state.default_questions, None, vec![error_notice(&e)]);
            return (status_for(&e), html).into_response();
        }
    };

    let questions_text = form
        .questions
        .unwrap_or_else(|| state.default_questions.clone());

    let (filename, bytes) = match (form.filename, form.document) {
        (Some(filename), Some(bytes)) if !filename.is_empty() && !bytes.is_empty() => {
            (filename, bytes)
        }
        _ => {
            let e = PdfcastError::InvalidInput("Choose a PDF document to upload".to_string());
            let html = page(&state, &questions_text, None, vec![error_notice(&e)]);
            return (status_for(&e), html).into_response();
        }
    };

    let questions = parse_questions(&questions_text);
    info!("Submission of {} with {} questions", filename, questions.len());

    match state
        .orchestrator
        .process_upload(&filename, bytes.to_vec(), &questions)
        .await
    {
        Ok(result) => {
            let view = submission_view(&state, &result);
            let notice = Notice::Success(format!(
                "Answered {} questions about {}",
                result.answers.len(),
                result.document.filename
            ));
            page(&state, &questions_text, Some(view), vec![notice]).into_response()
        }
        Err(e) => {
            let html = page(&state, &questions_text, None, vec![error_notice(&e)]);
            (status_for(&e), html).into_response()
        }
    }
}

/// Remove every clip left in the clips directory.
fn clear_clips(dir: &FsPath) -> crate::Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| PdfcastError::storage("list", dir, e))?;

    for entry in entries {
        let path = entry.map_err(|e| PdfcastError::storage("list", dir, e))?.path();
        if path.is_file() {
            std::fs::remove_file(&path).map_err(|e| PdfcastError::storage("remove", &path, e))?;
            debug!("Removed clip {}", path.display());
        }
    }
    Ok(())
}

/// Replace the previous submission's clips and describe the result for the page.
fn submission_view(state: &AppState, result: &SubmissionResult) -> SubmissionView {
    let _guard = state
        .clips_lock
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Err(e) = clear_clips(&state.clips_dir) {
        warn!("Failed to clear previous clips: {}", e);
    }

    let answers = result
        .answers
        .iter()
        .map(|answered| {
            let clip_name = format!("{}.wav", uuid::Uuid::new_v4());
            let clip_url = match answered.audio.export_wav(&state.clips_dir.join(&clip_name)) {
                Ok(()) => Some(path_link(&["clips", &clip_name])),
                Err(e) => {
                    warn!("Failed to write clip for question {}: {}", answered.position + 1, e);
                    None
                }
            };
            AnswerView {
                question: answered.question.clone(),
                answer: answered.answer.clone(),
                clip_url,
            }
        })
        .collect();

    let combined_name = result
        .audio_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    SubmissionView {
        document_name: result.document.filename.clone(),
        answers,
        combined_url: path_link(&["audio", &combined_name]),
        duration_secs: result.duration_secs,
    }
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    let report = state.orchestrator.storage().delete(&name);

    let notices = if report.is_complete() {
        vec![Notice::Success(format!("Deleted {} and its audio", name))]
    } else {
        report.errors().into_iter().map(error_notice).collect()
    };

    page(&state, &state.default_questions, None, notices)
}

async fn download_document(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let path = state.orchestrator.storage().document_path(&name);
    serve_file(path, "application/pdf", &name).await
}

async fn download_audio(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let path = state.orchestrator.storage().audio_file_path(&name);
    serve_file(path, "audio/wav", &name).await
}

async fn download_clip(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Response {
    let path = crate::storage::sanitize_filename(&name).and_then(|clean| {
        if clean == name {
            Ok(state.clips_dir.join(clean))
        } else {
            Err(PdfcastError::InvalidInput(format!(
                "Clip name must not contain a path: {:?}",
                name
            )))
        }
    });
    serve_file(path, "audio/wav", &name).await
}

async fn serve_file(
    path: crate::Result<PathBuf>,
    content_type: &'static str,
    name: &str,
) -> Response {
    let path = match path {
        Ok(path) => path,
        Err(e) => return (status_for(&e), e.to_string()).into_response(),
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{}\"", name.replace('"', "")),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            (StatusCode::NOT_FOUND, format!("Not found: {}", name)).into_response()
        }
        Err(e) => {
            let err = PdfcastError::storage("read", &path, e);
            (status_for(&err), err.to_string()).into_response()
        }
    }
}
