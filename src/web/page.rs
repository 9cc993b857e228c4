//! HTML rendering for the interactive page.

use crate::storage::HistoryEntry;
use std::fmt::Write;
use std::path::PathBuf;
use url::Url;

/// A one-line message shown above the form.
#[derive(Debug, Clone)]
pub enum Notice {
    Success(String),
    Error { kind: String, message: String },
}

/// One answered question as shown on the page.
#[derive(Debug, Clone)]
pub struct AnswerView {
    pub question: String,
    pub answer: String,
    pub clip_url: Option<String>,
}

/// The outcome of the submission just made.
#[derive(Debug, Clone)]
pub struct SubmissionView {
    pub document_name: String,
    pub answers: Vec<AnswerView>,
    pub combined_url: String,
    pub duration_secs: f64,
}

/// Everything the page shows.
#[derive(Debug, Default)]
pub struct PageView<'a> {
    pub questions_text: &'a str,
    pub history: &'a [HistoryEntry],
    pub orphaned_audio: &'a [PathBuf],
    pub submission: Option<SubmissionView>,
    pub notices: Vec<Notice>,
}

const STYLE: &str = "\
body{font-family:sans-serif;margin:0;display:flex;min-height:100vh}\
aside{width:320px;background:#f4f4f6;padding:1rem;border-right:1px solid #ddd}\
main{flex:1;padding:1rem 2rem;max-width:900px}\
textarea{width:100%;font-family:inherit}\
.notice{padding:.5rem 1rem;border-radius:4px;margin-bottom:1rem}\
.success{background:#e6f4ea}.error{background:#fce8e6}\
.entry{border-bottom:1px solid #ddd;padding:.5rem 0}\
.answer{margin-bottom:1.5rem}audio{width:100%}\
.muted{color:#777;font-size:.9em}";

/// Render the complete page.
pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<title>Pdfcast</title>");
    let _ = write!(html, "<style>{}</style></head><body>", STYLE);

    html.push_str(&render_history(view.history, view.orphaned_audio));

    html.push_str("<main><h1>Pdfcast</h1>");
    for notice in &view.notices {
        html.push_str(&render_notice(notice));
    }
    html.push_str(&render_form(view.questions_text));
    if let Some(submission) = &view.submission {
        html.push_str(&render_submission(submission));
    }
    html.push_str("</main></body></html>\n");
    html
}

fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Success(message) => {
            format!("<div class=\"notice success\">{}</div>", escape_html(message))
        }
        Notice::Error { kind, message } => format!(
            "<div class=\"notice error\"><strong>{}</strong>: {}</div>",
            escape_html(kind),
            escape_html(message)
        ),
    }
}

fn render_form(questions_text: &str) -> String {
    format!(
        "<form method=\"post\" action=\"/submit\" enctype=\"multipart/form-data\">\
         <p><label>PDF document<br>\
         <input type=\"file\" name=\"document\" accept=\".pdf,application/pdf\" required></label></p>\
         <p><label>Questions, one per line<br>\
         <textarea name=\"questions\" rows=\"8\">{}</textarea></label></p>\
         <p><button type=\"submit\">Submit</button></p></form>",
        escape_html(questions_text)
    )
}

fn render_submission(submission: &SubmissionView) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<section><h2>{}</h2>",
        escape_html(&submission.document_name)
    );

    for answer in &submission.answers {
        let _ = write!(
            html,
            "<div class=\"answer\"><h3>{}</h3><p>{}</p>",
            escape_html(&answer.question),
            escape_html(&answer.answer)
        );
        if let Some(url) = &answer.clip_url {
            let _ = write!(html, "{}", audio_player(url));
        }
        html.push_str("</div>");
    }

    let _ = write!(
        html,
        "<h2>Combined audio</h2>{}<p class=\"muted\">{} &middot; <a href=\"{}\" download>Download</a></p></section>",
        audio_player(&submission.combined_url),
        format_duration(submission.duration_secs),
        escape_html(&submission.combined_url)
    );
    html
}

fn render_history(history: &[HistoryEntry], orphaned_audio: &[PathBuf]) -> String {
    let mut html = String::from("<aside><h2>History</h2>");

    if history.is_empty() {
        html.push_str("<p class=\"muted\">No documents yet.</p>");
    }

    for entry in history {
        let _ = write!(
            html,
            "<div class=\"entry\"><strong>{}</strong><br>\
             <a href=\"{}\" download>Download document</a>",
            escape_html(&entry.name),
            escape_html(&path_link(&["documents", &entry.name]))
        );
        if let Some(uploaded) = entry.uploaded_at {
            let _ = write!(
                html,
                "<br><span class=\"muted\">{}</span>",
                uploaded.format("%Y-%m-%d %H:%M UTC")
            );
        }

        match entry.audio_name() {
            Some(audio_name) => {
                let url = path_link(&["audio", &audio_name]);
                let _ = write!(
                    html,
                    "{}<a href=\"{}\" download>Download audio</a>",
                    audio_player(&url),
                    escape_html(&url)
                );
            }
            None => html.push_str("<p class=\"muted\">No audio</p>"),
        }

        let _ = write!(
            html,
            "<form method=\"post\" action=\"{}\"><button type=\"submit\">Delete</button></form></div>",
            escape_html(&path_link(&["history", &entry.name, "delete"]))
        );
    }

    if !orphaned_audio.is_empty() {
        html.push_str("<h3>Audio without document</h3><ul>");
        for path in orphaned_audio {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let _ = write!(
                html,
                "<li><a href=\"{}\" download>{}</a></li>",
                escape_html(&path_link(&["audio", &name])),
                escape_html(&name)
            );
        }
        html.push_str("</ul>");
    }

    html.push_str("</aside>");
    html
}

fn audio_player(url: &str) -> String {
    format!(
        "<audio controls preload=\"none\" src=\"{}\"></audio>",
        escape_html(url)
    )
}

/// Absolute path with each segment percent-encoded.
pub fn path_link(segments: &[&str]) -> String {
    let build = || -> Option<String> {
        let mut url = Url::parse("http://localhost/").ok()?;
        url.path_segments_mut().ok()?.clear().extend(segments);
        Some(url.path().to_string())
    };
    build().unwrap_or_else(|| format!("/{}", segments.join("/")))
}

/// Escape text for use in HTML content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_duration(secs: f64) -> String {
    let total = secs.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
