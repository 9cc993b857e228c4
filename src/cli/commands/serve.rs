//! Serve command: the interactive page over HTTP.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{load_default_questions, parse_questions, Settings};
use crate::orchestrator::Orchestrator;
use crate::web::{router, AppState};
use std::sync::Arc;

/// Run the HTTP server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::warning(&format!("{}", e));
        Output::info("Submissions will fail until this is fixed. Run 'pdfcast doctor' for details.");
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    // Read once per server session
    let questions_path = settings.questions_file();
    let default_questions = load_default_questions(&questions_path)?;

    let orchestrator = Orchestrator::new(settings)?;
    let state = Arc::new(AppState::new(orchestrator, default_questions.clone())?);
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Pdfcast");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    Output::kv(
        "Default questions",
        &format!(
            "{} from {}",
            parse_questions(&default_questions).len(),
            questions_path.display()
        ),
    );
    println!();
    println!("Endpoints:");
    Output::kv("Page", "GET  /");
    Output::kv("Submit", "POST /submit");
    Output::kv("Document", "GET  /documents/{name}");
    Output::kv("Audio", "GET  /audio/{name}");
    Output::kv("Delete", "POST /history/{name}/delete");
    Output::kv("Health", "GET  /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}
