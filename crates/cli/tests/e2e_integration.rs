//! End-to-end tests: session, HTTP client and an in-process service.
//!
//! These exercise the full pipeline from a typed question to the recorded
//! answer, including uploads, directory probes and backend fallback.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use docpilot_client::HttpBackend;
use docpilot_core::document::DocumentStatus;
use docpilot_core::message::Role;
use docpilot_core::model::BackendKind;
use docpilot_session::{
    ChatSession, SessionOptions, SnapshotCache, SubmitBlocked, SubmitOutcome, UploadFile,
};
use serde_json::{Value, json};

// ── Fake service ─────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Service {
    local_up: bool,
    chats: Arc<Mutex<Vec<Value>>>,
}

async fn health(State(service): State<Service>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "ollama_available": service.local_up,
        "claude_available": true,
        "default_llm": "local"
    }))
}

async fn models() -> Json<Value> {
    Json(json!({"models": [{"name": "claude-sonnet-4", "type": "cloud", "available": true}]}))
}

async fn directory(Path(pool): Path<String>) -> Json<Value> {
    let files = if pool == "project" {
        json!([{"path": "Lastenheft_V2.pdf", "size": 1024}, {"path": "Pflichtenheft_X3.docx", "size": 1024}])
    } else {
        json!([])
    };
    let count = files.as_array().map(|a| a.len()).unwrap_or(0);
    Json(json!({"file_count": count, "total_size": count * 1024, "files": files}))
}

async fn upload(body: axum::body::Bytes) -> (StatusCode, Json<Value>) {
    let text = String::from_utf8_lossy(&body);
    if text.contains("filename=\"scan.pdf\"") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "No text layer found"})),
        );
    }
    let name = if text.contains("filename=\"a.txt\"") { "a.txt" } else { "c.md" };
    (
        StatusCode::OK,
        Json(json!({"filename": name, "content": format!("content of {name}"), "size": 5, "status": "processed"})),
    )
}

async fn chat(State(service): State<Service>, Json(body): Json<Value>) -> Json<Value> {
    let llm = if body["use_local"] == true { "local" } else { "cloud" };
    service.chats.lock().unwrap().push(body);
    Json(json!({
        "response": "Kapitel 3 fordert eine Rückverfolgbarkeit.",
        "model": "claude-sonnet-4",
        "llm_type": llm,
        "usage": {"input_tokens": 900, "output_tokens": 60},
        "citations": [{"filename": "Lastenheft_V2.pdf", "content": "3.1"}]
    }))
}

async fn spawn(service: Service) -> HttpBackend {
    let router = Router::new()
        .route("/health", get(health))
        .route("/models", get(models))
        .route("/directories/{pool}", get(directory))
        .route("/upload", post(upload))
        .route("/chat", post(chat))
        .with_state(service);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    HttpBackend::new(format!("http://{addr}"), std::time::Duration::from_secs(5)).unwrap()
}

async fn session(service: &Service) -> ChatSession {
    let backend = spawn(service.clone()).await;
    let mut session = ChatSession::new(
        Arc::new(backend),
        Arc::new(SnapshotCache::new()),
        SessionOptions::default(),
    );
    assert!(session.sync().await.is_empty());
    session
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_turn_with_uploads_and_fallback() {
    let service = Service::default();
    let mut session = session(&service).await;

    let report = session
        .upload_batch(vec![
            UploadFile::new("a.txt", b"alpha".to_vec()),
            UploadFile::new("scan.pdf", b"%PDF-1.7".to_vec()),
            UploadFile::new("c.md", b"gamma".to_vec()),
        ])
        .await;
    let statuses: Vec<_> = report.documents.iter().map(|d| d.status).collect();
    assert_eq!(
        statuses,
        vec![DocumentStatus::Processed, DocumentStatus::Error, DocumentStatus::Processed]
    );
    assert_eq!(report.documents[1].error.as_deref(), Some("No text layer found"));

    session.set_input("Was fordert Kapitel 3?");
    assert_eq!(session.submit().await, SubmitOutcome::Answered);

    let sent = service.chats.lock().unwrap()[0].clone();
    assert_eq!(sent["use_local"], false);
    assert_eq!(sent["include_project"], true);
    assert_eq!(sent["include_reference"], false);
    assert_eq!(sent["context"]["constraints"]["maxTokens"], 12000);
    let documents: Vec<_> = sent["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(documents, vec!["a.txt", "c.md"]);

    let answer = session.conversation().last().unwrap();
    assert_eq!(answer.role, Role::Assistant);
    assert_eq!(answer.llm_type, Some(BackendKind::Cloud));
    assert_eq!(answer.citations[0].filename, "Lastenheft_V2.pdf");
}

#[tokio::test]
async fn no_sources_blocks_before_the_network() {
    let service = Service {
        local_up: true,
        ..Service::default()
    };
    let mut session = session(&service).await;
    session.set_include_project(false);

    session.set_input("Frage ohne Quellen");
    assert_eq!(
        session.submit().await,
        SubmitOutcome::Blocked(SubmitBlocked::NoContext)
    );
    assert!(service.chats.lock().unwrap().is_empty());
    assert!(session.conversation().is_empty());
}
