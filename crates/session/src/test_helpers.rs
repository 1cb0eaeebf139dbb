//! Shared test helpers for session tests.

use async_trait::async_trait;
use docpilot_core::backend::{Backend, ChatReply, ChatRequest, UploadReply};
use docpilot_core::directory::{DirectoryPool, DirectorySnapshot, FileEntry};
use docpilot_core::error::BackendError;
use docpilot_core::message::{Citation, Usage};
use docpilot_core::model::{BackendKind, HealthStatus, ModelDescriptor, OverallStatus};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn health(local: bool, cloud: bool, default_backend: BackendKind) -> HealthStatus {
    HealthStatus {
        overall: OverallStatus::Healthy,
        local_available: local,
        cloud_available: cloud,
        default_backend,
        message: None,
    }
}

/// A mock backend with scripted answers.
///
/// Health, models and directories return whatever was last set. Chat
/// replies are queued; once the queue is empty every chat answers with a
/// fixed local reply. Uploads succeed unless the filename was marked as
/// failing.
pub struct ScriptedBackend {
    health: Mutex<Result<HealthStatus, BackendError>>,
    models: Mutex<Result<Vec<ModelDescriptor>, BackendError>>,
    directories: Mutex<HashMap<DirectoryPool, Result<DirectorySnapshot, BackendError>>>,
    refresh_error: Mutex<Option<String>>,
    failing_uploads: Mutex<HashMap<String, String>>,
    chat_replies: Mutex<VecDeque<Result<ChatReply, BackendError>>>,
    chat_requests: Mutex<Vec<ChatRequest>>,
    uploaded: Mutex<Vec<String>>,
    directory_calls: Mutex<usize>,
    reference_gate: Mutex<Option<Arc<FetchGate>>>,
}

/// Holds a directory fetch open until the test releases it.
#[derive(Default)]
pub struct FetchGate {
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        let directories = [
            (DirectoryPool::Project, Ok(Self::snapshot(&["Lastenheft_V2.pdf"]))),
            (DirectoryPool::Reference, Ok(Self::snapshot(&["DIN_EN_61508_V1.0.pdf"]))),
        ]
        .into_iter()
        .collect();

        Self {
            health: Mutex::new(Ok(health(true, true, BackendKind::Local))),
            models: Mutex::new(Ok(vec![
                ModelDescriptor {
                    name: "llama3.2".into(),
                    kind: BackendKind::Local,
                    available: true,
                    size_bytes: Some(2_019_393_189),
                },
                ModelDescriptor {
                    name: "claude-sonnet-4".into(),
                    kind: BackendKind::Cloud,
                    available: true,
                    size_bytes: None,
                },
            ])),
            directories: Mutex::new(directories),
            refresh_error: Mutex::new(None),
            failing_uploads: Mutex::new(HashMap::new()),
            chat_replies: Mutex::new(VecDeque::new()),
            chat_requests: Mutex::new(Vec::new()),
            uploaded: Mutex::new(Vec::new()),
            directory_calls: Mutex::new(0),
            reference_gate: Mutex::new(None),
        }
    }

    pub fn snapshot(paths: &[&str]) -> DirectorySnapshot {
        DirectorySnapshot::new(
            paths.iter().map(|p| FileEntry::classified(*p)).collect(),
            paths.len() as u64 * 1024,
        )
    }

    pub fn set_health(&self, health: Result<HealthStatus, BackendError>) {
        *self.health.lock().unwrap() = health;
    }

    pub fn set_models(&self, models: Result<Vec<ModelDescriptor>, BackendError>) {
        *self.models.lock().unwrap() = models;
    }

    pub fn set_directory(&self, pool: DirectoryPool, result: Result<DirectorySnapshot, BackendError>) {
        self.directories.lock().unwrap().insert(pool, result);
    }

    pub fn fail_refresh(&self, detail: &str) {
        *self.refresh_error.lock().unwrap() = Some(detail.to_string());
    }

    pub fn fail_upload(&self, filename: &str, detail: &str) {
        self.failing_uploads
            .lock()
            .unwrap()
            .insert(filename.to_string(), detail.to_string());
    }

    pub fn push_chat(&self, reply: Result<ChatReply, BackendError>) {
        self.chat_replies.lock().unwrap().push_back(reply);
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.chat_requests.lock().unwrap().clone()
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_requests.lock().unwrap().len()
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn directory_calls(&self) -> usize {
        *self.directory_calls.lock().unwrap()
    }

    /// Block the next reference fetches until `release` is notified.
    pub fn gate_reference(&self) -> Arc<FetchGate> {
        let gate = Arc::new(FetchGate::default());
        *self.reference_gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

pub fn make_reply(text: &str, kind: BackendKind) -> ChatReply {
    ChatReply {
        response: text.to_string(),
        model: match kind {
            BackendKind::Local => "llama3.2".into(),
            BackendKind::Cloud => "claude-sonnet-4".into(),
        },
        llm_type: kind,
        usage: Some(Usage {
            input_tokens: 120,
            output_tokens: 30,
        }),
        citations: vec![Citation {
            filename: "Lastenheft_V2.pdf".into(),
            content: "Abschnitt 3.1".into(),
        }],
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn health(&self) -> Result<HealthStatus, BackendError> {
        self.health.lock().unwrap().clone()
    }

    async fn models(&self) -> Result<Vec<ModelDescriptor>, BackendError> {
        self.models.lock().unwrap().clone()
    }

    async fn directory(&self, pool: DirectoryPool) -> Result<DirectorySnapshot, BackendError> {
        *self.directory_calls.lock().unwrap() += 1;
        if pool == DirectoryPool::Reference {
            let gate = self.reference_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
        }
        self.directories
            .lock()
            .unwrap()
            .get(&pool)
            .cloned()
            .unwrap_or_else(|| Ok(DirectorySnapshot::default()))
    }

    async fn refresh_directories(&self) -> Result<(), BackendError> {
        match self.refresh_error.lock().unwrap().clone() {
            Some(detail) => Err(BackendError::Api {
                status_code: 409,
                detail: Some(detail),
            }),
            None => Ok(()),
        }
    }

    async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<UploadReply, BackendError> {
        self.uploaded.lock().unwrap().push(filename.to_string());
        if let Some(detail) = self.failing_uploads.lock().unwrap().get(filename) {
            return Err(BackendError::Api {
                status_code: 500,
                detail: Some(detail.clone()),
            });
        }
        Ok(UploadReply {
            filename: filename.to_string(),
            content: format!("text of {filename}"),
            size_bytes: bytes.len() as u64,
            processed: true,
        })
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, BackendError> {
        let kind = request.backend;
        self.chat_requests.lock().unwrap().push(request);
        self.chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(make_reply("Antwort", kind)))
    }
}
