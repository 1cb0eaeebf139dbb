//! Wire formats of the backend's REST API and their mapping onto core types.

use docpilot_core::backend::{ChatReply, ChatRequest, UploadReply};
use docpilot_core::directory::{DirectorySnapshot, FileEntry};
use docpilot_core::message::{Citation, Usage};
use docpilot_core::model::{BackendKind, HealthStatus, ModelDescriptor, OverallStatus};
use docpilot_core::version::{VersionClassifier, VersionInfo, VersionType};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ── Health ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ApiHealth {
    #[serde(default)]
    status: String,
    #[serde(default, alias = "local_available")]
    ollama_available: bool,
    #[serde(default, alias = "cloud_available")]
    claude_available: bool,
    #[serde(default)]
    default_llm: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl From<ApiHealth> for HealthStatus {
    fn from(api: ApiHealth) -> Self {
        let overall = if api.status.eq_ignore_ascii_case("healthy") {
            OverallStatus::Healthy
        } else {
            OverallStatus::Error
        };
        let default_backend = api
            .default_llm
            .as_deref()
            .and_then(|s| s.parse::<BackendKind>().ok())
            .unwrap_or(BackendKind::Local);

        HealthStatus {
            overall,
            local_available: api.ollama_available,
            cloud_available: api.claude_available,
            default_backend,
            message: api.message,
        }
    }
}

// ── Models ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ApiModelList {
    #[serde(default)]
    models: Vec<ApiModel>,
}

#[derive(Debug, Deserialize)]
struct ApiModel {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    available: bool,
    #[serde(default)]
    size: Option<u64>,
}

impl ApiModelList {
    /// Models of an unknown type are skipped.
    pub(crate) fn into_descriptors(self) -> Vec<ModelDescriptor> {
        self.models
            .into_iter()
            .filter_map(|m| match m.kind.parse::<BackendKind>() {
                Ok(kind) => Some(ModelDescriptor {
                    name: m.name,
                    kind,
                    available: m.available,
                    size_bytes: m.size,
                }),
                Err(reason) => {
                    warn!(model = %m.name, %reason, "Skipping model with unknown type");
                    None
                }
            })
            .collect()
    }
}

// ── Directories ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ApiDirectory {
    #[serde(default)]
    file_count: Option<usize>,
    #[serde(default)]
    total_size: u64,
    #[serde(default)]
    files: Vec<ApiFile>,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    version_type: Option<String>,
    #[serde(default)]
    is_released: Option<bool>,
}

impl ApiFile {
    /// Backend-reported version metadata wins; files it did not tag are
    /// classified from their name.
    fn into_entry(self, classifier: &VersionClassifier) -> FileEntry {
        let path = self.path.or(self.name).unwrap_or_default();

        let info = match self.version {
            Some(version) => {
                let version_type = self.version_type.map(VersionType::from);
                let is_released = self.is_released.unwrap_or_else(|| {
                    version_type.as_ref().is_none_or(VersionType::is_released)
                });
                VersionInfo {
                    version: Some(version),
                    version_type,
                    is_released,
                }
            }
            None => classifier.classify(&path),
        };

        FileEntry::with_version(path, info)
    }
}

impl From<ApiDirectory> for DirectorySnapshot {
    fn from(api: ApiDirectory) -> Self {
        let classifier = VersionClassifier::new();
        let files: Vec<FileEntry> = api
            .files
            .into_iter()
            .map(|f| f.into_entry(&classifier))
            .collect();

        DirectorySnapshot {
            // The backend may list fewer files than it counted.
            file_count: api.file_count.unwrap_or(files.len()),
            total_size_bytes: api.total_size,
            files,
        }
    }
}

// ── Upload ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ApiUpload {
    filename: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    status: String,
}

impl From<ApiUpload> for UploadReply {
    fn from(api: ApiUpload) -> Self {
        UploadReply {
            filename: api.filename,
            content: api.content,
            size_bytes: api.size,
            processed: api.status.eq_ignore_ascii_case("processed"),
        }
    }
}

// ── Chat ──────────────────────────────────────────────────────────────────

/// Body of `POST /chat`.
///
/// The backend reads the flat fields (`documents`, `include_project`,
/// `include_reference`, `use_local`). `context` repeats the sources next to
/// the budget and citation constraints.
#[derive(Debug, Serialize)]
pub(crate) struct ApiChatRequest<'a> {
    message: &'a str,
    documents: Vec<ApiUploadSource<'a>>,
    use_local: bool,
    include_project: bool,
    include_reference: bool,
    llm: BackendKind,
    context: ApiContext<'a>,
}

#[derive(Debug, Serialize)]
struct ApiContext<'a> {
    mode: &'a str,
    sources: ApiSources<'a>,
    constraints: ApiConstraints,
}

#[derive(Debug, Serialize)]
struct ApiSources<'a> {
    uploads: Vec<ApiUploadSource<'a>>,
    project: bool,
    reference: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct ApiUploadSource<'a> {
    name: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiConstraints {
    max_tokens: u32,
    citation_required: bool,
}

impl<'a> From<&'a ChatRequest> for ApiChatRequest<'a> {
    fn from(req: &'a ChatRequest) -> Self {
        let ctx = &req.context;
        let documents: Vec<ApiUploadSource<'a>> = ctx
            .uploads
            .iter()
            .map(|u| ApiUploadSource {
                name: &u.name,
                content: &u.content,
            })
            .collect();

        ApiChatRequest {
            message: &req.message,
            documents: documents.clone(),
            use_local: req.backend == BackendKind::Local,
            include_project: ctx.include_project,
            include_reference: ctx.include_reference,
            llm: req.backend,
            context: ApiContext {
                mode: &ctx.mode,
                sources: ApiSources {
                    uploads: documents,
                    project: ctx.include_project,
                    reference: ctx.include_reference,
                },
                constraints: ApiConstraints {
                    max_tokens: ctx.max_tokens,
                    citation_required: ctx.citation_required,
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiChatResponse {
    response: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    llm_type: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    citations: Vec<Citation>,
}

impl ApiChatResponse {
    /// `requested` stands in when the backend omits `llm_type`.
    pub(crate) fn into_reply(self, requested: BackendKind) -> ChatReply {
        ChatReply {
            response: self.response,
            model: self.model,
            llm_type: self
                .llm_type
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(requested),
            usage: self.usage,
            citations: self.citations,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────

/// Pull the `detail` field out of an error body. FastAPI-style validation
/// errors carry a structured detail; it is rendered as JSON text.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
