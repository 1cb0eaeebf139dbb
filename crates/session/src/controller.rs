//! The chat session: owns per-user state and drives one turn at a time.
//!
//! ```text
//!   Idle ──begin_turn──▶ Submitting ──complete_turn──▶ Idle
//! ```
//!
//! A turn is split in two so callers can see the optimistic user message
//! before the backend answers. [`ChatSession::submit`] runs both halves.
//! Every guard failure leaves the session untouched.

use crate::assembler::{AssemblyMetadata, ContextAssembler};
use crate::cache::SnapshotCache;
use crate::router::ModelRouter;
use crate::selector::{SelectionInput, SourceSelector};
use crate::uploads::{self, UploadFile, UploadPolicy, UploadReport};
use docpilot_config::AppConfig;
use docpilot_core::backend::{Backend, ChatReply, ChatRequest};
use docpilot_core::document::{Document, DocumentId, DocumentList};
use docpilot_core::error::{BackendError, Error};
use docpilot_core::message::{Conversation, ConversationMessage};
use docpilot_core::model::BackendKind;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Prefix of the assistant message recorded for a failed turn.
pub const ERROR_PREFIX: &str = "Error while processing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Submitting,
}

/// Why a turn did not start or could not be completed. None of these change
/// the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitBlocked {
    #[error("Nothing to send")]
    EmptyInput,
    #[error("A question is already being answered")]
    TurnInFlight,
    #[error("No document source selected")]
    NoContext,
    #[error("No model backend is available")]
    NoBackend,
    #[error("No question is being answered")]
    NoTurnInFlight,
}

/// A turn that has passed every guard and is waiting for the backend.
#[derive(Debug)]
pub struct PendingTurn {
    pub request: ChatRequest,
    pub metadata: AssemblyMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Answered,
    /// The turn ran but the backend failed; carries the recorded message.
    Failed(String),
    Blocked(SubmitBlocked),
}

/// Session toggles and policy, usually taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub include_project: bool,
    pub include_reference: bool,
    pub require_context: bool,
    pub preferred_backend: Option<BackendKind>,
    pub mode: String,
    pub upload_policy: UploadPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SessionOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            include_project: config.session.include_project,
            include_reference: config.session.include_reference,
            require_context: config.session.require_context,
            preferred_backend: config.session.preferred_backend,
            mode: config.session.mode.clone(),
            upload_policy: UploadPolicy::from(&config.uploads),
        }
    }
}

/// One user's chat session.
pub struct ChatSession {
    backend: Arc<dyn Backend>,
    cache: Arc<SnapshotCache>,
    documents: DocumentList,
    conversation: Conversation,
    input: String,
    include_project: bool,
    include_reference: bool,
    require_context: bool,
    upload_policy: UploadPolicy,
    selector: SourceSelector,
    assembler: ContextAssembler,
    router: ModelRouter,
    state: SessionState,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn Backend>, cache: Arc<SnapshotCache>, options: SessionOptions) -> Self {
        Self {
            backend,
            cache,
            documents: DocumentList::new(),
            conversation: Conversation::new(),
            input: String::new(),
            include_project: options.include_project,
            include_reference: options.include_reference,
            require_context: options.require_context,
            upload_policy: options.upload_policy,
            selector: SourceSelector::new(),
            assembler: ContextAssembler::new(options.mode),
            router: ModelRouter::new(options.preferred_backend),
            state: SessionState::Idle,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn documents(&self) -> &DocumentList {
        &self.documents
    }

    pub fn include_project(&self) -> bool {
        self.include_project
    }

    pub fn include_reference(&self) -> bool {
        self.include_reference
    }

    pub fn preference(&self) -> Option<BackendKind> {
        self.router.preference()
    }

    pub fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    // ── Plain setters ────────────────────────────────────────────────────

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn set_include_project(&mut self, on: bool) {
        self.include_project = on;
    }

    pub fn set_include_reference(&mut self, on: bool) {
        self.include_reference = on;
    }

    pub fn set_preference(&mut self, kind: BackendKind) {
        self.router.set_preference(kind);
    }

    pub fn remove_document(&mut self, id: &DocumentId) -> Option<Document> {
        self.documents.remove(id)
    }

    /// Clear the conversation. Ignored while a turn is in flight; leaves
    /// documents and directory snapshots alone.
    pub fn clear(&mut self) -> bool {
        if self.state == SessionState::Submitting {
            debug!("Clear ignored while a turn is in flight");
            return false;
        }
        self.conversation.clear();
        true
    }

    // ── Background state ─────────────────────────────────────────────────

    /// Probe health, models and both directories, then let the router adopt
    /// the probe's default backend. Returns every probe failure.
    pub async fn sync(&mut self) -> Vec<Error> {
        let mut errors = Vec::new();
        let backend = self.backend.as_ref();

        if let Err(e) = self.cache.probe_health(backend).await {
            errors.push(e);
        }
        if let Err(e) = self.cache.probe_models(backend).await {
            errors.push(e);
        }
        errors.extend(self.cache.probe_directories(backend).await);

        self.sync_router().await;
        errors
    }

    /// Probe health only.
    pub async fn sync_health(&mut self) -> Result<(), Error> {
        let result = self.cache.probe_health(self.backend.as_ref()).await;
        self.sync_router().await;
        result.map(|_| ())
    }

    async fn sync_router(&mut self) {
        let health = self.cache.health().await;
        self.router.on_health_probe(&health);
    }

    /// Ask the backend to rescan directories and refetch them.
    pub async fn refresh_directories(&self) -> Vec<Error> {
        self.cache.refresh_directories(self.backend.as_ref()).await
    }

    /// Upload files one after another and append one document per file.
    pub async fn upload_batch(&mut self, files: Vec<UploadFile>) -> UploadReport {
        let report = uploads::upload_batch(self.backend.as_ref(), &self.upload_policy, files).await;
        for document in &report.documents {
            self.documents.push(document.clone());
        }
        report
    }

    // ── Turns ────────────────────────────────────────────────────────────

    /// Check every guard and, if they pass, enter `Submitting`.
    ///
    /// On success the user message is already in the conversation and the
    /// input is cleared. The message stays even if the turn later fails.
    pub async fn begin_turn(&mut self) -> Result<PendingTurn, SubmitBlocked> {
        if self.state == SessionState::Submitting {
            return Err(SubmitBlocked::TurnInFlight);
        }

        let text = self.input.trim();
        if text.is_empty() {
            return Err(SubmitBlocked::EmptyInput);
        }

        let health = self.cache.health().await;
        let directories = self.cache.directories().await;
        let selected = self.selector.select(SelectionInput {
            documents: self.documents.as_slice(),
            project: directories.project.as_deref(),
            reference: directories.reference.as_deref(),
            include_project: self.include_project,
            include_reference: self.include_reference,
        });

        if self.require_context && !selected.has_context {
            return Err(SubmitBlocked::NoContext);
        }

        let backend = match self.router.resolve(&health, None) {
            Ok(kind) => kind,
            Err(e) => {
                debug!(error = %e, "Submission blocked");
                return Err(SubmitBlocked::NoBackend);
            }
        };

        let message = text.to_string();
        self.conversation.push(ConversationMessage::user(message.clone()));
        self.input.clear();
        self.state = SessionState::Submitting;

        let assembled = self.assembler.assemble(&selected);
        info!(
            backend = %backend,
            uploads = assembled.metadata.uploads_included,
            project = assembled.payload.include_project,
            reference = assembled.payload.include_reference,
            "Turn started"
        );

        Ok(PendingTurn {
            request: ChatRequest {
                message,
                backend,
                context: assembled.payload,
            },
            metadata: assembled.metadata,
        })
    }

    /// Record the backend's answer (or failure) and return to `Idle`.
    ///
    /// Outside `Submitting` nothing is recorded.
    pub fn complete_turn(
        &mut self,
        _turn: PendingTurn,
        result: Result<ChatReply, BackendError>,
    ) -> SubmitOutcome {
        if self.state != SessionState::Submitting {
            debug!("Completion without a turn in flight dropped");
            return SubmitOutcome::Blocked(SubmitBlocked::NoTurnInFlight);
        }
        self.state = SessionState::Idle;

        match result {
            Ok(reply) => {
                debug!(model = %reply.model, llm_type = %reply.llm_type, "Turn answered");
                self.conversation.push(
                    ConversationMessage::assistant(reply.response)
                        .with_model(reply.model, reply.llm_type)
                        .with_usage(reply.usage)
                        .with_citations(reply.citations),
                );
                SubmitOutcome::Answered
            }
            Err(source) => {
                let err = Error::ChatRequestFailed(source);
                warn!(error = %err, "Turn failed");
                let content = format!("{ERROR_PREFIX}: {}", err.user_message());
                self.conversation.push(ConversationMessage::error(content.clone()));
                SubmitOutcome::Failed(content)
            }
        }
    }

    /// Run a whole turn: guards, backend call, recorded outcome.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let turn = match self.begin_turn().await {
            Ok(turn) => turn,
            Err(blocked) => return SubmitOutcome::Blocked(blocked),
        };
        let result = self.backend.chat(turn.request.clone()).await;
        self.complete_turn(turn, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedBackend, health, make_reply};
    use docpilot_core::directory::DirectoryPool;
    use docpilot_core::document::DocumentStatus;
    use docpilot_core::message::Role;

    async fn session_with(backend: Arc<ScriptedBackend>) -> ChatSession {
        let cache = Arc::new(SnapshotCache::new());
        let mut session = ChatSession::new(backend, cache, SessionOptions::default());
        session.sync().await;
        session
    }

    #[tokio::test]
    async fn successful_turn_appends_user_and_assistant() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with(backend.clone()).await;

        session.set_input("Welche Anforderungen gelten für Kapitel 3?");
        assert_eq!(session.submit().await, SubmitOutcome::Answered);

        let messages = session.conversation().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].model.as_deref(), Some("llama3.2"));
        assert_eq!(messages[1].llm_type, Some(BackendKind::Local));
        assert_eq!(messages[1].usage.map(|u| u.total()), Some(150));
        assert_eq!(messages[1].citations.len(), 1);
        assert!(session.input().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn payload_matches_selected_sources() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with(backend.clone()).await;
        session
            .upload_batch(vec![UploadFile::new("a.txt", b"X".to_vec())])
            .await;
        session.set_include_reference(false);

        session.set_input("Frage");
        session.submit().await;

        let request = &backend.chat_requests()[0];
        assert_eq!(request.message, "Frage");
        assert_eq!(request.context.uploads.len(), 1);
        assert_eq!(request.context.uploads[0].name, "a.txt");
        assert_eq!(request.context.uploads[0].content, "text of a.txt");
        assert!(request.context.include_project);
        assert!(!request.context.include_reference);
        assert_eq!(request.context.max_tokens, 12000);
        assert!(request.context.citation_required);
    }

    #[tokio::test]
    async fn failed_turn_becomes_error_message() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_chat(Err(BackendError::Api {
            status_code: 500,
            detail: Some("Ollama not reachable".into()),
        }));
        let mut session = session_with(backend.clone()).await;

        session.set_input("Frage");
        let outcome = session.submit().await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed("Error while processing: Ollama not reachable".into())
        );

        let messages = session.conversation().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert!(messages[1].is_error);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn second_submit_while_in_flight_is_ignored() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with(backend.clone()).await;

        session.set_input("erste Frage");
        let turn = session.begin_turn().await.unwrap();
        assert_eq!(session.state(), SessionState::Submitting);

        session.set_input("zweite Frage");
        assert_eq!(
            session.begin_turn().await.unwrap_err(),
            SubmitBlocked::TurnInFlight
        );
        assert_eq!(
            session.submit().await,
            SubmitOutcome::Blocked(SubmitBlocked::TurnInFlight)
        );
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(session.input(), "zweite Frage");
        assert!(!session.clear());
        assert_eq!(session.conversation().len(), 1);

        let reply = backend.chat(turn.request.clone()).await;
        session.complete_turn(turn, reply);
        assert_eq!(session.conversation().len(), 2);
        assert_eq!(backend.chat_calls(), 1);
    }

    #[tokio::test]
    async fn completion_without_turn_in_flight_records_nothing() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut asking = session_with(backend.clone()).await;
        let mut idle = session_with(backend.clone()).await;

        asking.set_input("Welche Norm gilt?");
        let turn = asking.begin_turn().await.unwrap();
        let reply = backend.chat(turn.request.clone()).await;

        assert_eq!(
            idle.complete_turn(turn, reply),
            SubmitOutcome::Blocked(SubmitBlocked::NoTurnInFlight)
        );
        assert!(idle.conversation().is_empty());
        assert_eq!(idle.state(), SessionState::Idle);
        assert_eq!(asking.state(), SessionState::Submitting);
    }

    #[tokio::test]
    async fn empty_input_is_a_no_op() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with(backend.clone()).await;

        session.set_input("   \n");
        assert_eq!(
            session.submit().await,
            SubmitOutcome::Blocked(SubmitBlocked::EmptyInput)
        );
        assert!(session.conversation().is_empty());
        assert_eq!(backend.chat_calls(), 0);
    }

    #[tokio::test]
    async fn no_context_blocks_when_required() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with(backend.clone()).await;
        session.set_include_project(false);
        session.set_include_reference(false);

        session.set_input("Frage");
        assert_eq!(
            session.submit().await,
            SubmitOutcome::Blocked(SubmitBlocked::NoContext)
        );
        assert!(session.conversation().is_empty());
        assert_eq!(session.input(), "Frage");
    }

    #[tokio::test]
    async fn no_context_allowed_when_not_required() {
        let backend = Arc::new(ScriptedBackend::new());
        let options = SessionOptions {
            include_project: false,
            include_reference: false,
            require_context: false,
            ..SessionOptions::default()
        };
        let mut session = ChatSession::new(backend.clone(), Arc::new(SnapshotCache::new()), options);
        session.sync().await;

        session.set_input("Frage");
        assert_eq!(session.submit().await, SubmitOutcome::Answered);
        assert!(backend.chat_requests()[0].context.is_empty());
    }

    #[tokio::test]
    async fn cloud_only_health_routes_to_cloud() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_health(Ok(health(false, true, BackendKind::Local)));
        let mut session = session_with(backend.clone()).await;
        assert_eq!(session.preference(), Some(BackendKind::Local));

        session.set_input("Frage");
        session.submit().await;
        assert_eq!(backend.chat_requests()[0].backend, BackendKind::Cloud);
    }

    #[tokio::test]
    async fn unreachable_backend_blocks_without_narration() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.set_health(Err(BackendError::Network("connection refused".into())));
        let mut session = session_with(backend.clone()).await;

        session.set_input("Frage");
        assert_eq!(
            session.submit().await,
            SubmitOutcome::Blocked(SubmitBlocked::NoBackend)
        );
        assert!(session.conversation().is_empty());
        assert_eq!(backend.chat_calls(), 0);
    }

    #[tokio::test]
    async fn clear_is_idempotent_and_keeps_documents() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with(backend.clone()).await;
        session
            .upload_batch(vec![UploadFile::new("a.txt", b"X".to_vec())])
            .await;
        session.set_input("Frage");
        session.submit().await;

        assert!(session.clear());
        assert!(session.conversation().is_empty());
        let updated = session.conversation().updated_at;
        assert!(session.clear());
        assert!(session.conversation().is_empty());
        assert_eq!(session.conversation().updated_at, updated);

        assert_eq!(session.documents().len(), 1);
        assert!(session.cache().directory(DirectoryPool::Project).await.is_some());
    }

    #[tokio::test]
    async fn batch_with_middle_failure_feeds_only_processed_documents() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.fail_upload("b.pdf", "PDF extraction failed");
        let mut session = session_with(backend.clone()).await;

        let report = session
            .upload_batch(vec![
                UploadFile::new("a.txt", b"A".to_vec()),
                UploadFile::new("b.pdf", b"B".to_vec()),
                UploadFile::new("c.txt", b"C".to_vec()),
            ])
            .await;
        assert_eq!(report.failed(), 1);

        let statuses: Vec<_> = session.documents().iter().map(|d| d.status).collect();
        assert_eq!(
            statuses,
            vec![
                DocumentStatus::Processed,
                DocumentStatus::Error,
                DocumentStatus::Processed
            ]
        );

        session.set_input("Frage");
        session.submit().await;
        let names: Vec<_> = backend.chat_requests()[0]
            .context
            .uploads
            .iter()
            .map(|u| u.name.clone())
            .collect();
        assert_eq!(names, vec!["a.txt", "c.txt"]);
    }

    #[tokio::test]
    async fn removed_document_leaves_next_payload() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut session = session_with(backend.clone()).await;
        session
            .upload_batch(vec![
                UploadFile::new("a.txt", b"A".to_vec()),
                UploadFile::new("b.txt", b"B".to_vec()),
            ])
            .await;

        let first = session.documents().as_slice()[0].id.clone();
        assert!(session.remove_document(&first).is_some());
        assert!(session.remove_document(&first).is_none());

        session.set_input("Frage");
        session.submit().await;
        assert_eq!(backend.chat_requests()[0].context.uploads[0].name, "b.txt");
    }

    #[tokio::test]
    async fn preference_change_applies_to_next_turn() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_chat(Ok(make_reply("eins", BackendKind::Local)));
        let mut session = session_with(backend.clone()).await;

        session.set_input("eins");
        session.submit().await;
        session.set_preference(BackendKind::Cloud);
        session.set_input("zwei");
        session.submit().await;

        let kinds: Vec<_> = backend.chat_requests().iter().map(|r| r.backend).collect();
        assert_eq!(kinds, vec![BackendKind::Local, BackendKind::Cloud]);
    }
}
