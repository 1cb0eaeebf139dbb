//! # docpilot-session
//!
//! Everything that happens between a user typing a question and the backend
//! receiving it:
//!
//! - [`selector`] decides which sources participate
//! - [`assembler`] turns them into the wire payload
//! - [`router`] picks a model backend that is actually up
//! - [`cache`] holds the shared health, model and directory snapshots
//! - [`uploads`] validates and uploads files in order
//! - [`controller`] owns the session and its `Idle`/`Submitting` state

pub mod assembler;
pub mod cache;
pub mod controller;
pub mod router;
pub mod selector;
pub mod token;
pub mod uploads;

#[cfg(test)]
mod test_helpers;

pub use assembler::{AssembledContext, AssemblyMetadata, ContextAssembler};
pub use cache::{DirectoryView, SnapshotCache};
pub use controller::{
    ChatSession, PendingTurn, SessionOptions, SessionState, SubmitBlocked, SubmitOutcome,
};
pub use router::ModelRouter;
pub use selector::{SelectedSources, SelectionInput, SourceSelector};
pub use uploads::{UploadFile, UploadPolicy, UploadReport};
