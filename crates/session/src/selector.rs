//! Source selection: which document pools feed a question.
//!
//! Policy:
//! - only processed uploads participate, in insertion order;
//! - an enabled pool with a missing or empty snapshot contributes nothing
//!   and is not an error;
//! - `has_context == false` is a valid outcome. Blocking submission on it is
//!   the controller's decision.

use docpilot_core::context::UploadSource;
use docpilot_core::directory::DirectorySnapshot;
use docpilot_core::document::Document;

/// Inputs for one selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput<'a> {
    pub documents: &'a [Document],
    pub project: Option<&'a DirectorySnapshot>,
    pub reference: Option<&'a DirectorySnapshot>,
    pub include_project: bool,
    pub include_reference: bool,
}

/// The sources that will be assembled for a turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedSources {
    pub uploads: Vec<UploadSource>,
    pub include_project: bool,
    pub include_reference: bool,
    pub has_context: bool,
}

/// Decides per request which sources participate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceSelector;

impl SourceSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn select(&self, input: SelectionInput<'_>) -> SelectedSources {
        let uploads: Vec<UploadSource> = input
            .documents
            .iter()
            .filter(|d| d.is_processed())
            .map(|d| UploadSource {
                name: d.name.clone(),
                content: d.content.clone(),
            })
            .collect();

        let include_project = input.include_project && pool_has_files(input.project);
        let include_reference = input.include_reference && pool_has_files(input.reference);

        SelectedSources {
            has_context: !uploads.is_empty() || include_project || include_reference,
            uploads,
            include_project,
            include_reference,
        }
    }
}

fn pool_has_files(snapshot: Option<&DirectorySnapshot>) -> bool {
    snapshot.is_some_and(|s| s.file_count > 0)
}
