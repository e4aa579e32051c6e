//! TEA update function and key handlers.
//!
//! - `update`: message dispatch over [`crate::state::AppState`]
//! - `keys`: translation of raw key presses into messages

pub(crate) mod keys;
pub(crate) mod update;

use owbc_core::Scope;

use crate::message::Message;
use crate::state::AnchorRect;
use crate::templates::TemplateKind;

pub use update::update;

/// Asynchronous work the event loop should perform after an update.
///
/// Tasks run to completion on the loop with exclusive access to the
/// state; none of them overlaps another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    RefreshLists,
    RefreshProfiles,
    RefreshFiles,
    /// Builds view refresh: builds, profiles, versions, then the
    /// parameter chain. `background` suppresses error banners.
    RefreshBuildsView { background: bool },
    /// Re-resolve the parameter chain below the current version.
    ResolveCascade,
    /// Delete the current selection of a scope, one id at a time.
    BulkDelete { scope: Scope },
    /// Create a list or profile from the endpoint's creation template.
    CreateFromTemplate { kind: TemplateKind },
    /// Fetch an entity, rewrite its name, and put it back.
    RenameEntity {
        scope: Scope,
        id: String,
        name: String,
    },
    /// Read a local file and upload it to the backend.
    UploadFile { path: String },
    /// Read a local external package list and import it.
    ImportList { path: String },
    /// Delete one uploaded file by its relative source path.
    DeleteFile { source_path: String },
    /// Queue a build for a profile with the current parameter chain.
    SubmitBuild { profile_id: String },
    CancelBuild { build_id: String },
    RebuildBuild { build_id: String },
    /// Fetch a build's request parameters for the detail popover.
    LoadRequestDetail { build_id: String, anchor: AnchorRect },
    /// Fetch the tail of a build's log for the log popover.
    LoadBuildLog { build_id: String, anchor: AnchorRect },
    /// Download every artifact of a build into the download folder.
    DownloadArtifacts { build_id: String },
    /// Persist a pending target-path edit.
    SaveFileTarget {
        file_id: String,
        source_path: String,
        target_path: String,
    },
    /// Full refresh after an endpoint switch.
    RefreshAll,
}

/// Result of one update step: an optional follow-up message fed back
/// into the loop and an optional task to execute.
#[derive(Debug, Default)]
pub struct UpdateResult {
    pub message: Option<Message>,
    pub task: Option<Task>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(message: Message) -> Self {
        Self {
            message: Some(message),
            ..Self::default()
        }
    }

    pub fn task(task: Task) -> Self {
        Self {
            task: Some(task),
            ..Self::default()
        }
    }
}
