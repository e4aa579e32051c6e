//! Messages driving the update loop.
//!
//! Every state change enters through one of these. The rendering layer
//! produces them from user gestures; the poll timer and the task runner
//! produce the rest.

use owbc_core::Scope;

use crate::input_key::InputKey;
use crate::state::{AnchorRect, EntryPurpose, View};
use crate::table::SortField;
use crate::templates::TemplateKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Raw key press, translated by the key handler.
    Key(InputKey),
    /// Periodic UI tick (redraw heartbeat, no state change).
    Tick,
    /// Build poll timer fired.
    PollTick,
    Quit,

    SwitchView(View),
    /// Re-fetch the data behind the active view.
    RefreshCurrent,

    SortBy { scope: Scope, field: SortField },

    /// Open a text entry; the update handler seeds the buffer.
    EntryStart(EntryPurpose),
    EntryChar(char),
    EntryBackspace,
    EntryCommit,
    EntryCancel,

    ToggleSelection { scope: Scope, id: String },
    SelectAllVisible(Scope),
    ClearSelection(Scope),
    DeleteSelected(Scope),

    /// Create a fresh list or profile from the endpoint's template.
    CreateFromTemplate(TemplateKind),

    SelectVersion(String),
    SelectTarget(String),
    SelectSubtarget(String),
    SelectPlatform(String),

    /// Queue a build for a profile with the current parameter chain.
    SubmitBuild { profile_id: String },
    CancelBuild(String),
    RebuildBuild(String),

    ShowRequestDetail { build_id: String, anchor: AnchorRect },
    ShowMessageDetail { build_id: String, anchor: AnchorRect },
    ShowBuildLog { build_id: String, anchor: AnchorRect },
    /// Fetch every artifact of a build into the local download folder.
    DownloadArtifacts(String),
    ClosePopover,
    /// Geometry under an open popover changed; anchors are stale.
    ViewportResized,
    ViewScrolled,

    ApplyEndpoint { address: String, api_path: String },

    /// Stage a target-path edit; follows up with the save round-trip.
    EditFileTarget { source_path: String, target_path: String },
    SaveFileTarget { source_path: String },
    DeleteFile { source_path: String },
}
