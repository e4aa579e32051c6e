//! Application state (Model in TEA pattern)
//!
//! One state store owning a record per scope, constructed at startup
//! and passed explicitly to every operation. The rendering layer reads
//! it; mutation happens only through the update handler and task runner
//! (single logical thread, no locking).

use std::collections::{HashMap, HashSet};

use owbc_api::{ActiveEndpoint, EndpointStore};
use owbc_core::{BuildProfile, BuildSummary, PackageList, RemoteFile, Scope};

use crate::cascade::CascadeState;
use crate::table::EntityTable;
use crate::templates::TemplateCache;

// ─────────────────────────────────────────────────────────────────────────────
// Text entry
// ─────────────────────────────────────────────────────────────────────────────

/// What a committed line of text entry means. The key handler opens an
/// entry with a purpose; the update handler routes the committed buffer
/// accordingly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPurpose {
    /// Filter text for the active table.
    Filter,
    /// New name for an existing list or profile.
    Rename { scope: Scope, id: String },
    /// Local path of a file to upload.
    UploadPath,
    /// Local path of an external package list to import.
    ImportPath,
    /// Rootfs target path for an uploaded file.
    FileTarget { source_path: String },
}

impl EntryPurpose {
    /// Short prompt label for the status line.
    pub fn label(&self) -> &'static str {
        match self {
            EntryPurpose::Filter => "filter",
            EntryPurpose::Rename { .. } => "rename",
            EntryPurpose::UploadPath => "upload",
            EntryPurpose::ImportPath => "import",
            EntryPurpose::FileTarget { .. } => "target",
        }
    }
}

/// One in-progress line of text input. At most one is open at a time;
/// while open it captures all printable keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEntry {
    pub purpose: EntryPurpose,
    pub buffer: String,
}

/// Current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Lists,
    Profiles,
    Builds,
    Files,
    Settings,
}

impl View {
    /// The entity scope this view manages, if any.
    pub fn scope(&self) -> Option<Scope> {
        match self {
            View::Lists => Some(Scope::Lists),
            View::Profiles => Some(Scope::Profiles),
            View::Builds => Some(Scope::Builds),
            View::Files | View::Settings => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Lists => "Package Lists",
            View::Profiles => "Profiles",
            View::Builds => "Builds",
            View::Files => "Files",
            View::Settings => "Settings",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detail popovers
// ─────────────────────────────────────────────────────────────────────────────

/// Screen rectangle of the element a popover anchors to, in terminal
/// cell coordinates. Kept free of UI-toolkit types so the engine stays
/// renderer-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnchorRect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopoverKind {
    /// The build's request parameters, pretty-printed.
    RequestDetail,
    /// The build's log/status message text.
    MessageDetail,
    /// The tail of the build log, fetched on demand.
    BuildLog,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popover {
    pub kind: PopoverKind,
    pub build_id: String,
    pub text: String,
    pub anchor: AnchorRect,
}

/// At most one popover is visible at a time; showing one replaces (and
/// therefore closes) the other.
#[derive(Debug, Clone, Default)]
pub struct PopoverState {
    pub open: Option<Popover>,
}

impl PopoverState {
    pub fn show(&mut self, popover: Popover) {
        self.open = Some(popover);
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn is_open(&self, kind: PopoverKind) -> bool {
        self.open.as_ref().map(|p| p.kind) == Some(kind)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builds pane
// ─────────────────────────────────────────────────────────────────────────────

/// Build table state. Builds have no sort or filter, only selection
/// over the full cached row set.
#[derive(Debug, Clone, Default)]
pub struct BuildsPane {
    pub rows: Vec<BuildSummary>,
    pub selection: HashSet<String>,
    pub cursor: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
    /// Screen area of the table body, recorded by the renderer each
    /// frame so detail popovers can anchor to the cursor row.
    pub table_area: AnchorRect,
    /// Index of the first row currently scrolled into the table body.
    pub scroll_offset: usize,
}

impl BuildsPane {
    /// Replace the cache wholesale, pruning the selection to surviving
    /// build ids.
    pub fn set_rows(&mut self, rows: Vec<BuildSummary>) {
        self.rows = rows;
        let present: HashSet<&str> = self.rows.iter().map(|b| b.build_id.as_str()).collect();
        self.selection.retain(|id| present.contains(id.as_str()));
        if self.cursor >= self.rows.len() {
            self.cursor = self.rows.len().saturating_sub(1);
        }
    }

    pub fn toggle_selection(&mut self, id: &str) {
        if !self.selection.remove(id) {
            self.selection.insert(id.to_string());
        }
    }

    pub fn select_all(&mut self) {
        for build in &self.rows {
            self.selection.insert(build.build_id.clone());
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn cursor_row(&self) -> Option<&BuildSummary> {
        self.rows.get(self.cursor)
    }

    pub fn move_cursor(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, self.rows.len() as isize - 1) as usize;
    }

    /// Slide the scroll window the minimal distance needed to keep the
    /// cursor inside `visible_rows` rows. Called by the renderer each
    /// frame with the table body height, before the rows are drawn.
    pub fn sync_scroll(&mut self, visible_rows: usize) {
        if visible_rows == 0 || self.rows.is_empty() {
            self.scroll_offset = 0;
            return;
        }
        let max_offset = self.rows.len().saturating_sub(visible_rows);
        self.scroll_offset = self.scroll_offset.min(max_offset);
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        } else if self.cursor >= self.scroll_offset + visible_rows {
            self.scroll_offset = self.cursor + 1 - visible_rows;
        }
    }

    /// Screen rectangle of the cursor row, derived from the area the
    /// renderer recorded on the last frame.
    pub fn cursor_anchor(&self) -> AnchorRect {
        let line = self.cursor.saturating_sub(self.scroll_offset) as u16;
        AnchorRect {
            x: self.table_area.x,
            y: self.table_area.y.saturating_add(line),
            width: self.table_area.width,
            height: 1,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Files pane
// ─────────────────────────────────────────────────────────────────────────────

/// Uploaded files plus pending target-path edits.
///
/// Drafts are keyed by source path and survive refreshes only while
/// their row is still present; a draft is cleared once its save
/// round-trip succeeds.
#[derive(Debug, Clone, Default)]
pub struct FilesPane {
    pub rows: Vec<RemoteFile>,
    pub drafts: HashMap<String, String>,
    pub cursor: usize,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl FilesPane {
    pub fn set_rows(&mut self, rows: Vec<RemoteFile>) {
        self.rows = rows;
        let present: HashSet<&str> = self.rows.iter().map(|f| f.source_path.as_str()).collect();
        self.drafts.retain(|source, _| present.contains(source.as_str()));
        if self.cursor >= self.rows.len() {
            self.cursor = self.rows.len().saturating_sub(1);
        }
    }

    pub fn set_draft(&mut self, source_path: &str, target_path: &str) {
        self.drafts
            .insert(source_path.to_string(), target_path.to_string());
    }

    pub fn draft(&self, source_path: &str) -> Option<&str> {
        self.drafts.get(source_path).map(String::as_str)
    }

    pub fn clear_draft(&mut self, source_path: &str) {
        self.drafts.remove(source_path);
    }

    pub fn row_by_source(&self, source_path: &str) -> Option<&RemoteFile> {
        self.rows.iter().find(|f| f.source_path == source_path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings pane
// ─────────────────────────────────────────────────────────────────────────────

/// Edit buffers for the endpoint form.
#[derive(Debug, Clone, Default)]
pub struct SettingsPane {
    pub address_entry: String,
    pub api_path_entry: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Root state
// ─────────────────────────────────────────────────────────────────────────────

pub struct AppState {
    pub view: View,
    pub running: bool,

    pub endpoint: ActiveEndpoint,
    pub store: EndpointStore,

    pub lists: EntityTable<PackageList>,
    pub profiles: EntityTable<BuildProfile>,
    pub builds: BuildsPane,
    pub files: FilesPane,
    pub settings: SettingsPane,

    pub cascade: CascadeState,
    pub templates: TemplateCache,
    pub popover: PopoverState,

    /// Open line of text input, if any; routed by purpose on commit.
    pub entry: Option<TextEntry>,
}

impl AppState {
    pub fn new(store: EndpointStore) -> Self {
        let endpoint = ActiveEndpoint::new(store.load());
        let mut settings = SettingsPane::default();
        settings.address_entry = endpoint.config().address.clone();
        settings.api_path_entry = endpoint.config().api_path.clone();
        Self {
            view: View::default(),
            running: true,
            endpoint,
            store,
            lists: EntityTable::new(),
            profiles: EntityTable::new(),
            builds: BuildsPane::default(),
            files: FilesPane::default(),
            settings,
            cascade: CascadeState::default(),
            templates: TemplateCache::new(),
            popover: PopoverState::default(),
            entry: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn popover(kind: PopoverKind, build_id: &str) -> Popover {
        Popover {
            kind,
            build_id: build_id.to_string(),
            text: String::new(),
            anchor: AnchorRect::default(),
        }
    }

    #[test]
    fn test_opening_one_popover_closes_the_other() {
        let mut state = PopoverState::default();
        state.show(popover(PopoverKind::RequestDetail, "b1"));
        assert!(state.is_open(PopoverKind::RequestDetail));

        state.show(popover(PopoverKind::MessageDetail, "b1"));
        assert!(state.is_open(PopoverKind::MessageDetail));
        assert!(!state.is_open(PopoverKind::RequestDetail));

        state.close();
        assert!(state.open.is_none());
    }

    #[test]
    fn test_builds_selection_pruned_on_refresh() {
        let mut pane = BuildsPane::default();
        pane.set_rows(vec![
            BuildSummary {
                build_id: "b1".to_string(),
                ..Default::default()
            },
            BuildSummary {
                build_id: "b2".to_string(),
                ..Default::default()
            },
        ]);
        pane.toggle_selection("b1");
        pane.toggle_selection("b2");

        pane.set_rows(vec![BuildSummary {
            build_id: "b2".to_string(),
            ..Default::default()
        }]);
        assert_eq!(pane.selection.len(), 1);
        assert!(pane.selection.contains("b2"));
    }

    #[test]
    fn test_sync_scroll_keeps_cursor_in_window() {
        let mut pane = BuildsPane::default();
        pane.set_rows(
            (0..30)
                .map(|i| BuildSummary {
                    build_id: format!("b{i}"),
                    ..Default::default()
                })
                .collect(),
        );

        pane.cursor = 5;
        pane.sync_scroll(10);
        assert_eq!(pane.scroll_offset, 0);

        pane.cursor = 15;
        pane.sync_scroll(10);
        assert_eq!(pane.scroll_offset, 6);

        pane.cursor = 2;
        pane.sync_scroll(10);
        assert_eq!(pane.scroll_offset, 2);
    }

    #[test]
    fn test_cursor_anchor_tracks_scrolled_line() {
        let mut pane = BuildsPane::default();
        pane.set_rows(
            (0..30)
                .map(|i| BuildSummary {
                    build_id: format!("b{i}"),
                    ..Default::default()
                })
                .collect(),
        );
        pane.table_area = AnchorRect {
            x: 1,
            y: 5,
            width: 40,
            height: 10,
        };
        pane.cursor = 29;
        pane.sync_scroll(10);

        // Cursor on the last visible line of the body, not off-screen.
        let anchor = pane.cursor_anchor();
        assert_eq!(anchor.y, 5 + 9);
        assert_eq!(anchor.height, 1);
    }

    #[test]
    fn test_sync_scroll_clamps_after_rows_shrink() {
        let mut pane = BuildsPane::default();
        pane.set_rows(
            (0..30)
                .map(|i| BuildSummary {
                    build_id: format!("b{i}"),
                    ..Default::default()
                })
                .collect(),
        );
        pane.cursor = 29;
        pane.sync_scroll(10);
        assert_eq!(pane.scroll_offset, 20);

        pane.set_rows(
            (0..5)
                .map(|i| BuildSummary {
                    build_id: format!("b{i}"),
                    ..Default::default()
                })
                .collect(),
        );
        pane.sync_scroll(10);
        assert_eq!(pane.scroll_offset, 0);
    }

    #[test]
    fn test_file_drafts_follow_rows() {
        let mut pane = FilesPane::default();
        pane.set_rows(vec![RemoteFile {
            id: "f1".to_string(),
            source_path: "etc/rc.local".to_string(),
            ..Default::default()
        }]);
        pane.set_draft("etc/rc.local", "/etc/rc.local");
        assert_eq!(pane.draft("etc/rc.local"), Some("/etc/rc.local"));

        // Row disappears -> its draft goes with it.
        pane.set_rows(Vec::new());
        assert!(pane.drafts.is_empty());
    }

    #[test]
    fn test_new_state_seeds_settings_from_stored_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = EndpointStore::at(dir.path().join("config.toml"));
        store.save(&owbc_api::EndpointConfig::new("http://h", "api/v1"));
        let state = AppState::new(store);
        assert_eq!(state.settings.address_entry, "http://h");
        assert_eq!(state.settings.api_path_entry, "api/v1");
        assert!(state.running);
        assert_eq!(state.view, View::Lists);
    }
}
