//! Key press translation.
//!
//! Maps raw keys to messages depending on the current mode: filter
//! entry captures text input, an open popover captures Esc, everything
//! else falls through to the global bindings. Cursor movement mutates
//! the active table directly instead of round-tripping a message.

use owbc_core::Scope;

use crate::input_key::InputKey;
use crate::message::Message;
use crate::state::{AppState, EntryPurpose, View};
use crate::table::SortField;
use crate::templates::TemplateKind;

pub(crate) fn handle_key(state: &mut AppState, key: InputKey) -> Option<Message> {
    if state.entry.is_some() {
        return handle_text_entry(key);
    }

    if state.popover.open.is_some() {
        if key == InputKey::Esc {
            return Some(Message::ClosePopover);
        }
        // Any other key falls through; scrolling keys below will close
        // the popover through ViewScrolled from the table handlers.
    }

    match key {
        InputKey::Char('q') | InputKey::CharCtrl('c') => Some(Message::Quit),

        InputKey::Char('1') => Some(Message::SwitchView(View::Lists)),
        InputKey::Char('2') => Some(Message::SwitchView(View::Profiles)),
        InputKey::Char('3') => Some(Message::SwitchView(View::Builds)),
        InputKey::Char('4') => Some(Message::SwitchView(View::Files)),
        InputKey::Char('5') => Some(Message::SwitchView(View::Settings)),

        InputKey::Char('r') => Some(Message::RefreshCurrent),

        InputKey::Char('/') if filterable(state.view) => {
            Some(Message::EntryStart(EntryPurpose::Filter))
        }

        InputKey::Char('N') if state.view == View::Lists => {
            Some(Message::CreateFromTemplate(TemplateKind::List))
        }
        InputKey::Char('N') if state.view == View::Profiles => {
            Some(Message::CreateFromTemplate(TemplateKind::Profile))
        }
        InputKey::Char('I') if state.view == View::Lists => {
            Some(Message::EntryStart(EntryPurpose::ImportPath))
        }

        InputKey::Char('e') => rename_or_edit_target(state),

        InputKey::Char('u') if state.view == View::Files => {
            Some(Message::EntryStart(EntryPurpose::UploadPath))
        }

        InputKey::Char('n') => sort_message(state.view, SortField::Name),
        InputKey::Char('u') => sort_message(state.view, SortField::Updated),

        InputKey::Up => move_cursor(state, -1),
        InputKey::Down => move_cursor(state, 1),
        InputKey::PageUp => move_cursor(state, -10),
        InputKey::PageDown => move_cursor(state, 10),

        InputKey::Char(' ') => toggle_cursor_row(state),
        InputKey::Char('a') => state.view.scope().map(Message::SelectAllVisible),
        InputKey::Char('c') => state.view.scope().map(Message::ClearSelection),
        // Files have no multi-selection; delete acts on the cursor row.
        InputKey::Char('x') if state.view == View::Files => {
            state.files.rows.get(state.files.cursor).map(|file| {
                Message::DeleteFile {
                    source_path: file.source_path.clone(),
                }
            })
        }
        InputKey::Char('x') => state.view.scope().map(Message::DeleteSelected),

        InputKey::Char('d') if state.view == View::Builds => {
            state.builds.cursor_row().map(|build| Message::ShowRequestDetail {
                build_id: build.build_id.clone(),
                anchor: state.builds.cursor_anchor(),
            })
        }
        InputKey::Char('m') if state.view == View::Builds => {
            state.builds.cursor_row().map(|build| Message::ShowMessageDetail {
                build_id: build.build_id.clone(),
                anchor: state.builds.cursor_anchor(),
            })
        }

        InputKey::Char('l') if state.view == View::Builds => {
            state.builds.cursor_row().map(|build| Message::ShowBuildLog {
                build_id: build.build_id.clone(),
                anchor: state.builds.cursor_anchor(),
            })
        }
        InputKey::Char('D') if state.view == View::Builds => state
            .builds
            .cursor_row()
            .map(|build| Message::DownloadArtifacts(build.build_id.clone())),

        InputKey::Char('k') if state.view == View::Builds => state
            .builds
            .cursor_row()
            .filter(|build| !build.state.is_final())
            .map(|build| Message::CancelBuild(build.build_id.clone())),
        InputKey::Char('b') if state.view == View::Builds => state
            .builds
            .cursor_row()
            .map(|build| Message::RebuildBuild(build.build_id.clone())),

        InputKey::Char('s') if state.view == View::Profiles => state
            .profiles
            .cursor_id()
            .map(|profile_id| Message::SubmitBuild { profile_id }),

        _ => None,
    }
}

fn handle_text_entry(key: InputKey) -> Option<Message> {
    match key {
        InputKey::Char(c) => Some(Message::EntryChar(c)),
        InputKey::Backspace => Some(Message::EntryBackspace),
        InputKey::Enter => Some(Message::EntryCommit),
        InputKey::Esc => Some(Message::EntryCancel),
        _ => None,
    }
}

/// `e` edits the cursor row: the name on the list/profile views, the
/// rootfs target path on the files view.
fn rename_or_edit_target(state: &AppState) -> Option<Message> {
    match state.view {
        View::Lists => state.lists.cursor_id().map(|id| {
            Message::EntryStart(EntryPurpose::Rename {
                scope: Scope::Lists,
                id,
            })
        }),
        View::Profiles => state.profiles.cursor_id().map(|id| {
            Message::EntryStart(EntryPurpose::Rename {
                scope: Scope::Profiles,
                id,
            })
        }),
        View::Files => state.files.rows.get(state.files.cursor).map(|file| {
            Message::EntryStart(EntryPurpose::FileTarget {
                source_path: file.source_path.clone(),
            })
        }),
        View::Builds | View::Settings => None,
    }
}

fn filterable(view: View) -> bool {
    matches!(view, View::Lists | View::Profiles)
}

fn sort_message(view: View, field: SortField) -> Option<Message> {
    match view.scope() {
        Some(scope @ (Scope::Lists | Scope::Profiles)) => Some(Message::SortBy { scope, field }),
        _ => None,
    }
}

/// Moving the cursor scrolls the table, which invalidates any popover
/// anchor; report it as a scroll so the popover closes.
fn move_cursor(state: &mut AppState, delta: isize) -> Option<Message> {
    let had_popover = state.popover.open.is_some();
    match state.view {
        View::Lists => state.lists.move_cursor(delta),
        View::Profiles => state.profiles.move_cursor(delta),
        View::Builds => state.builds.move_cursor(delta),
        View::Files | View::Settings => return None,
    }
    had_popover.then_some(Message::ViewScrolled)
}

fn toggle_cursor_row(state: &mut AppState) -> Option<Message> {
    let (scope, id) = match state.view {
        View::Lists => (Scope::Lists, state.lists.cursor_id()?),
        View::Profiles => (Scope::Profiles, state.profiles.cursor_id()?),
        View::Builds => (
            Scope::Builds,
            state.builds.cursor_row().map(|b| b.build_id.clone())?,
        ),
        View::Files | View::Settings => return None,
    };
    Some(Message::ToggleSelection { scope, id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use owbc_api::EndpointStore;
    use owbc_core::BuildSummary;

    fn new_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(EndpointStore::at(dir.path().join("config.toml")));
        (state, dir)
    }

    #[test]
    fn test_open_entry_captures_text_keys() {
        let (mut state, _dir) = new_state();
        state.entry = Some(crate::state::TextEntry {
            purpose: EntryPurpose::Filter,
            buffer: String::new(),
        });
        assert_eq!(
            handle_key(&mut state, InputKey::Char('q')),
            Some(Message::EntryChar('q'))
        );
        assert_eq!(
            handle_key(&mut state, InputKey::Enter),
            Some(Message::EntryCommit)
        );
        assert_eq!(
            handle_key(&mut state, InputKey::Esc),
            Some(Message::EntryCancel)
        );
    }

    #[test]
    fn test_create_and_import_keys_on_lists_view() {
        let (mut state, _dir) = new_state();
        assert_eq!(
            handle_key(&mut state, InputKey::Char('N')),
            Some(Message::CreateFromTemplate(TemplateKind::List))
        );
        assert_eq!(
            handle_key(&mut state, InputKey::Char('I')),
            Some(Message::EntryStart(EntryPurpose::ImportPath))
        );

        state.view = View::Profiles;
        assert_eq!(
            handle_key(&mut state, InputKey::Char('N')),
            Some(Message::CreateFromTemplate(TemplateKind::Profile))
        );
        assert_eq!(handle_key(&mut state, InputKey::Char('I')), None);

        state.view = View::Builds;
        assert_eq!(handle_key(&mut state, InputKey::Char('N')), None);
    }

    #[test]
    fn test_rename_key_targets_cursor_row() {
        let (mut state, _dir) = new_state();
        state.lists.set_rows(vec![owbc_core::PackageList {
            list_id: "l1".to_string(),
            name: "base".to_string(),
            ..Default::default()
        }]);
        assert_eq!(
            handle_key(&mut state, InputKey::Char('e')),
            Some(Message::EntryStart(EntryPurpose::Rename {
                scope: Scope::Lists,
                id: "l1".to_string(),
            }))
        );

        // No rows, no entry.
        state.view = View::Profiles;
        assert_eq!(handle_key(&mut state, InputKey::Char('e')), None);
    }

    #[test]
    fn test_files_view_keys() {
        let (mut state, _dir) = new_state();
        state.view = View::Files;
        state.files.set_rows(vec![owbc_core::RemoteFile {
            id: "f1".to_string(),
            source_path: "etc/rc.local".to_string(),
            ..Default::default()
        }]);

        assert_eq!(
            handle_key(&mut state, InputKey::Char('u')),
            Some(Message::EntryStart(EntryPurpose::UploadPath))
        );
        assert_eq!(
            handle_key(&mut state, InputKey::Char('e')),
            Some(Message::EntryStart(EntryPurpose::FileTarget {
                source_path: "etc/rc.local".to_string(),
            }))
        );
        assert_eq!(
            handle_key(&mut state, InputKey::Char('x')),
            Some(Message::DeleteFile {
                source_path: "etc/rc.local".to_string(),
            })
        );
    }

    #[test]
    fn test_log_and_artifact_keys_on_builds_view() {
        let (mut state, _dir) = new_state();
        state.view = View::Builds;
        state.builds.set_rows(vec![BuildSummary {
            build_id: "b1".to_string(),
            ..Default::default()
        }]);

        match handle_key(&mut state, InputKey::Char('l')) {
            Some(Message::ShowBuildLog { build_id, .. }) => assert_eq!(build_id, "b1"),
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(
            handle_key(&mut state, InputKey::Char('D')),
            Some(Message::DownloadArtifacts("b1".to_string()))
        );
    }

    #[test]
    fn test_digit_keys_switch_views() {
        let (mut state, _dir) = new_state();
        assert_eq!(
            handle_key(&mut state, InputKey::Char('3')),
            Some(Message::SwitchView(View::Builds))
        );
        assert_eq!(
            handle_key(&mut state, InputKey::Char('5')),
            Some(Message::SwitchView(View::Settings))
        );
    }

    #[test]
    fn test_sort_keys_only_on_sortable_views() {
        let (mut state, _dir) = new_state();
        assert_eq!(
            handle_key(&mut state, InputKey::Char('n')),
            Some(Message::SortBy {
                scope: Scope::Lists,
                field: SortField::Name
            })
        );
        state.view = View::Builds;
        assert_eq!(handle_key(&mut state, InputKey::Char('n')), None);
    }

    #[test]
    fn test_detail_keys_target_cursor_row() {
        let (mut state, _dir) = new_state();
        state.view = View::Builds;
        state.builds.set_rows(vec![BuildSummary {
            build_id: "b1".to_string(),
            ..Default::default()
        }]);

        match handle_key(&mut state, InputKey::Char('d')) {
            Some(Message::ShowRequestDetail { build_id, .. }) => assert_eq!(build_id, "b1"),
            other => panic!("unexpected: {other:?}"),
        }
        match handle_key(&mut state, InputKey::Char('m')) {
            Some(Message::ShowMessageDetail { build_id, .. }) => assert_eq!(build_id, "b1"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_cancel_key_skips_finished_builds() {
        let (mut state, _dir) = new_state();
        state.view = View::Builds;
        state.builds.set_rows(vec![BuildSummary {
            build_id: "b1".to_string(),
            state: owbc_core::BuildState::Done,
            ..Default::default()
        }]);
        assert_eq!(handle_key(&mut state, InputKey::Char('k')), None);
        assert_eq!(
            handle_key(&mut state, InputKey::Char('b')),
            Some(Message::RebuildBuild("b1".to_string()))
        );
    }

    #[test]
    fn test_cursor_movement_reports_scroll_only_with_popover_open() {
        let (mut state, _dir) = new_state();
        state.view = View::Builds;
        state.builds.set_rows(vec![
            BuildSummary {
                build_id: "b1".to_string(),
                ..Default::default()
            },
            BuildSummary {
                build_id: "b2".to_string(),
                ..Default::default()
            },
        ]);

        assert_eq!(handle_key(&mut state, InputKey::Down), None);
        assert_eq!(state.builds.cursor, 1);

        state.popover.show(crate::state::Popover {
            kind: crate::state::PopoverKind::RequestDetail,
            build_id: "b2".to_string(),
            text: String::new(),
            anchor: crate::state::AnchorRect::default(),
        });
        assert_eq!(
            handle_key(&mut state, InputKey::Up),
            Some(Message::ViewScrolled)
        );
    }
}
