//! Main update function: message dispatch over the application state.
//!
//! Pure state transitions happen inline; anything that needs the
//! network comes back as a [`Task`] for the event loop to execute.

use owbc_core::prelude::*;
use owbc_core::Scope;

use crate::handler::{keys, Task, UpdateResult};
use crate::message::Message;
use crate::poller;
use crate::state::{AppState, EntryPurpose, Popover, PopoverKind, TextEntry, View};

pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::Key(key) => match keys::handle_key(state, key) {
            Some(follow_up) => UpdateResult::message(follow_up),
            None => UpdateResult::none(),
        },

        Message::Tick => UpdateResult::none(),

        Message::PollTick => {
            if poller::should_poll(state) {
                UpdateResult::task(Task::RefreshBuildsView { background: true })
            } else {
                UpdateResult::none()
            }
        }

        Message::Quit => {
            state.running = false;
            UpdateResult::none()
        }

        Message::SwitchView(view) => switch_view(state, view),

        Message::RefreshCurrent => match refresh_task(state.view) {
            Some(task) => UpdateResult::task(task),
            None => UpdateResult::none(),
        },

        Message::SortBy { scope, field } => {
            match scope {
                Scope::Lists => state.lists.set_sort(field),
                Scope::Profiles => state.profiles.set_sort(field),
                // Builds come back newest-first from the backend.
                Scope::Builds => {}
            }
            UpdateResult::none()
        }

        Message::EntryStart(purpose) => {
            let buffer = seed_entry(state, &purpose);
            state.entry = Some(TextEntry { purpose, buffer });
            UpdateResult::none()
        }

        Message::EntryChar(c) => {
            if let Some(entry) = state.entry.as_mut() {
                entry.buffer.push(c);
            }
            UpdateResult::none()
        }

        Message::EntryBackspace => {
            if let Some(entry) = state.entry.as_mut() {
                entry.buffer.pop();
            }
            UpdateResult::none()
        }

        Message::EntryCommit => match state.entry.take() {
            Some(entry) => commit_entry(state, entry),
            None => UpdateResult::none(),
        },

        Message::EntryCancel => {
            state.entry = None;
            UpdateResult::none()
        }

        Message::ToggleSelection { scope, id } => {
            match scope {
                Scope::Lists => state.lists.toggle_selection(&id),
                Scope::Profiles => state.profiles.toggle_selection(&id),
                Scope::Builds => state.builds.toggle_selection(&id),
            }
            UpdateResult::none()
        }

        Message::SelectAllVisible(scope) => {
            match scope {
                Scope::Lists => state.lists.select_all_visible(),
                Scope::Profiles => state.profiles.select_all_visible(),
                Scope::Builds => state.builds.select_all(),
            }
            UpdateResult::none()
        }

        Message::ClearSelection(scope) => {
            match scope {
                Scope::Lists => state.lists.deselect_all_visible(),
                Scope::Profiles => state.profiles.deselect_all_visible(),
                Scope::Builds => state.builds.clear_selection(),
            }
            UpdateResult::none()
        }

        Message::DeleteSelected(scope) => UpdateResult::task(Task::BulkDelete { scope }),

        Message::CreateFromTemplate(kind) => UpdateResult::task(Task::CreateFromTemplate { kind }),

        Message::SelectVersion(version) => {
            state.cascade.select_version(&version);
            UpdateResult::task(Task::ResolveCascade)
        }

        Message::SelectTarget(target) => {
            state.cascade.select_target(&target);
            UpdateResult::task(Task::ResolveCascade)
        }

        Message::SelectSubtarget(subtarget) => {
            state.cascade.select_subtarget(&subtarget);
            UpdateResult::task(Task::ResolveCascade)
        }

        // Platform is the bottom of the chain: nothing to re-resolve.
        Message::SelectPlatform(platform) => {
            state.cascade.select_platform(&platform);
            UpdateResult::none()
        }

        Message::SubmitBuild { profile_id } => {
            if state.cascade.is_complete() {
                UpdateResult::task(Task::SubmitBuild { profile_id })
            } else {
                state.profiles.error =
                    Some("Select version, target, subtarget and platform first".to_string());
                UpdateResult::none()
            }
        }

        Message::CancelBuild(build_id) => UpdateResult::task(Task::CancelBuild { build_id }),

        Message::RebuildBuild(build_id) => UpdateResult::task(Task::RebuildBuild { build_id }),

        Message::ShowRequestDetail { build_id, anchor } => {
            UpdateResult::task(Task::LoadRequestDetail { build_id, anchor })
        }

        Message::ShowMessageDetail { build_id, anchor } => {
            let text = state
                .builds
                .rows
                .iter()
                .find(|b| b.build_id == build_id)
                .map(|b| b.message.clone().unwrap_or_default());
            match text {
                Some(text) => {
                    let text = if text.is_empty() {
                        "(no message)".to_string()
                    } else {
                        text
                    };
                    state.popover.show(Popover {
                        kind: PopoverKind::MessageDetail,
                        build_id,
                        text,
                        anchor,
                    });
                }
                None => debug!("message detail requested for unknown build {build_id}"),
            }
            UpdateResult::none()
        }

        Message::ShowBuildLog { build_id, anchor } => {
            UpdateResult::task(Task::LoadBuildLog { build_id, anchor })
        }

        Message::DownloadArtifacts(build_id) => {
            UpdateResult::task(Task::DownloadArtifacts { build_id })
        }

        // Any geometry change under an open popover leaves its anchor
        // stale, so it closes rather than drifting.
        Message::ClosePopover | Message::ViewportResized | Message::ViewScrolled => {
            state.popover.close();
            UpdateResult::none()
        }

        Message::ApplyEndpoint { address, api_path } => {
            state.endpoint.apply(&address, &api_path, &state.store);
            state.settings.address_entry = state.endpoint.config().address.clone();
            state.settings.api_path_entry = state.endpoint.config().api_path.clone();
            state.settings.notice = Some(format!("Endpoint: {}", state.endpoint.base_url()));
            state.settings.error = None;
            UpdateResult::task(Task::RefreshAll)
        }

        // Staging and saving are one gesture in the UI; the draft only
        // outlives this message if the save round-trip fails.
        Message::EditFileTarget {
            source_path,
            target_path,
        } => {
            state.files.set_draft(&source_path, &target_path);
            UpdateResult::message(Message::SaveFileTarget { source_path })
        }

        Message::SaveFileTarget { source_path } => {
            let file_id = state
                .files
                .row_by_source(&source_path)
                .map(|f| f.id.clone());
            let draft = state.files.draft(&source_path).map(str::to_string);
            match (file_id, draft) {
                (Some(file_id), Some(target_path)) => UpdateResult::task(Task::SaveFileTarget {
                    file_id,
                    source_path,
                    target_path,
                }),
                _ => UpdateResult::none(),
            }
        }

        Message::DeleteFile { source_path } => UpdateResult::task(Task::DeleteFile { source_path }),
    }
}

fn switch_view(state: &mut AppState, view: View) -> UpdateResult {
    state.view = view;
    state.popover.close();
    state.entry = None;
    if view == View::Settings {
        state.settings.address_entry = state.endpoint.config().address.clone();
        state.settings.api_path_entry = state.endpoint.config().api_path.clone();
    }
    match refresh_task(view) {
        Some(task) => UpdateResult::task(task),
        None => UpdateResult::none(),
    }
}

fn refresh_task(view: View) -> Option<Task> {
    match view {
        View::Lists => Some(Task::RefreshLists),
        View::Profiles => Some(Task::RefreshProfiles),
        View::Builds => Some(Task::RefreshBuildsView { background: false }),
        View::Files => Some(Task::RefreshFiles),
        View::Settings => None,
    }
}

/// Initial buffer for a new text entry: the value being edited, so the
/// user starts from what is already there.
fn seed_entry(state: &AppState, purpose: &EntryPurpose) -> String {
    match purpose {
        EntryPurpose::Filter => match state.view {
            View::Profiles => state.profiles.filter().to_string(),
            _ => state.lists.filter().to_string(),
        },
        EntryPurpose::Rename { scope, id } => match scope {
            Scope::Lists => state
                .lists
                .rows()
                .iter()
                .find(|r| r.list_id == *id)
                .map(|r| r.name.clone())
                .unwrap_or_default(),
            Scope::Profiles => state
                .profiles
                .rows()
                .iter()
                .find(|r| r.profile_id == *id)
                .map(|r| r.name.clone())
                .unwrap_or_default(),
            Scope::Builds => String::new(),
        },
        EntryPurpose::FileTarget { source_path } => state
            .files
            .draft(source_path)
            .map(str::to_string)
            .or_else(|| {
                state
                    .files
                    .row_by_source(source_path)
                    .and_then(|f| f.target_path.clone())
            })
            .unwrap_or_default(),
        EntryPurpose::UploadPath | EntryPurpose::ImportPath => String::new(),
    }
}

/// Route a committed entry buffer by its purpose. Blank input is a
/// no-op for everything except the filter, where it clears.
fn commit_entry(state: &mut AppState, entry: TextEntry) -> UpdateResult {
    let text = entry.buffer;
    match entry.purpose {
        EntryPurpose::Filter => {
            match state.view {
                View::Lists => state.lists.set_filter(&text),
                View::Profiles => state.profiles.set_filter(&text),
                _ => {}
            }
            UpdateResult::none()
        }
        EntryPurpose::Rename { scope, id } => {
            let name = text.trim();
            if name.is_empty() {
                return UpdateResult::none();
            }
            UpdateResult::task(Task::RenameEntity {
                scope,
                id,
                name: name.to_string(),
            })
        }
        EntryPurpose::UploadPath => {
            let path = text.trim();
            if path.is_empty() {
                return UpdateResult::none();
            }
            UpdateResult::task(Task::UploadFile {
                path: path.to_string(),
            })
        }
        EntryPurpose::ImportPath => {
            let path = text.trim();
            if path.is_empty() {
                return UpdateResult::none();
            }
            UpdateResult::task(Task::ImportList {
                path: path.to_string(),
            })
        }
        EntryPurpose::FileTarget { source_path } => UpdateResult::message(Message::EditFileTarget {
            source_path,
            target_path: text,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AnchorRect;
    use crate::table::{SortDirection, SortField};
    use owbc_api::EndpointStore;
    use owbc_core::BuildSummary;

    fn new_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(EndpointStore::at(dir.path().join("config.toml")));
        (state, dir)
    }

    #[test]
    fn test_sort_message_flips_on_repeat() {
        let (mut state, _dir) = new_state();
        update(
            &mut state,
            Message::SortBy {
                scope: Scope::Lists,
                field: SortField::Name,
            },
        );
        assert_eq!(state.lists.sort.field, SortField::Name);
        assert_eq!(state.lists.sort.direction, SortDirection::Asc);

        update(
            &mut state,
            Message::SortBy {
                scope: Scope::Lists,
                field: SortField::Name,
            },
        );
        assert_eq!(state.lists.sort.direction, SortDirection::Desc);
    }

    #[test]
    fn test_poll_tick_gated_by_view() {
        let (mut state, _dir) = new_state();
        let result = update(&mut state, Message::PollTick);
        assert_eq!(result.task, None);

        state.view = View::Builds;
        let result = update(&mut state, Message::PollTick);
        assert_eq!(
            result.task,
            Some(Task::RefreshBuildsView { background: true })
        );
    }

    #[test]
    fn test_switch_view_schedules_refresh_and_closes_popover() {
        let (mut state, _dir) = new_state();
        state.popover.show(Popover {
            kind: PopoverKind::MessageDetail,
            build_id: "b1".to_string(),
            text: String::new(),
            anchor: AnchorRect::default(),
        });

        let result = update(&mut state, Message::SwitchView(View::Builds));
        assert_eq!(state.view, View::Builds);
        assert!(state.popover.open.is_none());
        assert_eq!(
            result.task,
            Some(Task::RefreshBuildsView { background: false })
        );
    }

    #[test]
    fn test_message_detail_popover_from_cached_row() {
        let (mut state, _dir) = new_state();
        state.builds.set_rows(vec![BuildSummary {
            build_id: "b1".to_string(),
            message: Some("compiling".to_string()),
            ..Default::default()
        }]);

        update(
            &mut state,
            Message::ShowMessageDetail {
                build_id: "b1".to_string(),
                anchor: AnchorRect::default(),
            },
        );
        assert!(state.popover.is_open(PopoverKind::MessageDetail));
        assert_eq!(state.popover.open.as_ref().unwrap().text, "compiling");
    }

    #[test]
    fn test_scroll_and_resize_close_popover() {
        let (mut state, _dir) = new_state();
        for message in [Message::ViewScrolled, Message::ViewportResized] {
            state.popover.show(Popover {
                kind: PopoverKind::RequestDetail,
                build_id: "b1".to_string(),
                text: String::new(),
                anchor: AnchorRect::default(),
            });
            update(&mut state, message);
            assert!(state.popover.open.is_none());
        }
    }

    #[test]
    fn test_apply_endpoint_bumps_generation_and_refreshes() {
        let (mut state, _dir) = new_state();
        let result = update(
            &mut state,
            Message::ApplyEndpoint {
                address: "http://router.lan:8000/".to_string(),
                api_path: "".to_string(),
            },
        );
        assert_eq!(state.endpoint.generation(), 1);
        assert_eq!(state.endpoint.base_url(), "http://router.lan:8000/api/v1");
        assert_eq!(state.settings.address_entry, "http://router.lan:8000");
        assert_eq!(result.task, Some(Task::RefreshAll));
    }

    #[test]
    fn test_filter_entry_commits_into_active_table() {
        let (mut state, _dir) = new_state();
        update(&mut state, Message::EntryStart(EntryPurpose::Filter));
        for c in " Base ".chars() {
            update(&mut state, Message::EntryChar(c));
        }
        update(&mut state, Message::EntryCommit);
        assert_eq!(state.lists.filter(), "base");
        assert!(state.entry.is_none());
    }

    #[test]
    fn test_filter_cancel_leaves_committed_filter() {
        let (mut state, _dir) = new_state();
        state.lists.set_filter("kept");
        update(&mut state, Message::EntryStart(EntryPurpose::Filter));
        update(&mut state, Message::EntryChar('x'));
        update(&mut state, Message::EntryCancel);
        assert_eq!(state.lists.filter(), "kept");
    }

    #[test]
    fn test_rename_entry_seeds_current_name_and_commits_to_task() {
        let (mut state, _dir) = new_state();
        state.lists.set_rows(vec![owbc_core::PackageList {
            list_id: "l1".to_string(),
            name: "base".to_string(),
            ..Default::default()
        }]);

        update(
            &mut state,
            Message::EntryStart(EntryPurpose::Rename {
                scope: Scope::Lists,
                id: "l1".to_string(),
            }),
        );
        assert_eq!(state.entry.as_ref().unwrap().buffer, "base");

        for c in "-extended".chars() {
            update(&mut state, Message::EntryChar(c));
        }
        let result = update(&mut state, Message::EntryCommit);
        assert_eq!(
            result.task,
            Some(Task::RenameEntity {
                scope: Scope::Lists,
                id: "l1".to_string(),
                name: "base-extended".to_string(),
            })
        );
    }

    #[test]
    fn test_blank_rename_commit_is_dropped() {
        let (mut state, _dir) = new_state();
        update(
            &mut state,
            Message::EntryStart(EntryPurpose::Rename {
                scope: Scope::Profiles,
                id: "p1".to_string(),
            }),
        );
        update(&mut state, Message::EntryChar(' '));
        let result = update(&mut state, Message::EntryCommit);
        assert_eq!(result.task, None);
    }

    #[test]
    fn test_upload_and_import_entries_commit_to_tasks() {
        let (mut state, _dir) = new_state();
        update(&mut state, Message::EntryStart(EntryPurpose::UploadPath));
        for c in "/tmp/rc.local".chars() {
            update(&mut state, Message::EntryChar(c));
        }
        let result = update(&mut state, Message::EntryCommit);
        assert_eq!(
            result.task,
            Some(Task::UploadFile {
                path: "/tmp/rc.local".to_string(),
            })
        );

        update(&mut state, Message::EntryStart(EntryPurpose::ImportPath));
        for c in "/tmp/pkgs.json".chars() {
            update(&mut state, Message::EntryChar(c));
        }
        let result = update(&mut state, Message::EntryCommit);
        assert_eq!(
            result.task,
            Some(Task::ImportList {
                path: "/tmp/pkgs.json".to_string(),
            })
        );
    }

    #[test]
    fn test_create_from_template_schedules_task() {
        let (mut state, _dir) = new_state();
        let result = update(
            &mut state,
            Message::CreateFromTemplate(crate::templates::TemplateKind::Profile),
        );
        assert_eq!(
            result.task,
            Some(Task::CreateFromTemplate {
                kind: crate::templates::TemplateKind::Profile,
            })
        );
    }

    #[test]
    fn test_build_log_and_artifact_messages_schedule_tasks() {
        let (mut state, _dir) = new_state();
        let result = update(
            &mut state,
            Message::ShowBuildLog {
                build_id: "b1".to_string(),
                anchor: AnchorRect::default(),
            },
        );
        assert_eq!(
            result.task,
            Some(Task::LoadBuildLog {
                build_id: "b1".to_string(),
                anchor: AnchorRect::default(),
            })
        );

        let result = update(&mut state, Message::DownloadArtifacts("b1".to_string()));
        assert_eq!(
            result.task,
            Some(Task::DownloadArtifacts {
                build_id: "b1".to_string(),
            })
        );
    }

    #[test]
    fn test_file_target_entry_chains_into_save() {
        let (mut state, _dir) = new_state();
        state.files.set_rows(vec![owbc_core::RemoteFile {
            id: "f1".to_string(),
            source_path: "etc/rc.local".to_string(),
            ..Default::default()
        }]);

        update(
            &mut state,
            Message::EntryStart(EntryPurpose::FileTarget {
                source_path: "etc/rc.local".to_string(),
            }),
        );
        for c in "/etc/rc.local".chars() {
            update(&mut state, Message::EntryChar(c));
        }
        let result = update(&mut state, Message::EntryCommit);
        assert_eq!(
            result.message,
            Some(Message::EditFileTarget {
                source_path: "etc/rc.local".to_string(),
                target_path: "/etc/rc.local".to_string(),
            })
        );
    }

    #[test]
    fn test_cascade_selection_schedules_resolve_except_platform() {
        let (mut state, _dir) = new_state();
        let result = update(&mut state, Message::SelectVersion("24.10.0".to_string()));
        assert_eq!(result.task, Some(Task::ResolveCascade));

        let result = update(&mut state, Message::SelectPlatform("x86-64".to_string()));
        assert_eq!(result.task, None);
        assert_eq!(state.cascade.platform, "x86-64");
    }

    #[test]
    fn test_submit_build_requires_complete_chain() {
        let (mut state, _dir) = new_state();
        let result = update(
            &mut state,
            Message::SubmitBuild {
                profile_id: "p1".to_string(),
            },
        );
        assert_eq!(result.task, None);
        assert!(state.profiles.error.is_some());

        state.cascade.select_version("24.10.0");
        state.cascade.select_target("x86");
        state.cascade.select_subtarget("64");
        state.cascade.select_platform("generic");
        let result = update(
            &mut state,
            Message::SubmitBuild {
                profile_id: "p1".to_string(),
            },
        );
        assert_eq!(
            result.task,
            Some(Task::SubmitBuild {
                profile_id: "p1".to_string()
            })
        );
    }

    #[test]
    fn test_save_file_target_requires_row_and_draft() {
        let (mut state, _dir) = new_state();
        let result = update(
            &mut state,
            Message::SaveFileTarget {
                source_path: "etc/rc.local".to_string(),
            },
        );
        assert_eq!(result.task, None);

        state.files.set_rows(vec![owbc_core::RemoteFile {
            id: "f1".to_string(),
            source_path: "etc/rc.local".to_string(),
            ..Default::default()
        }]);
        update(
            &mut state,
            Message::EditFileTarget {
                source_path: "etc/rc.local".to_string(),
                target_path: "/etc/rc.local".to_string(),
            },
        );
        let result = update(
            &mut state,
            Message::SaveFileTarget {
                source_path: "etc/rc.local".to_string(),
            },
        );
        assert_eq!(
            result.task,
            Some(Task::SaveFileTarget {
                file_id: "f1".to_string(),
                source_path: "etc/rc.local".to_string(),
                target_path: "/etc/rc.local".to_string(),
            })
        );
    }
}
