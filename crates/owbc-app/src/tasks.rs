//! Task runner: the asynchronous half of the update loop.
//!
//! Tasks execute on the event loop with exclusive access to the state,
//! so a refresh observes the state exactly as the triggering update
//! left it. Background refreshes keep the last good cache on failure
//! and log instead of raising banners.

use std::path::{Path, PathBuf};

use owbc_api::ApiClient;
use owbc_core::prelude::*;
use owbc_core::{BuildOptions, BuildRequest, Scope};
use serde_json::{json, Value};

use crate::bulk;
use crate::cascade;
use crate::handler::Task;
use crate::state::{AppState, Popover, PopoverKind};
use crate::templates::TemplateKind;

/// Bytes requested from the log tail endpoint.
const LOG_TAIL_BYTES: u64 = 16 * 1024;
/// Lines of that tail shown in the popover.
const LOG_TAIL_LINES: usize = 20;

pub async fn run(task: Task, state: &mut AppState, api: &mut ApiClient) {
    match task {
        Task::RefreshLists => refresh_lists(state, api).await,
        Task::RefreshProfiles => refresh_profiles(state, api).await,
        Task::RefreshFiles => refresh_files(state, api).await,
        Task::RefreshBuildsView { background } => {
            refresh_builds_view(state, api, background).await
        }
        Task::ResolveCascade => cascade::resolve(&mut state.cascade, api).await,
        Task::BulkDelete { scope } => bulk_delete(state, api, scope).await,
        Task::CreateFromTemplate { kind } => create_from_template(state, api, kind).await,
        Task::RenameEntity { scope, id, name } => {
            rename_entity(state, api, scope, &id, &name).await
        }
        Task::UploadFile { path } => upload_file(state, api, &path).await,
        Task::ImportList { path } => import_list(state, api, &path).await,
        Task::DeleteFile { source_path } => delete_file(state, api, &source_path).await,
        Task::SubmitBuild { profile_id } => submit_build(state, api, &profile_id).await,
        Task::CancelBuild { build_id } => cancel_build(state, api, &build_id).await,
        Task::RebuildBuild { build_id } => rebuild_build(state, api, &build_id).await,
        Task::LoadRequestDetail { build_id, anchor } => {
            load_request_detail(state, api, build_id, anchor).await
        }
        Task::LoadBuildLog { build_id, anchor } => {
            load_build_log(state, api, build_id, anchor).await
        }
        Task::DownloadArtifacts { build_id } => download_artifacts(state, api, &build_id).await,
        Task::SaveFileTarget {
            file_id,
            source_path,
            target_path,
        } => save_file_target(state, api, &file_id, &source_path, &target_path).await,
        Task::RefreshAll => refresh_all(state, api).await,
    }
}

async fn refresh_lists(state: &mut AppState, api: &ApiClient) {
    state.lists.loading = true;
    match api.lists().await {
        Ok(rows) => {
            state.lists.set_rows(rows);
            state.lists.error = None;
        }
        Err(err) => state.lists.error = Some(err.to_string()),
    }
    state.lists.loading = false;
    ensure_template(state, api, TemplateKind::List).await;
}

async fn refresh_profiles(state: &mut AppState, api: &ApiClient) {
    state.profiles.loading = true;
    match api.profiles().await {
        Ok(rows) => {
            state.profiles.set_rows(rows);
            state.profiles.error = None;
        }
        Err(err) => state.profiles.error = Some(err.to_string()),
    }
    state.profiles.loading = false;
    ensure_template(state, api, TemplateKind::Profile).await;
}

async fn refresh_files(state: &mut AppState, api: &ApiClient) {
    state.files.loading = true;
    match api.files().await {
        Ok(rows) => {
            state.files.set_rows(rows);
            state.files.error = None;
        }
        Err(err) => state.files.error = Some(err.to_string()),
    }
    state.files.loading = false;
}

/// Refresh everything the builds view shows: the build table, the
/// profiles it references, the version list, and the parameter chain.
/// The three independent fetches run concurrently; the chain resolves
/// afterwards so it never queries under a stale version.
async fn refresh_builds_view(state: &mut AppState, api: &ApiClient, background: bool) {
    if !background {
        state.builds.loading = true;
    }
    let (builds, profiles, versions) = tokio::join!(api.builds(), api.profiles(), api.versions());

    match builds {
        Ok(rows) => {
            state.builds.set_rows(rows);
            if !background {
                state.builds.error = None;
            }
        }
        Err(err) => {
            if background {
                warn!("background build refresh failed: {err}");
            } else {
                state.builds.error = Some(err.to_string());
            }
        }
    }

    match profiles {
        Ok(rows) => state.profiles.set_rows(rows),
        Err(err) => warn!("profile refresh for builds view failed: {err}"),
    }

    match versions {
        Ok(versions) => state.cascade.set_versions(versions),
        Err(err) => warn!("version fetch failed: {err}"),
    }

    cascade::resolve(&mut state.cascade, api).await;
    state.builds.loading = false;
}

// An empty selection short-circuits inside `bulk::execute`: no calls,
// no refresh, and any error banner already on screen stays put.
async fn bulk_delete(state: &mut AppState, api: &ApiClient, scope: Scope) {
    let mut refreshed = false;
    let summary = match scope {
        Scope::Lists => {
            bulk::execute(
                scope.label(),
                &mut state.lists.selection,
                |id| async move { api.delete_list(&id).await },
                || refreshed = true,
            )
            .await
        }
        Scope::Profiles => {
            bulk::execute(
                scope.label(),
                &mut state.profiles.selection,
                |id| async move { api.delete_profile(&id).await },
                || refreshed = true,
            )
            .await
        }
        Scope::Builds => {
            bulk::execute(
                scope.label(),
                &mut state.builds.selection,
                |id| async move { api.delete_build(&id).await },
                || refreshed = true,
            )
            .await
        }
    };

    match scope {
        Scope::Lists => state.lists.notice = Some(summary),
        Scope::Profiles => state.profiles.notice = Some(summary),
        Scope::Builds => state.builds.notice = Some(summary),
    }

    if refreshed {
        match scope {
            Scope::Lists => refresh_lists(state, api).await,
            Scope::Profiles => refresh_profiles(state, api).await,
            Scope::Builds => refresh_builds_view(state, api, false).await,
        }
    }
}

/// Create a list or profile from the endpoint's creation template. The
/// cached template is used when fresh; otherwise one fetch attempt is
/// made first.
async fn create_from_template(state: &mut AppState, api: &ApiClient, kind: TemplateKind) {
    ensure_template(state, api, kind).await;
    let generation = state.endpoint.generation();
    let Some(template) = state.templates.get(kind, generation).cloned() else {
        let message = "Creation template unavailable".to_string();
        match kind {
            TemplateKind::List => state.lists.error = Some(message),
            TemplateKind::Profile => state.profiles.error = Some(message),
        }
        return;
    };

    match kind {
        TemplateKind::List => match api.create_list(&template).await {
            Ok(list) => {
                state.lists.notice = Some(format!("Created list {}", list.name));
                refresh_lists(state, api).await;
            }
            Err(err) => state.lists.error = Some(err.to_string()),
        },
        TemplateKind::Profile => match api.create_profile(&template).await {
            Ok(profile) => {
                state.profiles.notice = Some(format!("Created profile {}", profile.name));
                refresh_profiles(state, api).await;
            }
            Err(err) => state.profiles.error = Some(err.to_string()),
        },
    }
}

/// Rename by read-modify-write: the backend's PUT replaces the whole
/// record, so the payload is fetched and carried along unchanged.
async fn rename_entity(state: &mut AppState, api: &ApiClient, scope: Scope, id: &str, name: &str) {
    match scope {
        Scope::Lists => {
            let result = async {
                let record = api.get_list(id).await?;
                let body = json!({
                    "name": name,
                    "schema_version": record.schema_version,
                    "list": record.payload,
                });
                api.update_list(id, &body).await
            }
            .await;
            match result {
                Ok(_) => {
                    state.lists.notice = Some(format!("Renamed to {name}"));
                    refresh_lists(state, api).await;
                }
                Err(err) => state.lists.error = Some(err.to_string()),
            }
        }
        Scope::Profiles => {
            let result = async {
                let record = api.get_profile(id).await?;
                let body = json!({
                    "name": name,
                    "schema_version": record.schema_version,
                    "profile": record.payload,
                });
                api.update_profile(id, &body).await
            }
            .await;
            match result {
                Ok(_) => {
                    state.profiles.notice = Some(format!("Renamed to {name}"));
                    refresh_profiles(state, api).await;
                }
                Err(err) => state.profiles.error = Some(err.to_string()),
            }
        }
        Scope::Builds => debug!("rename is not defined for builds"),
    }
}

async fn upload_file(state: &mut AppState, api: &ApiClient, path: &str) {
    let contents = match tokio::fs::read(path).await {
        Ok(contents) => contents,
        Err(err) => {
            state.files.error = Some(format!("Cannot read {path}: {err}"));
            return;
        }
    };
    let file_name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin");

    match api.upload_file(file_name, contents, None).await {
        Ok(file) => {
            state.files.notice = Some(format!("Uploaded {}", file.source_path));
            refresh_files(state, api).await;
        }
        Err(err) => state.files.error = Some(err.to_string()),
    }
}

/// Import an externally formatted package list from a local JSON file.
async fn import_list(state: &mut AppState, api: &ApiClient, path: &str) {
    let body: Value = match tokio::fs::read(path).await {
        Ok(contents) => match serde_json::from_slice(&contents) {
            Ok(value) => value,
            Err(err) => {
                state.lists.error = Some(format!("{path} is not valid JSON: {err}"));
                return;
            }
        },
        Err(err) => {
            state.lists.error = Some(format!("Cannot read {path}: {err}"));
            return;
        }
    };

    match api.import_list(&body).await {
        Ok(list) => {
            state.lists.notice = Some(format!("Imported list {}", list.name));
            refresh_lists(state, api).await;
        }
        Err(err) => state.lists.error = Some(err.to_string()),
    }
}

async fn delete_file(state: &mut AppState, api: &ApiClient, source_path: &str) {
    match api.delete_file(source_path).await {
        Ok(()) => {
            state.files.notice = Some(format!("Deleted {source_path}"));
            refresh_files(state, api).await;
        }
        Err(err) => state.files.error = Some(err.to_string()),
    }
}

async fn submit_build(state: &mut AppState, api: &ApiClient, profile_id: &str) {
    let request = BuildRequest {
        profile_id: profile_id.to_string(),
        version: state.cascade.version.clone(),
        target: state.cascade.target.clone(),
        subtarget: state.cascade.subtarget.clone(),
        platform: state.cascade.platform.clone(),
        options: BuildOptions::default(),
    };
    match api.create_build(&request).await {
        Ok(build) => {
            state.profiles.error = None;
            state.profiles.notice = Some(format!("Build {} queued", build.summary.build_id));
        }
        Err(err) => state.profiles.error = Some(err.to_string()),
    }
}

async fn cancel_build(state: &mut AppState, api: &ApiClient, build_id: &str) {
    match api.cancel_build(build_id).await {
        Ok(accepted) => {
            state.builds.notice = Some(if accepted {
                format!("Cancel requested for {build_id}")
            } else {
                format!("Build {build_id} is no longer cancellable")
            });
            refresh_builds_view(state, api, false).await;
        }
        Err(err) => state.builds.error = Some(err.to_string()),
    }
}

async fn rebuild_build(state: &mut AppState, api: &ApiClient, build_id: &str) {
    match api.rebuild_build(build_id).await {
        Ok(build) => {
            state.builds.notice = Some(format!("Rebuild queued as {}", build.summary.build_id));
            refresh_builds_view(state, api, false).await;
        }
        Err(err) => state.builds.error = Some(err.to_string()),
    }
}

async fn load_request_detail(
    state: &mut AppState,
    api: &ApiClient,
    build_id: String,
    anchor: crate::state::AnchorRect,
) {
    match api.get_build(&build_id).await {
        Ok(build) => {
            let text = serde_json::to_string_pretty(&build.request)
                .unwrap_or_else(|_| "{}".to_string());
            state.popover.show(Popover {
                kind: PopoverKind::RequestDetail,
                build_id,
                text,
                anchor,
            });
        }
        Err(err) => state.builds.error = Some(err.to_string()),
    }
}

/// Show the last lines of a build's log in a popover anchored to its
/// row. The backend bounds the transfer; the popover bounds the lines.
async fn load_build_log(
    state: &mut AppState,
    api: &ApiClient,
    build_id: String,
    anchor: crate::state::AnchorRect,
) {
    match api.build_log(&build_id, LOG_TAIL_BYTES).await {
        Ok(log) => {
            let text = tail_lines(&log, LOG_TAIL_LINES);
            let text = if text.is_empty() {
                "(log empty)".to_string()
            } else {
                text
            };
            state.popover.show(Popover {
                kind: PopoverKind::BuildLog,
                build_id,
                text,
                anchor,
            });
        }
        Err(err) => state.builds.error = Some(err.to_string()),
    }
}

fn tail_lines(text: &str, count: usize) -> String {
    let mut lines: Vec<&str> = text.lines().rev().take(count).collect();
    lines.reverse();
    lines.join("\n").trim().to_string()
}

/// Fetch every artifact of a build into `<downloads>/owbc/<build_id>/`.
/// One failed artifact does not abort the rest.
async fn download_artifacts(state: &mut AppState, api: &ApiClient, build_id: &str) {
    let artifacts = match api.build_artifacts(build_id).await {
        Ok(artifacts) => artifacts,
        Err(err) => {
            state.builds.error = Some(err.to_string());
            return;
        }
    };
    if artifacts.is_empty() {
        state.builds.notice = Some(format!("Build {build_id} has no artifacts"));
        return;
    }

    let dir = download_dir().join(build_id);
    if let Err(err) = tokio::fs::create_dir_all(&dir).await {
        state.builds.error = Some(format!("Cannot create {}: {err}", dir.display()));
        return;
    }

    let total = artifacts.len();
    let mut saved = 0usize;
    for artifact in &artifacts {
        // Artifact names come from the backend; keep only the final
        // path component when writing locally.
        let file_name = Path::new(&artifact.name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(artifact.id.as_str());
        let result = match api.download_artifact(build_id, &artifact.id).await {
            Ok(bytes) => tokio::fs::write(dir.join(file_name), bytes)
                .await
                .map_err(Error::from),
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => saved += 1,
            Err(err) => warn!("artifact {} download failed: {err}", artifact.id),
        }
    }

    if saved == total {
        state.builds.notice = Some(format!("Saved {total} artifacts to {}", dir.display()));
    } else {
        state.builds.error = Some(format!(
            "Saved {saved}/{total} artifacts to {}",
            dir.display()
        ));
    }
}

fn download_dir() -> PathBuf {
    dirs::download_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("owbc")
}

async fn save_file_target(
    state: &mut AppState,
    api: &ApiClient,
    file_id: &str,
    source_path: &str,
    target_path: &str,
) {
    match api.update_file_meta(file_id, target_path).await {
        Ok(_) => {
            state.files.clear_draft(source_path);
            state.files.notice = Some(format!("Saved target for {source_path}"));
            refresh_files(state, api).await;
        }
        Err(err) => state.files.error = Some(err.to_string()),
    }
}

/// Fetch a creation template unless a fresh one is already cached for
/// the active endpoint. Fetch failures are silent; the next visit
/// retries.
async fn ensure_template(state: &mut AppState, api: &ApiClient, kind: TemplateKind) {
    let generation = state.endpoint.generation();
    if state.templates.get(kind, generation).is_some() {
        return;
    }
    let fetched = match kind {
        TemplateKind::List => api.list_template().await,
        TemplateKind::Profile => api.profile_template().await,
    };
    match fetched {
        Ok(value) => state.templates.insert(kind, generation, value),
        Err(err) => debug!("template fetch failed: {err}"),
    }
}

/// Point the client at the newly applied endpoint, run a health check,
/// and repopulate every view from scratch.
async fn refresh_all(state: &mut AppState, api: &mut ApiClient) {
    api.set_base_url(state.endpoint.base_url());

    match api.health().await {
        Ok(()) => state.settings.error = None,
        Err(err) => state.settings.error = Some(format!("Backend unreachable: {err}")),
    }

    refresh_lists(state, api).await;
    refresh_profiles(state, api).await;
    refresh_files(state, api).await;
    refresh_builds_view(state, api, true).await;
}
