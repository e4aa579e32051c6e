//! Typed backend client: one method per endpoint.
//!
//! Methods return domain types from `owbc-core`; shape mismatches in
//! enumeration payloads degrade to empty lists (the callers treat those
//! as "no options"), while transport and API errors propagate.

use owbc_core::prelude::*;
use owbc_core::{
    Artifact, Build, BuildProfile, BuildRequest, BuildSummary, PackageList, RemoteFile,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{json, Value};

use crate::transport::{decode, Transport};

/// Characters escaped inside a path segment. `/` is kept: the file
/// delete route takes a full relative path.
const PATH_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'#')
    .add(b'%');

#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Transport,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    /// Re-point the client after an endpoint apply.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.transport.set_base_url(base_url);
    }

    // ─────────────────────────────────────────────────────────────
    // Health
    // ─────────────────────────────────────────────────────────────

    pub async fn health(&self) -> Result<()> {
        self.transport.get("health").await.map(|_| ())
    }

    // ─────────────────────────────────────────────────────────────
    // Package lists
    // ─────────────────────────────────────────────────────────────

    pub async fn lists(&self) -> Result<Vec<PackageList>> {
        decode(self.transport.get("lists").await?)
    }

    pub async fn get_list(&self, list_id: &str) -> Result<PackageList> {
        decode(self.transport.get(&format!("list/{list_id}")).await?)
    }

    pub async fn create_list(&self, body: &Value) -> Result<PackageList> {
        decode(self.transport.post_json("list", body).await?)
    }

    pub async fn update_list(&self, list_id: &str, body: &Value) -> Result<PackageList> {
        decode(
            self.transport
                .put_json(&format!("list/{list_id}"), body)
                .await?,
        )
    }

    pub async fn delete_list(&self, list_id: &str) -> Result<()> {
        self.transport
            .delete(&format!("list/{list_id}"))
            .await
            .map(|_| ())
    }

    /// Import an externally formatted package list.
    pub async fn import_list(&self, body: &Value) -> Result<PackageList> {
        decode(self.transport.post_json("list-import", body).await?)
    }

    // ─────────────────────────────────────────────────────────────
    // Build profiles
    // ─────────────────────────────────────────────────────────────

    pub async fn profiles(&self) -> Result<Vec<BuildProfile>> {
        decode(self.transport.get("profiles").await?)
    }

    pub async fn get_profile(&self, profile_id: &str) -> Result<BuildProfile> {
        decode(self.transport.get(&format!("profile/{profile_id}")).await?)
    }

    pub async fn create_profile(&self, body: &Value) -> Result<BuildProfile> {
        decode(self.transport.post_json("profile", body).await?)
    }

    pub async fn update_profile(&self, profile_id: &str, body: &Value) -> Result<BuildProfile> {
        decode(
            self.transport
                .put_json(&format!("profile/{profile_id}"), body)
                .await?,
        )
    }

    pub async fn delete_profile(&self, profile_id: &str) -> Result<()> {
        self.transport
            .delete(&format!("profile/{profile_id}"))
            .await
            .map(|_| ())
    }

    // ─────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────

    pub async fn files(&self) -> Result<Vec<RemoteFile>> {
        decode(self.transport.get("files").await?)
    }

    /// Upload one file; the only multipart request in the protocol.
    pub async fn upload_file(
        &self,
        file_name: &str,
        contents: Vec<u8>,
        target_path: Option<&str>,
    ) -> Result<RemoteFile> {
        let part = reqwest::multipart::Part::bytes(contents).file_name(file_name.to_string());
        let mut form = reqwest::multipart::Form::new().part("file", part);
        if let Some(target) = target_path {
            form = form.text("target_path", target.to_string());
        }
        decode(self.transport.post_multipart("file", form).await?)
    }

    /// Rewrite a file's rootfs target path by descriptor id.
    pub async fn update_file_meta(
        &self,
        file_id: &str,
        target_path: &str,
    ) -> Result<RemoteFile> {
        let body = json!({ "target_path": target_path });
        decode(
            self.transport
                .put_json(&format!("file-meta/{file_id}"), &body)
                .await?,
        )
    }

    /// Delete an uploaded file by its relative source path.
    pub async fn delete_file(&self, source_path: &str) -> Result<()> {
        let encoded = utf8_percent_encode(source_path, PATH_SET).to_string();
        self.transport
            .delete(&format!("file/{encoded}"))
            .await
            .map(|_| ())
    }

    // ─────────────────────────────────────────────────────────────
    // Builds
    // ─────────────────────────────────────────────────────────────

    pub async fn builds(&self) -> Result<Vec<BuildSummary>> {
        decode(self.transport.get("builds").await?)
    }

    pub async fn get_build(&self, build_id: &str) -> Result<Build> {
        decode(self.transport.get(&format!("build/{build_id}")).await?)
    }

    pub async fn create_build(&self, request: &BuildRequest) -> Result<Build> {
        let body = json!({ "request": request });
        decode(self.transport.post_json("build", &body).await?)
    }

    pub async fn cancel_build(&self, build_id: &str) -> Result<bool> {
        let value = self
            .transport
            .post_empty(&format!("build/{build_id}/cancel"))
            .await?;
        Ok(value
            .get("cancel_requested")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    pub async fn delete_build(&self, build_id: &str) -> Result<()> {
        self.transport
            .delete(&format!("build/{build_id}"))
            .await
            .map(|_| ())
    }

    /// Re-run a finished build with the same request.
    pub async fn rebuild_build(&self, build_id: &str) -> Result<Build> {
        decode(
            self.transport
                .post_empty(&format!("build/{build_id}/rebuild"))
                .await?,
        )
    }

    /// Fetch the tail of a build's log, bounded by `limit_bytes`.
    pub async fn build_log(&self, build_id: &str, limit_bytes: u64) -> Result<String> {
        let limit = limit_bytes.to_string();
        let value = self
            .transport
            .get_with_query(&format!("build/{build_id}/log"), &[("limit_bytes", &limit)])
            .await?;
        Ok(match value {
            Value::String(text) => text,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    pub async fn build_artifacts(&self, build_id: &str) -> Result<Vec<Artifact>> {
        decode(
            self.transport
                .get(&format!("build/{build_id}/artifacts"))
                .await?,
        )
    }

    pub async fn download_artifact(&self, build_id: &str, artifact_id: &str) -> Result<Vec<u8>> {
        self.transport
            .get_bytes(&format!("build/{build_id}/download/{artifact_id}"))
            .await
    }

    // ─────────────────────────────────────────────────────────────
    // Cascade enumerations
    // ─────────────────────────────────────────────────────────────

    /// Available release versions. The backend proxies the upstream
    /// `latest` payload, so both a bare array and `{"latest": [...]}` are
    /// accepted; anything else counts as "no options".
    pub async fn versions(&self) -> Result<Vec<String>> {
        let value = self.transport.get("build-versions").await?;
        Ok(extract_versions(&value))
    }

    pub async fn targets(&self, version: &str) -> Result<Vec<String>> {
        let value = self
            .transport
            .get_with_query("build-targets", &[("version", version)])
            .await?;
        Ok(string_list(&value))
    }

    pub async fn subtargets(&self, version: &str, target: &str) -> Result<Vec<String>> {
        let value = self
            .transport
            .get_with_query("build-subtargets", &[("version", version), ("target", target)])
            .await?;
        Ok(string_list(&value))
    }

    pub async fn platforms(
        &self,
        version: &str,
        target: &str,
        subtarget: &str,
    ) -> Result<Vec<String>> {
        let value = self
            .transport
            .get_with_query(
                "build-platforms",
                &[
                    ("version", version),
                    ("target", target),
                    ("subtarget", subtarget),
                ],
            )
            .await?;
        Ok(string_list(&value))
    }

    // ─────────────────────────────────────────────────────────────
    // Creation templates
    // ─────────────────────────────────────────────────────────────

    /// Default object shape for "new list" creation. Lives under the
    /// backend's example path, so it is endpoint-dependent.
    pub async fn list_template(&self) -> Result<Value> {
        self.transport.get("example/list").await
    }

    /// Default object shape for "new profile" creation.
    pub async fn profile_template(&self) -> Result<Value> {
        self.transport.get("example/profile").await
    }
}

/// Collect the string elements of a JSON array; anything else is empty.
fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn extract_versions(value: &Value) -> Vec<String> {
    if value.is_array() {
        return string_list(value);
    }
    value
        .get("latest")
        .map(string_list)
        .unwrap_or_default()
}
