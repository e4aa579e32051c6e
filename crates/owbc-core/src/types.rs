//! Domain types mirrored from the backend's JSON representations.
//!
//! Every field that the backend may omit or mistype carries a serde
//! default so a malformed record degrades to a safe empty value instead
//! of failing the whole refresh.

use serde::{Deserialize, Serialize};

/// A named entity category with its own table state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Lists,
    Profiles,
    Builds,
}

impl Scope {
    /// Human-readable plural label used in bulk-operation summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Scope::Lists => "lists",
            Scope::Profiles => "profiles",
            Scope::Builds => "builds",
        }
    }
}

/// Row access shared by the sortable entity kinds.
///
/// The table controller is generic over this trait; builds are not
/// sortable/filterable and do not implement it.
pub trait TableRow {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn updated_at(&self) -> &str;
}

// ─────────────────────────────────────────────────────────────────────────────
// Lists and Profiles
// ─────────────────────────────────────────────────────────────────────────────

/// A named package list record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageList {
    #[serde(default)]
    pub list_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub updated_at: String,
    /// Backend-owned payload (package names, constraints). The engine
    /// never looks inside, it only round-trips it on edit.
    #[serde(default, rename = "list")]
    pub payload: serde_json::Value,
}

impl TableRow for PackageList {
    fn id(&self) -> &str {
        &self.list_id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn updated_at(&self) -> &str {
        &self.updated_at
    }
}

/// A build profile record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildProfile {
    #[serde(default)]
    pub profile_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub updated_at: String,
    /// Backend-owned payload (device selection, list references).
    #[serde(default, rename = "profile")]
    pub payload: serde_json::Value,
}

impl TableRow for BuildProfile {
    fn id(&self) -> &str {
        &self.profile_id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn updated_at(&self) -> &str {
        &self.updated_at
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

/// An uploaded file descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub source_path: String,
    /// Destination inside the image rootfs, if assigned.
    #[serde(default)]
    pub target_path: Option<String>,
    #[serde(default)]
    pub size: u64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Builds
// ─────────────────────────────────────────────────────────────────────────────

/// Lifecycle state of a build job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildState {
    #[default]
    Queued,
    Running,
    Done,
    Failed,
    Canceled,
}

impl BuildState {
    /// A final state can no longer change on its own.
    pub fn is_final(&self) -> bool {
        matches!(self, BuildState::Done | BuildState::Failed | BuildState::Canceled)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuildState::Queued => "queued",
            BuildState::Running => "running",
            BuildState::Done => "done",
            BuildState::Failed => "failed",
            BuildState::Canceled => "canceled",
        }
    }
}

/// Optional build flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOptions {
    #[serde(default)]
    pub force_rebuild: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_output_images")]
    pub output_images: Vec<String>,
}

fn default_output_images() -> Vec<String> {
    vec!["sysupgrade".to_string()]
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            force_rebuild: false,
            debug: false,
            output_images: default_output_images(),
        }
    }
}

/// Build request payload (the `request` object of `POST build`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildRequest {
    #[serde(default)]
    pub profile_id: String,
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub subtarget: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub options: BuildOptions,
}

/// Build summary row as returned by the collection endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSummary {
    #[serde(default)]
    pub build_id: String,
    #[serde(default)]
    pub state: BuildState,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    /// Completion percentage, 0..=100.
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub phase: Option<String>,
    #[serde(default)]
    pub cancel_requested: bool,
    #[serde(default)]
    pub runner_pid: Option<i64>,
}

/// A single produced artifact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, rename = "type")]
    pub artifact_type: String,
    #[serde(default)]
    pub role: String,
}

/// Result payload of a finished build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildResult {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Full build representation (summary fields plus request and result).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Build {
    #[serde(flatten)]
    pub summary: BuildSummary,
    #[serde(default)]
    pub request: BuildRequest,
    #[serde(default)]
    pub result: Option<BuildResult>,
}
