//! The dependent build-parameter chain: version → target → subtarget →
//! platform.
//!
//! Each level's options are only valid for the value chosen at the
//! level above, so the chain is re-resolved top-down on any upstream
//! change, one strictly sequential fetch per level. A fetch failure is
//! non-fatal and counts as "no options": the affected level and
//! everything below it fall back to the placeholder state instead of
//! surfacing an error.

use owbc_core::prelude::*;

/// One level of the chain, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeLevel {
    Version,
    Target,
    Subtarget,
    Platform,
}

/// Selected values and offered options for all four levels.
///
/// An empty string means "unset". A level whose upstream value is unset
/// is in placeholder state ("select the level above first").
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeState {
    pub version: String,
    pub target: String,
    pub subtarget: String,
    pub platform: String,

    pub versions: Vec<String>,
    pub targets: Vec<String>,
    pub subtargets: Vec<String>,
    pub platforms: Vec<String>,
}

impl CascadeState {
    /// Install freshly fetched versions, keeping the current selection
    /// when still offered, else taking the first offered value.
    pub fn set_versions(&mut self, versions: Vec<String>) {
        self.versions = versions;
        self.version = pick(&self.versions, &self.version);
    }

    pub fn select_version(&mut self, version: &str) {
        self.version = version.to_string();
    }

    pub fn select_target(&mut self, target: &str) {
        self.target = target.to_string();
    }

    pub fn select_subtarget(&mut self, subtarget: &str) {
        self.subtarget = subtarget.to_string();
    }

    pub fn select_platform(&mut self, platform: &str) {
        self.platform = platform.to_string();
    }

    /// Whether a level is waiting for an upstream selection.
    pub fn is_placeholder(&self, level: CascadeLevel) -> bool {
        match level {
            CascadeLevel::Version => false,
            CascadeLevel::Target => self.version.is_empty(),
            CascadeLevel::Subtarget => self.target.is_empty(),
            CascadeLevel::Platform => self.subtarget.is_empty(),
        }
    }

    /// All four levels carry a concrete value.
    pub fn is_complete(&self) -> bool {
        !self.version.is_empty()
            && !self.target.is_empty()
            && !self.subtarget.is_empty()
            && !self.platform.is_empty()
    }

    fn clear_from_target(&mut self) {
        self.target.clear();
        self.targets.clear();
        self.clear_from_subtarget();
    }

    fn clear_from_subtarget(&mut self) {
        self.subtarget.clear();
        self.subtargets.clear();
        self.clear_from_platform();
    }

    fn clear_from_platform(&mut self) {
        self.platform.clear();
        self.platforms.clear();
    }
}

/// Keep the previous selection if still offered, else take the first
/// offered value, else empty.
fn pick(options: &[String], previous: &str) -> String {
    if !previous.is_empty() && options.iter().any(|option| option == previous) {
        previous.to_string()
    } else {
        options.first().cloned().unwrap_or_default()
    }
}

/// Source of cascade options, keyed by the levels above.
///
/// Implemented by the API client; tests substitute an in-memory stub.
#[trait_variant::make(CascadeSource: Send)]
pub trait LocalCascadeSource {
    async fn targets(&self, version: &str) -> Result<Vec<String>>;
    async fn subtargets(&self, version: &str, target: &str) -> Result<Vec<String>>;
    async fn platforms(&self, version: &str, target: &str, subtarget: &str)
        -> Result<Vec<String>>;
}

impl CascadeSource for owbc_api::ApiClient {
    async fn targets(&self, version: &str) -> Result<Vec<String>> {
        owbc_api::ApiClient::targets(self, version).await
    }

    async fn subtargets(&self, version: &str, target: &str) -> Result<Vec<String>> {
        owbc_api::ApiClient::subtargets(self, version, target).await
    }

    async fn platforms(
        &self,
        version: &str,
        target: &str,
        subtarget: &str,
    ) -> Result<Vec<String>> {
        owbc_api::ApiClient::platforms(self, version, target, subtarget).await
    }
}

/// Re-resolve the chain below the current version.
///
/// Fetches are strictly sequential: a level is never queried with a
/// stale upper-level value.
pub async fn resolve<S: CascadeSource>(state: &mut CascadeState, source: &S) {
    if state.version.is_empty() {
        state.clear_from_target();
        return;
    }

    state.targets = source.targets(&state.version).await.unwrap_or_else(|err| {
        debug!("target fetch failed, treating as empty: {err}");
        Vec::new()
    });
    state.target = pick(&state.targets, &state.target);
    if state.target.is_empty() {
        state.clear_from_subtarget();
        return;
    }

    state.subtargets = source
        .subtargets(&state.version, &state.target)
        .await
        .unwrap_or_else(|err| {
            debug!("subtarget fetch failed, treating as empty: {err}");
            Vec::new()
        });
    state.subtarget = pick(&state.subtargets, &state.subtarget);
    if state.subtarget.is_empty() {
        state.clear_from_platform();
        return;
    }

    state.platforms = source
        .platforms(&state.version, &state.target, &state.subtarget)
        .await
        .unwrap_or_else(|err| {
            debug!("platform fetch failed, treating as empty: {err}");
            Vec::new()
        });
    state.platform = pick(&state.platforms, &state.platform);
}
