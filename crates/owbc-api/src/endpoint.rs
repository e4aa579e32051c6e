//! Backend endpoint resolution and persisted configuration.
//!
//! The console stores two values: a backend address (empty means "same
//! origin", i.e. a reverse-proxied backend reachable by relative paths)
//! and an API path. Older releases stored one combined `endpoint`
//! string; [`EndpointStore::load`] migrates it on read.
//!
//! Storage failures (missing dir, unreadable file, bad TOML) never
//! surface to the user: loading falls back to defaults and saving is
//! best effort. The fallible versions are kept internal so tests can
//! assert the swallow behavior.

use std::path::{Path, PathBuf};

use owbc_core::prelude::*;
use serde::{Deserialize, Serialize};
use url::Url;

/// Default API path used when the stored path is empty or absent.
pub const DEFAULT_API_PATH: &str = "api/v1";

const CONFIG_FILENAME: &str = "config.toml";
const CONFIG_DIR: &str = "owbc";

/// Trim whitespace and strip trailing slashes from a backend address.
///
/// An empty result means "same origin".
pub fn normalize_address(input: &str) -> String {
    input.trim().trim_end_matches('/').to_string()
}

/// Trim whitespace and strip leading/trailing slashes from an API path.
///
/// An empty input resolves to [`DEFAULT_API_PATH`].
pub fn normalize_path(input: &str) -> String {
    let trimmed = input.trim().trim_matches('/');
    if trimmed.is_empty() {
        DEFAULT_API_PATH.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Combine a normalized address and path into the active base URL.
pub fn build_base(address: &str, path: &str) -> String {
    if address.is_empty() {
        path.to_string()
    } else {
        format!("{address}/{path}")
    }
}

/// The two persisted endpoint values, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub address: String,
    pub api_path: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            api_path: DEFAULT_API_PATH.to_string(),
        }
    }
}

impl EndpointConfig {
    pub fn new(address: &str, api_path: &str) -> Self {
        Self {
            address: normalize_address(address),
            api_path: normalize_path(api_path),
        }
    }

    /// The base URL every request is resolved against.
    pub fn base_url(&self) -> String {
        build_base(&self.address, &self.api_path)
    }
}

/// On-disk representation. `endpoint` is the legacy combined key.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEndpoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
}

/// Reads and writes the endpoint configuration file.
#[derive(Debug, Clone)]
pub struct EndpointStore {
    path: PathBuf,
}

impl EndpointStore {
    /// Store under the platform config dir (`~/.config/owbc/config.toml`).
    pub fn default_location() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join(CONFIG_DIR).join(CONFIG_FILENAME),
        }
    }

    /// Store at an explicit file path (used by tests).
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored configuration, falling back to defaults on any
    /// storage or parse failure.
    pub fn load(&self) -> EndpointConfig {
        match self.try_load() {
            Ok(config) => config,
            Err(err) => {
                warn!("endpoint config unreadable, using defaults: {err}");
                EndpointConfig::default()
            }
        }
    }

    /// Persist the configuration, best effort. Failures are logged and
    /// swallowed.
    pub fn save(&self, config: &EndpointConfig) {
        if let Err(err) = self.try_save(config) {
            warn!("failed to persist endpoint config: {err}");
        }
    }

    pub(crate) fn try_load(&self) -> Result<EndpointConfig> {
        let raw = std::fs::read_to_string(&self.path)?;
        let stored: StoredEndpoint =
            toml::from_str(&raw).map_err(|e| Error::config(e.to_string()))?;

        // Dual-key form wins; presence of either key counts.
        if stored.address.is_some() || stored.api_path.is_some() {
            return Ok(EndpointConfig::new(
                stored.address.as_deref().unwrap_or(""),
                stored.api_path.as_deref().unwrap_or(""),
            ));
        }

        match stored.endpoint {
            Some(legacy) => Ok(parse_legacy(&legacy)),
            None => Ok(EndpointConfig::default()),
        }
    }

    pub(crate) fn try_save(&self, config: &EndpointConfig) -> Result<()> {
        let stored = StoredEndpoint {
            address: Some(config.address.clone()),
            api_path: Some(config.api_path.clone()),
            endpoint: None,
        };
        let raw = toml::to_string_pretty(&stored).map_err(|e| Error::config(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// Split a legacy combined endpoint value into address and path.
///
/// `scheme://host/rest` becomes address `scheme://host` and path `rest`;
/// a bare path keeps an empty address; anything unusable falls back to
/// defaults.
fn parse_legacy(value: &str) -> EndpointConfig {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return EndpointConfig::default();
    }

    if trimmed.contains("://") {
        match Url::parse(trimmed) {
            Ok(url) => {
                let mut address = format!(
                    "{}://{}",
                    url.scheme(),
                    url.host_str().unwrap_or_default()
                );
                if let Some(port) = url.port() {
                    address.push_str(&format!(":{port}"));
                }
                return EndpointConfig::new(&address, url.path());
            }
            Err(_) => return EndpointConfig::default(),
        }
    }

    // No scheme: the whole value is a path relative to the origin.
    EndpointConfig::new("", trimmed)
}

/// The active endpoint for the process lifetime.
///
/// `generation` is bumped on every [`ActiveEndpoint::apply`]; caches
/// holding endpoint-derived data (templates) stamp their entries with
/// the generation they were fetched under and treat a mismatch as a
/// miss, instead of relying on an external clearer.
#[derive(Debug, Clone)]
pub struct ActiveEndpoint {
    config: EndpointConfig,
    base_url: String,
    generation: u64,
}

impl ActiveEndpoint {
    pub fn new(config: EndpointConfig) -> Self {
        let base_url = config.base_url();
        Self {
            config,
            base_url,
            generation: 0,
        }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Switch to a new address/path pair. Normalizes both, recomputes
    /// the base URL, persists best-effort, and bumps the generation.
    /// This is the only place the active base URL changes.
    pub fn apply(&mut self, address: &str, api_path: &str, store: &EndpointStore) {
        self.config = EndpointConfig::new(address, api_path);
        self.base_url = self.config.base_url();
        self.generation += 1;
        store.save(&self.config);
        info!(base_url = %self.base_url, generation = self.generation, "endpoint applied");
    }
}
