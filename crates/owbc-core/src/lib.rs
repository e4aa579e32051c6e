//! # owbc-core - Core Domain Types
//!
//! Foundation crate for the OpenWrt build console. Provides the domain
//! types shared by the API client and the state engine, the error
//! taxonomy, and logging bootstrap.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, chrono, thiserror, tracing).

pub mod error;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all console crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use types::{
    Artifact, Build, BuildOptions, BuildProfile, BuildRequest, BuildResult, BuildState,
    BuildSummary, PackageList, RemoteFile, Scope, TableRow,
};
