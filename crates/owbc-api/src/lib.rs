//! # owbc-api - Backend Access
//!
//! Resolves which backend to talk to and wraps every network call the
//! console makes:
//!
//! - [`endpoint`]: address/path normalization, the persisted endpoint
//!   configuration, and the active base URL with its generation stamp.
//! - [`transport`]: the single JSON request helper. Non-2xx statuses
//!   become [`owbc_core::Error::Api`] carrying the body verbatim.
//! - [`client`]: one typed method per backend endpoint.

pub mod client;
pub mod endpoint;
pub mod transport;

pub use client::ApiClient;
pub use endpoint::{
    build_base, normalize_address, normalize_path, ActiveEndpoint, EndpointConfig, EndpointStore,
    DEFAULT_API_PATH,
};
pub use transport::Transport;
