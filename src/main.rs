//! OpenWrt build console - binary entry point.
//!
//! Parses flags, loads the persisted endpoint, and hands off to the
//! run loop in owbc-tui.

use std::path::PathBuf;

use clap::Parser;
use owbc_api::{ApiClient, EndpointStore};
use owbc_app::state::AppState;

/// Terminal console for a remote OpenWrt image-builder service
#[derive(Parser, Debug)]
#[command(name = "owbc")]
#[command(about = "Terminal console for a remote OpenWrt image-builder service", long_about = None)]
struct Args {
    /// Backend address, e.g. http://router.lan:8000 (overrides config)
    #[arg(long)]
    address: Option<String>,

    /// API path under the address (overrides config, default api/v1)
    #[arg(long)]
    api_path: Option<String>,

    /// Alternate config file location
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    owbc_core::logging::init()?;

    let args = Args::parse();
    let store = match args.config {
        Some(path) => EndpointStore::at(path),
        None => EndpointStore::default_location(),
    };

    let mut state = AppState::new(store);
    if args.address.is_some() || args.api_path.is_some() {
        let address = args
            .address
            .unwrap_or_else(|| state.endpoint.config().address.clone());
        let api_path = args
            .api_path
            .unwrap_or_else(|| state.endpoint.config().api_path.clone());
        state.endpoint.apply(&address, &api_path, &state.store);
        state.settings.address_entry = state.endpoint.config().address.clone();
        state.settings.api_path_entry = state.endpoint.config().api_path.clone();
    }

    let api = ApiClient::new(state.endpoint.base_url())?;
    tracing::info!(base_url = %api.base_url(), "starting console");

    owbc_tui::run(state, api).await?;
    Ok(())
}
