//! SFP HTTP Server Binary
//!
//! Loads configuration, preloads datasets, sets up the HTTP router and starts
//! serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin sfp-server
//! ```
//!
//! # Environment Variables
//!
//! - `SFP_CONFIG`: Path to the TOML config file (default: search for `sfp.toml`)
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `SFP_PRELOAD_DIR`: Directory of CSV files stored at start-up
//! - `RUST_LOG`: Log filter (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sfp_rust::config::AppConfig;
use sfp_rust::db::repositories::LocalRepository;
use sfp_rust::db::repository::FullRepository;
use sfp_rust::http::{create_router, AppState};
use sfp_rust::services;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Library code logs through `log`; the fmt subscriber picks those records up too.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting SFP HTTP Server");

    let config = AppConfig::load().context("Failed to load configuration")?;

    let repository: Arc<dyn FullRepository> = Arc::new(LocalRepository::new());
    if let Some(dir) = &config.repository.preload_dir {
        services::preload_directory(repository.as_ref(), dir).await?;
    }
    info!("Repository initialized successfully");

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind_address()))?;

    let state = AppState::with_config(repository, config);
    let app = create_router(state);

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
