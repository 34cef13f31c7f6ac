//! # anacan-server
//!
//! Development server for the Anacan.az site. Serves the sitemaps built from
//! published content in the remote database, plus a health check.

mod api;
mod config;
mod error;
mod sitemap;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use anacan_provision::{HttpBackend, RemoteConfig};

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,anacan_server=debug,tower_http=debug")),
        )
        .init();

    info!("Starting Anacan.az dev server v{}", env!("CARGO_PKG_VERSION"));

    // Reads .env first, so the server settings below see it too.
    let remote = RemoteConfig::from_env()?;
    let config = ServerConfig::from_env();
    info!(?config, ?remote, "Loaded configuration");

    let documents = Arc::new(HttpBackend::new(&remote)?);
    let state = AppState {
        documents,
        database_id: remote.database_id.clone(),
        config: Arc::new(config.clone()),
    };

    tokio::select! {
        result = api::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
