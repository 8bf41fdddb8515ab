//! mcadmin Server - HTTP endpoint for memcached flush and stats

mod server;

use anyhow::Result;
use mcadmin_common::{AdminConfig, CacheAdmin, MemcacheClient};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared application state
pub struct AppState {
    pub config: AdminConfig,
    pub admin: Arc<CacheAdmin>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mcadmin=info".parse()?),
        )
        .init();

    info!("Starting mcadmin server v{}", env!("CARGO_PKG_VERSION"));

    // Determine config path
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("mcadmin.toml"));

    // Load or create default configuration
    let config = if config_path.exists() {
        info!("Loading configuration from {}", config_path.display());
        AdminConfig::load(&config_path)?
    } else {
        info!("No configuration file found, using defaults");
        let config = AdminConfig::default();
        // Save default config for reference
        if let Err(e) = config.save(&config_path) {
            error!("Failed to save default config: {}", e);
        }
        config
    };

    let admin = Arc::new(connect(&config));

    let state = Arc::new(AppState {
        config: config.clone(),
        admin,
    });

    // Start HTTP server
    let server_state = state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::run_server(server_state).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = server_handle => {
            if let Err(e) = result {
                error!("Server task failed: {}", e);
            }
        }
    }

    info!("mcadmin server shutdown complete");
    Ok(())
}

/// Bind the admin service to the configured cluster.
///
/// Connections open on the first request, so the endpoint starts even when
/// the cluster is down. Only an empty server list leaves it unbound.
fn connect(config: &AdminConfig) -> CacheAdmin {
    match MemcacheClient::new(&config.memcached) {
        Ok(client) => CacheAdmin::new(Arc::new(client)),
        Err(e) => {
            warn!("Memcached client not configured: {}", e);
            CacheAdmin::unbound()
        }
    }
}
