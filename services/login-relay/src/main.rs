//! Discord Login Relay
//!
//! Single-binary Rust service that:
//! 1. Hands the application a Discord authorization URL (`POST /login`)
//! 2. Receives the OAuth callback and validates the single-use state
//! 3. Exchanges the authorization code and fetches the user's Discord id
//! 4. Stores the credential keyed by the caller-supplied token

mod config;
mod error;
mod routes;
mod secret;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use discord_auth::SessionStore;

use crate::config::Config;
use crate::routes::{AppState, RelayMetrics, build_router};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting discord-login-relay");

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        app_url = %config.oauth.app_url,
        redirect_uri = %config.redirect_uri(),
        store = %config.store.path.display(),
        "configuration loaded"
    );

    let store = SessionStore::load(config.store.path.clone())
        .await
        .context("failed to open session store")?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.oauth.timeout_secs))
        .build()
        .context("failed to build HTTP client")?;

    let listen_addr = config.server.listen_addr;
    let app_state = AppState {
        config: Arc::new(config),
        store: Arc::new(store),
        client,
        metrics: RelayMetrics::new(),
    };

    let app = build_router(app_state);

    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind to {listen_addr}"))?;

    info!(addr = %listen_addr, "accepting requests");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
