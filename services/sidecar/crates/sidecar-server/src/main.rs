//! Nexus sidecar entry point.
//!
//! Initializes tracing, loads configuration from environment variables
//! (prefixed with `NEXUS_SIDECAR_`), joins the tailnet from an auth-key
//! secret file, and serves the execution-dispatch API.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use nexus_sidecar::api::{self, AppState};
use nexus_sidecar::application::dispatcher::ExecutionDispatcher;
use nexus_sidecar::application::executor::{ExecutorChain, ExecutorConfig};
use nexus_sidecar::application::ports::OverlayNetwork;
use nexus_sidecar::application::store::ExecutionStore;
use nexus_sidecar::infra::{TailscaleCli, TokioCommandRunner};

// ===================================================================
// Configuration
// ===================================================================

/// Server configuration loaded from environment variables via `envy`.
///
/// Each field maps to `NEXUS_SIDECAR_<FIELD>`:
///   - `NEXUS_SIDECAR_LISTEN_ADDR`   (default `0.0.0.0:9000`)
///   - `NEXUS_SIDECAR_AUTH_KEY_FILE` (optional, path to tailnet auth-key secret)
///   - `NEXUS_SIDECAR_SSH_USER`      (default `root`)
#[derive(Debug, Deserialize)]
struct Config {
    /// Socket address to bind the HTTP server to.
    #[serde(default = "default_listen_addr")]
    listen_addr: String,

    /// Path to file containing the tailnet auth key (Docker secret). When
    /// unset the sidecar starts with the overlay network uninitialized.
    auth_key_file: Option<String>,

    /// Remote user executions run as on target devices.
    #[serde(default = "default_ssh_user")]
    ssh_user: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:9000".to_string()
}

fn default_ssh_user() -> String {
    "root".to_string()
}

// ===================================================================
// Entry point
// ===================================================================

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing with RUST_LOG env filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("nexus-sidecar starting");

    // 2. Load configuration from NEXUS_SIDECAR_* env vars.
    let config: Config = envy::prefixed("NEXUS_SIDECAR_")
        .from_env()
        .context("failed to load config from NEXUS_SIDECAR_* env vars")?;

    tracing::info!(
        listen_addr = %config.listen_addr,
        ssh_user = %config.ssh_user,
        auth_key_configured = config.auth_key_file.is_some(),
        "configuration loaded",
    );

    // 3. Join the tailnet once at startup. Failure is a warning, not fatal:
    //    dispatch keeps accepting requests and each execution re-checks
    //    readiness lazily, failing individually while the network is down.
    let runner = Arc::new(TokioCommandRunner::default());
    let tailnet = Arc::new(TailscaleCli::new(Arc::clone(&runner)));
    match &config.auth_key_file {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(key) => {
                if let Err(error) = tailnet.initialize(key.trim()).await {
                    tracing::warn!(error = %error, "tailnet initialization failed");
                }
            }
            Err(error) => {
                tracing::warn!(path = %path, error = %error, "could not read auth key file");
            }
        },
        None => tracing::warn!("no auth key file configured; tailnet left uninitialized"),
    }

    // 4. Wire the dispatcher: executor chain over the tailnet + process
    //    runner, with its own record store.
    let chain = ExecutorChain::new(
        Arc::clone(&tailnet),
        runner,
        ExecutorConfig {
            ssh_user: config.ssh_user.clone(),
            ..ExecutorConfig::default()
        },
    );
    let dispatcher = ExecutionDispatcher::new(chain, ExecutionStore::new());
    let state = Arc::new(AppState { dispatcher });

    // 5. Compose and serve the router.
    let router = api::router(Arc::clone(&state)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .context("failed to bind TCP listener")?;

    tracing::info!("sidecar ready — http://{}", config.listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    // 6. Drain in-flight executions; each is bounded by its own deadline.
    state.dispatcher.shutdown().await;

    tracing::info!("nexus-sidecar shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) for graceful shutdown.
async fn shutdown_signal() {
    #[allow(clippy::expect_used)]
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl-C handler");
    tracing::info!("received shutdown signal");
}
