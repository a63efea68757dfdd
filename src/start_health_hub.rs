//! Startup helpers for the Health Hub server.

use std::process::ExitCode;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::server::{self, AppState};

/// Run the server until Ctrl-C (used by the `health-hub-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    tracing::info!("Starting Health Hub v{}", env!("CARGO_PKG_VERSION"));

    let state = match initialize() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server_with_shutdown(state, shutdown_signal())) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    tracing::info!("Server stopped");
    ExitCode::SUCCESS
}

/// Install the global `tracing` subscriber (INFO unless `RUST_LOG` says otherwise).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

/// Load configuration and build application state without starting the server.
///
/// # Errors
/// Returns an error if configuration is invalid or state creation fails.
pub fn initialize() -> Result<Arc<AppState>, Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::from_env().map_err(|e| format!("Invalid configuration: {e}"))?;

    match &config.gemini.api_key {
        Some(key) => tracing::info!(key = %key.masked(), "Gemini API key found in environment"),
        None => tracing::warn!("Gemini API key NOT FOUND; answers will fail until GEMINI_API_KEY is set"),
    }
    tracing::info!(
        model = %config.gemini.model,
        port = config.server.port,
        seed = config.seed_placeholders,
        "Configuration loaded"
    );

    AppState::new(config).map_err(|e| format!("Failed to create state: {e}").into())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
