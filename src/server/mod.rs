//! HTTP server for the Health Hub API.
//!
//! Routes (all JSON unless noted):
//! - `GET /health`, `GET /` (key tester page, HTML)
//! - `POST /api/gemini`: single-prompt proxy to Gemini; `GET /api/test-key`
//! - `GET /api/capabilities`: speech recognition availability
//! - `GET|POST /api/conversations`: list summaries, create
//! - `GET|PATCH|DELETE /api/conversations/{id}`: read, rename, delete
//! - `POST /api/conversations/{id}/select`, `GET /api/conversations/{id}/share`
//! - `POST /api/conversations/{id}/messages`: send and wait for the answer
//! - `POST /api/messages`: send to the current conversation, creating one
//! - `POST /api/login`, `POST /api/signup`, `POST /api/logout`, `GET /api/me`
//!
//! Unknown conversation ids answer 404 with `{"error": ...}`.

pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Router with the permissive CORS and HTTP trace layers applied.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server on the configured port.
///
/// # Errors
/// Returns an error if the server fails to start.
pub async fn run_server(state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    run_server_with_shutdown(state, std::future::pending()).await
}

/// Start the HTTP server with graceful shutdown support.
///
/// The server will stop accepting new connections when `shutdown_signal` completes.
///
/// # Errors
/// Returns an error if the server fails to start.
pub async fn run_server_with_shutdown<F>(
    state: Arc<AppState>,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    let port = state.config.server.port;

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Health Hub server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}
