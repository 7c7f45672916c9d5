//! # natlog HTTP API Module
//!
//! This module implements the HTTP query server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Fact database kind, sizes and memory breakdown
//! - `POST /search` - Search for a proof of one query
//!
//! The engine is built before the server starts and shared read-only by
//! every request. Searches run on the blocking thread pool.

mod handlers;
mod types;

// Re-export handlers and types for integration tests (via `natlog::api::*`)
pub use handlers::{health_handler, search_handler, status_handler};
pub use types::{HealthResponse, SearchRequest, SearchResponse, StatusResponse};

use crate::engine::Engine;
use axum::{
    Router,
    routing::{get, post},
};
use natlog_core::NatlogError;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the loaded engine.
#[derive(Clone)]
pub struct AppState {
    /// The engine every request searches against.
    pub engine: Arc<Engine>,
}

impl AppState {
    /// Create new app state around a shared engine.
    #[must_use]
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/search", post(handlers::search_handler))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, engine: Arc<Engine>) -> Result<(), NatlogError> {
    let router = create_router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| NatlogError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("natlog query server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| NatlogError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down"),
        Err(e) => {
            tracing::error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
