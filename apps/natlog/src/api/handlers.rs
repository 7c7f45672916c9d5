//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{HealthResponse, SearchRequest, SearchResponse, StatusResponse},
};
use crate::render::{parse_query, render_fact, render_path, verdict};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Report the loaded fact database and its memory breakdown.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let engine = &state.engine;
    let memory = engine.memory_usage();

    let response = StatusResponse {
        fact_db: engine.fact_db().to_string(),
        edges: engine.graph().edge_count(),
        graph_words: engine.graph().word_count(),
        vocabulary: engine.vocabulary().len(),
        memory,
        total_bytes: memory.total(),
        budget: engine.budget(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// SEARCH HANDLER
// =============================================================================

/// Search for a proof of one query.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> impl IntoResponse {
    let engine = state.engine;
    let fact = match parse_query(&request.query, Some(engine.vocabulary())) {
        Ok(fact) => fact,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SearchResponse::error(format!("Invalid query: {}", e))),
            );
        }
    };
    let budget = request.requested_budget(engine.budget());

    let worker = engine.clone();
    let query = fact.clone();
    let outcome =
        match tokio::task::spawn_blocking(move || worker.search(&query, budget)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Search task failed: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(SearchResponse::error("Search failed")),
                );
            }
        };

    let vocabulary = engine.vocabulary();
    let steps = outcome
        .path()
        .map(|path| render_path(vocabulary, engine.edge_types(), path))
        .unwrap_or_default();
    tracing::debug!(verdict = verdict(&outcome), steps = steps.len(), "Search finished");

    (
        StatusCode::OK,
        Json(SearchResponse::from_outcome(
            render_fact(vocabulary, &fact),
            verdict(&outcome),
            steps,
            outcome,
        )),
    )
}
