//! Integration tests for the natlog HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum_test::TestServer;
use natlog::api::{AppState, HealthResponse, SearchResponse, StatusResponse, create_router};
use natlog::config::FactDbKind;
use natlog::engine::Engine;
use natlog_core::{
    Edge, EdgeTypeId, EdgeTypeTable, Graph, LoadConfig, MemoryFactSource, SearchBudget,
    SearchOutcome, Vocabulary, Word, build_fact_trie, build_lossy_trie,
};
use serde_json::json;
use std::sync::Arc;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// lemur=1 have=2 tail=3 animal=4 cat=5 fin=7; tail and fin are antonyms
fn graph() -> Graph {
    let mut graph = Graph::new(EdgeTypeTable::standard());
    graph
        .add_edge(Edge::new(Word(1), 0, Word(4), 0, EdgeTypeId(0), 1.0))
        .unwrap();
    graph
        .add_edge(Edge::new(Word(5), 0, Word(4), 0, EdgeTypeId(0), 1.0))
        .unwrap();
    graph
        .add_edge(Edge::new(Word(3), 0, Word(7), 0, EdgeTypeId(2), 2.0))
        .unwrap();
    graph
        .add_edge(Edge::new(Word(7), 0, Word(3), 0, EdgeTypeId(2), 2.0))
        .unwrap();
    graph
}

fn vocabulary() -> Vocabulary {
    let mut vocabulary = Vocabulary::new();
    for (id, gloss) in [
        (1, "lemur"),
        (2, "have"),
        (3, "tail"),
        (4, "animal"),
        (5, "cat"),
        (7, "fin"),
    ] {
        vocabulary.insert(Word(id), gloss);
    }
    vocabulary
}

fn source() -> MemoryFactSource {
    MemoryFactSource::from_facts(&[(&[1, 2, 3], 10), (&[4, 2, 3], 10), (&[5, 2, 7], 5)])
}

/// Create a test server over an engine built with `kind`.
fn create_test_server(kind: FactDbKind) -> TestServer {
    let graph = graph();
    let config = LoadConfig::default();
    let facts: Box<dyn natlog_core::FactDb> = match kind {
        FactDbKind::Exact => Box::new(build_fact_trie(&source(), &graph, &config).unwrap()),
        FactDbKind::Lossy => Box::new(build_lossy_trie(&source(), &graph, &config, 16).unwrap()),
    };
    let engine = Engine::new(graph, facts, vocabulary(), kind, SearchBudget::default());
    let router = create_router(AppState::new(Arc::new(engine)));
    TestServer::new(router).unwrap()
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server(FactDbKind::Exact);

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// STATUS ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_status_reports_fact_db() {
    let server = create_test_server(FactDbKind::Lossy);

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.fact_db, "lossy");
    assert_eq!(status.edges, 4);
    assert_eq!(status.vocabulary, 6);
    assert!(status.total_bytes > 0);
    assert_eq!(status.total_bytes, status.memory.total());
    assert_eq!(status.budget, SearchBudget::default());
}

// =============================================================================
// SEARCH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_search_stored_fact() {
    let server = create_test_server(FactDbKind::Exact);

    let response = server
        .post("/search")
        .json(&json!({ "query": "lemur,have,tail" }))
        .await;

    response.assert_status_ok();
    let result: SearchResponse = response.json();
    assert!(result.success);
    assert_eq!(result.verdict.as_deref(), Some("proven"));
    assert_eq!(result.query.as_deref(), Some("(lemur have tail)"));
    assert!(result.steps.is_empty());
    assert_eq!(result.cost.as_deref(), Some("0.000"));
}

#[tokio::test]
async fn test_search_one_step_proof() {
    for kind in [FactDbKind::Exact, FactDbKind::Lossy] {
        let server = create_test_server(kind);

        let response = server
            .post("/search")
            .json(&json!({ "query": "cat,have,tail" }))
            .await;

        response.assert_status_ok();
        let result: SearchResponse = response.json();
        assert_eq!(result.verdict.as_deref(), Some("proven"), "{}", kind);
        assert_eq!(result.steps.len(), 1);
        assert!(result.steps[0].contains("substitute cat -> animal"));
        match result.outcome {
            Some(SearchOutcome::Proven(path)) => {
                assert_eq!(path.replay().as_ref(), Some(path.final_fact()));
            }
            other => panic!("expected proof, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_search_refutation() {
    let server = create_test_server(FactDbKind::Exact);

    // (lemur have fin) against the stored (lemur have tail)
    let response = server
        .post("/search")
        .json(&json!({ "query": "lemur,have,fin" }))
        .await;

    response.assert_status_ok();
    let result: SearchResponse = response.json();
    assert_eq!(result.verdict.as_deref(), Some("refuted"));
    assert_eq!(result.cost.as_deref(), Some("2.000"));
}

#[tokio::test]
async fn test_search_zero_step_budget() {
    let server = create_test_server(FactDbKind::Exact);

    let response = server
        .post("/search")
        .json(&json!({ "query": "cat,have,tail", "max_steps": 0 }))
        .await;

    response.assert_status_ok();
    let result: SearchResponse = response.json();
    assert_eq!(result.verdict.as_deref(), Some("not_proven"));
    assert!(result.steps.is_empty());
    assert_eq!(result.cost, None);
}

#[tokio::test]
async fn test_search_numeric_ids() {
    let server = create_test_server(FactDbKind::Lossy);

    let response = server
        .post("/search")
        .json(&json!({ "query": "4,2,3" }))
        .await;

    response.assert_status_ok();
    let result: SearchResponse = response.json();
    assert_eq!(result.verdict.as_deref(), Some("proven"));
    assert_eq!(result.query.as_deref(), Some("(animal have tail)"));
}

#[tokio::test]
async fn test_search_invalid_query() {
    let server = create_test_server(FactDbKind::Exact);

    let response = server
        .post("/search")
        .json(&json!({ "query": "unicorn,have,horn" }))
        .await;

    response.assert_status_bad_request();
    let result: SearchResponse = response.json();
    assert!(!result.success);
    assert!(result.error.unwrap().contains("unknown word"));
}

#[tokio::test]
async fn test_search_malformed_body() {
    let server = create_test_server(FactDbKind::Exact);

    let response = server
        .post("/search")
        .json(&json!({ "max_steps": 2 }))
        .await;

    assert!(response.status_code().is_client_error());
}
