//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use natlog::api::{HealthResponse, SearchRequest, SearchResponse};
use natlog_core::{Fact, Path, SearchBudget, SearchOutcome};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_deserialization() {
    let json = r#"{"status":"healthy","version":"1.0.0"}"#;
    let health: HealthResponse = serde_json::from_str(json).unwrap();

    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, "1.0.0");
}

// =============================================================================
// SEARCH REQUEST TESTS
// =============================================================================

#[test]
fn test_search_request_budget_fields_optional() {
    let request: SearchRequest = serde_json::from_str(r#"{"query":"1,2,3"}"#).unwrap();
    assert_eq!(request.query, "1,2,3");
    assert_eq!(request.requested_budget(SearchBudget::default()), None);
}

#[test]
fn test_search_request_fills_unset_fields() {
    let request: SearchRequest =
        serde_json::from_str(r#"{"query":"1","max_steps":2}"#).unwrap();
    let budget = request
        .requested_budget(SearchBudget::default())
        .unwrap();

    assert_eq!(budget.max_steps, 2);
    assert_eq!(budget.max_ticks, SearchBudget::default().max_ticks);
}

#[test]
fn test_search_request_missing_query_rejected() {
    let result: Result<SearchRequest, _> = serde_json::from_str(r#"{"max_steps":2}"#);
    assert!(result.is_err());
}

// =============================================================================
// SEARCH RESPONSE TESTS
// =============================================================================

#[test]
fn test_search_response_error() {
    let response = SearchResponse::error("bad");
    let json = serde_json::to_string(&response).unwrap();

    assert!(json.contains("\"success\":false"));
    assert!(json.contains("\"error\":\"bad\""));
}

#[test]
fn test_search_response_roundtrip_keeps_outcome() {
    let query = Fact::from_words(&[1, 2]).unwrap();
    let outcome = SearchOutcome::Proven(Path {
        query,
        steps: Vec::new(),
    });
    let response =
        SearchResponse::from_outcome("(1 2)".to_string(), "proven", Vec::new(), outcome.clone());

    let json = serde_json::to_string(&response).unwrap();
    let parsed: SearchResponse = serde_json::from_str(&json).unwrap();

    assert!(parsed.success);
    assert_eq!(parsed.cost.as_deref(), Some("0.000"));
    assert_eq!(parsed.outcome, Some(outcome));
}
