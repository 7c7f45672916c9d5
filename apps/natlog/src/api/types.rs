//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use natlog_core::{MemoryUsage, SearchBudget, SearchOutcome};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Loaded engine status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub fact_db: String,
    pub edges: usize,
    pub graph_words: usize,
    pub vocabulary: usize,
    pub memory: MemoryUsage,
    pub total_bytes: usize,
    /// Upper bound for every request budget.
    pub budget: SearchBudget,
}

// =============================================================================
// SEARCH REQUEST/RESPONSE
// =============================================================================

/// Search request. Budget fields are optional and capped by the server's
/// configured budget.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query in the CLI text format, e.g. `"cat,have,tail"`.
    pub query: String,
    #[serde(default)]
    pub max_steps: Option<usize>,
    #[serde(default)]
    pub max_cost: Option<f32>,
    #[serde(default)]
    pub max_ticks: Option<usize>,
}

impl SearchRequest {
    /// The budget this request asks for, filling unset fields from
    /// `base`. `None` when no field is set.
    #[must_use]
    pub fn requested_budget(&self, base: SearchBudget) -> Option<SearchBudget> {
        if self.max_steps.is_none() && self.max_cost.is_none() && self.max_ticks.is_none() {
            return None;
        }
        Some(SearchBudget {
            max_steps: self.max_steps.unwrap_or(base.max_steps),
            max_cost: self.max_cost.unwrap_or(base.max_cost),
            max_ticks: self.max_ticks.unwrap_or(base.max_ticks),
        })
    }
}

/// Search response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    /// `proven`, `refuted` or `not_proven`.
    pub verdict: Option<String>,
    /// The parsed query, rendered.
    pub query: Option<String>,
    /// Rendered proof steps, empty unless proven or refuted.
    pub steps: Vec<String>,
    /// Total path cost, e.g. `"1.000"`.
    pub cost: Option<String>,
    pub outcome: Option<SearchOutcome>,
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn from_outcome(
        query: String,
        verdict: &str,
        steps: Vec<String>,
        outcome: SearchOutcome,
    ) -> Self {
        Self {
            success: true,
            verdict: Some(verdict.to_string()),
            query: Some(query),
            steps,
            cost: outcome.path().map(|p| p.cost().to_string()),
            outcome: Some(outcome),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            verdict: None,
            query: None,
            steps: Vec::new(),
            cost: None,
            outcome: None,
            error: Some(msg.into()),
        }
    }
}
