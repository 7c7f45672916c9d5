//! # Configuration
//!
//! Optional `natlog.toml` file with two sections:
//!
//! ```toml
//! [load]
//! min_fact_count = 1
//! max_facts = 1000000
//! fact_db = "lossy"          # or "exact"
//! histogram_capacity = 65536
//!
//! [search]
//! max_steps = 6
//! max_cost = 10.0
//! max_ticks = 100000
//! ```
//!
//! Every key is optional. CLI flags override file values, file values
//! override the built-in defaults.

use clap::ValueEnum;
use natlog_core::primitives::{
    DEFAULT_HISTOGRAM_CAPACITY, DEFAULT_MAX_COST, DEFAULT_MAX_STEPS, DEFAULT_MAX_TICKS,
    DEFAULT_MIN_FACT_COUNT,
};
use natlog_core::{LoadConfig, NatlogError, SearchBudget};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which fact database to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FactDbKind {
    /// Exact trie with sense variants and completion caches.
    Exact,
    /// Compact two-pass hashed trie.
    #[default]
    Lossy,
}

impl std::fmt::Display for FactDbKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Lossy => write!(f, "lossy"),
        }
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// `[load]` section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSection {
    pub min_fact_count: u32,
    pub max_facts: Option<usize>,
    pub fact_db: FactDbKind,
    pub histogram_capacity: usize,
}

impl Default for LoadSection {
    fn default() -> Self {
        Self {
            min_fact_count: DEFAULT_MIN_FACT_COUNT,
            max_facts: None,
            fact_db: FactDbKind::default(),
            histogram_capacity: DEFAULT_HISTOGRAM_CAPACITY,
        }
    }
}

impl LoadSection {
    #[must_use]
    pub fn load_config(&self) -> LoadConfig {
        LoadConfig {
            min_fact_count: self.min_fact_count,
            max_facts: self.max_facts,
        }
    }
}

/// `[search]` section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub max_steps: usize,
    pub max_cost: f32,
    pub max_ticks: usize,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_cost: DEFAULT_MAX_COST,
            max_ticks: DEFAULT_MAX_TICKS,
        }
    }
}

impl SearchSection {
    #[must_use]
    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            max_steps: self.max_steps,
            max_cost: self.max_cost,
            max_ticks: self.max_ticks,
        }
    }
}

// =============================================================================
// CONFIG FILE
// =============================================================================

/// The whole configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NatlogConfig {
    pub load: LoadSection,
    pub search: SearchSection,
}

impl NatlogConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, NatlogError> {
        toml::from_str(content)
            .map_err(|e| NatlogError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, NatlogError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|e| {
            NatlogError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Replace the fact database kind if one was given on the command line.
    #[must_use]
    pub fn with_fact_db(mut self, fact_db: Option<FactDbKind>) -> Self {
        if let Some(kind) = fact_db {
            self.load.fact_db = kind;
        }
        self
    }
}
