//! # Engine
//!
//! The loaded, read-only state one process searches against: the graph,
//! the fact database chosen in the configuration, the vocabulary used for
//! rendering, and the configured search budget.
//!
//! Built once from the redb snapshot. After that it is never mutated, so
//! the server shares it behind an `Arc` without locking.

use crate::config::{FactDbKind, NatlogConfig};
use natlog_core::{
    EdgeTypeTable, Fact, FactDb, FactStore, Graph, MemoryUsage, Search, SearchBudget,
    SearchOutcome, Vocabulary, build_fact_trie, build_lossy_trie,
};
use natlog_core::NatlogError;
use std::time::Instant;

pub struct Engine {
    graph: Graph,
    facts: Box<dyn FactDb>,
    vocabulary: Vocabulary,
    fact_db: FactDbKind,
    budget: SearchBudget,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("fact_db", &self.fact_db)
            .field("edges", &self.graph.edge_count())
            .field("vocabulary", &self.vocabulary.len())
            .field("budget", &self.budget)
            .finish()
    }
}

impl Engine {
    /// Assemble an engine from already-built parts.
    #[must_use]
    pub fn new(
        graph: Graph,
        facts: Box<dyn FactDb>,
        vocabulary: Vocabulary,
        fact_db: FactDbKind,
        budget: SearchBudget,
    ) -> Self {
        Self {
            graph,
            facts,
            vocabulary,
            fact_db,
            budget,
        }
    }

    /// Bulk-load the graph and the configured fact database from `store`.
    pub fn load(store: &FactStore, config: &NatlogConfig) -> Result<Self, NatlogError> {
        let started = Instant::now();
        let graph = store.load_graph()?;
        let load = config.load.load_config();

        let facts: Box<dyn FactDb> = match config.load.fact_db {
            FactDbKind::Exact => Box::new(build_fact_trie(store, &graph, &load)?),
            FactDbKind::Lossy => Box::new(build_lossy_trie(
                store,
                &graph,
                &load,
                config.load.histogram_capacity,
            )?),
        };
        let vocabulary = store.load_vocabulary()?;

        tracing::info!(
            fact_db = %config.load.fact_db,
            bytes = facts.memory_usage().total(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Engine loaded"
        );

        Ok(Self::new(
            graph,
            facts,
            vocabulary,
            config.load.fact_db,
            config.search.budget(),
        ))
    }

    /// Run one search. Every request field is capped by the configured
    /// budget.
    #[must_use]
    pub fn search(&self, query: &Fact, requested: Option<SearchBudget>) -> SearchOutcome {
        let budget = requested.map_or(self.budget, |r| self.cap(r));
        Search::new(&self.graph, self.facts.as_ref()).run(query, &budget)
    }

    /// `requested`, limited field by field to the configured budget.
    #[must_use]
    pub fn cap(&self, requested: SearchBudget) -> SearchBudget {
        SearchBudget {
            max_steps: requested.max_steps.min(self.budget.max_steps),
            max_cost: requested.max_cost.min(self.budget.max_cost),
            max_ticks: requested.max_ticks.min(self.budget.max_ticks),
        }
    }

    #[must_use]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[must_use]
    pub fn edge_types(&self) -> &EdgeTypeTable {
        self.graph.edge_types()
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    #[must_use]
    pub fn fact_db(&self) -> FactDbKind {
        self.fact_db
    }

    #[must_use]
    pub fn budget(&self) -> SearchBudget {
        self.budget
    }

    #[must_use]
    pub fn memory_usage(&self) -> MemoryUsage {
        self.facts.memory_usage()
    }
}
