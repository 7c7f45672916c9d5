//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::config::{FactDbKind, NatlogConfig, SearchSection};
use crate::engine::Engine;
use crate::render::{parse_query, render_fact, render_path, verdict};
use natlog_core::loader::{
    parse_edge_row, parse_edge_type_row, parse_fact_row, parse_lines, parse_vocab_row,
};
use natlog_core::{FactStore, NatlogError, SearchOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of one imported TSV dump (4 GiB).
const MAX_IMPORT_FILE_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), NatlogError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| NatlogError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(NatlogError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve `path` to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, NatlogError> {
    let canonical = path.canonicalize().map_err(|e| {
        NatlogError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(NatlogError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Read a TSV dump after path and size checks.
fn read_dump(path: &Path) -> Result<String, NatlogError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_IMPORT_FILE_SIZE)?;
    std::fs::read_to_string(&validated)
        .map_err(|e| NatlogError::IoError(format!("Read '{}': {}", path.display(), e)))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new fact store.
pub fn cmd_init(db_path: &Path, force: bool) -> Result<(), NatlogError> {
    if db_path.exists() {
        if !force {
            return Err(NatlogError::StorageError(
                "Fact store already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| NatlogError::IoError(format!("Remove existing store: {}", e)))?;
    }

    FactStore::open(db_path)?;
    println!("Initialized new fact store at {:?}", db_path);
    Ok(())
}

// =============================================================================
// IMPORT COMMAND
// =============================================================================

/// TSV dumps to import; any subset may be given.
#[derive(Debug, Clone, Default)]
pub struct ImportFiles {
    pub facts: Option<PathBuf>,
    pub edges: Option<PathBuf>,
    pub edge_types: Option<PathBuf>,
    pub vocabulary: Option<PathBuf>,
}

/// Import TSV dumps into the fact store. Each file is parsed completely
/// before anything is written.
pub fn cmd_import(db_path: &Path, json_mode: bool, files: &ImportFiles) -> Result<(), NatlogError> {
    let mut store = FactStore::open(db_path)?;
    let mut imported = serde_json::Map::new();

    if let Some(path) = &files.edge_types {
        let rows = parse_lines(&read_dump(path)?, parse_edge_type_row)?;
        let count = store.insert_edge_types(&rows)?;
        tracing::info!(count, "Imported edge types from {:?}", path);
        imported.insert("edge_types".to_string(), count.into());
    }
    if let Some(path) = &files.edges {
        let rows = parse_lines(&read_dump(path)?, parse_edge_row)?;
        let count = store.insert_edges(&rows)?;
        tracing::info!(count, "Imported edges from {:?}", path);
        imported.insert("edges".to_string(), count.into());
    }
    if let Some(path) = &files.facts {
        let rows = parse_lines(&read_dump(path)?, parse_fact_row)?;
        let count = store.insert_facts(&rows)?;
        tracing::info!(count, "Imported facts from {:?}", path);
        imported.insert("facts".to_string(), count.into());
    }
    if let Some(path) = &files.vocabulary {
        let rows = parse_lines(&read_dump(path)?, parse_vocab_row)?;
        let count = store.insert_vocabulary(&rows)?;
        tracing::info!(count, "Imported vocabulary from {:?}", path);
        imported.insert("vocabulary".to_string(), count.into());
    }

    if json_mode {
        print_json(&serde_json::Value::Object(imported));
        return Ok(());
    }

    if imported.is_empty() {
        println!("Nothing to import (use --facts, --edges, --edge-types or --vocabulary)");
    }
    for (table, count) in &imported {
        println!("Imported {} {}", count, table);
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show fact store row counts.
pub fn cmd_status(db_path: &Path, json_mode: bool) -> Result<(), NatlogError> {
    let store = FactStore::open(db_path)?;
    let counts = store.counts()?;

    if json_mode {
        print_json(&serde_json::json!({
            "database": db_path.to_string_lossy(),
            "facts": counts.facts,
            "edges": counts.edges,
            "edge_types": counts.edge_types,
            "vocabulary": counts.vocabulary
        }));
        return Ok(());
    }

    println!("natlog Fact Store Status");
    println!("========================");
    println!("Database: {:?}", db_path);
    println!();
    println!("Facts:       {}", counts.facts);
    println!("Edges:       {}", counts.edges);
    println!("Edge Types:  {}", counts.edge_types);
    println!("Vocabulary:  {}", counts.vocabulary);

    Ok(())
}

// =============================================================================
// BUILD COMMAND
// =============================================================================

/// Load the configuration and the engine it describes.
fn load_engine(
    db_path: &Path,
    config: NatlogConfig,
) -> Result<Engine, NatlogError> {
    let store = FactStore::open(db_path)?;
    Engine::load(&store, &config)
}

/// Bulk-load the fact database and print its memory breakdown.
pub fn cmd_build(
    db_path: &Path,
    config_path: Option<&Path>,
    fact_db: Option<FactDbKind>,
    json_mode: bool,
) -> Result<(), NatlogError> {
    let config = NatlogConfig::load(config_path)?.with_fact_db(fact_db);
    let engine = load_engine(db_path, config)?;
    let usage = engine.memory_usage();

    if json_mode {
        print_json(&serde_json::json!({
            "fact_db": engine.fact_db().to_string(),
            "edges": engine.graph().edge_count(),
            "graph_words": engine.graph().word_count(),
            "memory": usage,
            "total_bytes": usage.total()
        }));
        return Ok(());
    }

    println!("natlog Fact Database");
    println!("====================");
    println!("Kind:        {}", engine.fact_db());
    println!("Edges:       {}", engine.graph().edge_count());
    println!("Graph words: {}", engine.graph().word_count());
    println!();
    println!("Memory:");
    println!("  Facts:     {} bytes", usage.fact_bytes);
    println!("  Structure: {} bytes", usage.structure_bytes);
    println!("  Caching:   {} bytes", usage.caching_bytes);
    println!("  Total:     {} bytes", usage.total());

    Ok(())
}

// =============================================================================
// SEARCH COMMAND
// =============================================================================

/// Search budget values given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct BudgetOverrides {
    pub max_steps: Option<usize>,
    pub max_cost: Option<f32>,
    pub max_ticks: Option<usize>,
}

impl BudgetOverrides {
    /// Overwrite the configured values with those given.
    #[must_use]
    pub fn apply(&self, mut search: SearchSection) -> SearchSection {
        if let Some(max_steps) = self.max_steps {
            search.max_steps = max_steps;
        }
        if let Some(max_cost) = self.max_cost {
            search.max_cost = max_cost;
        }
        if let Some(max_ticks) = self.max_ticks {
            search.max_ticks = max_ticks;
        }
        search
    }
}

/// Search for a proof of one query.
pub fn cmd_search(
    db_path: &Path,
    config_path: Option<&Path>,
    fact_db: Option<FactDbKind>,
    json_mode: bool,
    query: &str,
    overrides: BudgetOverrides,
) -> Result<(), NatlogError> {
    let mut config = NatlogConfig::load(config_path)?.with_fact_db(fact_db);
    config.search = overrides.apply(config.search);
    let engine = load_engine(db_path, config)?;

    let fact = parse_query(query, Some(engine.vocabulary()))?;
    let outcome = engine.search(&fact, None);
    let vocabulary = engine.vocabulary();
    let steps = outcome
        .path()
        .map(|path| render_path(vocabulary, engine.edge_types(), path))
        .unwrap_or_default();

    if json_mode {
        print_json(&serde_json::json!({
            "query": render_fact(vocabulary, &fact),
            "verdict": verdict(&outcome),
            "steps": steps,
            "outcome": outcome
        }));
        return Ok(());
    }

    println!("Query: {}", render_fact(vocabulary, &fact));
    match &outcome {
        SearchOutcome::Proven(path) | SearchOutcome::Refuted(path) => {
            println!(
                "Result: {} by {} (cost {})",
                verdict(&outcome),
                render_fact(vocabulary, path.final_fact()),
                path.cost()
            );
            if path.is_empty() {
                println!("  (stored fact)");
            }
            for line in &steps {
                println!("  {}", line);
            }
        }
        SearchOutcome::NotProven { ticks } => {
            println!("Result: not proven ({} states expanded)", ticks);
        }
    }

    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP query server.
pub async fn cmd_serve(
    db_path: &Path,
    config_path: Option<&Path>,
    fact_db: Option<FactDbKind>,
    host: &str,
    port: u16,
) -> Result<(), NatlogError> {
    let config = NatlogConfig::load(config_path)?.with_fact_db(fact_db);
    let engine = load_engine(db_path, config)?;

    println!("natlog Query Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Fact DB:  {}", engine.fact_db());
    println!("  Database: {:?}", db_path);
    println!();
    println!("Endpoints:");
    println!("  GET  /health - Health check");
    println!("  GET  /status - Fact database memory breakdown");
    println!("  POST /search - Search for a proof");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, Arc::new(engine)).await
}
