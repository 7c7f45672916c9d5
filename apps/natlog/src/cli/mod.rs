//! # natlog CLI Module
//!
//! This module implements the CLI interface for natlog.
//!
//! ## Available Commands
//!
//! - `init` - Create an empty fact store
//! - `import` - Import TSV dumps into the fact store
//! - `status` - Show fact store row counts
//! - `build` - Bulk-load the fact database and print its memory breakdown
//! - `search` - Search for a proof of one query
//! - `serve` - Start the HTTP query server

mod commands;

use crate::config::FactDbKind;
use clap::{Parser, Subcommand};
use natlog_core::NatlogError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// natlog - natural-logic entailment search
///
/// Proves or refutes short facts against a large fact database by
/// chaining lexical mutations. Never guesses.
#[derive(Parser, Debug)]
#[command(name = "natlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the fact store
    #[arg(short = 'D', long, global = true, default_value = "natlog.redb")]
    pub database: PathBuf,

    /// Path to a natlog.toml configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new empty fact store
    Init {
        /// Force initialization even if the store exists
        #[arg(short, long)]
        force: bool,
    },

    /// Import TSV dumps into the fact store
    Import {
        /// Facts: `{id,id,...}<TAB>weight`
        #[arg(long)]
        facts: Option<PathBuf>,

        /// Edges: `source<TAB>source_sense<TAB>sink<TAB>sink_sense<TAB>type<TAB>cost`
        #[arg(long)]
        edges: Option<PathBuf>,

        /// Edge types: `id<TAB>name`
        #[arg(long)]
        edge_types: Option<PathBuf>,

        /// Vocabulary: `id<TAB>gloss`
        #[arg(long)]
        vocabulary: Option<PathBuf>,
    },

    /// Show fact store row counts
    Status,

    /// Bulk-load the fact database and report its memory usage
    Build {
        /// Fact database to build (overrides the config file)
        #[arg(long, value_enum)]
        fact_db: Option<FactDbKind>,
    },

    /// Search for a proof of one query
    Search {
        /// Comma-separated tokens: `word[:sense][:up|down|flat]`
        query: String,

        /// Fact database to build (overrides the config file)
        #[arg(long, value_enum)]
        fact_db: Option<FactDbKind>,

        /// Maximum number of mutations
        #[arg(long)]
        max_steps: Option<usize>,

        /// Maximum cumulative path cost
        #[arg(long)]
        max_cost: Option<f32>,

        /// Maximum number of states to expand
        #[arg(long)]
        max_ticks: Option<usize>,
    },

    /// Start the HTTP query server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Fact database to build (overrides the config file)
        #[arg(long, value_enum)]
        fact_db: Option<FactDbKind>,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), NatlogError> {
    let json_mode = cli.json_mode;
    let config = cli.config.as_deref();

    match cli.command {
        Some(Commands::Init { force }) => cmd_init(&cli.database, force),
        Some(Commands::Import {
            facts,
            edges,
            edge_types,
            vocabulary,
        }) => cmd_import(
            &cli.database,
            json_mode,
            &ImportFiles {
                facts,
                edges,
                edge_types,
                vocabulary,
            },
        ),
        Some(Commands::Status) => cmd_status(&cli.database, json_mode),
        Some(Commands::Build { fact_db }) => cmd_build(&cli.database, config, fact_db, json_mode),
        Some(Commands::Search {
            query,
            fact_db,
            max_steps,
            max_cost,
            max_ticks,
        }) => cmd_search(
            &cli.database,
            config,
            fact_db,
            json_mode,
            &query,
            BudgetOverrides {
                max_steps,
                max_cost,
                max_ticks,
            },
        ),
        Some(Commands::Serve {
            host,
            port,
            fact_db,
        }) => cmd_serve(&cli.database, config, fact_db, &host, port).await,
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.database, json_mode)
        }
    }
}
