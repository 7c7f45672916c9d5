//! # natlog - Natural-Logic Entailment Search
//!
//! The main binary for the natlog inference engine.
//!
//! This application provides:
//! - CLI interface to import TSV dumps, build the fact database and search
//! - HTTP query server (axum-based)
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/natlog (THE BINARY)           │
//! │                                               │
//! │   ┌─────────────┐         ┌─────────────┐     │
//! │   │    CLI      │         │  HTTP API   │     │
//! │   │   (clap)    │         │   (axum)    │     │
//! │   └──────┬──────┘         └──────┬──────┘     │
//! │          └───────────┬───────────┘            │
//! │                      ▼                        │
//! │              ┌───────────────┐                │
//! │              │  natlog-core  │                │
//! │              │  (THE LOGIC)  │                │
//! │              └───────────────┘                │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! natlog init
//! natlog import --facts facts.tsv --edges edges.tsv --vocabulary vocab.tsv
//! natlog build --fact-db lossy
//! natlog search "all,cat,have,tail"
//! natlog serve --host 0.0.0.0 --port 8080
//! ```

use clap::Parser;
use natlog::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing; NATLOG_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("NATLOG_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "natlog=debug,natlog_core=debug,tower_http=debug"
    } else {
        "natlog=info,natlog_core=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the natlog startup banner.
fn print_banner() {
    println!(
        r#"
  natlog v{}
  Natural-logic entailment search - proven, refuted, or not proven
"#,
        env!("CARGO_PKG_VERSION")
    );
}
