//! # natlog-core
//!
//! The natural-logic entailment engine for natlog - THE LOGIC.
//!
//! Given a query fact, Search looks for a chain of lexical mutations that
//! turns it into a stored fact while a natural-logic truth state is
//! maintained along the way. The answer is proven, refuted, or not proven
//! within budget. Never a guess.
//!
//! ## Structures
//!
//! - `Graph`: typed, costed lexical edges (substitutions and deletions)
//!   and the operator words whose scope sets token polarity
//! - `TrieRoot`: exact fact store with cached insertion completions
//! - `LossyTrie`: compact hash-keyed fact store built in two passes
//!   over the corpus, for fact sets too large for `TrieRoot`
//! - `HashIntMap`: the open-addressing histogram behind `LossyTrie`
//!
//! ## Architectural Constraints
//!
//! - Built once by the loader, then read-only; searches share structures
//! - Deterministic: BTreeMap only, fixed-point costs, ordered frontier
//! - No async, no network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod edge_types;
pub mod fact_db;
pub mod graph;
pub mod hash_int_map;
pub mod hashing;
pub mod inference;
pub mod loader;
pub mod lossy_trie;
pub mod primitives;
pub mod search;
pub mod storage;
pub mod trie;
pub mod types;
pub mod vocabulary;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Cost, Edge, EdgeRow, EdgeTypeId, Fact, Monotonicity, NatlogError, TaggedWord, Word,
};

// =============================================================================
// RE-EXPORTS: Structures
// =============================================================================

pub use edge_types::{EdgeKind, EdgeTypeRow, EdgeTypeTable};
pub use fact_db::{CompletionSite, Completions, FactDb, MemoryUsage};
pub use graph::Graph;
pub use hash_int_map::HashIntMap;
pub use hashing::FactHash;
pub use lossy_trie::{Bucket, LossyTrie, PackedInsertion};
pub use trie::{Trie, TrieRoot};
pub use vocabulary::Vocabulary;

// =============================================================================
// RE-EXPORTS: Loading & Search
// =============================================================================

pub use inference::{Operator, Relation, TruthState};
pub use loader::{
    FactRow, FactSource, LoadConfig, MemoryFactSource, VocabRow, build_fact_trie,
    build_lossy_trie, load_graph,
};
pub use search::{Mutation, Path, PathStep, Search, SearchBudget, SearchOutcome};
pub use storage::{FactStore, StoreCounts};
