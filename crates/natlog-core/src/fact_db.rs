//! # Fact Database Seam
//!
//! The interface Search uses to ask a fact store two things at once:
//! whether a token sequence is a stored fact, and which tokens could be
//! inserted at a given position.
//!
//! Implemented by the exact [`crate::TrieRoot`] and the compact
//! [`crate::LossyTrie`]. Both are read-only once built and are shared
//! across threads without locking.

use crate::primitives::MAX_COMPLETIONS;
use crate::{Edge, TaggedWord};
use serde::{Deserialize, Serialize};

/// Where completions are requested during a containment lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CompletionSite {
    /// Membership only.
    None,
    /// Tokens that may precede the first token of the query.
    SentenceStart,
    /// Tokens that may follow the prefix ending at this index.
    After(usize),
}

/// Caller-owned completion buffer, bounded at `MAX_COMPLETIONS` edges.
///
/// Each completion is an edge whose `source` is the proposed word, whose
/// `source_sense` / `edge_type` identify the registered sense variant,
/// and whose `sink` is always null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completions {
    edges: Vec<Edge>,
}

impl Completions {
    #[must_use]
    pub fn new() -> Self {
        Self {
            edges: Vec::with_capacity(MAX_COMPLETIONS),
        }
    }

    /// Append a completion. Returns false, and drops it, once full.
    pub fn push(&mut self, edge: Edge) -> bool {
        if self.is_full() {
            return false;
        }
        self.edges.push(edge);
        true
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.edges.len() >= MAX_COMPLETIONS
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Edge] {
        &self.edges
    }
}

/// Memory breakdown of a fact database, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Bytes holding fact membership and completion records.
    pub fact_bytes: usize,
    /// Bytes of structural overhead (nodes, maps, hash tables).
    pub structure_bytes: usize,
    /// Bytes of completion caches and skip-gram indexes.
    pub caching_bytes: usize,
}

impl MemoryUsage {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.fact_bytes + self.structure_bytes + self.caching_bytes
    }
}

/// A read-only store of facts that can also propose insertions.
pub trait FactDb: Send + Sync {
    /// Report whether `query` is a stored fact, writing completions for
    /// `site` into `out` (never more than `MAX_COMPLETIONS`).
    fn contains(&self, query: &[TaggedWord], site: CompletionSite, out: &mut Completions) -> bool;

    /// Memory breakdown for diagnostics.
    fn memory_usage(&self) -> MemoryUsage;

    /// Membership only.
    fn is_fact(&self, query: &[TaggedWord]) -> bool {
        let mut unused = Completions::new();
        self.contains(query, CompletionSite::None, &mut unused)
    }
}
