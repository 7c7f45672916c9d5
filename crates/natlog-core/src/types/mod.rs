//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the natlog CORE:
//! - Interned word identifiers (`Word`, `EdgeTypeId`)
//! - Tokens and propositions (`TaggedWord`, `Monotonicity`, `Fact`)
//! - Graph edges (`Edge`, `EdgeRow`) and search costs (`Cost`)
//! - Error types (`NatlogError`)
//!
//! ## Bounded Values
//!
//! Out-of-range inputs that the loader may legitimately see are saturated,
//! never rejected:
//! - Word senses above `MAX_SENSE` are stored as `MAX_SENSE`
//! - Edge costs below zero (or NaN) are stored as zero

use crate::primitives::{MAX_FACT_LENGTH, MAX_SENSE};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// An interned word. `Word(0)` is reserved as the null sentinel.
///
/// The mapping between ids and surface strings lives in the external
/// vocabulary table; the CORE only ever sees ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Word(pub u32);

impl Word {
    /// The null / sentinel word.
    pub const NULL: Word = Word(0);

    /// Check whether this is the null sentinel.
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Get the raw id.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Word {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an edge type, resolved once at load time from the
/// edge-type table. Search and storage key on this id, never on names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct EdgeTypeId(pub u8);

/// Saturate a sense value into the supported range.
#[must_use]
pub const fn clamp_sense(sense: u32) -> u8 {
    if sense > MAX_SENSE as u32 {
        MAX_SENSE
    } else {
        sense as u8
    }
}

fn deserialize_sense<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    u32::deserialize(deserializer).map(clamp_sense)
}

fn deserialize_cost<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    f32::deserialize(deserializer).map(clamp_cost)
}

/// Clamp a cost into `[0, +inf)`. NaN becomes zero.
#[must_use]
pub fn clamp_cost(cost: f32) -> f32 {
    cost.max(0.0)
}

// =============================================================================
// TOKENS
// =============================================================================

/// Polarity of the context a token sits in.
///
/// Derived from the quantifier and operator tokens of a fact and their
/// scope; it decides which lexical mutations preserve truth at that token.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Monotonicity {
    /// Upward monotone: generalising the token preserves truth.
    #[default]
    Up,
    /// Downward monotone: specialising the token preserves truth.
    Down,
    /// Non-monotone: only equivalences preserve truth.
    Flat,
}

impl std::str::FromStr for Monotonicity {
    type Err = NatlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" | "^" => Ok(Self::Up),
            "down" | "v" => Ok(Self::Down),
            "flat" | "-" => Ok(Self::Flat),
            other => Err(NatlogError::InvalidQuery(format!(
                "unknown monotonicity marker '{}'",
                other
            ))),
        }
    }
}

/// A word together with its sense and an optional polarity marker.
///
/// Unmarked tokens take the polarity their position in the fact gives
/// them; a marker overrides it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaggedWord {
    word: Word,
    #[serde(deserialize_with = "deserialize_sense")]
    sense: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    marker: Option<Monotonicity>,
}

impl TaggedWord {
    /// Create an unmarked tagged word.
    /// Senses above `MAX_SENSE` are saturated.
    #[must_use]
    pub const fn new(word: Word, sense: u32) -> Self {
        Self {
            word,
            sense: clamp_sense(sense),
            marker: None,
        }
    }

    /// Same token, with an explicit polarity marker.
    #[must_use]
    pub const fn with_monotonicity(self, monotonicity: Monotonicity) -> Self {
        Self {
            marker: Some(monotonicity),
            ..self
        }
    }

    #[must_use]
    pub const fn word(&self) -> Word {
        self.word
    }

    #[must_use]
    pub const fn sense(&self) -> u8 {
        self.sense
    }

    #[must_use]
    pub const fn marker(&self) -> Option<Monotonicity> {
        self.marker
    }
}

// =============================================================================
// EDGES
// =============================================================================

/// A raw edge row as it arrives from the bulk-load source.
///
/// No bounds are enforced here; converting into an [`Edge`] saturates the
/// senses and clamps the cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    pub source: u32,
    pub source_sense: u32,
    pub sink: u32,
    pub sink_sense: u32,
    pub edge_type: u8,
    pub cost: f32,
}

/// A typed, costed edge of the lexical graph.
///
/// `sink == Word::NULL` denotes a registered deletion: `source` may be
/// legally dropped from a fact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    source: Word,
    #[serde(deserialize_with = "deserialize_sense")]
    source_sense: u8,
    sink: Word,
    #[serde(deserialize_with = "deserialize_sense")]
    sink_sense: u8,
    edge_type: EdgeTypeId,
    #[serde(deserialize_with = "deserialize_cost")]
    cost: f32,
}

impl Edge {
    /// Create an edge. Senses saturate at `MAX_SENSE`, negative costs clamp to 0.
    #[must_use]
    pub fn new(
        source: Word,
        source_sense: u32,
        sink: Word,
        sink_sense: u32,
        edge_type: EdgeTypeId,
        cost: f32,
    ) -> Self {
        Self {
            source,
            source_sense: clamp_sense(source_sense),
            sink,
            sink_sense: clamp_sense(sink_sense),
            edge_type,
            cost: clamp_cost(cost),
        }
    }

    /// Create a registered-deletion edge (`sink == 0`).
    #[must_use]
    pub fn deletion(source: Word, source_sense: u32, edge_type: EdgeTypeId, cost: f32) -> Self {
        Self::new(source, source_sense, Word::NULL, 0, edge_type, cost)
    }

    #[must_use]
    pub const fn source(&self) -> Word {
        self.source
    }

    #[must_use]
    pub const fn source_sense(&self) -> u8 {
        self.source_sense
    }

    #[must_use]
    pub const fn sink(&self) -> Word {
        self.sink
    }

    #[must_use]
    pub const fn sink_sense(&self) -> u8 {
        self.sink_sense
    }

    #[must_use]
    pub const fn edge_type(&self) -> EdgeTypeId {
        self.edge_type
    }

    #[must_use]
    pub const fn cost(&self) -> f32 {
        self.cost
    }

    /// True if this edge registers `source` as legally omissible.
    #[must_use]
    pub const fn is_deletion(&self) -> bool {
        self.sink.is_null()
    }
}

impl From<EdgeRow> for Edge {
    fn from(row: EdgeRow) -> Self {
        Self::new(
            Word(row.source),
            row.source_sense,
            Word(row.sink),
            row.sink_sense,
            EdgeTypeId(row.edge_type),
            row.cost,
        )
    }
}

impl From<&Edge> for EdgeRow {
    fn from(edge: &Edge) -> Self {
        Self {
            source: edge.source.0,
            source_sense: u32::from(edge.source_sense),
            sink: edge.sink.0,
            sink_sense: u32::from(edge.sink_sense),
            edge_type: edge.edge_type.0,
            cost: edge.cost,
        }
    }
}

// =============================================================================
// COST
// =============================================================================

/// Fixed-point path cost in thousandths.
///
/// Edge costs are floats at the boundary; search accumulates them as
/// integers so that sums are exact and the frontier order is total.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Cost(pub u64);

impl Cost {
    pub const ZERO: Cost = Cost(0);

    /// Convert a float cost. Negative and NaN inputs become zero,
    /// values past `u64::MAX` thousandths saturate.
    #[must_use]
    #[allow(clippy::float_arithmetic)]
    pub fn from_f32(cost: f32) -> Self {
        Self((clamp_cost(cost) * 1000.0).round() as u64)
    }

    #[must_use]
    pub const fn saturating_add(self, other: Cost) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl std::fmt::Display for Cost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:03}", self.0 / 1000, self.0 % 1000)
    }
}

// =============================================================================
// FACT
// =============================================================================

/// An ordered proposition of 1..=`MAX_FACT_LENGTH` tagged words.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaggedWord>", into = "Vec<TaggedWord>")]
pub struct Fact(Vec<TaggedWord>);

impl Fact {
    /// Create a fact, validating its length.
    pub fn new(words: Vec<TaggedWord>) -> Result<Self, NatlogError> {
        if words.is_empty() {
            return Err(NatlogError::EmptyFact);
        }
        if words.len() > MAX_FACT_LENGTH {
            return Err(NatlogError::FactTooLong(words.len()));
        }
        Ok(Self(words))
    }

    /// Create a fact of sense-0, upward-monotone tokens from raw ids.
    pub fn from_words(ids: &[u32]) -> Result<Self, NatlogError> {
        Self::new(ids.iter().map(|&id| TaggedWord::new(Word(id), 0)).collect())
    }

    #[must_use]
    pub fn words(&self) -> &[TaggedWord] {
        &self.0
    }

    /// The word ids of this fact, without senses or markers.
    #[must_use]
    pub fn word_ids(&self) -> Vec<Word> {
        self.0.iter().map(TaggedWord::word).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed fact; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaggedWord> {
        self.0.iter()
    }

    /// Set the polarity marker of one token.
    pub fn set_monotonicity(&mut self, index: usize, monotonicity: Monotonicity) {
        if let Some(token) = self.0.get_mut(index) {
            *token = token.with_monotonicity(monotonicity);
        }
    }
}

impl TryFrom<Vec<TaggedWord>> for Fact {
    type Error = NatlogError;

    fn try_from(words: Vec<TaggedWord>) -> Result<Self, Self::Error> {
        Self::new(words)
    }
}

impl From<Fact> for Vec<TaggedWord> {
    fn from(fact: Fact) -> Self {
        fact.0
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the natlog system.
///
/// - Load-time failures (malformed rows, missing offsets, allocation) are
///   fatal to the load that raised them; no partial structure escapes.
/// - Per-query conditions (budget exhaustion, no successors) are ordinary
///   return values and never appear here.
#[derive(Debug, Error)]
pub enum NatlogError {
    /// A loaded row has a malformed field.
    #[error("Malformed row: {reason} in {row:?}")]
    MalformedRow { row: String, reason: String },

    /// A fact exceeds `MAX_FACT_LENGTH` tokens.
    #[error("Fact too long: {0} tokens")]
    FactTooLong(usize),

    /// A fact with no tokens where at least one is required.
    #[error("Empty fact")]
    EmptyFact,

    /// An edge refers to a type id missing from the edge-type table.
    #[error("Unknown edge type id: {0}")]
    UnknownEdgeType(u8),

    /// The edge-type table names a type this build does not know.
    #[error("Unknown edge type name: {0}")]
    UnknownEdgeTypeName(String),

    /// The same edge-type id appears twice in the table.
    #[error("Duplicate edge type id: {0}")]
    DuplicateEdgeType(u8),

    /// A new key was inserted into a frozen histogram.
    #[error("Histogram is frozen; cannot insert new key ({main:#010x}, {aux:#010x})")]
    HistogramFrozen { main: u32, aux: u32 },

    /// Pass 2 found no pre-reserved offset for a prefix counted in pass 1.
    #[error("No offset was allocated for prefix ({main:#010x}, {aux:#010x})")]
    MissingOffset { main: u32, aux: u32 },

    /// The completion region could not be allocated.
    #[error("Allocation failed: {0}")]
    AllocationFailed(String),

    /// A query could not be interpreted.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A storage backend error occurred.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
