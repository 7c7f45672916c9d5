//! # Innate Primitives
//!
//! Hardcoded constants for the natlog CORE.
//!
//! These bound every structure on the query path: fact length, sense
//! space, completion buffers and the default search budget. They are
//! compiled into the binary and immutable at runtime.

/// Maximum number of tokens in a fact.
///
/// Facts longer than this are rejected by `Fact::new` and truncated by
/// the bulk loader.
pub const MAX_FACT_LENGTH: usize = 255;

/// Largest representable word sense. Larger senses saturate to this value.
///
/// Must fit the 5-bit sense field of a packed completion record.
pub const MAX_SENSE: u8 = 31;

/// Maximum number of completions a single lookup may return.
///
/// Must fit the 5-bit capacity field of a LossyTrie flags byte.
pub const MAX_COMPLETIONS: usize = 25;

/// Maximum number of sense-variant edges recorded on one trie node.
pub const MAX_NODE_EDGES: usize = 4;

/// FNV-1a 32-bit offset basis; seed of the main fact hash.
pub const FNV_SEED_MAIN: u32 = 0x811c_9dc5;

/// Seed of the auxiliary fact hash.
pub const FNV_SEED_AUX: u32 = 1154;

/// FNV-1a 32-bit prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Default minimum weight for a fact row to be loaded.
pub const DEFAULT_MIN_FACT_COUNT: u32 = 1;

/// Default expected number of distinct prefixes for the pass-1 histogram.
pub const DEFAULT_HISTOGRAM_CAPACITY: usize = 1 << 16;

/// Cost assigned to an insertion proposed by the fact database.
pub const INSERTION_COST: f32 = 1.0;

// =============================================================================
// SEARCH BUDGET DEFAULTS
// =============================================================================

/// Default maximum number of mutations on a proof path.
pub const DEFAULT_MAX_STEPS: usize = 6;

/// Default maximum cumulative path cost.
pub const DEFAULT_MAX_COST: f32 = 10.0;

/// Default maximum number of states popped from the frontier.
pub const DEFAULT_MAX_TICKS: usize = 100_000;
