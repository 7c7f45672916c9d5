//! # Bulk Loader
//!
//! Streams rows from the external store into the in-memory structures.
//!
//! ## Row Formats
//!
//! Rows arrive as tab-separated lines:
//! - facts: `{1,2,3}<TAB>weight`
//! - edges: `source<TAB>source_sense<TAB>sink<TAB>sink_sense<TAB>type<TAB>cost`
//! - edge types: `id<TAB>name`
//! - vocabulary: `id<TAB>gloss`
//!
//! A malformed numeric field fails the whole load; such rows mean the
//! upstream data is corrupt.
//!
//! ## Fact Order
//!
//! Facts are consumed in descending weight order. Streaming stops at the
//! first fact below `min_fact_count`, or once `max_facts` have been read.
//!
//! ## Sense Variants
//!
//! Each word contributes the `(sense, type)` deletion registrations the
//! graph holds for it. A word with none contributes one default variant
//! (sense 0, type 0), in both LossyTrie passes alike.

use crate::edge_types::{EdgeTypeRow, EdgeTypeTable};
use crate::fact_db::FactDb;
use crate::graph::Graph;
use crate::hash_int_map::HashIntMap;
use crate::hashing::FactHash;
use crate::lossy_trie::LossyTrie;
use crate::primitives::{DEFAULT_MIN_FACT_COUNT, MAX_COMPLETIONS, MAX_FACT_LENGTH};
use crate::trie::TrieRoot;
use crate::{Edge, EdgeRow, EdgeTypeId, NatlogError, TaggedWord, Word};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

/// Facts between two progress log lines.
const PROGRESS_INTERVAL: usize = 1_000_000;

// =============================================================================
// ROWS
// =============================================================================

/// A fact row: the bracketed gloss of word ids and its weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactRow {
    pub gloss: String,
    pub weight: u32,
}

/// A vocabulary row: word id and its surface form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabRow {
    pub id: u32,
    pub gloss: String,
}

fn malformed(row: &str, reason: impl Into<String>) -> NatlogError {
    NatlogError::MalformedRow {
        row: row.to_string(),
        reason: reason.into(),
    }
}

fn field<T: FromStr>(row: &str, fields: &[&str], index: usize, name: &str) -> Result<T, NatlogError> {
    let raw = fields
        .get(index)
        .ok_or_else(|| malformed(row, format!("missing field '{}'", name)))?;
    raw.trim()
        .parse()
        .map_err(|_| malformed(row, format!("bad {} '{}'", name, raw)))
}

fn split_exact<'a>(row: &'a str, expected: usize) -> Result<Vec<&'a str>, NatlogError> {
    let fields: Vec<&str> = row.split('\t').collect();
    if fields.len() != expected {
        return Err(malformed(
            row,
            format!("expected {} fields, found {}", expected, fields.len()),
        ));
    }
    Ok(fields)
}

/// Parse a gloss such as `{1,2,3}` (braces or brackets optional) into
/// word ids. Facts longer than `MAX_FACT_LENGTH` are truncated.
pub fn parse_gloss(gloss: &str) -> Result<Vec<Word>, NatlogError> {
    let inner = gloss
        .trim()
        .trim_start_matches(['{', '['])
        .trim_end_matches(['}', ']']);
    if inner.trim().is_empty() {
        return Err(malformed(gloss, "empty gloss"));
    }
    let mut words = Vec::new();
    for part in inner.split(',') {
        let id: u32 = part
            .trim()
            .parse()
            .map_err(|_| malformed(gloss, format!("bad word id '{}'", part)))?;
        if id == 0 {
            return Err(malformed(gloss, "word id 0 is reserved"));
        }
        words.push(Word(id));
        if words.len() >= MAX_FACT_LENGTH {
            break;
        }
    }
    Ok(words)
}

/// Parse `gloss<TAB>weight`.
pub fn parse_fact_row(line: &str) -> Result<FactRow, NatlogError> {
    let fields = split_exact(line, 2)?;
    Ok(FactRow {
        gloss: fields[0].trim().to_string(),
        weight: field(line, &fields, 1, "weight")?,
    })
}

/// Parse `source<TAB>source_sense<TAB>sink<TAB>sink_sense<TAB>type<TAB>cost`.
pub fn parse_edge_row(line: &str) -> Result<EdgeRow, NatlogError> {
    let fields = split_exact(line, 6)?;
    Ok(EdgeRow {
        source: field(line, &fields, 0, "source")?,
        source_sense: field(line, &fields, 1, "source_sense")?,
        sink: field(line, &fields, 2, "sink")?,
        sink_sense: field(line, &fields, 3, "sink_sense")?,
        edge_type: field(line, &fields, 4, "type")?,
        cost: field(line, &fields, 5, "cost")?,
    })
}

/// Parse `id<TAB>name`.
pub fn parse_edge_type_row(line: &str) -> Result<EdgeTypeRow, NatlogError> {
    let fields = split_exact(line, 2)?;
    Ok(EdgeTypeRow {
        id: field(line, &fields, 0, "id")?,
        name: fields[1].trim().to_string(),
    })
}

/// Parse `id<TAB>gloss`.
pub fn parse_vocab_row(line: &str) -> Result<VocabRow, NatlogError> {
    let fields = split_exact(line, 2)?;
    Ok(VocabRow {
        id: field(line, &fields, 0, "id")?,
        gloss: fields[1].to_string(),
    })
}

/// Parse every non-empty line of a TSV dump with `parse`.
pub fn parse_lines<T>(
    text: &str,
    parse: impl Fn(&str) -> Result<T, NatlogError>,
) -> Result<Vec<T>, NatlogError> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse)
        .collect()
}

// =============================================================================
// FACT SOURCES
// =============================================================================

/// Limits on which facts a load consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Facts with a lower weight end the stream.
    pub min_fact_count: u32,
    /// Stop after this many facts.
    pub max_facts: Option<usize>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            min_fact_count: DEFAULT_MIN_FACT_COUNT,
            max_facts: None,
        }
    }
}

/// A re-readable stream of facts in descending weight order.
///
/// The LossyTrie build reads its source twice; both reads must yield the
/// same facts in the same order.
pub trait FactSource {
    /// Call `f` on every fact admitted by `config`. Returns the number of
    /// facts streamed.
    fn for_each_fact(
        &self,
        config: &LoadConfig,
        f: &mut dyn FnMut(&[Word]) -> Result<(), NatlogError>,
    ) -> Result<usize, NatlogError>;
}

/// Apply `config` to rows already in descending weight order.
pub fn stream_fact_rows(
    rows: impl IntoIterator<Item = Result<FactRow, NatlogError>>,
    config: &LoadConfig,
    f: &mut dyn FnMut(&[Word]) -> Result<(), NatlogError>,
) -> Result<usize, NatlogError> {
    let mut count = 0usize;
    for row in rows {
        let row = row?;
        if row.weight < config.min_fact_count {
            break;
        }
        if config.max_facts.is_some_and(|max| count >= max) {
            break;
        }
        let words = parse_gloss(&row.gloss)?;
        f(&words)?;
        count += 1;
        if count % PROGRESS_INTERVAL == 0 {
            info!(facts = count, "Streaming facts");
        }
    }
    Ok(count)
}

/// Fact rows held in memory, sorted by descending weight (stable).
#[derive(Debug, Clone, Default)]
pub struct MemoryFactSource {
    rows: Vec<FactRow>,
}

impl MemoryFactSource {
    #[must_use]
    pub fn new(mut rows: Vec<FactRow>) -> Self {
        rows.sort_by(|a, b| b.weight.cmp(&a.weight));
        Self { rows }
    }

    /// Build from `(word ids, weight)` pairs.
    #[must_use]
    pub fn from_facts(facts: &[(&[u32], u32)]) -> Self {
        let rows = facts
            .iter()
            .map(|(ids, weight)| FactRow {
                gloss: format!(
                    "{{{}}}",
                    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
                ),
                weight: *weight,
            })
            .collect();
        Self::new(rows)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FactSource for MemoryFactSource {
    fn for_each_fact(
        &self,
        config: &LoadConfig,
        f: &mut dyn FnMut(&[Word]) -> Result<(), NatlogError>,
    ) -> Result<usize, NatlogError> {
        stream_fact_rows(self.rows.iter().cloned().map(Ok), config, f)
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// Build the graph from edge rows, validating every type id.
pub fn load_graph(
    edge_types: EdgeTypeTable,
    edges: impl IntoIterator<Item = EdgeRow>,
) -> Result<Graph, NatlogError> {
    let mut graph = Graph::new(edge_types);
    for row in edges {
        graph.add_edge(Edge::from(row))?;
    }
    info!(
        edges = graph.edge_count(),
        deletions = graph.deletion_count(),
        words = graph.word_count(),
        "Loaded graph"
    );
    Ok(graph)
}

/// `(sense, type)` variants of a word, with the default for words the
/// graph does not register.
fn sense_variants(graph: &Graph, word: Word) -> Vec<(u8, EdgeTypeId)> {
    let variants: Vec<(u8, EdgeTypeId)> = graph
        .sense_variants(word)
        .iter()
        .map(|e| (e.source_sense(), e.edge_type()))
        .collect();
    if variants.is_empty() {
        vec![(0, EdgeTypeId(0))]
    } else {
        variants
    }
}

// =============================================================================
// EXACT TRIE
// =============================================================================

/// Build the exact fact database.
///
/// Each fact is added once with every word at its first sense variant,
/// then once per alternative sense of each single position.
pub fn build_fact_trie(
    source: &dyn FactSource,
    graph: &Graph,
    config: &LoadConfig,
) -> Result<TrieRoot, NatlogError> {
    let mut root = TrieRoot::new();
    let mut added = 0usize;
    let count = source.for_each_fact(config, &mut |words| {
        let variants: Vec<Vec<(u8, EdgeTypeId)>> =
            words.iter().map(|&w| sense_variants(graph, w)).collect();
        let canonical: Vec<TaggedWord> = words
            .iter()
            .zip(&variants)
            .map(|(&w, v)| TaggedWord::new(w, u32::from(v[0].0)))
            .collect();
        root.add(&canonical, Some(graph));

        for (k, alternatives) in variants.iter().enumerate() {
            for &(sense, _) in alternatives.iter().skip(1) {
                let mut variant = canonical.clone();
                variant[k] = TaggedWord::new(words[k], u32::from(sense));
                root.add(&variant, Some(graph));
            }
        }
        added += 1;
        if let Some(bytes) = trie_progress(&root, added) {
            info!(facts = added, bytes, "Building fact trie");
        }
        Ok(())
    })?;

    let usage = root.memory_usage();
    info!(
        facts = count,
        nodes = root.trie().node_count(),
        bytes = usage.total(),
        "Built fact trie"
    );
    Ok(root)
}

/// Memory used so far, every `PROGRESS_INTERVAL` facts.
fn trie_progress(root: &TrieRoot, facts: usize) -> Option<usize> {
    (facts > 0 && facts % PROGRESS_INTERVAL == 0).then(|| root.memory_usage().total())
}

// =============================================================================
// LOSSY TRIE (TWO PASSES)
// =============================================================================

/// Pass 1: count completions per proper prefix, and touch every full
/// fact with a zero increment so that it gets a bucket.
pub fn completion_counts(
    source: &dyn FactSource,
    graph: &Graph,
    config: &LoadConfig,
    counts: &mut HashIntMap,
) -> Result<usize, NatlogError> {
    let cap = MAX_COMPLETIONS as u32;
    let count = source.for_each_fact(config, &mut |words| {
        for k in 1..words.len() {
            let hash = FactHash::of_words(&words[..k]);
            let by = sense_variants(graph, words[k]).len().min(MAX_COMPLETIONS) as u32;
            counts.increment(hash.main, hash.aux, by, cap)?;
        }
        let hash = FactHash::of_words(words);
        counts.increment(hash.main, hash.aux, 0, cap)?;
        Ok(())
    })?;
    info!(
        facts = count,
        prefixes = counts.len(),
        completions = counts.sum(),
        "Pass 1 complete"
    );
    Ok(count)
}

/// Pass 2: write completions, begin insertions and fact flags into the
/// pre-allocated buckets.
pub fn add_facts(
    source: &dyn FactSource,
    graph: &Graph,
    config: &LoadConfig,
    trie: &mut LossyTrie,
) -> Result<usize, NatlogError> {
    let count = source.for_each_fact(config, &mut |words| {
        for k in 1..words.len() {
            for (sense, edge_type) in sense_variants(graph, words[k]) {
                trie.add_completion(&words[..k], words[k], sense, edge_type)?;
            }
        }
        if let [first, second, ..] = words {
            for (sense, edge_type) in sense_variants(graph, *first) {
                trie.add_begin_insertion(*first, sense, edge_type, *second);
            }
        }
        trie.add_fact(words)
    })?;
    info!(facts = count, "Pass 2 complete");
    Ok(count)
}

/// Run both passes and the allocation between them.
pub fn build_lossy_trie(
    source: &dyn FactSource,
    graph: &Graph,
    config: &LoadConfig,
    histogram_capacity: usize,
) -> Result<LossyTrie, NatlogError> {
    let mut counts = HashIntMap::with_capacity(histogram_capacity);
    completion_counts(source, graph, config, &mut counts)?;
    debug!(slots = counts.capacity(), "Histogram sized");
    let mut trie = LossyTrie::allocate(counts)?;
    add_facts(source, graph, config, &mut trie)?;
    Ok(trie)
}

// =============================================================================
// TESTS
// =============================================================================
