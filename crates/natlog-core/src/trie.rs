//! # Exact Fact Trie
//!
//! A prefix tree over word sequences, stored as an arena of nodes
//! addressed by index. Node 0 is the root.
//!
//! Each node remembers:
//! - its children, keyed by word
//! - whether the path to it is a complete fact (leaf)
//! - up to `MAX_NODE_EDGES` registered sense variants of its word, which
//!   are what a completion lookup proposes for insertion
//! - a cache of the children that are themselves leaves, consulted when a
//!   node has more than `MAX_COMPLETIONS` children
//!
//! [`TrieRoot`] wraps the trie with a skip-gram index from the second
//! word of every fact back to its legal first words, so that insertions
//! at the start of a sentence can be proposed without left context.

use crate::fact_db::{CompletionSite, Completions, FactDb, MemoryUsage};
use crate::graph::Graph;
use crate::primitives::{INSERTION_COST, MAX_COMPLETIONS, MAX_NODE_EDGES};
use crate::{Edge, EdgeTypeId, TaggedWord, Word};
use std::collections::{BTreeMap, BTreeSet};
use std::mem::size_of;

const ROOT: usize = 0;

#[derive(Debug, Clone, Default)]
struct TrieNode {
    children: BTreeMap<Word, usize>,
    /// Children that end a fact.
    leaf_children: BTreeMap<Word, usize>,
    /// Registered sense variants of this node's word.
    edges: Vec<Edge>,
    is_leaf: bool,
}

impl TrieNode {
    fn register_edge(&mut self, edge: Edge) {
        let duplicate = self.edges.iter().any(|e| {
            e.source_sense() == edge.source_sense() && e.edge_type() == edge.edge_type()
        });
        if !duplicate && self.edges.len() < MAX_NODE_EDGES {
            self.edges.push(edge);
        }
    }
}

/// Arena-backed exact trie.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    cache_leaf_completions: bool,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// Create an empty trie with the leaf-completion cache enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            cache_leaf_completions: true,
        }
    }

    /// Create an empty trie without the leaf-completion cache. Nodes with
    /// more than `MAX_COMPLETIONS` children then propose nothing.
    #[must_use]
    pub fn without_completion_cache() -> Self {
        Self {
            cache_leaf_completions: false,
            ..Self::new()
        }
    }

    /// Insert a fact, creating nodes on demand.
    ///
    /// With a graph, each node records the graph's deletion registrations
    /// for its `(word, sense)`. Without one, every token is recorded as
    /// its own sense-tagged variant of type 0.
    pub fn add(&mut self, fact: &[TaggedWord], graph: Option<&Graph>) {
        let mut node = ROOT;
        for (depth, token) in fact.iter().enumerate() {
            let word = token.word();
            let existing = self.nodes[node].children.get(&word).copied();
            let child = match existing {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(word, child);
                    child
                }
            };

            match graph {
                None => self.nodes[child].register_edge(Edge::deletion(
                    word,
                    u32::from(token.sense()),
                    EdgeTypeId(0),
                    INSERTION_COST,
                )),
                Some(graph) => {
                    for variant in graph.sense_variants(word) {
                        if variant.source_sense() == token.sense() || variant.source_sense() == 0 {
                            self.nodes[child].register_edge(variant);
                        }
                    }
                }
            }

            if depth + 1 == fact.len() {
                self.nodes[child].is_leaf = true;
                if self.cache_leaf_completions {
                    self.nodes[node].leaf_children.insert(word, child);
                }
            }
            node = child;
        }
    }

    /// Write the registered variants of `child` into `out`, tagged with
    /// `word`. Returns false once `out` is full.
    fn add_completion(&self, child: usize, word: Word, out: &mut Completions) -> bool {
        for edge in &self.nodes[child].edges {
            let completion = Edge::deletion(
                word,
                u32::from(edge.source_sense()),
                edge.edge_type(),
                INSERTION_COST,
            );
            if !out.push(completion) {
                return false;
            }
        }
        !out.is_full()
    }

    /// Completions for the children of `node`: all of them when there are
    /// at most `MAX_COMPLETIONS`, otherwise only the cached leaf children.
    fn add_children(&self, node: usize, out: &mut Completions) {
        let node = &self.nodes[node];
        let candidates = if node.children.len() <= MAX_COMPLETIONS {
            &node.children
        } else {
            &node.leaf_children
        };
        for (&word, &child) in candidates {
            if !self.add_completion(child, word, out) {
                break;
            }
        }
    }

    fn child(&self, node: usize, word: Word) -> Option<usize> {
        self.nodes[node].children.get(&word).copied()
    }

    /// Walk `query`; if `completion_depth` is reached, write the
    /// completions of the node at that depth. Returns the leaf flag of the
    /// final node, or false if the walk falls off the trie.
    fn walk(&self, query: &[TaggedWord], completion_depth: Option<usize>, out: &mut Completions) -> bool {
        let mut node = ROOT;
        for (depth, token) in query.iter().enumerate() {
            if completion_depth == Some(depth) {
                self.add_children(node, out);
            }
            match self.child(node, token.word()) {
                Some(child) => node = child,
                None => return false,
            }
        }
        if completion_depth == Some(query.len()) {
            self.add_children(node, out);
        }
        self.nodes[node].is_leaf
    }

    /// Containment with optional completions after a prefix.
    ///
    /// `After(i)` proposes the words that can follow `query[..=i]`.
    /// `SentenceStart` is only meaningful on a [`TrieRoot`]; here it
    /// proposes the root's children.
    pub fn contains(&self, query: &[TaggedWord], site: CompletionSite, out: &mut Completions) -> bool {
        let depth = match site {
            CompletionSite::None => None,
            CompletionSite::SentenceStart => Some(0),
            CompletionSite::After(index) if index < query.len() => Some(index + 1),
            CompletionSite::After(_) => None,
        };
        self.walk(query, depth, out)
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes.
    #[must_use]
    pub fn fact_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf).count()
    }

    #[must_use]
    pub fn memory_usage(&self) -> MemoryUsage {
        let mut usage = MemoryUsage::default();
        for node in &self.nodes {
            usage.structure_bytes += size_of::<TrieNode>() + node.edges.len() * size_of::<Edge>();
            usage.fact_bytes += node.children.len() * size_of::<Word>();
            usage.structure_bytes += node.children.len() * size_of::<usize>();
            usage.caching_bytes += node.leaf_children.len() * (size_of::<Word>() + size_of::<usize>());
        }
        usage
    }
}

// =============================================================================
// TRIE ROOT
// =============================================================================

/// The exact fact database: a [`Trie`] plus the sentence-start skip-gram
/// index.
#[derive(Debug, Clone, Default)]
pub struct TrieRoot {
    trie: Trie,
    /// second word -> legal first words
    skip_grams: BTreeMap<Word, BTreeSet<Word>>,
}

impl TrieRoot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fact and register its skip-gram `fact[1] -> fact[0]`.
    pub fn add(&mut self, fact: &[TaggedWord], graph: Option<&Graph>) {
        self.trie.add(fact, graph);
        if let [first, second, ..] = fact {
            self.skip_grams
                .entry(second.word())
                .or_default()
                .insert(first.word());
        }
    }

    fn add_sentence_start(&self, query: &[TaggedWord], out: &mut Completions) {
        let root = &self.trie.nodes[ROOT];
        match query.first() {
            Some(first) => match self.skip_grams.get(&first.word()) {
                Some(preceding) => {
                    for &word in preceding {
                        let Some(child) = self.trie.child(ROOT, word) else {
                            continue;
                        };
                        if !self.trie.add_completion(child, word, out) {
                            break;
                        }
                    }
                }
                None => {
                    for (&word, &child) in &root.children {
                        if !self.trie.add_completion(child, word, out) {
                            break;
                        }
                    }
                }
            },
            None => {
                for (&word, &child) in &root.children {
                    if self.trie.nodes[child].is_leaf && !self.trie.add_completion(child, word, out) {
                        break;
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn trie(&self) -> &Trie {
        &self.trie
    }
}

impl FactDb for TrieRoot {
    fn contains(&self, query: &[TaggedWord], site: CompletionSite, out: &mut Completions) -> bool {
        if site == CompletionSite::SentenceStart {
            self.add_sentence_start(query, out);
            return self.trie.contains(query, CompletionSite::None, out);
        }
        self.trie.contains(query, site, out)
    }

    fn memory_usage(&self) -> MemoryUsage {
        let mut usage = self.trie.memory_usage();
        for preceding in self.skip_grams.values() {
            usage.caching_bytes += size_of::<Word>()
                + size_of::<BTreeSet<Word>>()
                + preceding.len() * size_of::<Word>();
        }
        usage
    }
}

// =============================================================================
// TESTS
// =============================================================================
