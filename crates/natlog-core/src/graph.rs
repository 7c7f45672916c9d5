//! # Graph
//!
//! The lexical graph of natlog CORE: typed, costed edges over interned
//! words, loaded once and read-only afterwards.
//!
//! Answers three questions for Search and the loaders:
//! - which substitutions (and deletions) exist for a `(word, sense)`
//! - whether a word is registered as legally omissible
//! - whether a word is an operator, and with which signature
//!
//! Sources of quantifier edges are operators. Without a known gloss they
//! read as universal quantifiers.
//!
//! All data structures use `BTreeMap` for deterministic ordering.
//! Edges of one source word are kept in load order.

use crate::edge_types::{EdgeKind, EdgeTypeTable};
use crate::inference::Operator;
use crate::vocabulary::Vocabulary;
use crate::{Edge, EdgeTypeId, NatlogError, Word};
use std::collections::{BTreeMap, BTreeSet};

/// In-memory typed-edge index.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Resolves every stored edge type id.
    edge_types: EdgeTypeTable,

    /// source word -> outgoing edges (deletions included), in load order
    outgoing: BTreeMap<Word, Vec<Edge>>,

    /// source word -> registered deletion edges, in load order
    deletions: BTreeMap<Word, Vec<Edge>>,

    /// operator word -> scope signature
    operators: BTreeMap<Word, Operator>,

    edge_count: usize,
}

impl Graph {
    /// Create an empty graph over an edge-type table.
    #[must_use]
    pub fn new(edge_types: EdgeTypeTable) -> Self {
        Self {
            edge_types,
            ..Self::default()
        }
    }

    /// Add an edge. Fails if its type id is not in the table.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), NatlogError> {
        let kind = self.edge_types.resolve(edge.edge_type())?;

        if kind.is_quantifier() {
            for word in [edge.source(), edge.sink()] {
                if !word.is_null() {
                    self.operators.entry(word).or_insert(Operator::UNIVERSAL);
                }
            }
        }
        if edge.is_deletion() {
            self.deletions.entry(edge.source()).or_default().push(edge);
        }
        self.outgoing.entry(edge.source()).or_default().push(edge);
        self.edge_count += 1;
        Ok(())
    }

    /// Candidate mutations of `(word, sense)`: every edge out of `word`
    /// whose source sense is `sense`, or 0 for sense-agnostic edges.
    pub fn mutations_of(&self, word: Word, sense: u8) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing
            .get(&word)
            .into_iter()
            .flatten()
            .filter(move |e| e.source_sense() == sense || e.source_sense() == 0)
    }

    /// True if `(edge.source, edge.source_sense)` is registered as a
    /// legal deletion. A sense-0 registration covers every sense.
    #[must_use]
    pub fn contains_deletion(&self, edge: &Edge) -> bool {
        self.deletions.get(&edge.source()).is_some_and(|edges| {
            edges
                .iter()
                .any(|d| d.source_sense() == edge.source_sense() || d.source_sense() == 0)
        })
    }

    /// The distinct `(sense, type)` deletion registrations of `word`,
    /// ordered by type id, then load order.
    #[must_use]
    pub fn sense_variants(&self, word: Word) -> Vec<Edge> {
        let Some(edges) = self.deletions.get(&word) else {
            return Vec::new();
        };
        let mut seen = BTreeSet::new();
        let mut variants: Vec<Edge> = edges
            .iter()
            .filter(|e| seen.insert((e.source_sense(), e.edge_type())))
            .copied()
            .collect();
        variants.sort_by_key(Edge::edge_type);
        variants
    }

    /// Give `word` an explicit operator signature.
    pub fn register_operator(&mut self, word: Word, operator: Operator) {
        self.operators.insert(word, operator);
    }

    /// Register every vocabulary word whose gloss is a known operator.
    /// Returns how many were registered.
    pub fn register_operators(&mut self, vocabulary: &Vocabulary) -> usize {
        let mut registered = 0;
        for (word, gloss) in vocabulary.iter() {
            if let Some(operator) = Operator::from_gloss(gloss) {
                self.register_operator(word, operator);
                registered += 1;
            }
        }
        registered
    }

    /// The operator signature of `word`, if it is one.
    #[must_use]
    pub fn operator(&self, word: Word) -> Option<Operator> {
        self.operators.get(&word).copied()
    }

    #[must_use]
    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    #[must_use]
    pub fn edge_types(&self) -> &EdgeTypeTable {
        &self.edge_types
    }

    /// Resolve the kind of a stored edge.
    pub fn kind_of(&self, id: EdgeTypeId) -> Result<EdgeKind, NatlogError> {
        self.edge_types.resolve(id)
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    #[must_use]
    pub fn deletion_count(&self) -> usize {
        self.deletions.values().map(Vec::len).sum()
    }

    /// Number of distinct source words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.outgoing.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Graph {
        Graph::new(EdgeTypeTable::standard())
    }

    #[test]
    fn unknown_edge_type_is_rejected() {
        let mut g = graph();
        let edge = Edge::new(Word(1), 0, Word(2), 0, EdgeTypeId(200), 1.0);
        assert!(matches!(
            g.add_edge(edge),
            Err(NatlogError::UnknownEdgeType(200))
        ));
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn mutations_filter_by_sense() {
        let mut g = graph();
        g.add_edge(Edge::new(Word(1), 1, Word(2), 0, EdgeTypeId(0), 1.0))
            .expect("add");
        g.add_edge(Edge::new(Word(1), 2, Word(3), 0, EdgeTypeId(0), 1.0))
            .expect("add");
        g.add_edge(Edge::new(Word(1), 0, Word(4), 0, EdgeTypeId(1), 1.0))
            .expect("add");

        let sinks: Vec<Word> = g.mutations_of(Word(1), 1).map(Edge::sink).collect();
        assert_eq!(sinks, vec![Word(2), Word(4)]);

        let sinks: Vec<Word> = g.mutations_of(Word(1), 2).map(Edge::sink).collect();
        assert_eq!(sinks, vec![Word(3), Word(4)]);

        assert_eq!(g.mutations_of(Word(9), 0).count(), 0);
    }

    #[test]
    fn deletions_are_registered_per_sense() {
        let mut g = graph();
        g.add_edge(Edge::deletion(Word(5), 2, EdgeTypeId(16), 0.5))
            .expect("add");

        assert!(g.contains_deletion(&Edge::deletion(Word(5), 2, EdgeTypeId(0), 0.0)));
        assert!(!g.contains_deletion(&Edge::deletion(Word(5), 3, EdgeTypeId(0), 0.0)));
        assert!(!g.contains_deletion(&Edge::deletion(Word(6), 2, EdgeTypeId(0), 0.0)));
        assert_eq!(g.deletion_count(), 1);
    }

    #[test]
    fn sense_variants_are_distinct_and_type_ordered() {
        let mut g = graph();
        g.add_edge(Edge::deletion(Word(5), 1, EdgeTypeId(17), 1.0))
            .expect("add");
        g.add_edge(Edge::deletion(Word(5), 2, EdgeTypeId(16), 1.0))
            .expect("add");
        g.add_edge(Edge::deletion(Word(5), 2, EdgeTypeId(16), 3.0))
            .expect("add");

        let variants: Vec<(u8, EdgeTypeId)> = g
            .sense_variants(Word(5))
            .iter()
            .map(|e| (e.source_sense(), e.edge_type()))
            .collect();
        assert_eq!(
            variants,
            vec![(2, EdgeTypeId(16)), (1, EdgeTypeId(17))]
        );
        assert!(g.sense_variants(Word(6)).is_empty());
    }

    #[test]
    fn quantifier_edges_mark_operators() {
        let mut g = graph();
        g.add_edge(Edge::new(Word(10), 0, Word(11), 0, EdgeTypeId(14), 1.0))
            .expect("add");
        g.add_edge(Edge::new(Word(1), 0, Word(2), 0, EdgeTypeId(0), 1.0))
            .expect("add");

        assert_eq!(g.operator(Word(10)), Some(Operator::UNIVERSAL));
        assert_eq!(g.operator(Word(11)), Some(Operator::UNIVERSAL));
        assert_eq!(g.operator(Word(1)), None);
        assert_eq!(g.operator_count(), 2);
    }

    #[test]
    fn vocabulary_glosses_override_operator_signatures() {
        let mut g = graph();
        g.add_edge(Edge::new(Word(10), 0, Word(11), 0, EdgeTypeId(14), 1.0))
            .expect("add");
        let mut vocabulary = Vocabulary::new();
        vocabulary.insert(Word(10), "all");
        vocabulary.insert(Word(11), "some");
        vocabulary.insert(Word(12), "no");
        vocabulary.insert(Word(1), "cat");

        assert_eq!(g.register_operators(&vocabulary), 3);
        assert_eq!(g.operator(Word(11)), Some(Operator::EXISTENTIAL));
        assert_eq!(g.operator(Word(12)), Some(Operator::NEGATIVE));
        assert_eq!(g.operator(Word(1)), None);

        // a later quantifier edge keeps the registered signature
        g.add_edge(Edge::new(Word(11), 0, Word(10), 0, EdgeTypeId(15), 1.0))
            .expect("add");
        assert_eq!(g.operator(Word(11)), Some(Operator::EXISTENTIAL));
    }

    #[test]
    fn counts() {
        let mut g = graph();
        g.add_edge(Edge::new(Word(1), 0, Word(2), 0, EdgeTypeId(0), 1.0))
            .expect("add");
        g.add_edge(Edge::new(Word(3), 0, Word(2), 0, EdgeTypeId(0), 1.0))
            .expect("add");
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.word_count(), 2);
        assert_eq!(g.deletion_count(), 0);
    }
}
