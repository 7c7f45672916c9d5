//! # Validation Tier Tests (T0-T4)
//!
//! If ANY tier fails, the system is INVALID.
//!
//! ## Tiers
//! - T0: Bounded Values
//! - T1: Exact Fact Database
//! - T2: Lossy Fact Database
//! - T3: Search
//! - T4: Store Round Trip

use natlog_core::{
    CompletionSite, Completions, Cost, Edge, EdgeTypeId, EdgeTypeTable, Fact, FactDb, Graph,
    LoadConfig, MemoryFactSource, Monotonicity, NatlogError, Search, SearchBudget, SearchOutcome,
    TaggedWord, TrieRoot, Vocabulary, Word,
};

const LEMUR: u32 = 1;
const HAVE: u32 = 2;
const TAIL: u32 = 3;
const ANIMAL: u32 = 4;
const CAT: u32 = 5;

const HYPERNYM: EdgeTypeId = EdgeTypeId(0);
const ADD_NOUN: EdgeTypeId = EdgeTypeId(16);

fn fact(ids: &[u32]) -> Fact {
    Fact::from_words(ids).expect("fact")
}

fn animal_graph() -> Graph {
    let mut graph = Graph::new(EdgeTypeTable::standard());
    graph
        .add_edge(Edge::new(Word(LEMUR), 0, Word(ANIMAL), 0, HYPERNYM, 1.0))
        .expect("edge");
    graph
        .add_edge(Edge::new(Word(CAT), 0, Word(ANIMAL), 0, HYPERNYM, 1.0))
        .expect("edge");
    graph
}

fn animal_source() -> MemoryFactSource {
    MemoryFactSource::from_facts(&[(&[LEMUR, HAVE, TAIL], 10), (&[ANIMAL, HAVE, TAIL], 10)])
}

/// `(cat, have, tail)`, untagged: the bare subject reads generically.
fn cat_query() -> Fact {
    fact(&[CAT, HAVE, TAIL])
}

// =============================================================================
// TIER T0: BOUNDED VALUES
// =============================================================================

mod t0_bounded_values {
    use super::*;

    /// T0.1: Senses above 31 saturate.
    #[test]
    fn sense_saturates() {
        assert_eq!(TaggedWord::new(Word(9), 1000).sense(), 31);
        let edge = Edge::new(Word(1), 40, Word(2), 77, HYPERNYM, 1.0);
        assert_eq!(edge.source_sense(), 31);
        assert_eq!(edge.sink_sense(), 31);
    }

    /// T0.2: Negative edge costs clamp to zero.
    #[test]
    fn cost_clamps() {
        let edge = Edge::new(Word(1), 0, Word(2), 0, HYPERNYM, -0.5);
        assert_eq!(Cost::from_f32(edge.cost()), Cost::ZERO);
    }

    /// T0.3: Facts outside 1..=255 tokens are rejected.
    #[test]
    fn fact_length_bounds() {
        assert!(matches!(Fact::from_words(&[]), Err(NatlogError::EmptyFact)));
        let long: Vec<u32> = (1..=256).collect();
        assert!(matches!(
            Fact::from_words(&long),
            Err(NatlogError::FactTooLong(256))
        ));
    }

    /// T0.4: Edges with unknown type ids are rejected at load time.
    #[test]
    fn unknown_edge_type_rejected() {
        let mut graph = Graph::new(EdgeTypeTable::standard());
        let result = graph.add_edge(Edge::new(Word(1), 0, Word(2), 0, EdgeTypeId(200), 1.0));
        assert!(matches!(result, Err(NatlogError::UnknownEdgeType(200))));
    }
}

// =============================================================================
// TIER T1: EXACT FACT DATABASE
// =============================================================================

mod t1_exact_fact_db {
    use super::*;
    use natlog_core::build_fact_trie;

    /// T1.1: Every added fact is a leaf.
    #[test]
    fn added_facts_are_leaves() {
        let root = build_fact_trie(&animal_source(), &animal_graph(), &LoadConfig::default())
            .expect("build");
        assert!(root.is_fact(fact(&[LEMUR, HAVE, TAIL]).words()));
        assert!(root.is_fact(fact(&[ANIMAL, HAVE, TAIL]).words()));
    }

    /// T1.2: Strict prefixes are traversable but not leaves; registered
    /// words are proposed as completions.
    #[test]
    fn prefixes_are_not_leaves() {
        let mut graph = animal_graph();
        graph
            .add_edge(Edge::deletion(Word(TAIL), 0, ADD_NOUN, 1.0))
            .expect("edge");
        let root =
            build_fact_trie(&animal_source(), &graph, &LoadConfig::default()).expect("build");
        let mut out = Completions::new();
        assert!(!root.contains(
            fact(&[LEMUR, HAVE]).words(),
            CompletionSite::After(1),
            &mut out
        ));
        assert_eq!(out.len(), 1);
        assert_eq!(out.as_slice()[0].source(), Word(TAIL));
    }

    /// T1.3: Weight filtering stops the stream.
    #[test]
    fn min_fact_count_filters() {
        let source = MemoryFactSource::from_facts(&[(&[1, 2], 5), (&[3, 4], 1)]);
        let config = LoadConfig {
            min_fact_count: 2,
            max_facts: None,
        };
        let root = build_fact_trie(&source, &animal_graph(), &config).expect("build");
        assert!(root.is_fact(fact(&[1, 2]).words()));
        assert!(!root.is_fact(fact(&[3, 4]).words()));
    }
}

// =============================================================================
// TIER T2: LOSSY FACT DATABASE
// =============================================================================

mod t2_lossy_fact_db {
    use super::*;
    use natlog_core::build_lossy_trie;
    use natlog_core::primitives::DEFAULT_HISTOGRAM_CAPACITY;

    /// T2.1: Both facts are found; the shared prefix carries two records.
    #[test]
    fn two_facts_share_a_bucket() {
        let source = MemoryFactSource::from_facts(&[(&[1, 2, 3], 10), (&[1, 2, 4], 10)]);
        let config = LoadConfig {
            min_fact_count: 5,
            max_facts: None,
        };
        let graph = Graph::new(EdgeTypeTable::standard());
        let trie =
            build_lossy_trie(&source, &graph, &config, DEFAULT_HISTOGRAM_CAPACITY).expect("build");

        assert!(trie.is_fact(fact(&[1, 2, 3]).words()));
        assert!(trie.is_fact(fact(&[1, 2, 4]).words()));

        let bucket = trie.bucket(&[Word(1), Word(2)]).expect("bucket");
        assert!(bucket.has_completions());
        let sources: Vec<Word> = bucket.records().iter().map(|r| r.source()).collect();
        assert_eq!(sources, vec![Word(3), Word(4)]);
    }

    /// T2.2: Begin insertions list every sense variant of the first word.
    #[test]
    fn begin_insertions_cover_sense_variants() {
        let mut graph = Graph::new(EdgeTypeTable::standard());
        graph
            .add_edge(Edge::deletion(Word(1), 1, ADD_NOUN, 1.0))
            .expect("edge");
        graph
            .add_edge(Edge::deletion(Word(1), 2, ADD_NOUN, 1.0))
            .expect("edge");
        let source = MemoryFactSource::from_facts(&[(&[1, 2, 3], 10)]);
        let trie = build_lossy_trie(&source, &graph, &LoadConfig::default(), 64).expect("build");

        let records = trie.begin_insertions(Word(2));
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.source() == Word(1)));

        let mut out = Completions::new();
        trie.contains(
            fact(&[2, 3]).words(),
            CompletionSite::SentenceStart,
            &mut out,
        );
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| e.is_deletion() && e.source() == Word(1)));
        let senses: Vec<u8> = out.iter().map(|e| e.source_sense()).collect();
        assert_eq!(senses, vec![1, 2]);
    }

    /// T2.3: Lossy and exact databases agree on membership.
    #[test]
    fn agrees_with_exact_trie() {
        let graph = animal_graph();
        let config = LoadConfig::default();
        let exact = natlog_core::build_fact_trie(&animal_source(), &graph, &config).expect("exact");
        let lossy = build_lossy_trie(&animal_source(), &graph, &config, 16).expect("lossy");
        for ids in [
            &[LEMUR, HAVE, TAIL][..],
            &[ANIMAL, HAVE, TAIL],
            &[CAT, HAVE, TAIL],
            &[LEMUR, HAVE],
        ] {
            let query = fact(ids);
            assert_eq!(exact.is_fact(query.words()), lossy.is_fact(query.words()));
        }
    }
}

// =============================================================================
// TIER T3: SEARCH
// =============================================================================

mod t3_search {
    use super::*;
    use natlog_core::{build_fact_trie, build_lossy_trie};

    fn exact() -> TrieRoot {
        build_fact_trie(&animal_source(), &animal_graph(), &LoadConfig::default()).expect("build")
    }

    /// T3.1: A stored query is proven immediately.
    #[test]
    fn stored_fact_is_proven() {
        let graph = animal_graph();
        let facts = exact();
        let outcome =
            Search::new(&graph, &facts).run(&fact(&[LEMUR, HAVE, TAIL]), &SearchBudget::default());
        assert!(outcome.is_proven());
        assert!(outcome.path().expect("path").is_empty());
    }

    /// T3.2: One hypernym substitution reaches a stored fact.
    #[test]
    fn one_step_substitution() {
        let graph = animal_graph();
        let facts = exact();
        let query = Fact::from_words(&[CAT, HAVE, TAIL]).expect("query");
        let outcome = Search::new(&graph, &facts).run(&query, &SearchBudget::default());

        let path = outcome.path().expect("path");
        assert!(outcome.is_proven());
        assert_eq!(path.len(), 1);
        assert_eq!(path.steps[0].mutation.edge().source(), Word(CAT));
        assert_eq!(path.steps[0].mutation.edge().sink(), Word(ANIMAL));
        assert_eq!(path.final_fact().word_ids(), vec![Word(ANIMAL), Word(HAVE), Word(TAIL)]);
        assert_eq!(path.cost(), Cost::from_f32(1.0));
    }

    /// T3.3: A zero-step budget never proves a non-stored query.
    #[test]
    fn zero_step_budget() {
        let graph = animal_graph();
        let facts = exact();
        let budget = SearchBudget {
            max_steps: 0,
            ..SearchBudget::default()
        };
        let outcome = Search::new(&graph, &facts).run(&cat_query(), &budget);
        assert!(matches!(outcome, SearchOutcome::NotProven { .. }));
    }

    /// T3.4: The same proof is found over the lossy database.
    #[test]
    fn lossy_search_matches_exact() {
        let graph = animal_graph();
        let exact = exact();
        let lossy = build_lossy_trie(&animal_source(), &graph, &LoadConfig::default(), 16)
            .expect("build");

        let a = Search::new(&graph, &exact).run(&cat_query(), &SearchBudget::default());
        let b = Search::new(&graph, &lossy).run(&cat_query(), &SearchBudget::default());
        assert_eq!(
            a.path().map(|p| p.final_fact().clone()),
            b.path().map(|p| p.final_fact().clone())
        );
    }

    /// T3.5: Search works through a trait object.
    #[test]
    fn dyn_fact_db() {
        let graph = animal_graph();
        let facts: Box<dyn FactDb> = Box::new(exact());
        let outcome = Search::new(&graph, facts.as_ref()).run(&cat_query(), &SearchBudget::default());
        let path = outcome.path().expect("path");
        assert_eq!(path.replay().as_ref(), Some(path.final_fact()));
    }

    /// T3.6: An explicit upward marker on the subject blocks generalising it.
    #[test]
    fn marker_overrides_generic_reading() {
        let graph = animal_graph();
        let facts = exact();
        let mut query = cat_query();
        query.set_monotonicity(0, Monotonicity::Up);
        let outcome = Search::new(&graph, &facts).run(&query, &SearchBudget::default());
        assert!(matches!(outcome, SearchOutcome::NotProven { .. }));
    }

    /// T3.7: `some -> all` puts the restrictor in a downward context, which
    /// then licenses `cat -> animal`.
    #[test]
    fn quantifier_scope_is_recomputed() {
        const ALL: u32 = 10;
        const SOME: u32 = 11;
        let mut graph = animal_graph();
        graph
            .add_edge(Edge::new(Word(SOME), 0, Word(ALL), 0, EdgeTypeId(15), 0.5))
            .expect("edge");
        let mut vocabulary = Vocabulary::new();
        vocabulary.insert(Word(ALL), "all");
        vocabulary.insert(Word(SOME), "some");
        assert_eq!(graph.register_operators(&vocabulary), 2);

        let source = MemoryFactSource::from_facts(&[(&[ALL, ANIMAL, HAVE, TAIL], 10)]);
        let facts = build_fact_trie(&source, &graph, &LoadConfig::default()).expect("build");

        let outcome = Search::new(&graph, &facts)
            .run(&fact(&[SOME, CAT, HAVE, TAIL]), &SearchBudget::default());
        let path = outcome.path().expect("path");
        assert!(outcome.is_proven());
        let sources: Vec<Word> = path.steps.iter().map(|s| s.mutation.edge().source()).collect();
        assert_eq!(sources, vec![Word(SOME), Word(CAT)]);
        assert_eq!(path.cost(), Cost::from_f32(1.5));
    }
}

// =============================================================================
// TIER T4: STORE ROUND TRIP
// =============================================================================

mod t4_store_round_trip {
    use super::*;
    use natlog_core::loader::{parse_edge_row, parse_fact_row, parse_lines, parse_vocab_row};
    use natlog_core::{FactStore, Operator, build_lossy_trie};
    use tempfile::TempDir;

    const FACTS_TSV: &str = "{1,2,3}\t10\n{4,2,3}\t10\n";
    const EDGES_TSV: &str = "5\t0\t4\t0\t0\t1.0\n1\t0\t4\t0\t0\t1.0\n";
    const VOCAB_TSV: &str = "1\tlemur\n2\thave\n3\ttail\n4\tanimal\n5\tcat\n";

    fn store(dir: &TempDir) -> FactStore {
        let mut store = FactStore::open(dir.path().join("natlog.redb")).expect("open");
        store
            .insert_facts(&parse_lines(FACTS_TSV, parse_fact_row).expect("facts"))
            .expect("insert facts");
        store
            .insert_edges(&parse_lines(EDGES_TSV, parse_edge_row).expect("edges"))
            .expect("insert edges");
        store
            .insert_vocabulary(&parse_lines(VOCAB_TSV, parse_vocab_row).expect("vocab"))
            .expect("insert vocab");
        store
    }

    /// T4.1: Imported rows are counted.
    #[test]
    fn counts_after_import() {
        let dir = TempDir::new().expect("tempdir");
        let counts = store(&dir).counts().expect("counts");
        assert_eq!(counts.facts, 2);
        assert_eq!(counts.edges, 2);
        assert_eq!(counts.vocabulary, 5);
    }

    /// T4.2: A search over structures built from the store succeeds.
    #[test]
    fn search_from_store() {
        let dir = TempDir::new().expect("tempdir");
        let store = store(&dir);
        let graph = store.load_graph().expect("graph");
        let trie = build_lossy_trie(&store, &graph, &LoadConfig::default(), 16).expect("build");

        let outcome = Search::new(&graph, &trie).run(&cat_query(), &SearchBudget::default());
        assert!(outcome.is_proven());

        let vocabulary = store.load_vocabulary().expect("vocabulary");
        let glosses: Vec<&str> = outcome
            .path()
            .expect("path")
            .final_fact()
            .iter()
            .filter_map(|t| vocabulary.gloss(t.word()))
            .collect();
        assert_eq!(glosses, vec!["animal", "have", "tail"]);
    }

    /// T4.3: Operator words in the stored vocabulary get their signature.
    #[test]
    fn store_registers_operator_words() {
        let dir = TempDir::new().expect("tempdir");
        let mut store = store(&dir);
        store
            .insert_vocabulary(&parse_lines("10\tall\n11\tno\n", parse_vocab_row).expect("vocab"))
            .expect("insert vocab");

        let graph = store.load_graph().expect("graph");
        assert_eq!(graph.operator(Word(10)), Some(Operator::UNIVERSAL));
        assert_eq!(graph.operator(Word(11)), Some(Operator::NEGATIVE));
        assert_eq!(graph.operator(Word(CAT)), None);
    }
}
