//! # redb-backed Fact Store
//!
//! A snapshot of the external relational tables in a redb database:
//! facts, edges, edge types and vocabulary.
//!
//! Facts are keyed by `(u32::MAX - weight, sequence)` so that a plain
//! forward scan yields them in descending weight order, ties in import
//! order. That makes the store a [`FactSource`] that both LossyTrie
//! passes can read identically.
//!
//! Each bulk insert runs in a single write transaction and validates
//! every row before the transaction opens, so a malformed batch leaves
//! the store untouched.

use crate::edge_types::{EdgeKind, EdgeTypeRow, EdgeTypeTable};
use crate::graph::Graph;
use crate::loader::{self, FactRow, FactSource, LoadConfig, VocabRow};
use crate::vocabulary::Vocabulary;
use crate::{EdgeRow, NatlogError, Word};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Table for facts: (inverted weight, sequence) -> gloss
const FACTS: TableDefinition<(u32, u64), &str> = TableDefinition::new("facts");

/// Table for edges: sequence -> postcard-encoded `EdgeRow`
const EDGES: TableDefinition<u64, &[u8]> = TableDefinition::new("edges");

/// Table for edge types: id -> name
const EDGE_TYPES: TableDefinition<u8, &str> = TableDefinition::new("edge_types");

/// Table for vocabulary: word id -> gloss
const VOCABULARY: TableDefinition<u32, &str> = TableDefinition::new("vocabulary");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_FACT_SEQ: &str = "next_fact_seq";
const NEXT_EDGE_SEQ: &str = "next_edge_seq";

fn storage_error(e: impl std::fmt::Display) -> NatlogError {
    NatlogError::StorageError(e.to_string())
}

/// Row counts of every table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub facts: u64,
    pub edges: u64,
    pub edge_types: u64,
    pub vocabulary: u64,
}

/// The redb fact store.
pub struct FactStore {
    db: Database,
}

impl std::fmt::Debug for FactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactStore").finish_non_exhaustive()
    }
}

impl FactStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NatlogError> {
        let db = Database::create(path.as_ref()).map_err(storage_error)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(storage_error)?;
            let _ = write_txn.open_table(FACTS).map_err(storage_error)?;
            let _ = write_txn.open_table(EDGES).map_err(storage_error)?;
            let _ = write_txn.open_table(EDGE_TYPES).map_err(storage_error)?;
            let _ = write_txn.open_table(VOCABULARY).map_err(storage_error)?;
            let _ = write_txn.open_table(METADATA).map_err(storage_error)?;
            write_txn.commit().map_err(storage_error)?;
        }

        Ok(Self { db })
    }

    /// Append fact rows. Every gloss is validated first.
    pub fn insert_facts(&mut self, rows: &[FactRow]) -> Result<usize, NatlogError> {
        for row in rows {
            loader::parse_gloss(&row.gloss)?;
        }

        let write_txn = self.db.begin_write().map_err(storage_error)?;
        {
            let mut facts = write_txn.open_table(FACTS).map_err(storage_error)?;
            let mut meta = write_txn.open_table(METADATA).map_err(storage_error)?;
            let mut seq = meta
                .get(NEXT_FACT_SEQ)
                .map_err(storage_error)?
                .map(|v| v.value())
                .unwrap_or(0);
            for row in rows {
                facts
                    .insert((u32::MAX - row.weight, seq), row.gloss.as_str())
                    .map_err(storage_error)?;
                seq = seq.saturating_add(1);
            }
            meta.insert(NEXT_FACT_SEQ, seq).map_err(storage_error)?;
        }
        write_txn.commit().map_err(storage_error)?;
        debug!(rows = rows.len(), "Inserted facts");
        Ok(rows.len())
    }

    /// Append edge rows.
    pub fn insert_edges(&mut self, rows: &[EdgeRow]) -> Result<usize, NatlogError> {
        let encoded = rows
            .iter()
            .map(|row| {
                postcard::to_allocvec(row)
                    .map_err(|e| NatlogError::SerializationError(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let write_txn = self.db.begin_write().map_err(storage_error)?;
        {
            let mut edges = write_txn.open_table(EDGES).map_err(storage_error)?;
            let mut meta = write_txn.open_table(METADATA).map_err(storage_error)?;
            let mut seq = meta
                .get(NEXT_EDGE_SEQ)
                .map_err(storage_error)?
                .map(|v| v.value())
                .unwrap_or(0);
            for bytes in &encoded {
                edges
                    .insert(seq, bytes.as_slice())
                    .map_err(storage_error)?;
                seq = seq.saturating_add(1);
            }
            meta.insert(NEXT_EDGE_SEQ, seq).map_err(storage_error)?;
        }
        write_txn.commit().map_err(storage_error)?;
        debug!(rows = rows.len(), "Inserted edges");
        Ok(rows.len())
    }

    /// Insert or replace edge types. Names must be known kinds.
    pub fn insert_edge_types(&mut self, rows: &[EdgeTypeRow]) -> Result<usize, NatlogError> {
        for row in rows {
            EdgeKind::from_name(&row.name)
                .ok_or_else(|| NatlogError::UnknownEdgeTypeName(row.name.clone()))?;
        }

        let write_txn = self.db.begin_write().map_err(storage_error)?;
        {
            let mut table = write_txn.open_table(EDGE_TYPES).map_err(storage_error)?;
            for row in rows {
                table
                    .insert(row.id, row.name.as_str())
                    .map_err(storage_error)?;
            }
        }
        write_txn.commit().map_err(storage_error)?;
        Ok(rows.len())
    }

    /// Insert or replace vocabulary entries.
    pub fn insert_vocabulary(&mut self, rows: &[VocabRow]) -> Result<usize, NatlogError> {
        let write_txn = self.db.begin_write().map_err(storage_error)?;
        {
            let mut table = write_txn.open_table(VOCABULARY).map_err(storage_error)?;
            for row in rows {
                table
                    .insert(row.id, row.gloss.as_str())
                    .map_err(storage_error)?;
            }
        }
        write_txn.commit().map_err(storage_error)?;
        Ok(rows.len())
    }

    /// The stored edge-type table, or the standard one if none was
    /// imported.
    pub fn load_edge_types(&self) -> Result<EdgeTypeTable, NatlogError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let table = read_txn.open_table(EDGE_TYPES).map_err(storage_error)?;
        let mut rows = Vec::new();
        for entry in table.iter().map_err(storage_error)? {
            let (key, value) = entry.map_err(storage_error)?;
            rows.push(EdgeTypeRow {
                id: key.value(),
                name: value.value().to_string(),
            });
        }
        if rows.is_empty() {
            debug!("No edge types stored; using the standard table");
            return Ok(EdgeTypeTable::standard());
        }
        EdgeTypeTable::from_rows(rows)
    }

    /// All edge rows, in import order.
    pub fn load_edges(&self) -> Result<Vec<EdgeRow>, NatlogError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let table = read_txn.open_table(EDGES).map_err(storage_error)?;
        let mut rows = Vec::new();
        for entry in table.iter().map_err(storage_error)? {
            let (_, value) = entry.map_err(storage_error)?;
            let row: EdgeRow = postcard::from_bytes(value.value())
                .map_err(|e| NatlogError::SerializationError(e.to_string()))?;
            rows.push(row);
        }
        Ok(rows)
    }

    /// Build the graph from the stored edge types and edges, with the
    /// operator words of the stored vocabulary registered.
    pub fn load_graph(&self) -> Result<Graph, NatlogError> {
        let edge_types = self.load_edge_types()?;
        let mut graph = loader::load_graph(edge_types, self.load_edges()?)?;
        let operators = graph.register_operators(&self.load_vocabulary()?);
        debug!(operators, "Registered operator words");
        Ok(graph)
    }

    pub fn load_vocabulary(&self) -> Result<Vocabulary, NatlogError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let table = read_txn.open_table(VOCABULARY).map_err(storage_error)?;
        let mut vocabulary = Vocabulary::new();
        for entry in table.iter().map_err(storage_error)? {
            let (key, value) = entry.map_err(storage_error)?;
            vocabulary.insert(Word(key.value()), value.value());
        }
        Ok(vocabulary)
    }

    /// Row counts of every table.
    pub fn counts(&self) -> Result<StoreCounts, NatlogError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let facts = read_txn.open_table(FACTS).map_err(storage_error)?;
        let edges = read_txn.open_table(EDGES).map_err(storage_error)?;
        let edge_types = read_txn.open_table(EDGE_TYPES).map_err(storage_error)?;
        let vocabulary = read_txn.open_table(VOCABULARY).map_err(storage_error)?;
        Ok(StoreCounts {
            facts: facts.len().map_err(storage_error)?,
            edges: edges.len().map_err(storage_error)?,
            edge_types: edge_types.len().map_err(storage_error)?,
            vocabulary: vocabulary.len().map_err(storage_error)?,
        })
    }
}

impl FactSource for FactStore {
    fn for_each_fact(
        &self,
        config: &LoadConfig,
        f: &mut dyn FnMut(&[Word]) -> Result<(), NatlogError>,
    ) -> Result<usize, NatlogError> {
        let read_txn = self.db.begin_read().map_err(storage_error)?;
        let table = read_txn.open_table(FACTS).map_err(storage_error)?;
        let rows = table
            .iter()
            .map_err(storage_error)?
            .map(|entry| -> Result<FactRow, NatlogError> {
                let (key, value) = entry.map_err(storage_error)?;
                let (inverted_weight, _) = key.value();
                Ok(FactRow {
                    gloss: value.value().to_string(),
                    weight: u32::MAX - inverted_weight,
                })
            });
        loader::stream_fact_rows(rows, config, f)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fact(gloss: &str, weight: u32) -> FactRow {
        FactRow {
            gloss: gloss.to_string(),
            weight,
        }
    }

    #[test]
    fn facts_stream_in_descending_weight() {
        let temp = tempdir().expect("temp dir");
        let mut store = FactStore::open(temp.path().join("facts.redb")).expect("open");
        store
            .insert_facts(&[fact("{1}", 3), fact("{2}", 9), fact("{3}", 3)])
            .expect("insert");

        let mut seen = Vec::new();
        let count = store
            .for_each_fact(&LoadConfig::default(), &mut |w| {
                seen.push(w[0]);
                Ok(())
            })
            .expect("stream");
        assert_eq!(count, 3);
        assert_eq!(seen, vec![Word(2), Word(1), Word(3)]);
    }

    #[test]
    fn malformed_batch_is_rejected_atomically() {
        let temp = tempdir().expect("temp dir");
        let mut store = FactStore::open(temp.path().join("facts.redb")).expect("open");
        let result = store.insert_facts(&[fact("{1,2}", 3), fact("{1,oops}", 3)]);
        assert!(matches!(result, Err(NatlogError::MalformedRow { .. })));
        assert_eq!(store.counts().expect("counts").facts, 0);
    }

    #[test]
    fn graph_roundtrips_through_store() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("facts.redb");
        {
            let mut store = FactStore::open(&path).expect("open");
            store
                .insert_edges(&[
                    EdgeRow {
                        source: 1,
                        source_sense: 0,
                        sink: 2,
                        sink_sense: 0,
                        edge_type: 0,
                        cost: 1.0,
                    },
                    EdgeRow {
                        source: 3,
                        source_sense: 1,
                        sink: 0,
                        sink_sense: 0,
                        edge_type: 16,
                        cost: -1.0,
                    },
                ])
                .expect("edges");
        }

        let store = FactStore::open(&path).expect("reopen");
        let graph = store.load_graph().expect("graph");
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.deletion_count(), 1);
        assert_eq!(store.counts().expect("counts").edges, 2);
    }

    #[test]
    fn stored_edge_types_replace_standard_table() {
        let temp = tempdir().expect("temp dir");
        let mut store = FactStore::open(temp.path().join("facts.redb")).expect("open");
        assert_eq!(
            store.load_edge_types().expect("types").len(),
            EdgeTypeTable::standard().len()
        );

        store
            .insert_edge_types(&[EdgeTypeRow {
                id: 7,
                name: "wordnet_up".to_string(),
            }])
            .expect("types");
        let table = store.load_edge_types().expect("types");
        assert_eq!(table.len(), 1);
        assert_eq!(table.kind(crate::EdgeTypeId(7)), Some(EdgeKind::Hypernym));

        assert!(
            store
                .insert_edge_types(&[EdgeTypeRow {
                    id: 8,
                    name: "nonsense".to_string(),
                }])
                .is_err()
        );
    }

    #[test]
    fn vocabulary_roundtrip() {
        let temp = tempdir().expect("temp dir");
        let mut store = FactStore::open(temp.path().join("facts.redb")).expect("open");
        store
            .insert_vocabulary(&[VocabRow {
                id: 5,
                gloss: "tail".to_string(),
            }])
            .expect("vocab");
        let vocabulary = store.load_vocabulary().expect("vocab");
        assert_eq!(vocabulary.gloss(Word(5)), Some("tail"));
    }
}
