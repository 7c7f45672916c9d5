//! # Edge Types
//!
//! The closed set of edge kinds the graph can carry, and the immutable
//! id → kind table that is resolved once at load time.
//!
//! The table is passed explicitly to every component that needs to
//! interpret an edge; there is no global registry. Ids that are not in
//! the table are rejected when an edge is added to the graph.

use crate::inference::Relation;
use crate::{EdgeTypeId, NatlogError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kinds of lexical edges understood by Search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Hypernym,
    Hyponym,
    NounAntonym,
    NounSynonym,
    VerbAntonym,
    AdjectiveAntonym,
    AdjectivePertainym,
    AdverbPertainym,
    AdjectiveRelated,
    NearestNeighbor,
    FreebaseUp,
    FreebaseDown,
    QuantifierReword,
    QuantifierNegate,
    QuantifierUp,
    QuantifierDown,
    /// Morphology types (`add_*` / `del_*`) that register legal
    /// insertions and deletions.
    Insertion,
}

impl EdgeKind {
    /// Resolve a kind from its edge-type table name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "wordnet_up" => Self::Hypernym,
            "wordnet_down" => Self::Hyponym,
            "wordnet_noun_antonym" => Self::NounAntonym,
            "wordnet_noun_synonym" => Self::NounSynonym,
            "wordnet_verb_antonym" => Self::VerbAntonym,
            "wordnet_adjective_antonym" => Self::AdjectiveAntonym,
            "wordnet_adjective_pertainym" => Self::AdjectivePertainym,
            "wordnet_adverb_pertainym" => Self::AdverbPertainym,
            "wordnet_adjective_related" => Self::AdjectiveRelated,
            "angle_nn" => Self::NearestNeighbor,
            "freebase_up" => Self::FreebaseUp,
            "freebase_down" => Self::FreebaseDown,
            "quantifier_reword" => Self::QuantifierReword,
            "quantifier_negate" => Self::QuantifierNegate,
            "quantifier_up" => Self::QuantifierUp,
            "quantifier_down" => Self::QuantifierDown,
            other if other.starts_with("add_") || other.starts_with("del_") => Self::Insertion,
            _ => return None,
        };
        Some(kind)
    }

    /// True for the kinds that rewrite one quantifier into another.
    #[must_use]
    pub const fn is_quantifier(self) -> bool {
        matches!(
            self,
            Self::QuantifierReword | Self::QuantifierNegate | Self::QuantifierUp | Self::QuantifierDown
        )
    }

    /// Relation of an edge's sink to its source when substituted in an
    /// upward-monotone context.
    #[must_use]
    pub const fn lexical_relation(self) -> Relation {
        match self {
            Self::Hypernym | Self::FreebaseUp | Self::QuantifierUp => Relation::Reverse,
            Self::Hyponym | Self::FreebaseDown | Self::QuantifierDown => Relation::Forward,
            Self::NounAntonym | Self::VerbAntonym | Self::AdjectiveAntonym => {
                Relation::Alternation
            }
            Self::NounSynonym
            | Self::AdjectivePertainym
            | Self::AdverbPertainym
            | Self::AdjectiveRelated
            | Self::NearestNeighbor
            | Self::QuantifierReword => Relation::Equivalent,
            Self::QuantifierNegate => Relation::Negation,
            Self::Insertion => Relation::Independent,
        }
    }
}

/// One row of the external edge-type interning table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeTypeRow {
    pub id: u8,
    pub name: String,
}

/// Canonical names, in id order.
const STANDARD_NAMES: &[&str] = &[
    "wordnet_up",
    "wordnet_down",
    "wordnet_noun_antonym",
    "wordnet_noun_synonym",
    "wordnet_verb_antonym",
    "wordnet_adjective_antonym",
    "wordnet_adjective_pertainym",
    "wordnet_adverb_pertainym",
    "wordnet_adjective_related",
    "angle_nn",
    "freebase_up",
    "freebase_down",
    "quantifier_reword",
    "quantifier_negate",
    "quantifier_up",
    "quantifier_down",
    "add_noun",
    "add_verb",
    "add_adj",
    "add_adv",
    "add_other",
];

/// Immutable edge-type table: id → (name, kind).
#[derive(Debug, Clone, Default)]
pub struct EdgeTypeTable {
    entries: BTreeMap<EdgeTypeId, (String, EdgeKind)>,
}

impl EdgeTypeTable {
    /// Build a table from interning rows.
    ///
    /// Fails on duplicate ids and on names that map to no known kind.
    pub fn from_rows(rows: impl IntoIterator<Item = EdgeTypeRow>) -> Result<Self, NatlogError> {
        let mut entries = BTreeMap::new();
        for row in rows {
            let kind = EdgeKind::from_name(&row.name)
                .ok_or_else(|| NatlogError::UnknownEdgeTypeName(row.name.clone()))?;
            if entries.insert(EdgeTypeId(row.id), (row.name, kind)).is_some() {
                return Err(NatlogError::DuplicateEdgeType(row.id));
            }
        }
        Ok(Self { entries })
    }

    /// The canonical table (`wordnet_up` = 0, `wordnet_down` = 1,
    /// `wordnet_noun_antonym` = 2, ...).
    #[must_use]
    pub fn standard() -> Self {
        let entries = STANDARD_NAMES
            .iter()
            .enumerate()
            .filter_map(|(id, name)| {
                EdgeKind::from_name(name)
                    .map(|kind| (EdgeTypeId(id as u8), ((*name).to_string(), kind)))
            })
            .collect();
        Self { entries }
    }

    /// The rows of this table, in id order.
    #[must_use]
    pub fn rows(&self) -> Vec<EdgeTypeRow> {
        self.entries
            .iter()
            .map(|(id, (name, _))| EdgeTypeRow {
                id: id.0,
                name: name.clone(),
            })
            .collect()
    }

    /// Kind of a type id, if registered.
    #[must_use]
    pub fn kind(&self, id: EdgeTypeId) -> Option<EdgeKind> {
        self.entries.get(&id).map(|(_, kind)| *kind)
    }

    /// Kind of a type id, failing on unregistered ids.
    pub fn resolve(&self, id: EdgeTypeId) -> Result<EdgeKind, NatlogError> {
        self.kind(id).ok_or(NatlogError::UnknownEdgeType(id.0))
    }

    /// Name of a type id, if registered.
    #[must_use]
    pub fn name(&self, id: EdgeTypeId) -> Option<&str> {
        self.entries.get(&id).map(|(name, _)| name.as_str())
    }

    /// First id registered for a kind.
    #[must_use]
    pub fn id_of(&self, kind: EdgeKind) -> Option<EdgeTypeId> {
        self.entries
            .iter()
            .find(|(_, (_, k))| *k == kind)
            .map(|(id, _)| *id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
