//! # Inference Rules
//!
//! Natural-logic bookkeeping for Search.
//!
//! Every mutation relates the mutated fact to its predecessor by one of
//! seven set relations. The relation is first projected through the
//! polarity of the mutated token, then folded into the running truth
//! state of the path. A path whose truth state survives every step is a
//! proof; one that ends in `Contradicts` is a refutation.
//!
//! ## Polarity
//!
//! The polarity of each token is recomputed from the fact itself. An
//! operator (a quantifier or negation) puts the token right after it in
//! its restrictor and every later token in its body. A fact that does not
//! open with an operator reads generically, as if under `all`. Nested
//! operators compose with the polarity they sit in. An explicit marker on
//! a token overrides the computed polarity of that token only.

use crate::{Monotonicity, TaggedWord, Word};
use serde::{Deserialize, Serialize};

/// Relation of a mutated fact (or token) to its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Same denotation.
    Equivalent,
    /// The new fact is more specific: it entails the old one.
    Forward,
    /// The new fact is more general: it is entailed by the old one.
    Reverse,
    /// Exhaustive exclusion.
    Negation,
    /// Non-exhaustive exclusion (e.g. antonyms).
    Alternation,
    /// Exhaustive non-exclusion.
    Cover,
    /// Nothing can be concluded.
    Independent,
}

/// Project a lexical relation through the polarity of its context.
#[must_use]
pub const fn project(relation: Relation, monotonicity: Monotonicity) -> Relation {
    match monotonicity {
        Monotonicity::Up => relation,
        Monotonicity::Down => match relation {
            Relation::Forward => Relation::Reverse,
            Relation::Reverse => Relation::Forward,
            Relation::Alternation => Relation::Cover,
            Relation::Cover => Relation::Alternation,
            other => other,
        },
        Monotonicity::Flat => match relation {
            Relation::Equivalent => Relation::Equivalent,
            _ => Relation::Independent,
        },
    }
}

/// Polarity of an inner context seen from an outer one.
#[must_use]
pub const fn compose(outer: Monotonicity, inner: Monotonicity) -> Monotonicity {
    match (outer, inner) {
        (Monotonicity::Up, inner) => inner,
        (Monotonicity::Down, Monotonicity::Up) => Monotonicity::Down,
        (Monotonicity::Down, Monotonicity::Down) => Monotonicity::Up,
        (Monotonicity::Flat, _) | (_, Monotonicity::Flat) => Monotonicity::Flat,
    }
}

// =============================================================================
// OPERATORS
// =============================================================================

/// Monotonicity signature of a quantifier or negation word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Operator {
    /// Polarity of the token right after the operator.
    pub restrictor: Monotonicity,
    /// Polarity of every later token.
    pub body: Monotonicity,
}

impl Operator {
    /// `all`, `every`: also the reading of a fact with no leading operator.
    pub const UNIVERSAL: Self = Self::new(Monotonicity::Down, Monotonicity::Up);
    /// `some`, `a`
    pub const EXISTENTIAL: Self = Self::new(Monotonicity::Up, Monotonicity::Up);
    /// `no`, `none`
    pub const NEGATIVE: Self = Self::new(Monotonicity::Down, Monotonicity::Down);
    /// `most`, `many`
    pub const PROPORTIONAL: Self = Self::new(Monotonicity::Flat, Monotonicity::Up);
    /// `few`
    pub const FEW: Self = Self::new(Monotonicity::Flat, Monotonicity::Down);
    /// `not`, `never`: flips everything after it.
    pub const NEGATION: Self = Self::new(Monotonicity::Down, Monotonicity::Down);

    #[must_use]
    pub const fn new(restrictor: Monotonicity, body: Monotonicity) -> Self {
        Self { restrictor, body }
    }

    /// The signature of a known operator gloss.
    #[must_use]
    pub fn from_gloss(gloss: &str) -> Option<Self> {
        match gloss.to_ascii_lowercase().as_str() {
            "all" | "every" | "each" | "any" => Some(Self::UNIVERSAL),
            "some" | "a" | "an" | "several" | "there_are" => Some(Self::EXISTENTIAL),
            "no" | "none" | "neither" => Some(Self::NEGATIVE),
            "most" | "many" => Some(Self::PROPORTIONAL),
            "few" => Some(Self::FEW),
            "not" | "never" | "n't" => Some(Self::NEGATION),
            _ => None,
        }
    }
}

/// Polarity of every token of `words`, given the operator signature of
/// each word (if it is one).
#[must_use]
pub fn polarities(
    words: &[TaggedWord],
    operator_of: impl Fn(Word) -> Option<Operator>,
) -> Vec<Monotonicity> {
    let mut out = Vec::with_capacity(words.len());
    let mut body = Monotonicity::Up;
    let mut restrictor = None;

    let opens_with_operator = words
        .first()
        .is_some_and(|first| operator_of(first.word()).is_some());
    if !opens_with_operator {
        restrictor = Some(Operator::UNIVERSAL.restrictor);
        body = Operator::UNIVERSAL.body;
    }

    for token in words {
        let computed = restrictor.take().unwrap_or(body);
        if let Some(operator) = operator_of(token.word()) {
            restrictor = Some(compose(computed, operator.restrictor));
            body = compose(computed, operator.body);
        }
        out.push(token.marker().unwrap_or(computed));
    }
    out
}

/// What the current fact of a path says about the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TruthState {
    /// If the current fact holds, the query holds.
    Entails,
    /// If the current fact holds, the query is false.
    Contradicts,
}

impl TruthState {
    /// Fold one projected relation into the truth state.
    ///
    /// Returns `None` when the step leaves the query undetermined, in
    /// which case the successor is pruned.
    #[must_use]
    pub const fn apply(self, relation: Relation) -> Option<TruthState> {
        match (self, relation) {
            (Self::Entails, Relation::Equivalent | Relation::Forward) => Some(Self::Entails),
            (Self::Entails, Relation::Negation | Relation::Alternation) => {
                Some(Self::Contradicts)
            }
            (Self::Contradicts, Relation::Equivalent | Relation::Forward) => {
                Some(Self::Contradicts)
            }
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
