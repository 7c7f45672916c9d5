//! # Text Rendering
//!
//! Conversion between the query text format and core facts, and
//! human-readable rendering of facts and proof paths.
//!
//! ## Query Format
//!
//! Comma-separated tokens, each `word[:sense][:marker]`:
//! - `word` is a numeric id or, when a vocabulary is available, a gloss
//! - `sense` is a number (saturated at 31)
//! - `marker` is `up`, `down` or `flat` (also `^`, `v`, `-`); it
//!   overrides the polarity the token's position would give it
//!
//! For example `all,cat,have,tail` or `12:3,7,9:0:down`.

use natlog_core::{
    EdgeTypeTable, Fact, Monotonicity, Mutation, NatlogError, Path, SearchOutcome, TaggedWord,
    TruthState, Vocabulary, Word,
};

// =============================================================================
// PARSING
// =============================================================================

fn parse_token(token: &str, vocabulary: Option<&Vocabulary>) -> Result<TaggedWord, NatlogError> {
    let mut parts = token.split(':').map(str::trim);
    let head = parts.next().unwrap_or_default();
    if head.is_empty() {
        return Err(NatlogError::InvalidQuery(format!("empty token in '{}'", token)));
    }

    let word = match head.parse::<u32>() {
        Ok(id) => Word(id),
        Err(_) => vocabulary
            .and_then(|v| v.word_of(head))
            .ok_or_else(|| NatlogError::InvalidQuery(format!("unknown word '{}'", head)))?,
    };
    if word.is_null() {
        return Err(NatlogError::InvalidQuery("word id 0 is reserved".to_string()));
    }

    let mut sense = 0u32;
    let mut marker: Option<Monotonicity> = None;
    for part in parts {
        match part.parse::<u32>() {
            Ok(value) => sense = value,
            Err(_) => marker = Some(part.parse()?),
        }
    }
    let token = TaggedWord::new(word, sense);
    Ok(match marker {
        Some(monotonicity) => token.with_monotonicity(monotonicity),
        None => token,
    })
}

/// Parse a query in the text format.
pub fn parse_query(text: &str, vocabulary: Option<&Vocabulary>) -> Result<Fact, NatlogError> {
    let tokens = text
        .split(',')
        .map(|token| parse_token(token.trim(), vocabulary))
        .collect::<Result<Vec<_>, _>>()?;
    Fact::new(tokens)
}

// =============================================================================
// RENDERING
// =============================================================================

/// The gloss of `word`, or `#<id>` when it has none.
#[must_use]
pub fn render_word(vocabulary: &Vocabulary, word: Word) -> String {
    vocabulary
        .gloss(word)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{}", word.id()))
}

/// `(lemur have tail)`; non-zero senses are shown as `bank:2`.
#[must_use]
pub fn render_fact(vocabulary: &Vocabulary, fact: &Fact) -> String {
    let words: Vec<String> = fact
        .iter()
        .map(|token| {
            let word = render_word(vocabulary, token.word());
            if token.sense() == 0 {
                word
            } else {
                format!("{}:{}", word, token.sense())
            }
        })
        .collect();
    format!("({})", words.join(" "))
}

fn render_mutation(vocabulary: &Vocabulary, edge_types: &EdgeTypeTable, mutation: &Mutation) -> String {
    let edge = mutation.edge();
    let type_name = edge_types.name(edge.edge_type()).unwrap_or("?");
    match mutation {
        Mutation::Substitute { .. } => format!(
            "substitute {} -> {} [{}]",
            render_word(vocabulary, edge.source()),
            render_word(vocabulary, edge.sink()),
            type_name
        ),
        Mutation::Delete { .. } => format!(
            "delete {} [{}]",
            render_word(vocabulary, edge.source()),
            type_name
        ),
        Mutation::Insert { index, .. } => format!(
            "insert {} at {}",
            render_word(vocabulary, edge.source()),
            index
        ),
    }
}

/// One line per step: mutation, resulting fact, cumulative cost, truth.
#[must_use]
pub fn render_path(vocabulary: &Vocabulary, edge_types: &EdgeTypeTable, path: &Path) -> Vec<String> {
    path.steps
        .iter()
        .enumerate()
        .map(|(i, step)| {
            format!(
                "{}. {} => {} (cost {}, {})",
                i + 1,
                render_mutation(vocabulary, edge_types, &step.mutation),
                render_fact(vocabulary, &step.fact),
                step.cost,
                truth_label(step.truth)
            )
        })
        .collect()
}

#[must_use]
pub const fn truth_label(truth: TruthState) -> &'static str {
    match truth {
        TruthState::Entails => "entails",
        TruthState::Contradicts => "contradicts",
    }
}

/// `proven`, `refuted` or `not_proven`.
#[must_use]
pub const fn verdict(outcome: &SearchOutcome) -> &'static str {
    match outcome {
        SearchOutcome::Proven(_) => "proven",
        SearchOutcome::Refuted(_) => "refuted",
        SearchOutcome::NotProven { .. } => "not_proven",
    }
}
