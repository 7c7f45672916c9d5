//! # Vocabulary
//!
//! Word id → surface form. Renders facts and proofs for humans, and
//! names the operator words whose scope sets token polarity.

use crate::loader::VocabRow;
use crate::Word;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    glosses: BTreeMap<Word, String>,
}

impl Vocabulary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: Word, gloss: impl Into<String>) {
        self.glosses.insert(word, gloss.into());
    }

    #[must_use]
    pub fn gloss(&self, word: Word) -> Option<&str> {
        self.glosses.get(&word).map(String::as_str)
    }

    /// Reverse lookup by surface form. Linear; meant for the CLI.
    #[must_use]
    pub fn word_of(&self, gloss: &str) -> Option<Word> {
        self.glosses
            .iter()
            .find(|(_, g)| g.as_str() == gloss)
            .map(|(w, _)| *w)
    }

    /// `(word, gloss)` pairs in word order.
    pub fn iter(&self) -> impl Iterator<Item = (Word, &str)> + '_ {
        self.glosses.iter().map(|(w, g)| (*w, g.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.glosses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glosses.is_empty()
    }
}

impl FromIterator<VocabRow> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = VocabRow>>(rows: I) -> Self {
        let mut vocabulary = Self::new();
        for row in rows {
            vocabulary.insert(Word(row.id), row.gloss);
        }
        vocabulary
    }
}
