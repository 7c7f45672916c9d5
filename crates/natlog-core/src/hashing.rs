//! # Fact Hashing
//!
//! Two independent 32-bit FNV-1a hashes over the little-endian bytes of a
//! word sequence. `main` is seeded with the FNV offset basis, `aux` with
//! a small fixed constant; together they address one LossyTrie bucket.

use crate::primitives::{FNV_PRIME, FNV_SEED_AUX, FNV_SEED_MAIN};
use crate::{TaggedWord, Word};
use serde::{Deserialize, Serialize};

/// FNV-1a over the little-endian bytes of each value.
#[must_use]
pub fn fnv1a(seed: u32, values: impl IntoIterator<Item = u32>) -> u32 {
    let mut hash = seed;
    for value in values {
        for byte in value.to_le_bytes() {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
    }
    hash
}

/// The `(main, aux)` key of a word sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactHash {
    pub main: u32,
    pub aux: u32,
}

impl FactHash {
    /// Hash raw word ids.
    #[must_use]
    pub fn of_words(words: &[Word]) -> Self {
        Self {
            main: fnv1a(FNV_SEED_MAIN, words.iter().map(|w| w.0)),
            aux: fnv1a(FNV_SEED_AUX, words.iter().map(|w| w.0)),
        }
    }

    /// Hash words and senses together, as one 64-bit key.
    #[must_use]
    pub fn of_senses(words: &[TaggedWord]) -> u64 {
        let stream = || {
            words
                .iter()
                .flat_map(|w| [w.word().0, u32::from(w.sense())])
        };
        let main = fnv1a(FNV_SEED_MAIN, stream());
        let aux = fnv1a(FNV_SEED_AUX, stream());
        (u64::from(main) << 32) | u64::from(aux)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_the_seed() {
        assert_eq!(fnv1a(FNV_SEED_MAIN, []), FNV_SEED_MAIN);
        assert_eq!(fnv1a(FNV_SEED_AUX, []), FNV_SEED_AUX);
    }

    #[test]
    fn known_fnv1a_vector() {
        // FNV-1a("a") = 0xe40c292c; one byte only, so feed it by hand
        let mut hash = FNV_SEED_MAIN;
        hash ^= u32::from(b'a');
        hash = hash.wrapping_mul(FNV_PRIME);
        assert_eq!(hash, 0xe40c_292c);
    }

    #[test]
    fn order_matters() {
        assert_ne!(
            FactHash::of_words(&[Word(1), Word(2)]),
            FactHash::of_words(&[Word(2), Word(1)])
        );
    }

    #[test]
    fn sense_hash_distinguishes_senses() {
        let a = [TaggedWord::new(Word(1), 1)];
        let b = [TaggedWord::new(Word(1), 2)];
        assert_ne!(FactHash::of_senses(&a), FactHash::of_senses(&b));
    }
}
