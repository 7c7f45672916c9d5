//! # LossyTrie
//!
//! A compact, read-only fact database for very large fact sets.
//!
//! Instead of nodes, every fact prefix is addressed by its [`FactHash`].
//! A frozen [`HashIntMap`] maps that hash to a byte offset inside one
//! contiguous buffer, where the prefix's bucket lives:
//!
//! ```text
//! offset-1   offset      offset+8    ...
//! +--------+-----------+-----------+-----
//! | flags  | record 0  | record 1  | ...   (capacity records)
//! +--------+-----------+-----------+-----
//!
//! flags: bit0 is-fact | bit1 has-completions | bit2 full | bits3-7 capacity
//! record (u64 LE): source:32 | sense:5 | type:8 | end_of_list:1
//! ```
//!
//! Byte 0 of the buffer is reserved so that no bucket lives at offset 0.
//!
//! ## Build
//!
//! Construction is two-pass and ordered: pass 1 counts completions per
//! prefix into a histogram, [`LossyTrie::allocate`] turns the counts into
//! offsets and sizes the buffer exactly, pass 2 fills the buckets with
//! [`LossyTrie::add_completion`] / [`LossyTrie::add_fact`]. Completions
//! before the first word have no prefix to hash and go to a separate
//! map keyed by the fact's second word.
//!
//! ## Lossiness
//!
//! Two facts whose `(main, aux)` hashes both collide share a bucket:
//! membership may report false positives and completions may be merged.
//! This is accepted; nothing attempts to detect it.

use crate::fact_db::{CompletionSite, Completions, FactDb, MemoryUsage};
use crate::hash_int_map::HashIntMap;
use crate::hashing::FactHash;
use crate::primitives::{INSERTION_COST, MAX_COMPLETIONS, MAX_SENSE};
use crate::{Edge, EdgeTypeId, NatlogError, TaggedWord, Word};
use std::collections::BTreeMap;
use std::mem::size_of;
use tracing::info;

// =============================================================================
// PACKED RECORDS
// =============================================================================

const FLAG_FACT: u8 = 0x1;
const FLAG_HAS_COMPLETIONS: u8 = 0x2;
const FLAG_FULL: u8 = 0x4;
const CAPACITY_SHIFT: u8 = 3;

const RECORD_BYTES: usize = size_of::<u64>();

const SENSE_SHIFT: u64 = 32;
const TYPE_SHIFT: u64 = 37;
const END_OF_LIST_BIT: u64 = 1 << 45;

/// One completion record: a source word with its sense and edge type,
/// plus the end-of-list marker of its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackedInsertion(u64);

impl PackedInsertion {
    /// Pack a record. Senses above `MAX_SENSE` saturate.
    #[must_use]
    pub fn new(source: Word, sense: u8, edge_type: EdgeTypeId, end_of_list: bool) -> Self {
        let mut bits = u64::from(source.0)
            | (u64::from(sense.min(MAX_SENSE)) << SENSE_SHIFT)
            | (u64::from(edge_type.0) << TYPE_SHIFT);
        if end_of_list {
            bits |= END_OF_LIST_BIT;
        }
        Self(bits)
    }

    #[must_use]
    pub const fn source(self) -> Word {
        Word(self.0 as u32)
    }

    #[must_use]
    pub const fn sense(self) -> u8 {
        ((self.0 >> SENSE_SHIFT) & 0x1f) as u8
    }

    #[must_use]
    pub const fn edge_type(self) -> EdgeTypeId {
        EdgeTypeId(((self.0 >> TYPE_SHIFT) & 0xff) as u8)
    }

    #[must_use]
    pub const fn is_end_of_list(self) -> bool {
        self.0 & END_OF_LIST_BIT != 0
    }

    #[must_use]
    pub const fn with_end_of_list(self, end_of_list: bool) -> Self {
        if end_of_list {
            Self(self.0 | END_OF_LIST_BIT)
        } else {
            Self(self.0 & !END_OF_LIST_BIT)
        }
    }

    /// Same source, sense and type; the end marker is ignored.
    const fn same_completion(self, other: Self) -> bool {
        (self.0 & !END_OF_LIST_BIT) == (other.0 & !END_OF_LIST_BIT)
    }

    /// The completion as a null-sink edge of unit insertion cost.
    #[must_use]
    pub fn to_edge(self) -> Edge {
        Edge::deletion(
            self.source(),
            u32::from(self.sense()),
            self.edge_type(),
            INSERTION_COST,
        )
    }
}

/// A read-only view of one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    flags: u8,
    records: Vec<PackedInsertion>,
}

impl Bucket {
    #[must_use]
    pub const fn is_fact(&self) -> bool {
        self.flags & FLAG_FACT != 0
    }

    #[must_use]
    pub const fn has_completions(&self) -> bool {
        self.flags & FLAG_HAS_COMPLETIONS != 0
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.flags & FLAG_FULL != 0
    }

    /// Number of record slots allocated to this bucket.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        (self.flags >> CAPACITY_SHIFT) as usize
    }

    /// The records written so far, up to and including the end marker.
    #[must_use]
    pub fn records(&self) -> &[PackedInsertion] {
        &self.records
    }
}

// =============================================================================
// LOSSY TRIE
// =============================================================================

/// The compact fact database.
#[derive(Debug, Clone)]
pub struct LossyTrie {
    /// prefix hash -> offset of the bucket's first record (frozen)
    offsets: HashIntMap,
    /// flags bytes and packed records, sized exactly at allocation
    data: Vec<u8>,
    /// second word -> completions for the position before the first word
    begin_insertions: BTreeMap<Word, Vec<PackedInsertion>>,
}

impl LossyTrie {
    /// Turn pass-1 completion counts into bucket offsets and allocate the
    /// buffer: one reserved byte, plus a flags byte and `count` records
    /// per prefix.
    ///
    /// The histogram is frozen; pass 2 can only address prefixes that
    /// were counted.
    pub fn allocate(mut counts: HashIntMap) -> Result<Self, NatlogError> {
        let prefixes = counts.len() as u64;
        let records = counts.sum();
        let size = 1 + prefixes + records * RECORD_BYTES as u64;
        if size > u64::from(u32::MAX) {
            return Err(NatlogError::AllocationFailed(format!(
                "completion region of {} bytes exceeds 32-bit offsets",
                size
            )));
        }
        let size = size as usize;

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|e| NatlogError::AllocationFailed(e.to_string()))?;
        data.resize(size, 0u8);

        let mut cursor = 1usize;
        counts.map_values(|count| {
            let capacity = count.min(MAX_COMPLETIONS as u32) as u8;
            data[cursor] = capacity << CAPACITY_SHIFT;
            let offset = cursor + 1;
            cursor = offset + count as usize * RECORD_BYTES;
            offset as u32
        });
        counts.freeze();

        info!(
            prefixes,
            records,
            bytes = size,
            "Allocated completion region"
        );

        Ok(Self {
            offsets: counts,
            data,
            begin_insertions: BTreeMap::new(),
        })
    }

    fn offset_of(&self, prefix: &[Word]) -> Option<usize> {
        let hash = FactHash::of_words(prefix);
        self.offsets
            .get(hash.main, hash.aux)
            .map(|offset| offset as usize)
    }

    fn require_offset(&self, prefix: &[Word]) -> Result<usize, NatlogError> {
        self.offset_of(prefix).ok_or_else(|| {
            let hash = FactHash::of_words(prefix);
            NatlogError::MissingOffset {
                main: hash.main,
                aux: hash.aux,
            }
        })
    }

    fn read_record(&self, offset: usize, slot: usize) -> PackedInsertion {
        let start = offset + slot * RECORD_BYTES;
        let mut bytes = [0u8; RECORD_BYTES];
        bytes.copy_from_slice(&self.data[start..start + RECORD_BYTES]);
        PackedInsertion(u64::from_le_bytes(bytes))
    }

    fn write_record(&mut self, offset: usize, slot: usize, record: PackedInsertion) {
        let start = offset + slot * RECORD_BYTES;
        self.data[start..start + RECORD_BYTES].copy_from_slice(&record.0.to_le_bytes());
    }

    /// Records of the bucket at `offset`, stopping after the end marker.
    fn records_at(&self, offset: usize) -> Vec<PackedInsertion> {
        let capacity = (self.data[offset - 1] >> CAPACITY_SHIFT) as usize;
        let mut records = Vec::new();
        for slot in 0..capacity {
            let record = self.read_record(offset, slot);
            if record.source().is_null() {
                break;
            }
            records.push(record);
            if record.is_end_of_list() {
                break;
            }
        }
        records
    }

    /// Pass 2: append a completion `(source, sense, edge_type)` to the
    /// bucket of `prefix`.
    ///
    /// Duplicates are written once. When the bucket has no free slot it
    /// is flagged full and the record is dropped.
    pub fn add_completion(
        &mut self,
        prefix: &[Word],
        source: Word,
        sense: u8,
        edge_type: EdgeTypeId,
    ) -> Result<(), NatlogError> {
        let offset = self.require_offset(prefix)?;
        let flags = self.data[offset - 1];
        self.data[offset - 1] = flags | FLAG_HAS_COMPLETIONS;
        if flags & FLAG_FULL != 0 {
            return Ok(());
        }

        let record = PackedInsertion::new(source, sense, edge_type, true);
        let capacity = (flags >> CAPACITY_SHIFT) as usize;
        for slot in 0..capacity {
            let existing = self.read_record(offset, slot);
            if existing.source().is_null() {
                if slot > 0 {
                    let last = self.read_record(offset, slot - 1);
                    self.write_record(offset, slot - 1, last.with_end_of_list(false));
                }
                self.write_record(offset, slot, record);
                return Ok(());
            }
            if existing.same_completion(record) {
                return Ok(());
            }
        }
        self.data[offset - 1] |= FLAG_FULL;
        Ok(())
    }

    /// Pass 2: record that `fact` itself is stored.
    pub fn add_fact(&mut self, fact: &[Word]) -> Result<(), NatlogError> {
        let offset = self.require_offset(fact)?;
        self.data[offset - 1] |= FLAG_FACT;
        Ok(())
    }

    /// Pass 2: record that `(first, sense, edge_type)` may be inserted
    /// before a query starting with `second`.
    pub fn add_begin_insertion(
        &mut self,
        first: Word,
        sense: u8,
        edge_type: EdgeTypeId,
        second: Word,
    ) {
        let record = PackedInsertion::new(first, sense, edge_type, false);
        let entries = self.begin_insertions.entry(second).or_default();
        if !entries.iter().any(|r| r.same_completion(record)) {
            entries.push(record);
        }
    }

    /// The bucket of `prefix`, if one was allocated.
    #[must_use]
    pub fn bucket(&self, prefix: &[Word]) -> Option<Bucket> {
        self.offset_of(prefix).map(|offset| Bucket {
            flags: self.data[offset - 1],
            records: self.records_at(offset),
        })
    }

    /// Begin insertions recorded for queries starting with `second`.
    #[must_use]
    pub fn begin_insertions(&self, second: Word) -> &[PackedInsertion] {
        self.begin_insertions
            .get(&second)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of hashed prefixes (facts included).
    #[must_use]
    pub fn prefix_count(&self) -> usize {
        self.offsets.len()
    }

    /// Size of the completion region in bytes.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }
}

impl FactDb for LossyTrie {
    fn contains(&self, query: &[TaggedWord], site: CompletionSite, out: &mut Completions) -> bool {
        let words: Vec<Word> = query.iter().map(TaggedWord::word).collect();

        let is_fact = !words.is_empty()
            && self
                .offset_of(&words)
                .is_some_and(|offset| self.data[offset - 1] & FLAG_FACT != 0);

        match site {
            CompletionSite::After(index) if index < words.len() => {
                let offset = self
                    .offset_of(&words[..=index])
                    .filter(|&offset| self.data[offset - 1] & FLAG_HAS_COMPLETIONS != 0);
                for record in offset.map(|o| self.records_at(o)).unwrap_or_default() {
                    if !out.push(record.to_edge()) {
                        break;
                    }
                }
            }
            CompletionSite::SentenceStart => {
                if let Some(first) = words.first() {
                    for record in self.begin_insertions(*first).iter().take(MAX_COMPLETIONS) {
                        if !out.push(record.to_edge()) {
                            break;
                        }
                    }
                }
            }
            CompletionSite::After(_) | CompletionSite::None => {}
        }

        is_fact
    }

    fn memory_usage(&self) -> MemoryUsage {
        let caching_bytes = self
            .begin_insertions
            .values()
            .map(|v| size_of::<Word>() + size_of::<Vec<PackedInsertion>>() + v.len() * RECORD_BYTES)
            .sum();
        MemoryUsage {
            fact_bytes: self.data.len(),
            structure_bytes: self.offsets.memory_bytes(),
            caching_bytes,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
