//! # HashIntMap
//!
//! Open-addressed table from a `(main, aux)` hash pair to a small integer.
//!
//! Pass 1 of the LossyTrie build uses it as a histogram of completion
//! counts per fact prefix; allocation then rewrites every count into a
//! byte offset with a single [`HashIntMap::map_values`] sweep, after which
//! the map is frozen and only read.
//!
//! ## Slot Search
//!
//! Double hashing over a power-of-two table: the search starts at
//! `main & mask` and advances by `aux | 1`. An odd step is coprime with
//! the table size, so every slot is visited before the search repeats.
//!
//! ## Approximate Membership
//!
//! The pair is the whole identity of a key. Two different facts whose
//! hashes agree on both halves share one entry; nothing detects it.

use crate::NatlogError;

const MIN_SLOTS: usize = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Slot {
    key: u64,
    value: u32,
    used: bool,
}

/// Open-addressed `(u32, u32) -> u32` map with a freeze switch.
#[derive(Debug, Clone)]
pub struct HashIntMap {
    slots: Vec<Slot>,
    len: usize,
    frozen: bool,
}

impl Default for HashIntMap {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

const fn combine(main: u32, aux: u32) -> u64 {
    ((main as u64) << 32) | aux as u64
}

impl HashIntMap {
    /// Create a map sized so that `expected` entries stay at or below
    /// half load.
    #[must_use]
    pub fn with_capacity(expected: usize) -> Self {
        let slots = expected
            .saturating_mul(2)
            .checked_next_power_of_two()
            .unwrap_or(usize::MAX / 2 + 1)
            .max(MIN_SLOTS);
        Self {
            slots: vec![Slot::default(); slots],
            len: 0,
            frozen: false,
        }
    }

    /// Locate the slot holding `(main, aux)`, or the empty slot where it
    /// would be inserted. `None` only if the table is full and the key
    /// is absent.
    fn find_slot(&self, main: u32, aux: u32) -> Option<usize> {
        let key = combine(main, aux);
        let mask = self.slots.len() - 1;
        let step = (aux | 1) as usize;
        let mut index = main as usize & mask;
        for _ in 0..self.slots.len() {
            let slot = self.slots[index];
            if !slot.used || slot.key == key {
                return Some(index);
            }
            index = index.wrapping_add(step) & mask;
        }
        None
    }

    fn grow(&mut self) {
        let old = std::mem::take(&mut self.slots);
        self.slots = vec![Slot::default(); old.len() * 2];
        for slot in old.into_iter().filter(|s| s.used) {
            let main = (slot.key >> 32) as u32;
            let aux = slot.key as u32;
            if let Some(index) = self.find_slot(main, aux) {
                self.slots[index] = slot;
            }
        }
    }

    /// Value stored under `(main, aux)`, or `None` if absent.
    #[must_use]
    pub fn get(&self, main: u32, aux: u32) -> Option<u32> {
        self.find_slot(main, aux)
            .map(|index| self.slots[index])
            .filter(|slot| slot.used)
            .map(|slot| slot.value)
    }

    /// Add `by` to the count stored under `(main, aux)`, saturating at
    /// `cap`, and return the new count. Absent keys start at zero.
    ///
    /// A frozen map still updates existing keys but refuses new ones.
    pub fn increment(&mut self, main: u32, aux: u32, by: u32, cap: u32) -> Result<u32, NatlogError> {
        if !self.frozen && (self.len + 1) * 4 > self.slots.len() * 3 {
            self.grow();
        }

        let index = self
            .find_slot(main, aux)
            .filter(|&index| self.slots[index].used || !self.frozen)
            .ok_or(NatlogError::HistogramFrozen { main, aux })?;

        let slot = &mut self.slots[index];
        if !slot.used {
            *slot = Slot {
                key: combine(main, aux),
                value: 0,
                used: true,
            };
            self.len += 1;
        }
        if slot.value < cap {
            slot.value = slot.value.saturating_add(by).min(cap);
        }
        Ok(slot.value)
    }

    /// Rewrite every stored value in place, visiting slots in table order.
    pub fn map_values(&mut self, mut f: impl FnMut(u32) -> u32) {
        for slot in self.slots.iter_mut().filter(|s| s.used) {
            slot.value = f(slot.value);
        }
    }

    /// Sum of all stored values.
    #[must_use]
    pub fn sum(&self) -> u64 {
        self.slots
            .iter()
            .filter(|s| s.used)
            .map(|s| u64::from(s.value))
            .sum()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots in the table.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Forbid further key insertion.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Bytes held by the slot table.
    #[must_use]
    pub fn memory_bytes(&self) -> usize {
        self.slots.len() * std::mem::size_of::<Slot>()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_power_of_two_at_half_load() {
        let map = HashIntMap::with_capacity(100);
        assert_eq!(map.capacity(), 256);
        assert!(map.capacity().is_power_of_two());

        let tiny = HashIntMap::with_capacity(0);
        assert_eq!(tiny.capacity(), MIN_SLOTS);
    }

    #[test]
    fn increment_accumulates_and_saturates() {
        let mut map = HashIntMap::with_capacity(4);
        assert_eq!(map.increment(7, 9, 3, 25).expect("inc"), 3);
        assert_eq!(map.increment(7, 9, 20, 25).expect("inc"), 23);
        assert_eq!(map.increment(7, 9, 20, 25).expect("inc"), 25);
        assert_eq!(map.get(7, 9), Some(25));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn zero_increment_creates_entry() {
        let mut map = HashIntMap::with_capacity(4);
        map.increment(1, 1, 0, 25).expect("inc");
        assert_eq!(map.get(1, 1), Some(0));
        assert_eq!(map.get(1, 2), None);
    }

    #[test]
    fn colliding_main_hashes_are_distinguished_by_aux() {
        let mut map = HashIntMap::with_capacity(4);
        map.increment(42, 1, 5, 25).expect("inc");
        map.increment(42, 2, 7, 25).expect("inc");
        assert_eq!(map.get(42, 1), Some(5));
        assert_eq!(map.get(42, 2), Some(7));
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut map = HashIntMap::with_capacity(1);
        for i in 0..1000u32 {
            map.increment(i.wrapping_mul(2_654_435_761), i, 1, 25)
                .expect("inc");
        }
        assert_eq!(map.len(), 1000);
        assert!(map.capacity() * 3 >= map.len() * 4);
        for i in 0..1000u32 {
            assert_eq!(map.get(i.wrapping_mul(2_654_435_761), i), Some(1));
        }
    }

    #[test]
    fn frozen_map_rejects_new_keys_only() {
        let mut map = HashIntMap::with_capacity(4);
        map.increment(1, 1, 1, 25).expect("inc");
        map.freeze();
        assert!(map.is_frozen());
        assert_eq!(map.increment(1, 1, 1, 25).expect("existing"), 2);
        assert!(matches!(
            map.increment(2, 2, 1, 25),
            Err(NatlogError::HistogramFrozen { main: 2, aux: 2 })
        ));
    }

    #[test]
    fn map_values_rewrites_every_entry() {
        let mut map = HashIntMap::with_capacity(8);
        map.increment(1, 1, 2, 25).expect("inc");
        map.increment(2, 2, 3, 25).expect("inc");
        assert_eq!(map.sum(), 5);

        let mut cursor = 1;
        map.map_values(|count| {
            let offset = cursor;
            cursor += count;
            offset
        });
        assert_eq!(cursor, 6);
        let mut offsets = vec![map.get(1, 1), map.get(2, 2)];
        offsets.sort();
        assert_eq!(offsets[0], Some(1));
        assert!(offsets[1] == Some(3) || offsets[1] == Some(4));
    }
}
