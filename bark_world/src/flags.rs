//! Fixed-width flag bitsets and the name registry that maps flag names to bits.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::WorldError;

/// Number of distinct flags a registry can hold.
pub const FLAG_CAPACITY: usize = 128;

const WORD_BITS: usize = 64;
const WORDS: usize = FLAG_CAPACITY / WORD_BITS;

/// Position of a flag inside a [`FlagSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlagIndex(u8);

impl FlagIndex {
    /// Create an index, or `None` when it lies outside [`FLAG_CAPACITY`].
    pub fn new(index: usize) -> Option<Self> {
        if index < FLAG_CAPACITY {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }

    fn word_and_mask(self) -> (usize, u64) {
        let bit = self.get();
        (bit / WORD_BITS, 1u64 << (bit % WORD_BITS))
    }
}

impl std::fmt::Display for FlagIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fixed-size set of boolean flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FlagSet {
    words: [u64; WORDS],
}

impl FlagSet {
    /// Create a set with every flag clear.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: FlagIndex) {
        let (word, mask) = index.word_and_mask();
        self.words[word] |= mask;
    }

    pub fn remove(&mut self, index: FlagIndex) {
        let (word, mask) = index.word_and_mask();
        self.words[word] &= !mask;
    }

    /// Set or clear a flag.
    pub fn assign(&mut self, index: FlagIndex, value: bool) {
        if value {
            self.insert(index);
        } else {
            self.remove(index);
        }
    }

    pub fn contains(&self, index: FlagIndex) -> bool {
        let (word, mask) = index.word_and_mask();
        self.words[word] & mask != 0
    }

    /// True when every flag in `bits` is set in `self`.
    pub fn all_set(&self, bits: &FlagSet) -> bool {
        self.words
            .iter()
            .zip(bits.words.iter())
            .all(|(have, want)| have & want == *want)
    }

    /// True when at least one flag in `bits` is set in `self`.
    pub fn any_set(&self, bits: &FlagSet) -> bool {
        self.words
            .iter()
            .zip(bits.words.iter())
            .any(|(have, want)| have & want != 0)
    }

    /// Number of flags set.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Iterate the indices of all set flags in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = FlagIndex> + '_ {
        (0..FLAG_CAPACITY)
            .filter_map(FlagIndex::new)
            .filter(move |index| self.contains(*index))
    }
}

impl FromIterator<FlagIndex> for FlagSet {
    fn from_iter<T: IntoIterator<Item = FlagIndex>>(iter: T) -> Self {
        let mut set = FlagSet::empty();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

/// Maps flag names to bit positions. Shared by the world and all actors.
#[derive(Debug, Clone, Default)]
pub struct FlagRegistry {
    names: Vec<String>,
    index: HashMap<String, FlagIndex>,
}

impl FlagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a flag name, returning its bit. Declaring an existing name is a no-op.
    pub fn declare(&mut self, name: &str) -> Result<FlagIndex, WorldError> {
        if let Some(index) = self.index_of(name) {
            return Ok(index);
        }

        let index = FlagIndex::new(self.names.len()).ok_or_else(|| WorldError::FlagCapacity {
            name: name.to_string(),
            capacity: FLAG_CAPACITY,
        })?;
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), index);
        Ok(index)
    }

    pub fn index_of(&self, name: &str) -> Option<FlagIndex> {
        self.index.get(name).copied()
    }

    /// Look up a flag, failing on undeclared names.
    pub fn resolve(&self, name: &str) -> Result<FlagIndex, WorldError> {
        self.index_of(name)
            .ok_or_else(|| WorldError::UnknownFlag(name.to_string()))
    }

    pub fn name_of(&self, index: FlagIndex) -> Option<&str> {
        self.names.get(index.get()).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
