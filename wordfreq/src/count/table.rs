use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::hash_map;
use std::fmt;

use crate::errors::{WordFreqError, WordFreqResult};

/// An immutable, length-bounded word.
///
/// Words are raw corpus bytes: a byte-range partition may cut through a
/// multi-byte character, so no encoding is assumed until display time.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Word(Box<[u8]>);

impl Word {
    /// Copies `bytes` into a new word, failing instead of aborting when the
    /// allocation cannot be satisfied
    pub fn new(bytes: &[u8]) -> WordFreqResult<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(bytes.len())
            .map_err(|_| WordFreqError::out_of_memory("allocating a word"))?;
        buf.extend_from_slice(bytes);
        Ok(Self(buf.into_boxed_slice()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<[u8]> for Word {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Word {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().into())
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from_utf8_lossy(&self.0))
    }
}

/// Word to occurrence-count mapping owned by a single worker at a time.
///
/// Lookups are hash based so both counting and merging stay O(1) per word on
/// average. An optional word limit caps the number of distinct words; going
/// past it is reported as an out-of-memory condition, exactly like a failed
/// allocation.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: FxHashMap<Word, u64>,
    word_limit: Option<usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table that refuses to hold more than `limit` distinct words
    pub fn with_word_limit(limit: Option<usize>) -> Self {
        Self {
            counts: FxHashMap::default(),
            word_limit: limit,
        }
    }

    /// Counts one occurrence of `word`
    pub fn record(&mut self, word: &[u8]) -> WordFreqResult<()> {
        if let Some(count) = self.counts.get_mut(word) {
            *count += 1;
            return Ok(());
        }
        self.insert_new(Word::new(word)?, 1)
    }

    /// Adds `count` occurrences of an owned word
    pub fn add(&mut self, word: Word, count: u64) -> WordFreqResult<()> {
        if let Some(existing) = self.counts.get_mut(word.as_bytes()) {
            *existing += count;
            return Ok(());
        }
        self.insert_new(word, count)
    }

    fn insert_new(&mut self, word: Word, count: u64) -> WordFreqResult<()> {
        if let Some(limit) = self.word_limit {
            if self.counts.len() >= limit {
                return Err(WordFreqError::out_of_memory(format!(
                    "inserting a new word: table is full at {} distinct words",
                    limit
                )));
            }
        }
        self.counts.try_reserve(1)?;
        self.counts.insert(word, count);
        Ok(())
    }

    /// Folds every entry of `other` into this table, summing counts
    pub fn absorb(&mut self, other: FrequencyTable) -> WordFreqResult<()> {
        self.counts.try_reserve(other.len())?;
        for (word, count) in other.counts {
            self.add(word, count)?;
        }
        Ok(())
    }

    /// Count for `word`, zero when absent
    pub fn get(&self, word: impl AsRef<[u8]>) -> u64 {
        self.counts.get(word.as_ref()).copied().unwrap_or(0)
    }

    pub fn contains(&self, word: impl AsRef<[u8]>) -> bool {
        self.counts.contains_key(word.as_ref())
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total_words(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn word_limit(&self) -> Option<usize> {
        self.word_limit
    }

    /// Removes the distinct-word cap, used once a table leaves its worker
    pub fn clear_word_limit(&mut self) {
        self.word_limit = None;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Word, u64)> + '_ {
        self.counts.iter().map(|(w, &c)| (w, c))
    }
}

impl PartialEq for FrequencyTable {
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
    }
}

impl Eq for FrequencyTable {}

impl IntoIterator for FrequencyTable {
    type Item = (Word, u64);
    type IntoIter = hash_map::IntoIter<Word, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.into_iter()
    }
}

impl<'a> FromIterator<(&'a str, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, u64)>>(iter: I) -> Self {
        let mut counts = FxHashMap::default();
        for (word, count) in iter {
            *counts.entry(Word::from(word)).or_insert(0) += count;
        }
        Self {
            counts,
            word_limit: None,
        }
    }
}
