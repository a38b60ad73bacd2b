use serde::{Deserialize, Serialize};

use super::partition::Partition;
use crate::errors::WordFreqError;

/// Longest word kept, in bytes; longer tokens are truncated
pub const DEFAULT_MAX_WORD_LEN: usize = 99;

/// How a token that straddles a partition boundary is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// A partition owns every token whose first byte lies inside it, reading
    /// past its end to complete the last one. Counts match a single-worker run.
    #[default]
    Stitch,
    /// Tokens are clipped at the partition edges, so a token cut by a boundary
    /// is counted as two shorter words.
    Split,
}

impl std::str::FromStr for BoundaryMode {
    type Err = WordFreqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stitch" => Ok(Self::Stitch),
            "split" => Ok(Self::Split),
            other => Err(WordFreqError::invalid_config(format!(
                "unknown boundary mode '{}', expected 'stitch' or 'split'",
                other
            ))),
        }
    }
}

/// Whitespace as understood by C's `isspace` in the default locale
#[inline]
pub fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

/// Lazily yields the whitespace-delimited words of one partition.
///
/// Single pass: once exhausted it stays exhausted.
#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    corpus: &'a [u8],
    pos: usize,
    end: usize,
    max_word_len: usize,
    mode: BoundaryMode,
}

impl<'a> Tokenizer<'a> {
    pub fn new(
        corpus: &'a [u8],
        partition: &Partition,
        max_word_len: usize,
        mode: BoundaryMode,
    ) -> Self {
        let end = partition.end().min(corpus.len());
        let mut pos = partition.start.min(end);

        // The token under the start boundary belongs to the previous partition
        if mode == BoundaryMode::Stitch && pos > 0 && !is_space(corpus[pos - 1]) {
            while pos < end && !is_space(corpus[pos]) {
                pos += 1;
            }
        }

        Self {
            corpus,
            pos,
            end,
            max_word_len,
            mode,
        }
    }

    /// Tokenizes a whole buffer as a single partition
    pub fn whole(corpus: &'a [u8], max_word_len: usize) -> Self {
        let partition = Partition {
            index: 0,
            start: 0,
            len: corpus.len(),
        };
        Self::new(corpus, &partition, max_word_len, BoundaryMode::Split)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.end && is_space(self.corpus[self.pos]) {
            self.pos += 1;
        }
        if self.pos >= self.end {
            return None;
        }

        let limit = match self.mode {
            BoundaryMode::Split => self.end,
            BoundaryMode::Stitch => self.corpus.len(),
        };
        let start = self.pos;
        while self.pos < limit && !is_space(self.corpus[self.pos]) {
            self.pos += 1;
        }

        let token = &self.corpus[start..self.pos];
        Some(&token[..token.len().min(self.max_word_len)])
    }
}
