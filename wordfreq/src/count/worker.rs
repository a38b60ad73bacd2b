use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::partition::Partition;
use super::table::FrequencyTable;
use super::tokenizer::{BoundaryMode, Tokenizer, DEFAULT_MAX_WORD_LEN};
use crate::config::CountConfig;
use crate::errors::WordFreqResult;
use crate::progress::{ProgressBatcher, ProgressSink};

/// Per-worker counting options, shared by every backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountOptions {
    pub max_word_len: usize,
    pub boundary_mode: BoundaryMode,
    pub word_limit: Option<usize>,
}

impl Default for CountOptions {
    fn default() -> Self {
        Self {
            max_word_len: DEFAULT_MAX_WORD_LEN,
            boundary_mode: BoundaryMode::default(),
            word_limit: None,
        }
    }
}

impl From<&CountConfig> for CountOptions {
    fn from(config: &CountConfig) -> Self {
        Self {
            max_word_len: config.max_word_len,
            boundary_mode: config.boundary_mode,
            word_limit: config.word_limit,
        }
    }
}

/// What a worker hands back to the coordinator on success
#[derive(Debug, Clone)]
pub struct WorkerReport {
    /// Index of the partition the worker counted
    pub index: usize,
    pub table: FrequencyTable,
    pub total_words: u64,
    pub unique_words: usize,
}

impl WorkerReport {
    /// Builds a report for a table received from elsewhere, deriving the totals
    pub fn from_table(index: usize, table: FrequencyTable) -> Self {
        Self {
            index,
            total_words: table.total_words(),
            unique_words: table.len(),
            table,
        }
    }
}

/// Counts every word of `partition` into a fresh table owned by this call.
///
/// Fails on the first word that cannot be stored; the partial table is
/// dropped rather than returned.
pub fn count_partition(
    corpus: &[u8],
    partition: &Partition,
    options: &CountOptions,
    progress: &dyn ProgressSink,
) -> WordFreqResult<WorkerReport> {
    trace!(
        "Worker {} counting bytes {}..{}",
        partition.index,
        partition.start,
        partition.end()
    );

    let mut table = FrequencyTable::with_word_limit(options.word_limit);
    let mut batcher = ProgressBatcher::new(progress);
    let mut total_words = 0u64;

    let tokens = Tokenizer::new(
        corpus,
        partition,
        options.max_word_len,
        options.boundary_mode,
    );
    for word in tokens {
        table.record(word)?;
        total_words += 1;
        batcher.tick();
    }
    batcher.flush();

    debug!(
        "Worker {} done: {} words, {} unique",
        partition.index,
        total_words,
        table.len()
    );

    Ok(WorkerReport {
        index: partition.index,
        unique_words: table.len(),
        total_words,
        table,
    })
}
