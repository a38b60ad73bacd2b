//! Result types handed back by a counting run.
//!
//! The output owns the merged global table as well as the ranked entries so
//! callers can inspect either without re-running the pipeline. Printing is
//! left to the caller.

use serde::Serialize;
use std::time::Duration;

use crate::count::partition::Partition;
use crate::count::rank::RankedEntry;
use crate::count::table::FrequencyTable;
use crate::count::worker::WorkerReport;

/// Per-worker statistics of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    /// Partition index
    pub index: usize,
    /// First byte of the partition
    pub start: usize,
    /// Partition length in bytes
    pub len: usize,
    /// Words counted by the worker
    pub total_words: u64,
    /// Distinct words seen by the worker
    pub unique_words: usize,
}

impl WorkerStats {
    pub fn new(partition: &Partition, report: &WorkerReport) -> Self {
        Self {
            index: partition.index,
            start: partition.start,
            len: partition.len,
            total_words: report.total_words,
            unique_words: report.unique_words,
        }
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone, Serialize)]
pub struct CountOutput {
    /// Highest-ranked entries, best first
    pub top: Vec<RankedEntry>,
    /// Merged table of every word in the corpus
    #[serde(skip)]
    pub table: FrequencyTable,
    /// Words counted across all workers
    pub total_words: u64,
    /// Distinct words in the merged table
    pub unique_words: usize,
    /// Bytes in the corpus
    pub corpus_bytes: usize,
    /// Backend that ran the workers
    pub backend: &'static str,
    /// Per-worker statistics in partition order
    pub workers: Vec<WorkerStats>,
    /// Wall-clock time of the whole run
    pub elapsed: Duration,
}

impl CountOutput {
    /// Sum of the per-worker word totals.
    ///
    /// Equals `total_words`; kept separate so the scaling property can be
    /// checked from the worker side.
    pub fn worker_word_total(&self) -> u64 {
        self.workers.iter().map(|w| w.total_words).sum()
    }
}
