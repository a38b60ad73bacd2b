use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;
use tracing::debug;

use super::ConcurrencyBackend;
use crate::corpus::Corpus;
use crate::count::partition::Partition;
use crate::count::worker::{count_partition, CountOptions, WorkerReport};
use crate::errors::{WordFreqError, WordFreqResult};
use crate::progress::{ProgressSink, SharedProgress};

/// Runs workers as threads sharing this process's address space.
///
/// Each worker builds its own table and hands it back by move, so the counting
/// structures are never shared. The only shared state is the progress counter.
#[derive(Debug, Clone, Default)]
pub struct ThreadBackend {
    progress: SharedProgress,
}

impl ThreadBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConcurrencyBackend for ThreadBackend {
    fn name(&self) -> &'static str {
        "threads"
    }

    fn progress(&self) -> Arc<dyn ProgressSink> {
        Arc::new(self.progress.clone())
    }

    fn run(
        &self,
        corpus: &Corpus,
        partitions: &[Partition],
        options: &CountOptions,
    ) -> WordFreqResult<Vec<WorkerReport>> {
        // A pool of exactly one thread per partition, separate from the global pool
        let pool = ThreadPoolBuilder::new()
            .num_threads(partitions.len().max(1))
            .thread_name(|i| format!("wordfreq-worker-{}", i))
            .build()
            .map_err(|e| {
                WordFreqError::invalid_config(format!("cannot start worker threads: {}", e))
            })?;
        debug!("Started {} worker threads", pool.current_num_threads());
        self.progress.reset();

        let bytes = corpus.as_bytes();
        let progress = &self.progress;
        pool.install(|| {
            partitions
                .par_iter()
                .with_max_len(1)
                .map(|partition| count_partition(bytes, partition, options, progress))
                .collect::<WordFreqResult<Vec<_>>>()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::partition::partition;
    use crate::count::tokenizer::BoundaryMode;

    #[test]
    fn test_reports_in_partition_order() {
        let corpus = Corpus::from_bytes("one two three four five six seven eight nine ten");
        let parts = partition(corpus.len(), 4, 8).unwrap();
        let backend = ThreadBackend::new();

        let reports = backend
            .run(&corpus, &parts, &CountOptions::default())
            .unwrap();
        let indices: Vec<usize> = reports.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(reports.iter().map(|r| r.total_words).sum::<u64>(), 10);
        assert_eq!(backend.progress().words_processed(), 10);
    }

    #[test]
    fn test_progress_restarts_for_each_run() {
        let backend = ThreadBackend::new();
        let first = Corpus::from_bytes("one two three four five six");
        let parts = partition(first.len(), 2, 8).unwrap();
        backend.run(&first, &parts, &CountOptions::default()).unwrap();
        assert_eq!(backend.progress().words_processed(), 6);

        let second = Corpus::from_bytes("seven eight nine");
        let parts = partition(second.len(), 3, 8).unwrap();
        backend.run(&second, &parts, &CountOptions::default()).unwrap();
        assert_eq!(backend.progress().words_processed(), 3);
    }

    #[test]
    fn test_split_mode_reports_boundary_fragments() {
        let corpus = Corpus::from_bytes("an elephant");
        let parts = partition(corpus.len(), 2, 8).unwrap();
        let options = CountOptions {
            boundary_mode: BoundaryMode::Split,
            ..CountOptions::default()
        };

        let reports = ThreadBackend::new().run(&corpus, &parts, &options).unwrap();
        assert_eq!(reports[0].table.get("el"), 1);
        assert_eq!(reports[1].table.get("ephant"), 1);
    }

    #[test]
    fn test_one_failing_worker_fails_the_run() {
        let corpus = Corpus::from_bytes("a a a a a a b c d e f g h i j k");
        let parts = partition(corpus.len(), 2, 8).unwrap();
        let options = CountOptions {
            word_limit: Some(2),
            ..CountOptions::default()
        };

        let err = ThreadBackend::new()
            .run(&corpus, &parts, &options)
            .unwrap_err();
        assert!(matches!(err, WordFreqError::OutOfMemory(_)));
    }
}
