use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

use super::merge::merge_reports;
use super::partition::partition;
use super::rank::top_k;
use super::worker::CountOptions;
use crate::backend::{create_backend, ConcurrencyBackend};
use crate::config::{CountConfig, MAX_WORKERS};
use crate::corpus::Corpus;
use crate::errors::WordFreqResult;
use crate::results::{CountOutput, WorkerStats};

/// Stages of a counting run, visited strictly in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Configured,
    Partitioned,
    WorkersRunning,
    Joined,
    Merged,
    Ranked,
    Done,
}

impl RunState {
    /// The stage that follows this one
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Configured => Some(Self::Partitioned),
            Self::Partitioned => Some(Self::WorkersRunning),
            Self::WorkersRunning => Some(Self::Joined),
            Self::Joined => Some(Self::Merged),
            Self::Merged => Some(Self::Ranked),
            Self::Ranked => Some(Self::Done),
            Self::Done => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Coordinator of one partition, count, merge and rank run.
///
/// A run is single use. If a worker fails, the run stops in
/// `WorkersRunning` and the error is returned; nothing is merged or ranked.
pub struct CountRun<'a> {
    config: &'a CountConfig,
    backend: &'a dyn ConcurrencyBackend,
    state: RunState,
}

impl<'a> CountRun<'a> {
    /// Validates `config` and prepares a run on `backend`
    pub fn new(
        config: &'a CountConfig,
        backend: &'a dyn ConcurrencyBackend,
    ) -> WordFreqResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            backend,
            state: RunState::Configured,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn advance(&mut self, to: RunState) {
        debug_assert_eq!(self.state.next(), Some(to), "invalid run transition");
        debug!("Run state {} -> {}", self.state, to);
        self.state = to;
    }

    /// Executes the run over `corpus`
    pub fn execute(&mut self, corpus: &Corpus) -> WordFreqResult<CountOutput> {
        let started = Instant::now();
        let workers = self.config.worker_count.get();
        info!(
            "Counting {} bytes with {} {} workers",
            corpus.len(),
            workers,
            self.backend.name()
        );

        let partitions = partition(corpus.len(), workers, MAX_WORKERS)?;
        self.advance(RunState::Partitioned);

        let options = CountOptions::from(self.config);
        self.advance(RunState::WorkersRunning);
        let reports = self.backend.run(corpus, &partitions, &options)?;
        self.advance(RunState::Joined);

        let worker_stats: Vec<WorkerStats> = partitions
            .iter()
            .zip(&reports)
            .map(|(partition, report)| WorkerStats::new(partition, report))
            .collect();
        let total_words = reports.iter().map(|r| r.total_words).sum();

        let table = merge_reports(reports)?;
        self.advance(RunState::Merged);

        let top = top_k(&table, self.config.top_k);
        self.advance(RunState::Ranked);

        let output = CountOutput {
            top,
            unique_words: table.len(),
            table,
            total_words,
            corpus_bytes: corpus.len(),
            backend: self.backend.name(),
            workers: worker_stats,
            elapsed: started.elapsed(),
        };
        self.advance(RunState::Done);

        info!(
            "Count complete. {} words, {} unique, in {:?}",
            output.total_words, output.unique_words, output.elapsed
        );
        Ok(output)
    }
}

/// Counts the corpus named by `config` with the backend it selects.
///
/// The process backend re-launches the current executable as its worker
/// program; see [`crate::backend::ProcessBackend`].
pub fn count(config: &CountConfig) -> WordFreqResult<CountOutput> {
    config.validate()?;
    let corpus = Corpus::open(&config.corpus_path)?;
    let backend = create_backend(config.backend, None)?;
    count_with(config, &corpus, backend.as_ref())
}

/// Counts an already opened corpus on a caller-supplied backend
pub fn count_with(
    config: &CountConfig,
    corpus: &Corpus,
    backend: &dyn ConcurrencyBackend,
) -> WordFreqResult<CountOutput> {
    CountRun::new(config, backend)?.execute(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ThreadBackend;
    use crate::count::tokenizer::BoundaryMode;
    use crate::errors::WordFreqError;
    use std::num::NonZeroUsize;
    use tempfile::tempdir;

    fn config(workers: usize) -> CountConfig {
        CountConfig::new("unused.txt", NonZeroUsize::new(workers).unwrap())
    }

    #[test]
    fn test_state_order() {
        let mut state = RunState::Configured;
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            assert!(next > state);
            seen.push(next);
            state = next;
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(state, RunState::Done);
    }

    #[test]
    fn test_run_reaches_done() {
        let corpus = Corpus::from_bytes("the cat the dog the");
        let config = config(1);
        let backend = ThreadBackend::new();

        let mut run = CountRun::new(&config, &backend).unwrap();
        let output = run.execute(&corpus).unwrap();
        assert_eq!(run.state(), RunState::Done);

        assert_eq!(output.total_words, 5);
        assert_eq!(output.unique_words, 3);
        assert_eq!(output.top[0].word.to_string(), "the");
        assert_eq!(output.top[0].count, 3);
        assert_eq!(output.table.get("dog"), 1);
        assert_eq!(output.backend, "threads");
    }

    #[test]
    fn test_worker_failure_stops_before_merge() {
        let corpus = Corpus::from_bytes("alpha beta gamma delta epsilon zeta eta theta");
        let mut config = config(2);
        config.word_limit = Some(1);
        let backend = ThreadBackend::new();

        let mut run = CountRun::new(&config, &backend).unwrap();
        let err = run.execute(&corpus).unwrap_err();
        assert!(matches!(err, WordFreqError::OutOfMemory(_)));
        assert_eq!(run.state(), RunState::WorkersRunning);
    }

    #[test]
    fn test_invalid_worker_count_is_rejected_before_running() {
        let config = config(MAX_WORKERS + 1);
        let backend = ThreadBackend::new();
        let err = CountRun::new(&config, &backend).err().unwrap();
        assert!(matches!(err, WordFreqError::InvalidConfig(_)));
    }

    #[test]
    fn test_worker_counts_agree_when_stitching() {
        let text = "it was the best of times it was the worst of times ".repeat(50);
        let corpus = Corpus::from_bytes(text);
        let backend = ThreadBackend::new();

        let baseline = count_with(&config(1), &corpus, &backend).unwrap();
        for workers in 2..=MAX_WORKERS {
            let output = count_with(&config(workers), &corpus, &ThreadBackend::new()).unwrap();
            assert_eq!(output.total_words, baseline.total_words);
            assert_eq!(output.worker_word_total(), baseline.total_words);
            assert_eq!(output.table, baseline.table, "workers = {}", workers);
            assert_eq!(output.top, baseline.top);
        }
    }

    #[test]
    fn test_split_mode_may_differ_only_at_boundaries() {
        let text = "abcdefgh ".repeat(7);
        let corpus = Corpus::from_bytes(text);
        let mut split = config(4);
        split.boundary_mode = BoundaryMode::Split;

        let baseline = count_with(&config(1), &corpus, &ThreadBackend::new()).unwrap();
        let output = count_with(&split, &corpus, &ThreadBackend::new()).unwrap();
        // Each of the three inner boundaries can add at most one extra fragment
        assert!(output.total_words >= baseline.total_words);
        assert!(output.total_words <= baseline.total_words + 3);
    }

    #[test]
    fn test_count_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.txt");
        std::fs::write(&path, "b a b c b a").unwrap();

        let mut config = config(2);
        config.corpus_path = path;
        let output = count(&config).unwrap();
        let top: Vec<(String, u64)> = output
            .top
            .iter()
            .map(|e| (e.word.to_string(), e.count))
            .collect();
        assert_eq!(
            top,
            vec![
                ("b".to_string(), 3),
                ("a".to_string(), 2),
                ("c".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_missing_corpus() {
        let mut config = config(2);
        config.corpus_path = "/definitely/not/here.txt".into();
        let err = count(&config).unwrap_err();
        assert!(err.is_config_error());
    }
}
