use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, trace, warn};

use super::transfer;
use super::ConcurrencyBackend;
use crate::corpus::Corpus;
use crate::count::partition::Partition;
use crate::count::tokenizer::BoundaryMode;
use crate::count::worker::{count_partition, CountOptions, WorkerReport};
use crate::errors::{WordFreqError, WordFreqResult};
use crate::progress::{MappedCounter, ProgressSink};

/// Subcommand under which the worker program runs a single [`WorkerTask`]
pub const WORKER_SUBCOMMAND: &str = "worker";

/// Everything a child process needs to count one partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerTask {
    pub corpus: PathBuf,
    pub partition: Partition,
    pub options: CountOptions,
    /// File holding the shared progress counter
    pub counter: PathBuf,
    /// File the serialized table is written to
    pub output: PathBuf,
}

impl WorkerTask {
    /// Command-line arguments understood by the worker subcommand
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--corpus".into(),
            self.corpus.clone().into(),
            "--index".into(),
            self.partition.index.to_string().into(),
            "--start".into(),
            self.partition.start.to_string().into(),
            "--len".into(),
            self.partition.len.to_string().into(),
            "--max-word-len".into(),
            self.options.max_word_len.to_string().into(),
            "--boundary".into(),
            match self.options.boundary_mode {
                BoundaryMode::Stitch => "stitch".into(),
                BoundaryMode::Split => "split".into(),
            },
            "--counter".into(),
            self.counter.clone().into(),
            "--output".into(),
            self.output.clone().into(),
        ];
        if let Some(limit) = self.options.word_limit {
            args.push("--word-limit".into());
            args.push(limit.to_string().into());
        }
        args
    }

    /// Counts the partition and writes the table to [`WorkerTask::output`].
    ///
    /// This is the body of a worker process.
    pub fn run(&self) -> WordFreqResult<WorkerReport> {
        let corpus = Corpus::open(&self.corpus)?;
        let counter = MappedCounter::open(&self.counter)?;
        let report = count_partition(&corpus, &self.partition, &self.options, &counter)?;
        transfer::write_file(&self.output, &report.table)?;
        trace!(
            "Worker {} wrote {} entries to {}",
            self.partition.index,
            report.unique_words,
            self.output.display()
        );
        Ok(report)
    }
}

/// Runs workers as child processes that share nothing but the progress counter.
///
/// Each child re-runs `program` with the worker subcommand, maps the counter
/// file and writes its table to a transfer file. The coordinator waits for the
/// children in partition order, decodes each transfer file and deletes it.
/// A child that exits unsuccessfully, or is killed, fails the run; the
/// remaining children are then killed and reaped.
#[derive(Debug)]
pub struct ProcessBackend {
    program: PathBuf,
    workdir: TempDir,
    counter: Arc<MappedCounter>,
}

impl ProcessBackend {
    /// Creates a backend that launches `program` for each worker
    pub fn new(program: impl Into<PathBuf>) -> WordFreqResult<Self> {
        let workdir = tempfile::Builder::new().prefix("wordfreq-").tempdir()?;
        let counter = MappedCounter::create(&workdir.path().join("progress.bin"))?;
        Ok(Self {
            program: program.into(),
            workdir,
            counter: Arc::new(counter),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn spawn(&self, task: &WorkerTask) -> WordFreqResult<Child> {
        Command::new(&self.program)
            .arg(WORKER_SUBCOMMAND)
            .args(task.to_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                WordFreqError::worker_failure(
                    task.partition.index,
                    format!("cannot start {}: {}", self.program.display(), e),
                )
            })
    }

    fn join<I>(running: &mut I) -> WordFreqResult<Vec<WorkerReport>>
    where
        I: Iterator<Item = (WorkerTask, Child)>,
    {
        let mut reports = Vec::new();
        for (task, child) in running {
            let index = task.partition.index;
            let output = child
                .wait_with_output()
                .map_err(|e| WordFreqError::worker_failure(index, e.to_string()))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                let reason = match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
                    Some(line) => format!("{}: {}", output.status, line.trim()),
                    None => output.status.to_string(),
                };
                return Err(WordFreqError::worker_failure(index, reason));
            }

            // A child that exited cleanly but left no usable table still failed
            let table = transfer::read_file(&task.output)
                .map_err(|e| WordFreqError::worker_failure(index, e.to_string()))?;
            fs::remove_file(&task.output)
                .map_err(|e| WordFreqError::worker_failure(index, e.to_string()))?;
            debug!("Collected {} unique words from worker {}", table.len(), index);
            reports.push(WorkerReport::from_table(index, table));
        }
        Ok(reports)
    }
}

fn abort(children: impl Iterator<Item = (WorkerTask, Child)>) {
    for (task, mut child) in children {
        warn!("Killing worker {} after run failure", task.partition.index);
        let _ = child.kill();
        let _ = child.wait();
    }
}

impl ConcurrencyBackend for ProcessBackend {
    fn name(&self) -> &'static str {
        "processes"
    }

    fn progress(&self) -> Arc<dyn ProgressSink> {
        self.counter.clone()
    }

    fn run(
        &self,
        corpus: &Corpus,
        partitions: &[Partition],
        options: &CountOptions,
    ) -> WordFreqResult<Vec<WorkerReport>> {
        let corpus_path = corpus.path().ok_or_else(|| {
            WordFreqError::invalid_config("the process backend needs a corpus file")
        })?;

        self.counter.reset();
        let mut children = Vec::with_capacity(partitions.len());
        for partition in partitions {
            let task = WorkerTask {
                corpus: corpus_path.to_path_buf(),
                partition: *partition,
                options: *options,
                counter: self.counter.path().to_path_buf(),
                output: self
                    .workdir
                    .path()
                    .join(format!("worker-{}.bin", partition.index)),
            };
            match self.spawn(&task) {
                Ok(child) => children.push((task, child)),
                Err(e) => {
                    abort(children.into_iter());
                    return Err(e);
                }
            }
        }
        debug!("Spawned {} worker processes", children.len());

        let mut running = children.into_iter();
        let result = Self::join(&mut running);
        if result.is_err() {
            abort(running);
        }
        result
    }
}
