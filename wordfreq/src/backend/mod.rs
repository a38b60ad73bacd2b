//! Concurrency backends that run one worker per partition.
//!
//! Both backends implement the same fan-out / fan-in contract: every partition
//! is counted by exactly one worker, the coordinator blocks until all workers
//! reached a terminal state, and any failure fails the whole run. They differ
//! in their isolation model:
//!
//! | | [`ThreadBackend`] | [`ProcessBackend`] |
//! |---|---|---|
//! | Workers | threads of a dedicated pool | child processes |
//! | Progress counter | `Mutex<u64>` | atomic in a shared file mapping |
//! | Results | moved back in memory | serialized to a transfer file |

pub mod process;
pub mod threads;
pub mod transfer;

pub use process::{ProcessBackend, WorkerTask};
pub use threads::ThreadBackend;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::BackendKind;
use crate::corpus::Corpus;
use crate::count::partition::Partition;
use crate::count::worker::{CountOptions, WorkerReport};
use crate::errors::WordFreqResult;
use crate::progress::ProgressSink;

/// Runs the workers of one counting run
pub trait ConcurrencyBackend {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Handle on the words-processed counter of the current or last run,
    /// readable while workers run. Each call to `run` starts it from zero.
    fn progress(&self) -> Arc<dyn ProgressSink>;

    /// Counts every partition and returns one report per partition in
    /// partition order. Returns the first failure observed, after every
    /// worker has stopped.
    fn run(
        &self,
        corpus: &Corpus,
        partitions: &[Partition],
        options: &CountOptions,
    ) -> WordFreqResult<Vec<WorkerReport>>;
}

/// Creates the backend selected by `kind`.
///
/// `worker_program` is the executable the process backend launches; it
/// defaults to the current executable.
pub fn create_backend(
    kind: BackendKind,
    worker_program: Option<PathBuf>,
) -> WordFreqResult<Box<dyn ConcurrencyBackend>> {
    match kind {
        BackendKind::Threads => Ok(Box::new(ThreadBackend::new())),
        BackendKind::Processes => {
            let program = match worker_program {
                Some(path) => path,
                None => std::env::current_exe()?,
            };
            Ok(Box::new(ProcessBackend::new(program)?))
        }
    }
}
