//! Error types for the word-frequency pipeline.
//!
//! Every error is terminal for a run: nothing is retried, and a failed run
//! never yields a partial ranking. The variants mirror the failure classes of
//! the pipeline:
//!
//! - `InvalidConfig`: rejected before any worker starts (bad worker count,
//!   unreadable corpus, malformed config file)
//! - `OutOfMemory`: an allocation for a word, a table slot or a decode buffer
//!   could not be obtained
//! - `WorkerFailure`: a worker reported an error or terminated abnormally
//! - `Transfer`: a serialized table could not be encoded or decoded
//!
//! ```rust,ignore
//! match wordfreq::count(&config) {
//!     Ok(output) => // Report output.top,
//!     Err(WordFreqError::InvalidConfig(msg)) => // Print usage,
//!     Err(e) => // Abort the run
//! }
//! ```

use std::collections::TryReserveError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for word counting operations
pub type WordFreqResult<T> = Result<T, WordFreqError>;

/// Errors that can occur while counting words
#[derive(Error, Debug)]
pub enum WordFreqError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Corpus not readable: {path}: {source}")]
    CorpusUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Out of memory while {0}")]
    OutOfMemory(String),
    #[error("Worker {worker} failed: {reason}")]
    WorkerFailure { worker: usize, reason: String },
    #[error("Transfer error: {0}")]
    Transfer(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl WordFreqError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn corpus_unreadable(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::CorpusUnreadable {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn out_of_memory(context: impl Into<String>) -> Self {
        Self::OutOfMemory(context.into())
    }

    pub fn worker_failure(worker: usize, reason: impl Into<String>) -> Self {
        Self::WorkerFailure {
            worker,
            reason: reason.into(),
        }
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::Transfer(msg.into())
    }

    /// True for errors raised before any worker was started
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig(_) | Self::CorpusUnreadable { .. }
        )
    }
}

impl From<TryReserveError> for WordFreqError {
    fn from(err: TryReserveError) -> Self {
        Self::OutOfMemory(format!("reserving table capacity ({})", err))
    }
}
