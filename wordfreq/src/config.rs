use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::count::tokenizer::{BoundaryMode, DEFAULT_MAX_WORD_LEN};
use crate::errors::{WordFreqError, WordFreqResult};

/// Upper bound on the number of workers a run may use
pub const MAX_WORKERS: usize = 8;

/// Number of ranked entries reported by default
pub const DEFAULT_TOP_K: usize = 10;

/// Which concurrency backend executes the workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Worker threads in this process, results handed back by move
    #[default]
    Threads,
    /// Child processes, results handed back through a serialized transfer file
    Processes,
}

impl std::str::FromStr for BackendKind {
    type Err = WordFreqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "threads" | "thread" => Ok(Self::Threads),
            "processes" | "process" => Ok(Self::Processes),
            other => Err(WordFreqError::invalid_config(format!(
                "unknown backend '{}', expected 'threads' or 'processes'",
                other
            ))),
        }
    }
}

/// Values given on the command line; `None` leaves the configured value alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    pub corpus_path: Option<PathBuf>,
    pub worker_count: Option<NonZeroUsize>,
    pub backend: Option<BackendKind>,
    pub top_k: Option<usize>,
    pub max_word_len: Option<usize>,
    pub boundary_mode: Option<BoundaryMode>,
    pub word_limit: Option<usize>,
    pub log_level: Option<String>,
}

/// Configuration for a counting run.
///
/// # Configuration Locations
///
/// Configuration is loaded from these locations, later entries taking precedence:
/// 1. Global `$HOME/.config/wordfreq/config.yaml`
/// 2. Local `.wordfreq.yaml` in the current directory
/// 3. Custom config file given via `--config`
///
/// Command-line values are merged last, see [`CountConfig::merge_with_cli`].
///
/// # Configuration Format
///
/// ```yaml
/// # Corpus to count
/// corpus_path: "corpus.txt"
///
/// # Number of workers (1-8)
/// worker_count: 4
///
/// # threads | processes
/// backend: "threads"
///
/// # Number of ranked words to report
/// top_k: 10
///
/// # Tokens longer than this many bytes are truncated
/// max_word_len: 99
///
/// # stitch: re-join tokens split by a partition boundary
/// # split: count both halves separately
/// boundary_mode: "stitch"
///
/// # Optional cap on distinct words per worker
/// word_limit: 1000000
///
/// # Log level (trace, debug, info, warn, error)
/// log_level: "info"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountConfig {
    /// Path of the text corpus to count
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// Number of workers; must not exceed [`MAX_WORKERS`]
    #[serde(default = "default_worker_count")]
    pub worker_count: NonZeroUsize,

    /// Backend that runs the workers
    #[serde(default)]
    pub backend: BackendKind,

    /// Number of top entries to report
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Maximum word length in bytes
    #[serde(default = "default_max_word_len")]
    pub max_word_len: usize,

    /// How tokens crossing a partition boundary are counted
    #[serde(default)]
    pub boundary_mode: BoundaryMode,

    /// Maximum number of distinct words a single worker may hold.
    /// Exceeding it fails the run with an out-of-memory error.
    #[serde(default)]
    pub word_limit: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("corpus.txt")
}

fn default_worker_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get().clamp(1, MAX_WORKERS)).unwrap_or(NonZeroUsize::MIN)
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_max_word_len() -> usize {
    DEFAULT_MAX_WORD_LEN
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for CountConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            worker_count: default_worker_count(),
            backend: BackendKind::default(),
            top_k: default_top_k(),
            max_word_len: default_max_word_len(),
            boundary_mode: BoundaryMode::default(),
            word_limit: None,
            log_level: default_log_level(),
        }
    }
}

impl CountConfig {
    /// Creates a config for `corpus_path` with `worker_count` workers and defaults otherwise
    pub fn new(corpus_path: impl Into<PathBuf>, worker_count: NonZeroUsize) -> Self {
        Self {
            corpus_path: corpus_path.into(),
            worker_count,
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration, layering a specific file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("wordfreq/config.yaml")),
            Some(PathBuf::from(".wordfreq.yaml")),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments with configuration file values.
    ///
    /// Only the values actually given on the command line replace file values,
    /// so an explicit flag wins even when it repeats the built-in default.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(path) = cli.corpus_path {
            self.corpus_path = path;
        }
        if let Some(workers) = cli.worker_count {
            self.worker_count = workers;
        }
        if let Some(backend) = cli.backend {
            self.backend = backend;
        }
        if let Some(top_k) = cli.top_k {
            self.top_k = top_k;
        }
        if let Some(max_word_len) = cli.max_word_len {
            self.max_word_len = max_word_len;
        }
        if let Some(mode) = cli.boundary_mode {
            self.boundary_mode = mode;
        }
        if cli.word_limit.is_some() {
            self.word_limit = cli.word_limit;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Checks the values that cannot be expressed in the types
    pub fn validate(&self) -> WordFreqResult<()> {
        let workers = self.worker_count.get();
        if workers > MAX_WORKERS {
            return Err(WordFreqError::invalid_config(format!(
                "worker count must be in [1, {}], got {}",
                MAX_WORKERS, workers
            )));
        }
        if self.top_k == 0 {
            return Err(WordFreqError::invalid_config("top_k must be at least 1"));
        }
        if self.max_word_len == 0 {
            return Err(WordFreqError::invalid_config(
                "max_word_len must be at least 1",
            ));
        }
        Ok(())
    }
}
