use memmap2::MmapRaw;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::errors::{WordFreqError, WordFreqResult};

/// Number of words a worker counts between progress publications
pub const PROGRESS_BATCH: u64 = 10_000;

/// Aggregate words-processed counter shared by all workers of a run.
///
/// The counter only grows during a run and is zeroed when the next run starts.
/// Workers publish in batches of [`PROGRESS_BATCH`],
/// so readers see a value that trails the true count by less than one batch
/// per worker until the run is joined.
pub trait ProgressSink: Send + Sync {
    /// Adds `words` to the counter
    fn add(&self, words: u64);

    /// Current value of the counter
    fn words_processed(&self) -> u64;

    /// Zeroes the counter before a new run
    fn reset(&self);
}

/// Counter for workers sharing one address space, guarded by a mutex
#[derive(Debug, Clone, Default)]
pub struct SharedProgress {
    words: Arc<Mutex<u64>>,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for SharedProgress {
    fn add(&self, words: u64) {
        let mut total = self.words.lock().unwrap_or_else(|e| e.into_inner());
        *total += words;
    }

    fn words_processed(&self) -> u64 {
        *self.words.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reset(&self) {
        *self.words.lock().unwrap_or_else(|e| e.into_inner()) = 0;
    }
}

/// Counter stored in a file-backed shared mapping.
///
/// Every process that maps the same file sees the same eight bytes, which are
/// only ever touched through atomic operations.
#[derive(Debug)]
pub struct MappedCounter {
    map: MmapRaw,
    path: PathBuf,
}

impl MappedCounter {
    /// Creates the backing file, zeroed, and maps it
    pub fn create(path: &Path) -> WordFreqResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(std::mem::size_of::<AtomicU64>() as u64)?;
        debug!("Created shared progress counter at {}", path.display());
        Self::map(file, path)
    }

    /// Maps a counter file created by another process
    pub fn open(path: &Path) -> WordFreqResult<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        if len < std::mem::size_of::<AtomicU64>() as u64 {
            return Err(WordFreqError::transfer(format!(
                "progress counter {} is {} bytes, expected 8",
                path.display(),
                len
            )));
        }
        Self::map(file, path)
    }

    fn map(file: std::fs::File, path: &Path) -> WordFreqResult<Self> {
        let map = MmapRaw::map_raw(&file)?;
        Ok(Self {
            map,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn counter(&self) -> &AtomicU64 {
        // The mapping is page aligned, at least eight bytes long and lives as
        // long as `self`; all access goes through the atomic.
        unsafe { &*(self.map.as_mut_ptr() as *const AtomicU64) }
    }
}

impl ProgressSink for MappedCounter {
    fn add(&self, words: u64) {
        self.counter().fetch_add(words, Ordering::Relaxed);
    }

    fn words_processed(&self) -> u64 {
        self.counter().load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.counter().store(0, Ordering::Relaxed);
    }
}

/// Accumulates per-word ticks locally and publishes them in batches
pub struct ProgressBatcher<'a> {
    sink: &'a dyn ProgressSink,
    pending: u64,
}

impl<'a> ProgressBatcher<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink, pending: 0 }
    }

    #[inline]
    pub fn tick(&mut self) {
        self.pending += 1;
        if self.pending == PROGRESS_BATCH {
            self.flush();
        }
    }

    /// Publishes whatever is pending
    pub fn flush(&mut self) {
        if self.pending > 0 {
            self.sink.add(self.pending);
            self.pending = 0;
        }
    }
}
