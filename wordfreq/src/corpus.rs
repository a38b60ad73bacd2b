use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::errors::{WordFreqError, WordFreqResult};

const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB

#[derive(Debug)]
enum Backing {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

/// Read-only view of the text corpus.
///
/// Small files are read into memory, larger ones are memory mapped. Either way
/// the corpus is a flat byte slice that workers index by partition.
#[derive(Debug)]
pub struct Corpus {
    path: Option<PathBuf>,
    backing: Backing,
}

impl Corpus {
    /// Opens the corpus at `path`, choosing the read strategy by file size
    pub fn open(path: &Path) -> WordFreqResult<Self> {
        let file = File::open(path).map_err(|e| WordFreqError::corpus_unreadable(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| WordFreqError::corpus_unreadable(path, e))?
            .len();

        let backing = if size < SMALL_FILE_THRESHOLD {
            trace!("Reading corpus into memory: {} ({} bytes)", path.display(), size);
            let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
            let mut bytes = Vec::new();
            bytes
                .try_reserve_exact(size as usize)
                .map_err(|_| WordFreqError::out_of_memory("reading the corpus"))?;
            reader
                .read_to_end(&mut bytes)
                .map_err(|e| WordFreqError::corpus_unreadable(path, e))?;
            Backing::Owned(bytes)
        } else {
            trace!("Memory mapping corpus: {} ({} bytes)", path.display(), size);
            // The corpus must not be modified while a run is in progress
            let mmap = unsafe { Mmap::map(&file) }
                .map_err(|e| WordFreqError::corpus_unreadable(path, e))?;
            Backing::Mapped(mmap)
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            backing,
        })
    }

    /// Wraps in-memory text, used by tests and embedders
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: None,
            backing: Backing::Owned(bytes.into()),
        }
    }

    /// Path the corpus was opened from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self.backing, Backing::Mapped(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.backing {
            Backing::Owned(bytes) => bytes,
            Backing::Mapped(mmap) => mmap,
        }
    }
}

impl Deref for Corpus {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_small_file_is_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small.txt");
        std::fs::write(&path, "the cat the dog").unwrap();

        let corpus = Corpus::open(&path).unwrap();
        assert!(!corpus.is_mapped());
        assert_eq!(corpus.as_bytes(), b"the cat the dog");
        assert_eq!(corpus.path(), Some(path.as_path()));
    }

    #[test]
    fn test_large_file_is_mapped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("large.txt");
        let mut file = File::create(&path).unwrap();
        let line = "alpha beta gamma delta\n";
        let repeats = (SMALL_FILE_THRESHOLD as usize / line.len()) + 10;
        for _ in 0..repeats {
            file.write_all(line.as_bytes()).unwrap();
        }
        drop(file);

        let corpus = Corpus::open(&path).unwrap();
        assert!(corpus.is_mapped());
        assert_eq!(corpus.len(), line.len() * repeats);
        assert!(corpus.starts_with(b"alpha beta"));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();

        let corpus = Corpus::open(&path).unwrap();
        assert!(corpus.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = Corpus::open(Path::new("does/not/exist.txt")).unwrap_err();
        assert!(matches!(err, WordFreqError::CorpusUnreadable { .. }));
        assert!(err.is_config_error());
    }
}
