use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::errors::{WordFreqError, WordFreqResult};

/// A half-open byte range `[start, start + len)` of the corpus assigned to one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    /// Position of the partition in start order
    pub index: usize,
    /// First byte of the range
    pub start: usize,
    /// Length of the range in bytes
    pub len: usize,
}

impl Partition {
    /// One past the last byte of the range
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Splits `corpus_len` bytes into `worker_count` contiguous partitions.
///
/// Every partition but the last gets `corpus_len / worker_count` bytes; the last
/// one absorbs the remainder. The ranges are byte ranges, not token aligned.
pub fn partition(
    corpus_len: usize,
    worker_count: usize,
    max_workers: usize,
) -> WordFreqResult<Vec<Partition>> {
    if worker_count == 0 || worker_count > max_workers {
        return Err(WordFreqError::invalid_config(format!(
            "worker count must be in [1, {}], got {}",
            max_workers, worker_count
        )));
    }

    let base = corpus_len / worker_count;
    let partitions = (0..worker_count)
        .map(|index| {
            let start = base * index;
            let len = if index + 1 == worker_count {
                corpus_len - base * (worker_count - 1)
            } else {
                base
            };
            Partition { index, start, len }
        })
        .collect();

    Ok(partitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_WORKERS;

    #[test]
    fn test_partitions_tile_the_corpus() {
        for corpus_len in [0usize, 1, 7, 8, 9, 100, 1023, 65_537] {
            for workers in 1..=MAX_WORKERS {
                let parts = partition(corpus_len, workers, MAX_WORKERS).unwrap();
                assert_eq!(parts.len(), workers);

                let mut expected_start = 0;
                for (i, p) in parts.iter().enumerate() {
                    assert_eq!(p.index, i);
                    assert_eq!(p.start, expected_start, "gap or overlap before {}", i);
                    expected_start = p.end();
                }
                assert_eq!(expected_start, corpus_len);
                assert_eq!(parts.iter().map(|p| p.len).sum::<usize>(), corpus_len);

                let base = corpus_len / workers;
                assert_eq!(parts[workers - 1].len, corpus_len - base * (workers - 1));
            }
        }
    }

    #[test]
    fn test_last_partition_absorbs_remainder() {
        let parts = partition(10, 3, MAX_WORKERS).unwrap();
        let lens: Vec<usize> = parts.iter().map(|p| p.len).collect();
        assert_eq!(lens, vec![3, 3, 4]);
        assert_eq!(parts[2].range(), 6..10);
    }

    #[test]
    fn test_more_workers_than_bytes() {
        let parts = partition(3, 8, MAX_WORKERS).unwrap();
        assert!(parts[..7].iter().all(Partition::is_empty));
        assert_eq!(parts[7].range(), 0..3);
    }

    #[test]
    fn test_invalid_worker_count() {
        assert!(matches!(
            partition(100, 0, MAX_WORKERS),
            Err(WordFreqError::InvalidConfig(_))
        ));
        assert!(matches!(
            partition(100, MAX_WORKERS + 1, MAX_WORKERS),
            Err(WordFreqError::InvalidConfig(_))
        ));
    }
}
