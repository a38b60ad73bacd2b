use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::num::NonZeroUsize;
use tempfile::tempdir;
use wordfreq::backend::{ConcurrencyBackend, ThreadBackend};
use wordfreq::count::{merge, rank_all, top_k, BoundaryMode, FrequencyTable};
use wordfreq::{count, count_with, Corpus, CountConfig, WordFreqError};

fn create_corpus(dir: &tempfile::TempDir, lines: usize) -> Result<std::path::PathBuf> {
    let path = dir.path().join("corpus.txt");
    let mut file = File::create(&path)?;
    for i in 0..lines {
        writeln!(
            file,
            "the quick brown fox jumps over the lazy dog line{} the end",
            i % 17
        )?;
    }
    Ok(path)
}

fn config(path: &std::path::Path, workers: usize) -> CountConfig {
    CountConfig::new(path, NonZeroUsize::new(workers).unwrap())
}

#[test]
fn test_counts_large_corpus() -> Result<()> {
    let dir = tempdir()?;
    let path = create_corpus(&dir, 5_000)?;

    let output = count(&config(&path, 4))?;
    assert_eq!(output.total_words, 5_000 * 12);
    assert_eq!(output.table.get("the"), 15_000);
    assert_eq!(output.table.get("fox"), 5_000);
    assert_eq!(output.unique_words, 9 + 17);

    assert_eq!(output.top.len(), 10);
    assert_eq!(output.top[0].word.to_string(), "the");
    assert_eq!(output.top[0].count, 15_000);
    assert!(output.top.windows(2).all(|w| w[0].count >= w[1].count));
    Ok(())
}

#[test]
fn test_worker_count_does_not_change_result() -> Result<()> {
    let dir = tempdir()?;
    let path = create_corpus(&dir, 3_000)?;
    let corpus = Corpus::open(&path)?;
    assert!(corpus.is_mapped());

    let baseline = count_with(&config(&path, 1), &corpus, &ThreadBackend::new())?;
    for workers in 2..=8 {
        let backend = ThreadBackend::new();
        let output = count_with(&config(&path, workers), &corpus, &backend)?;
        assert_eq!(output.table, baseline.table, "workers = {}", workers);
        assert_eq!(output.total_words, baseline.total_words);
        assert_eq!(output.worker_word_total(), baseline.total_words);
        assert_eq!(output.workers.len(), workers);
        assert_eq!(backend.progress().words_processed(), baseline.total_words);
    }
    Ok(())
}

#[test]
fn test_split_boundaries_only_add_fragments() -> Result<()> {
    let dir = tempdir()?;
    let path = create_corpus(&dir, 1_000)?;
    let corpus = Corpus::open(&path)?;

    let baseline = count_with(&config(&path, 1), &corpus, &ThreadBackend::new())?;
    for workers in 2..=8 {
        let mut split = config(&path, workers);
        split.boundary_mode = BoundaryMode::Split;
        let output = count_with(&split, &corpus, &ThreadBackend::new())?;
        let extra = output.total_words - baseline.total_words;
        assert!(extra <= (workers - 1) as u64, "workers = {}", workers);
    }
    Ok(())
}

#[test]
fn test_simulated_allocation_failure_aborts_run() -> Result<()> {
    let dir = tempdir()?;
    let path = create_corpus(&dir, 100)?;

    let mut config = config(&path, 3);
    config.word_limit = Some(5);
    let err = count(&config).unwrap_err();
    assert!(matches!(err, WordFreqError::OutOfMemory(_)));
    Ok(())
}

#[test]
fn test_invalid_worker_counts() -> Result<()> {
    let dir = tempdir()?;
    let path = create_corpus(&dir, 10)?;

    let err = count(&config(&path, 9)).unwrap_err();
    assert!(matches!(err, WordFreqError::InvalidConfig(_)));
    Ok(())
}

#[test]
fn test_empty_corpus() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("empty.txt");
    File::create(&path)?;

    let output = count(&config(&path, 8))?;
    assert_eq!(output.total_words, 0);
    assert!(output.top.is_empty());
    assert!(output.table.is_empty());
    Ok(())
}

#[test]
fn test_merge_then_rank() -> Result<()> {
    let left: FrequencyTable = [("a", 5), ("b", 4), ("c", 1)].into_iter().collect();
    let right: FrequencyTable = [("b", 5), ("d", 9), ("e", 3)].into_iter().collect();
    let global = merge(vec![left, right])?;

    let top = top_k(&global, 3);
    let words: Vec<String> = top.iter().map(|e| e.word.to_string()).collect();
    assert_eq!(words, vec!["b", "d", "a"]);
    assert_eq!(top[0].count, 9);
    assert_eq!(top, rank_all(&global)[..3].to_vec());
    Ok(())
}
