use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::table::{FrequencyTable, Word};

/// A word and its count, ordered by rank: higher counts first, then words in
/// ascending byte order so that equal counts always rank the same way
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub word: Word,
    pub count: u64,
}

impl RankedEntry {
    fn key(&self) -> (Reverse<u64>, &Word) {
        (Reverse(self.count), &self.word)
    }
}

impl Ord for RankedEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl PartialOrd for RankedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Returns the `k` highest-ranked entries of `table`, best first.
///
/// Keeps a bounded heap of `k` candidates whose top is the worst one kept, so
/// the table is scanned once in O(U log k). The result equals the first `k`
/// entries of [`rank_all`].
pub fn top_k(table: &FrequencyTable, k: usize) -> Vec<RankedEntry> {
    if k == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<(Reverse<u64>, &Word)> = BinaryHeap::with_capacity(k + 1);
    for (word, count) in table.iter() {
        let candidate = (Reverse(count), word);
        if heap.len() < k {
            heap.push(candidate);
        } else if heap.peek().is_some_and(|worst| candidate < *worst) {
            heap.pop();
            heap.push(candidate);
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|(Reverse(count), word)| RankedEntry {
            word: word.clone(),
            count,
        })
        .collect()
}

/// Ranks every entry of `table`
pub fn rank_all(table: &FrequencyTable) -> Vec<RankedEntry> {
    let mut entries: Vec<RankedEntry> = table
        .iter()
        .map(|(word, count)| RankedEntry {
            word: word.clone(),
            count,
        })
        .collect();
    entries.sort_unstable();
    entries
}
