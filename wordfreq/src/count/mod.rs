//! The partition, count, merge and rank pipeline.
//!
//! A run flows through these pieces, leaf first:
//!
//! 1. [`partition`]: split the corpus into one contiguous byte range per worker
//! 2. [`tokenizer`]: lazily yield the whitespace-delimited words of a range
//! 3. [`worker`]: count a range into a [`FrequencyTable`] the worker owns
//! 4. [`merge`]: sum the worker tables into one global table
//! 5. [`rank`]: select the highest-count entries
//!
//! [`engine`] drives the steps and hands the counting to a
//! [`ConcurrencyBackend`](crate::backend::ConcurrencyBackend):
//!
//! ```rust,ignore
//! let corpus = Corpus::open(&config.corpus_path)?;
//! let output = count_with(&config, &corpus, &ThreadBackend::new())?;
//! for entry in &output.top {
//!     println!("{} {}", entry.word, entry.count);
//! }
//! ```
//!
//! Tables are hash based, so counting and merging cost O(1) per word on
//! average, and ranking keeps a bounded heap of `k` entries instead of sorting
//! the whole table.

pub mod engine;
pub mod merge;
pub mod partition;
pub mod rank;
pub mod table;
pub mod tokenizer;
pub mod worker;

pub use engine::{count, count_with, CountRun, RunState};
pub use merge::merge;
pub use partition::{partition, Partition};
pub use rank::{rank_all, top_k, RankedEntry};
pub use table::{FrequencyTable, Word};
pub use tokenizer::{BoundaryMode, Tokenizer};
pub use worker::{count_partition, CountOptions, WorkerReport};
