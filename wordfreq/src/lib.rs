pub mod backend;
pub mod config;
pub mod corpus;
pub mod count;
pub mod errors;
pub mod progress;
pub mod results;

pub use config::{BackendKind, CountConfig};
pub use corpus::Corpus;
pub use count::{count, count_with, FrequencyTable, RankedEntry, Word};
pub use errors::{WordFreqError, WordFreqResult};
pub use results::{CountOutput, WorkerStats};
