use tracing::debug;

use super::table::FrequencyTable;
use super::worker::WorkerReport;
use crate::errors::WordFreqResult;

/// Combines per-worker tables into one global table by summing counts per word.
///
/// Merging is commutative, so the order of `tables` does not affect the
/// result. The largest table is reused as the accumulator to avoid rehashing
/// its entries.
pub fn merge<I>(tables: I) -> WordFreqResult<FrequencyTable>
where
    I: IntoIterator<Item = FrequencyTable>,
{
    let mut tables: Vec<FrequencyTable> = tables.into_iter().collect();
    let Some(largest) = tables
        .iter()
        .enumerate()
        .max_by_key(|(_, table)| table.len())
        .map(|(i, _)| i)
    else {
        return Ok(FrequencyTable::new());
    };

    let mut global = tables.swap_remove(largest);
    global.clear_word_limit();
    for table in tables {
        global.absorb(table)?;
    }

    debug!("Merged tables into {} unique words", global.len());
    Ok(global)
}

/// Merges the tables carried by worker reports
pub fn merge_reports(reports: Vec<WorkerReport>) -> WordFreqResult<FrequencyTable> {
    merge(reports.into_iter().map(|report| report.table))
}
