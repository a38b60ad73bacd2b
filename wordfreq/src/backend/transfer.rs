//! Byte format used to move a frequency table across a process boundary.
//!
//! All integers are little-endian `i32`:
//!
//! ```text
//! [unique_words]
//! unique_words x ( [word_len] [word bytes] [count] )
//! ```
//!
//! The format is internal to one run and independent of the transport: any
//! `Read`/`Write` pair will do.
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::count::table::{FrequencyTable, Word};
use crate::errors::{WordFreqError, WordFreqResult};

const BUFFER_CAPACITY: usize = 65536;

fn field(value: usize, what: &str) -> WordFreqResult<[u8; 4]> {
    i32::try_from(value)
        .map(i32::to_le_bytes)
        .map_err(|_| WordFreqError::transfer(format!("{} {} does not fit in an i32", what, value)))
}

/// Serializes `table` into `writer`
pub fn encode<W: Write>(table: &FrequencyTable, writer: &mut W) -> WordFreqResult<()> {
    writer.write_all(&field(table.len(), "unique word count")?)?;
    for (word, count) in table.iter() {
        writer.write_all(&field(word.len(), "word length")?)?;
        writer.write_all(word.as_bytes())?;
        let count = usize::try_from(count).unwrap_or(usize::MAX);
        writer.write_all(&field(count, "count")?)?;
    }
    Ok(())
}

fn truncated(err: io::Error, what: &str) -> WordFreqError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        WordFreqError::transfer(format!("stream truncated while reading {}", what))
    } else {
        WordFreqError::IoError(err)
    }
}

fn read_len<R: Read>(reader: &mut R, what: &str) -> WordFreqResult<u64> {
    let mut buf = [0u8; 4];
    reader
        .read_exact(&mut buf)
        .map_err(|e| truncated(e, what))?;
    let value = i32::from_le_bytes(buf);
    u64::try_from(value)
        .map_err(|_| WordFreqError::transfer(format!("negative {}: {}", what, value)))
}

/// Reads a table previously written by [`encode`].
///
/// The stream must contain exactly one table: short reads, negative fields,
/// repeated words and trailing bytes are all rejected.
pub fn decode<R: Read>(reader: &mut R) -> WordFreqResult<FrequencyTable> {
    let unique = read_len(reader, "unique word count")?;
    let mut table = FrequencyTable::new();

    for _ in 0..unique {
        let len = read_len(reader, "word length")?;
        let mut bytes = Vec::new();
        // Reserve at most one buffer up front; the rest grows with the data
        // actually present instead of trusting `len`
        bytes
            .try_reserve(len.min(BUFFER_CAPACITY as u64) as usize)
            .map_err(|_| WordFreqError::out_of_memory("decoding a transferred word"))?;
        let read = reader.by_ref().take(len).read_to_end(&mut bytes)?;
        if (read as u64) < len {
            return Err(WordFreqError::transfer(
                "stream truncated while reading word bytes",
            ));
        }
        let count = read_len(reader, "count")?;

        if table.contains(&bytes) {
            return Err(WordFreqError::transfer(format!(
                "word {:?} appears twice",
                String::from_utf8_lossy(&bytes)
            )));
        }
        table.add(Word::new(&bytes)?, count)?;
    }

    let mut probe = [0u8; 1];
    if reader.read(&mut probe)? != 0 {
        return Err(WordFreqError::transfer("trailing bytes after last record"));
    }
    Ok(table)
}

/// Writes `table` to a new file at `path`
pub fn write_file(path: &Path, table: &FrequencyTable) -> WordFreqResult<()> {
    let mut writer = BufWriter::with_capacity(BUFFER_CAPACITY, File::create(path)?);
    encode(table, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Reads the table stored at `path`
pub fn read_file(path: &Path) -> WordFreqResult<FrequencyTable> {
    let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, File::open(path)?);
    decode(&mut reader)
}
