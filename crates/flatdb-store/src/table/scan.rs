//! Forward iteration over the data lines of a table file.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::PathBuf;
use std::sync::Arc;

use crate::codec::LineCodec;
use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::schema::Schema;

/// Iterator over raw data lines, paired with their 1-based line numbers.
///
/// The header is consumed on construction. The iterator stops after the
/// first I/O error.
pub(crate) struct DataLines {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    line_number: u64,
    done: bool,
}

impl DataLines {
    pub(crate) fn open(path: PathBuf) -> StoreResult<Self> {
        let file = File::open(&path).map_err(|e| StoreError::io(&path, e))?;
        let mut lines = BufReader::new(file).lines();
        if let Some(header) = lines.next() {
            header.map_err(|e| StoreError::io(&path, e))?;
        }
        Ok(Self {
            lines,
            path,
            line_number: 0,
            done: false,
        })
    }
}

impl Iterator for DataLines {
    type Item = StoreResult<(u64, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lines.next()? {
            Ok(line) => {
                self.line_number += 1;
                Some(Ok((self.line_number, line)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(StoreError::io(&self.path, e)))
            }
        }
    }
}

/// Lazy scan over the records of a table, in file order.
///
/// Each record carries its line number. A line that fails to decode yields
/// an error for that line and the scan continues with the next one.
pub struct Scan {
    lines: DataLines,
    codec: LineCodec,
    schema: Arc<Schema>,
}

impl Scan {
    pub(crate) fn new(lines: DataLines, codec: LineCodec, schema: Arc<Schema>) -> Self {
        Self {
            lines,
            codec,
            schema,
        }
    }

    /// Collects all remaining records, stopping at the first error.
    pub fn collect_records(self) -> StoreResult<Vec<Record>> {
        self.collect()
    }
}

impl Iterator for Scan {
    type Item = StoreResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let (line_number, line) = match self.lines.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(e)),
        };
        let record = self.codec.decode(&self.schema, &line).map(|mut record| {
            record.set_line_number(Some(line_number));
            record
        });
        Some(record)
    }
}

impl std::fmt::Debug for Scan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scan")
            .field("path", &self.lines.path)
            .field("line_number", &self.lines.line_number)
            .finish()
    }
}
