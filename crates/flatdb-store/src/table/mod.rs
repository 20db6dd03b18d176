//! File-backed tables.
//!
//! A [`Table`] owns the path of one delimited text file and the [`Schema`]
//! describing its columns. It caches nothing: every operation re-reads the
//! file, so the file on disk is always the source of truth.
//!
//! # File Layout
//!
//! ```text
//! ID<sep>Title<sep>Author<sep>Price<sep>Saleable\n     <- header, line 0
//! 1<sep>Dune<sep>Frank Herbert<sep>120<sep>1\n         <- data line 1
//! 2<sep>Emma<sep>Jane Austen<sep>80<sep>0\n            <- data line 2
//! ```
//!
//! # Record Lifecycle
//!
//! ```text
//! Transient (no line number) --create/append--> Persisted(N)
//! Persisted(N) --update/update_in_place--> Persisted(N)
//! ```
//!
//! There is no delete. Only one process may write a table file at a time;
//! concurrent writers are not detected.

mod reverse;
mod rewrite;
mod scan;

pub use scan::Scan;

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::codec::{trim_line_end, LineCodec};
use crate::config::TableConfig;
use crate::error::{StoreError, StoreResult};
use crate::record::Record;
use crate::schema::Schema;
use crate::value::Value;

use reverse::{read_last_line, REVERSE_CHUNK_SIZE};
use rewrite::{parent_dir, replace_line};
use scan::DataLines;

/// A table stored as one delimited text file.
#[derive(Debug, Clone)]
pub struct Table {
    path: PathBuf,
    schema: Arc<Schema>,
    codec: LineCodec,
    sync_writes: bool,
}

impl Table {
    /// Creates a table handle. The file is not touched until
    /// [`Table::init_file`] or another operation is called.
    pub fn open(config: TableConfig, schema: Schema) -> StoreResult<Self> {
        config.validate()?;
        Ok(Self {
            path: config.path,
            schema: Arc::new(schema),
            codec: LineCodec::new(config.separator, config.null_token),
            sync_writes: config.sync_writes,
        })
    }

    /// Returns the table file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the schema.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the column separator.
    pub fn separator(&self) -> char {
        self.codec.separator()
    }

    /// Returns the header line for this table, without a line terminator.
    pub fn header_string(&self) -> String {
        self.schema.header_string(self.codec.separator())
    }

    /// Creates a transient record for this table with every field NULL.
    pub fn new_record(&self) -> Record {
        Record::new(Arc::clone(&self.schema))
    }

    /// Serializes a record into the line it would occupy in the file.
    pub fn format_record(&self, record: &Record) -> StoreResult<String> {
        self.check_schema(record)?;
        self.codec.encode(record)
    }

    /// Parses a line of this table into a transient record.
    pub fn parse_line(&self, line: &str) -> StoreResult<Record> {
        self.codec.decode(&self.schema, line)
    }

    // =========================================================================
    // File lifecycle
    // =========================================================================

    /// Creates the file with a header line, or validates an existing header.
    ///
    /// A missing or empty file gets the header written. Otherwise the first
    /// line must equal [`Table::header_string`], or
    /// [`StoreError::SchemaMismatch`] is returned.
    pub fn init_file(&self) -> StoreResult<()> {
        let expected = self.header_string();

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return self.write_header(&expected);
            }
            Err(e) => return Err(self.io_err(e)),
        };

        let mut first = String::new();
        let n = BufReader::new(file)
            .read_line(&mut first)
            .map_err(|e| self.io_err(e))?;
        if n == 0 {
            return self.write_header(&expected);
        }

        let found = trim_line_end(&first);
        if found != expected {
            warn!(path = %self.path.display(), expected = %expected, found = %found, "table header mismatch");
            return Err(StoreError::SchemaMismatch {
                path: self.path.clone(),
                expected,
                found: found.to_string(),
            });
        }

        debug!(path = %self.path.display(), "table header validated");
        Ok(())
    }

    fn write_header(&self, header: &str) -> StoreResult<()> {
        let dir = parent_dir(&self.path);
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

        let mut file = File::create(&self.path).map_err(|e| self.io_err(e))?;
        file.write_all(header.as_bytes())
            .and_then(|()| file.write_all(b"\n"))
            .map_err(|e| self.io_err(e))?;
        if self.sync_writes {
            file.sync_all().map_err(|e| self.io_err(e))?;
        }

        info!(path = %self.path.display(), "created table file");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns the last record in the file, or `None` if there are no data
    /// lines.
    ///
    /// Reads backward from the end of the file, so the cost depends on the
    /// length of the last line only. The returned record has no line number,
    /// since its position is not known without counting every line.
    ///
    /// Compare the result with a freshly appended record through
    /// [`Record::values`]: comparing whole records also compares line
    /// numbers, which differ.
    pub fn last(&self) -> StoreResult<Option<Record>> {
        let mut file = File::open(&self.path).map_err(|e| self.io_err(e))?;
        let last = read_last_line(&mut file, REVERSE_CHUNK_SIZE).map_err(|e| self.io_err(e))?;

        match last {
            // A line starting at offset 0 is the header.
            None => Ok(None),
            Some(last) if last.offset == 0 => Ok(None),
            Some(last) => {
                let line = String::from_utf8(last.bytes).map_err(|e| {
                    self.io_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
                })?;
                self.parse_line(&line).map(Some)
            }
        }
    }

    /// Returns a lazy scan over all records in file order.
    ///
    /// Every call re-opens the file and starts from the first data line.
    pub fn scan(&self) -> StoreResult<Scan> {
        let lines = self.data_lines()?;
        Ok(Scan::new(lines, self.codec.clone(), Arc::clone(&self.schema)))
    }

    /// Returns the number of data lines.
    pub fn count(&self) -> StoreResult<u64> {
        let file = File::open(&self.path).map_err(|e| self.io_err(e))?;
        let mut lines = 0u64;
        for segment in BufReader::new(file).split(b'\n') {
            segment.map_err(|e| self.io_err(e))?;
            lines += 1;
        }
        Ok(lines.saturating_sub(1))
    }

    /// Returns the record on data line `line_number` (1-based).
    pub fn get_by_line(&self, line_number: u64) -> StoreResult<Record> {
        if line_number == 0 {
            return Err(StoreError::not_found("line 0 is the header"));
        }
        for entry in self.data_lines()? {
            let (n, line) = entry?;
            if n == line_number {
                let mut record = self.parse_line(&line)?;
                record.set_line_number(Some(n));
                return Ok(record);
            }
        }
        Err(StoreError::not_found(format!("line {}", line_number)))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Appends a record as a new last line.
    ///
    /// The file must already exist; see [`Table::init_file`].
    pub fn append(&self, record: &Record) -> StoreResult<()> {
        let mut line = self.format_record(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;
        file.write_all(line.as_bytes()).map_err(|e| self.io_err(e))?;
        if self.sync_writes {
            file.sync_data().map_err(|e| self.io_err(e))?;
        }

        debug!(path = %self.path.display(), pk = ?record.primary_key(), "appended record");
        Ok(())
    }

    /// Persists a transient record with the next primary key.
    ///
    /// The key is the last record's key plus one, or 1 for an empty table.
    /// Any key already set on `record` is overwritten. The returned record
    /// carries its line number.
    pub fn create(&self, record: Record) -> StoreResult<Record> {
        if record.is_persisted() {
            return Err(StoreError::validation(
                "record is already persisted; use update instead",
            ));
        }
        self.check_schema(&record)?;

        let pk = match self.last()? {
            None => 1,
            Some(last) => {
                let key = last.primary_key().ok_or_else(|| {
                    StoreError::validation("last record has a NULL primary key")
                })?;
                key.checked_add(1)
                    .ok_or_else(|| StoreError::validation("primary key overflow"))?
            }
        };

        let mut record = record;
        record.set_primary_key(pk);
        self.append(&record)?;
        let line_number = self.count()?;
        record.set_line_number(Some(line_number));

        debug!(path = %self.path.display(), pk, line = line_number, "created record");
        Ok(record)
    }

    /// Replaces data line `line_number` with `new_line`.
    ///
    /// The header (line 0) cannot be replaced. `new_line` must be a valid
    /// line for this table. Every other line is left byte-identical.
    pub fn update_in_place(&self, line_number: u64, new_line: &str) -> StoreResult<()> {
        if line_number == 0 {
            return Err(StoreError::validation("the header line cannot be replaced"));
        }
        if new_line.contains('\n') {
            return Err(StoreError::validation("replacement line contains a line break"));
        }
        self.parse_line(new_line)?;

        if !replace_line(&self.path, line_number, new_line, self.sync_writes)? {
            return Err(StoreError::not_found(format!("line {}", line_number)));
        }

        debug!(path = %self.path.display(), line = line_number, "rewrote line");
        Ok(())
    }

    /// Applies `changes` to a persisted record and rewrites its line.
    ///
    /// The record keeps its line number. Changing the primary key is
    /// rejected. On failure the record is left unchanged.
    pub fn update<I, K, V>(&self, record: &mut Record, changes: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let line_number = record
            .line_number()
            .ok_or_else(|| StoreError::validation("record is not persisted"))?;
        self.check_schema(record)?;

        let pk_name = self.schema.primary_key().name();
        let mut next = record.clone();
        for (name, value) in changes {
            let name = name.as_ref();
            let value = value.into();
            if name == pk_name && next.get(name) != Some(&value) {
                return Err(StoreError::validation("the primary key cannot be changed"));
            }
            next.set(name, value)?;
        }

        let line = self.codec.encode(&next)?;
        self.update_in_place(line_number, &line)?;
        record.replace_values(next.values().to_vec());
        Ok(())
    }

    /// Creates a transient record, or rewrites a persisted one as it is.
    pub fn save(&self, record: &mut Record) -> StoreResult<()> {
        if record.is_persisted() {
            self.update(record, std::iter::empty::<(&str, Value)>())
        } else {
            *record = self.create(record.clone())?;
            Ok(())
        }
    }

    pub(crate) fn codec(&self) -> &LineCodec {
        &self.codec
    }

    pub(crate) fn data_lines(&self) -> StoreResult<DataLines> {
        DataLines::open(self.path.clone())
    }

    fn check_schema(&self, record: &Record) -> StoreResult<()> {
        if Arc::ptr_eq(record.schema(), &self.schema) || **record.schema() == *self.schema {
            Ok(())
        } else {
            Err(StoreError::validation("record belongs to a different schema"))
        }
    }

    fn io_err(&self, e: std::io::Error) -> StoreError {
        StoreError::io(&self.path, e)
    }
}
