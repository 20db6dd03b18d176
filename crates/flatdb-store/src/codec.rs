//! Line encoding and decoding.
//!
//! Converts between [`Record`]s and the delimited text lines stored in a
//! table file.
//!
//! # Line Format
//!
//! ```text
//! <col 0><sep><col 1><sep>...<sep><col n-1>\n
//! ```
//!
//! Columns appear in file-index order. There is no quoting or escaping, so
//! a value containing the separator or a line break cannot be stored; the
//! encoder rejects such values instead of writing a misaligned row.

use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::field::FieldDescriptor;
use crate::record::Record;
use crate::schema::Schema;
use crate::value::Value;

/// Encodes and decodes the lines of one table file.
#[derive(Debug, Clone)]
pub struct LineCodec {
    separator: char,
    null_token: String,
}

impl LineCodec {
    /// Creates a codec for the given separator and null token.
    pub fn new(separator: char, null_token: impl Into<String>) -> Self {
        Self {
            separator,
            null_token: null_token.into(),
        }
    }

    /// Returns the column separator.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Returns the text stored for NULL values.
    pub fn null_token(&self) -> &str {
        &self.null_token
    }

    /// Encodes a record into a line, without the trailing newline.
    pub fn encode(&self, record: &Record) -> StoreResult<String> {
        self.encode_values(record.schema(), record.values())
    }

    /// Encodes values in file-column order into a line.
    pub fn encode_values(&self, schema: &Schema, values: &[Value]) -> StoreResult<String> {
        if values.len() != schema.len() {
            return Err(StoreError::validation(format!(
                "expected {} values, got {}",
                schema.len(),
                values.len()
            )));
        }

        let mut line = String::new();
        for (i, (field, value)) in schema.fields().iter().zip(values).enumerate() {
            if i > 0 {
                line.push(self.separator);
            }
            let raw = field.field_type().format(value, &self.null_token)?;
            self.check_storable(field, value, &raw)?;
            line.push_str(&raw);
        }
        Ok(line)
    }

    /// Decodes a line into a transient record.
    pub fn decode(&self, schema: &Arc<Schema>, line: &str) -> StoreResult<Record> {
        let line = trim_line_end(line);
        let columns: Vec<&str> = line.split(self.separator).collect();
        if columns.len() != schema.len() {
            return Err(StoreError::validation(format!(
                "expected {} columns, found {} in line {:?}",
                schema.len(),
                columns.len(),
                line
            )));
        }

        let values = schema
            .fields()
            .iter()
            .zip(columns)
            .map(|(field, raw)| field.field_type().parse(raw, &self.null_token))
            .collect::<StoreResult<Vec<_>>>()?;
        Record::from_values(Arc::clone(schema), values)
    }

    /// Decodes only the column at `position` of a line.
    pub fn decode_column(&self, schema: &Schema, line: &str, position: usize) -> StoreResult<Value> {
        let line = trim_line_end(line);
        let field = schema.fields().get(position).ok_or_else(|| {
            StoreError::validation(format!("column {} out of range", position))
        })?;
        let raw = line.split(self.separator).nth(position).ok_or_else(|| {
            StoreError::validation(format!(
                "line has no column {} ({:?}): {:?}",
                position,
                field.name(),
                line
            ))
        })?;
        field.field_type().parse(raw, &self.null_token)
    }

    fn check_storable(&self, field: &FieldDescriptor, value: &Value, raw: &str) -> StoreResult<()> {
        if raw.contains(self.separator) || raw.contains('\n') || raw.contains('\r') {
            return Err(StoreError::validation(format!(
                "value of field {:?} contains the separator or a line break",
                field.name()
            )));
        }
        if !value.is_null() && raw == self.null_token {
            return Err(StoreError::validation(format!(
                "value of field {:?} collides with the null token {:?}",
                field.name(),
                self.null_token
            )));
        }
        Ok(())
    }
}

/// Strips a trailing `\n` or `\r\n` from a line.
pub(crate) fn trim_line_end(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
