//! Field adapters and field descriptors.
//!
//! A field adapter converts between the raw text stored in one column of a
//! table file and a typed [`Value`]. The null token parses to
//! [`Value::Null`] regardless of the field type, so nulls survive a
//! parse/format round trip for every column.

use std::fmt;

use crate::error::{StoreError, StoreResult};
use crate::value::Value;

/// The adapter used to parse and format one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Free text, stored as-is.
    Text,
    /// Base-10 signed 64-bit integer.
    Integer,
}

impl FieldType {
    /// Parses a raw column into a typed value.
    pub fn parse(&self, raw: &str, null_token: &str) -> StoreResult<Value> {
        if raw == null_token {
            return Ok(Value::Null);
        }
        match self {
            FieldType::Text => Ok(Value::Text(raw.to_string())),
            FieldType::Integer => raw.parse::<i64>().map(Value::Integer).map_err(|_| {
                StoreError::validation(format!("invalid integer literal {:?}", raw))
            }),
        }
    }

    /// Formats a typed value into its raw column text.
    ///
    /// Fails if the value's kind does not belong to this field type.
    pub fn format(&self, value: &Value, null_token: &str) -> StoreResult<String> {
        match (self, value) {
            (_, Value::Null) => Ok(null_token.to_string()),
            (FieldType::Text, Value::Text(s)) => Ok(s.clone()),
            (FieldType::Integer, Value::Integer(i)) => Ok(i.to_string()),
            (ty, other) => Err(StoreError::validation(format!(
                "cannot store {} value in {} field",
                other.kind(),
                ty
            ))),
        }
    }

    /// Returns true if `value` may be stored in a field of this type.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null) | (FieldType::Text, Value::Text(_)) | (FieldType::Integer, Value::Integer(_))
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::Integer => write!(f, "integer"),
        }
    }
}

/// Describes how one named field maps onto a column of the table file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    column_name: String,
    file_index: usize,
    field_type: FieldType,
    primary_key: bool,
}

impl FieldDescriptor {
    /// Creates a field stored at `file_index` under the header `column_name`.
    pub fn new(
        name: impl Into<String>,
        column_name: impl Into<String>,
        file_index: usize,
        field_type: FieldType,
    ) -> Self {
        Self {
            name: name.into(),
            column_name: column_name.into(),
            file_index,
            field_type,
            primary_key: false,
        }
    }

    /// Creates a text field.
    pub fn text(name: impl Into<String>, column_name: impl Into<String>, file_index: usize) -> Self {
        Self::new(name, column_name, file_index, FieldType::Text)
    }

    /// Creates an integer field.
    pub fn integer(
        name: impl Into<String>,
        column_name: impl Into<String>,
        file_index: usize,
    ) -> Self {
        Self::new(name, column_name, file_index, FieldType::Integer)
    }

    /// Marks this field as the auto-increment primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Returns the field name used by callers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column name written to the header line.
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Returns the zero-based column position in the file.
    pub fn file_index(&self) -> usize {
        self.file_index
    }

    /// Returns the field adapter.
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns true if this is the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NULL: &str = "\\N";

    #[test]
    fn test_text_identity() {
        let v = FieldType::Text.parse("The Outskirts", NULL).unwrap();
        assert_eq!(v, Value::text("The Outskirts"));
        assert_eq!(FieldType::Text.format(&v, NULL).unwrap(), "The Outskirts");
    }

    #[test]
    fn test_integer_parse() {
        assert_eq!(FieldType::Integer.parse("290", NULL).unwrap(), Value::Integer(290));
        assert_eq!(FieldType::Integer.parse("-3", NULL).unwrap(), Value::Integer(-3));

        let err = FieldType::Integer.parse("abc", NULL).unwrap_err();
        assert!(err.is_validation());
        assert!(FieldType::Integer.parse("", NULL).unwrap_err().is_validation());
    }

    #[test]
    fn test_null_round_trip() {
        for ty in [FieldType::Text, FieldType::Integer] {
            let v = ty.parse(NULL, NULL).unwrap();
            assert!(v.is_null());
            assert_eq!(ty.format(&v, NULL).unwrap(), NULL);
        }
    }

    #[test]
    fn test_format_type_mismatch() {
        let err = FieldType::Integer.format(&Value::text("x"), NULL).unwrap_err();
        assert!(err.is_validation());
        assert!(!FieldType::Text.accepts(&Value::Integer(1)));
        assert!(FieldType::Text.accepts(&Value::Null));
    }

    #[test]
    fn test_descriptor_builder() {
        let field = FieldDescriptor::integer("id", "ID", 0).primary_key();
        assert_eq!(field.name(), "id");
        assert_eq!(field.column_name(), "ID");
        assert_eq!(field.file_index(), 0);
        assert_eq!(field.field_type(), FieldType::Integer);
        assert!(field.is_primary_key());
        assert!(!FieldDescriptor::text("title", "Title", 1).is_primary_key());
    }
}
