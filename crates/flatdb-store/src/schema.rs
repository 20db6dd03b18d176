//! Schema registry.
//!
//! A [`Schema`] is built once per record type from a list of
//! [`FieldDescriptor`]s. Registration validates the declaration and sorts the
//! fields into file-column order, which is the canonical on-disk layout
//! regardless of the order the fields were declared in.

use std::collections::HashSet;

use crate::error::{StoreError, StoreResult};
use crate::field::{FieldDescriptor, FieldType};

/// An ordered, validated set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Fields in file-column order.
    fields: Vec<FieldDescriptor>,
    /// Position of the primary key in `fields`.
    primary_key: usize,
}

impl Schema {
    /// Validates `fields` and builds a schema from them.
    ///
    /// Fails if there is not exactly one primary key, if the primary key is
    /// not an integer field, if field names repeat, or if the file indices
    /// are not a permutation of `0..fields.len()`.
    pub fn register(fields: Vec<FieldDescriptor>) -> StoreResult<Self> {
        if fields.is_empty() {
            return Err(StoreError::validation("schema declares no fields"));
        }

        {
            let mut names = HashSet::with_capacity(fields.len());
            for field in &fields {
                if !names.insert(field.name()) {
                    return Err(StoreError::validation(format!(
                        "field {:?} is declared more than once",
                        field.name()
                    )));
                }
            }
        }

        let mut fields = fields;
        fields.sort_by_key(FieldDescriptor::file_index);
        for (expected, field) in fields.iter().enumerate() {
            if field.file_index() != expected {
                return Err(StoreError::validation(format!(
                    "file indices must be unique and contiguous from 0: field {:?} has index {}, expected {}",
                    field.name(),
                    field.file_index(),
                    expected
                )));
            }
        }

        let mut keys = fields.iter().enumerate().filter(|(_, f)| f.is_primary_key());
        let primary_key = match (keys.next(), keys.next()) {
            (Some((pos, _)), None) => pos,
            (None, _) => return Err(StoreError::validation("schema declares no primary key")),
            (Some(_), Some(_)) => {
                return Err(StoreError::validation(
                    "a schema can only have one primary key",
                ))
            }
        };
        if fields[primary_key].field_type() != FieldType::Integer {
            return Err(StoreError::validation(format!(
                "primary key {:?} must be an integer field",
                fields[primary_key].name()
            )));
        }

        Ok(Self {
            fields,
            primary_key,
        })
    }

    /// Returns the header line for this schema, without a line terminator.
    pub fn header_string(&self, separator: char) -> String {
        self.fields
            .iter()
            .map(FieldDescriptor::column_name)
            .collect::<Vec<_>>()
            .join(separator.to_string().as_str())
    }

    /// Returns the fields in file-column order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always false for a registered schema.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Returns the column position of a field by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Like [`Schema::position`], but unknown names are a validation error.
    pub fn require_position(&self, name: &str) -> StoreResult<usize> {
        self.position(name)
            .ok_or_else(|| StoreError::validation(format!("unknown field {:?}", name)))
    }

    /// Returns the primary-key field.
    pub fn primary_key(&self) -> &FieldDescriptor {
        &self.fields[self.primary_key]
    }

    /// Returns the column position of the primary key.
    pub fn primary_key_position(&self) -> usize {
        self.primary_key
    }
}
