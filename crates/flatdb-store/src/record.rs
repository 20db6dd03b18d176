//! Dynamic records.
//!
//! A [`Record`] holds one value per schema field in file-column order and an
//! optional line number. A record without a line number is transient; one
//! read from a table file carries the 1-based position of its data line.

use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::schema::Schema;
use crate::value::Value;

/// One row of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    schema: Arc<Schema>,
    values: Vec<Value>,
    line_number: Option<u64>,
}

impl Record {
    /// Creates a transient record with every field set to NULL.
    pub fn new(schema: Arc<Schema>) -> Self {
        let values = vec![Value::Null; schema.len()];
        Self {
            schema,
            values,
            line_number: None,
        }
    }

    /// Creates a transient record from values in file-column order.
    pub fn from_values(schema: Arc<Schema>, values: Vec<Value>) -> StoreResult<Self> {
        if values.len() != schema.len() {
            return Err(StoreError::validation(format!(
                "expected {} values, got {}",
                schema.len(),
                values.len()
            )));
        }
        for (field, value) in schema.fields().iter().zip(&values) {
            if !field.field_type().accepts(value) {
                return Err(StoreError::validation(format!(
                    "field {:?} is {}, got {} value",
                    field.name(),
                    field.field_type(),
                    value.kind()
                )));
            }
        }
        Ok(Self {
            schema,
            values,
            line_number: None,
        })
    }

    /// Sets a field by name, builder style.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> StoreResult<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Sets a field by name.
    ///
    /// Fails if the field does not exist or the value has the wrong type.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> StoreResult<()> {
        let pos = self.schema.require_position(name)?;
        let value = value.into();
        let field = &self.schema.fields()[pos];
        if !field.field_type().accepts(&value) {
            return Err(StoreError::validation(format!(
                "field {:?} is {}, got {} value",
                name,
                field.field_type(),
                value.kind()
            )));
        }
        self.values[pos] = value;
        Ok(())
    }

    /// Returns a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.position(name).map(|pos| &self.values[pos])
    }

    /// Returns the text of a field, if it is non-null text.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Returns the integer of a field, if it is a non-null integer.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    /// Returns all values in file-column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns the schema this record conforms to.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the primary key, if set.
    pub fn primary_key(&self) -> Option<i64> {
        self.values[self.schema.primary_key_position()].as_i64()
    }

    /// Returns the 1-based data line number, if the record is persisted.
    pub fn line_number(&self) -> Option<u64> {
        self.line_number
    }

    /// Returns true if the record was read from or written to a table file.
    pub fn is_persisted(&self) -> bool {
        self.line_number.is_some()
    }

    pub(crate) fn set_primary_key(&mut self, pk: i64) {
        let pos = self.schema.primary_key_position();
        self.values[pos] = Value::Integer(pk);
    }

    pub(crate) fn set_line_number(&mut self, line_number: Option<u64>) {
        self.line_number = line_number;
    }

    pub(crate) fn replace_values(&mut self, values: Vec<Value>) {
        debug_assert_eq!(values.len(), self.values.len());
        self.values = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDescriptor;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::register(vec![
                FieldDescriptor::integer("id", "ID", 0).primary_key(),
                FieldDescriptor::text("title", "Title", 1),
                FieldDescriptor::integer("price", "Price", 2),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn test_new_record_is_transient_and_null() {
        let record = Record::new(schema());
        assert!(!record.is_persisted());
        assert!(record.values().iter().all(Value::is_null));
        assert_eq!(record.primary_key(), None);
    }

    #[test]
    fn test_set_and_get() {
        let record = Record::new(schema())
            .with("title", "Dune")
            .unwrap()
            .with("price", 120)
            .unwrap();
        assert_eq!(record.text("title"), Some("Dune"));
        assert_eq!(record.integer("price"), Some(120));
        assert!(record.get("missing").is_none());
    }

    #[test]
    fn test_set_rejects_bad_type_and_unknown_field() {
        let mut record = Record::new(schema());
        assert!(record.set("price", "cheap").unwrap_err().is_validation());
        assert!(record.set("isbn", "x").unwrap_err().is_validation());
        record.set("price", None::<i64>).unwrap();
        assert!(record.get("price").unwrap().is_null());
    }

    #[test]
    fn test_from_values_checks_arity() {
        let err = Record::from_values(schema(), vec![Value::Integer(1)]).unwrap_err();
        assert!(err.is_validation());

        let record = Record::from_values(
            schema(),
            vec![Value::Integer(1), Value::text("x"), Value::Integer(2)],
        )
        .unwrap();
        assert_eq!(record.primary_key(), Some(1));
    }
}
