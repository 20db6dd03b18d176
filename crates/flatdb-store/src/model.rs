//! Statically typed models on top of [`Table`].
//!
//! A [`Model`] is a plain struct with named fields plus a pair of functions
//! converting it to and from a [`Record`]. Its schema is declared by
//! [`Model::fields`] and registered once, when a [`Repository`] is opened.

use std::marker::PhantomData;

use crate::config::TableConfig;
use crate::error::{StoreError, StoreResult};
use crate::field::FieldDescriptor;
use crate::query::{SearchColumns, SearchQuery};
use crate::record::Record;
use crate::schema::Schema;
use crate::table::Table;
use crate::value::Value;

/// A record type with a fixed schema.
pub trait Model: Sized {
    /// Declares the fields of this model.
    fn fields() -> Vec<FieldDescriptor>;

    /// Builds a model from a record read from the table.
    fn from_record(record: &Record) -> StoreResult<Self>;

    /// Returns `(field name, value)` pairs for every field.
    fn to_values(&self) -> Vec<(&'static str, Value)>;

    /// Returns the 1-based line number, if persisted.
    fn line_number(&self) -> Option<u64>;

    /// Records where this model lives in the table file.
    fn set_line_number(&mut self, line_number: Option<u64>);
}

/// Typed access to one table.
#[derive(Debug, Clone)]
pub struct Repository<M> {
    table: Table,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Repository<M> {
    /// Registers the model's schema and opens its table.
    ///
    /// Schema errors surface here.
    pub fn open(config: TableConfig) -> StoreResult<Self> {
        let schema = Schema::register(M::fields())?;
        Ok(Self {
            table: Table::open(config, schema)?,
            _model: PhantomData,
        })
    }

    /// Returns the underlying table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Creates or validates the table file.
    pub fn init_file(&self) -> StoreResult<()> {
        self.table.init_file()
    }

    /// Persists a new model and returns it with its key and line number.
    pub fn create(&self, model: &M) -> StoreResult<M> {
        let record = self.to_record(model)?;
        let created = self.table.create(record)?;
        self.decode(&created)
    }

    /// Looks up a model by primary key.
    pub fn get(&self, pk: i64) -> StoreResult<Option<M>> {
        self.table
            .get_by_pk(pk)?
            .map(|record| self.decode(&record))
            .transpose()
    }

    /// Rewrites a persisted model's line with its current values.
    ///
    /// The line is re-read first; a model whose primary key differs from
    /// the stored one is rejected and the file is left unchanged.
    pub fn update(&self, model: &M) -> StoreResult<()> {
        let line_number = model
            .line_number()
            .ok_or_else(|| StoreError::validation("model is not persisted"))?;
        let mut current = self.table.get_by_line(line_number)?;
        self.table.update(&mut current, model.to_values())
    }

    /// Returns the last model in the table.
    pub fn last(&self) -> StoreResult<Option<M>> {
        self.table
            .last()?
            .map(|record| self.decode(&record))
            .transpose()
    }

    /// Returns a lazy iterator over every model, in file order.
    pub fn all(&self) -> StoreResult<impl Iterator<Item = StoreResult<M>>> {
        Ok(self
            .table
            .scan()?
            .map(|record| record.and_then(|r| decode_record::<M>(&r))))
    }

    /// Returns a lazy iterator over models whose field `name` equals `value`.
    pub fn find_by(
        &self,
        name: &str,
        value: impl Into<Value>,
    ) -> StoreResult<impl Iterator<Item = StoreResult<M>>> {
        Ok(self
            .table
            .get_multi_by_field(name, value)?
            .map(|record| record.and_then(|r| decode_record::<M>(&r))))
    }

    /// Runs a ranked search with the default search columns.
    pub fn search(&self, query: &SearchQuery) -> StoreResult<Vec<M>> {
        self.search_with(&SearchColumns::default(), query)
    }

    /// Runs a ranked search over the given columns.
    pub fn search_with(&self, columns: &SearchColumns, query: &SearchQuery) -> StoreResult<Vec<M>> {
        self.table
            .search_with(columns, query)?
            .iter()
            .map(|record| self.decode(record))
            .collect()
    }

    /// Returns the number of stored models.
    pub fn count(&self) -> StoreResult<u64> {
        self.table.count()
    }

    fn to_record(&self, model: &M) -> StoreResult<Record> {
        let mut record = self.table.new_record();
        for (name, value) in model.to_values() {
            record.set(name, value)?;
        }
        record.set_line_number(model.line_number());
        Ok(record)
    }

    fn decode(&self, record: &Record) -> StoreResult<M> {
        decode_record(record)
    }
}

fn decode_record<M: Model>(record: &Record) -> StoreResult<M> {
    let mut model = M::from_record(record)?;
    model.set_line_number(record.line_number());
    Ok(model)
}

/// Reads a non-null text field, for use in [`Model::from_record`].
pub fn require_text(record: &Record, name: &str) -> StoreResult<String> {
    record
        .text(name)
        .map(str::to_string)
        .ok_or_else(|| StoreError::validation(format!("field {:?} is missing or NULL", name)))
}

/// Reads a non-null integer field, for use in [`Model::from_record`].
pub fn require_integer(record: &Record, name: &str) -> StoreResult<i64> {
    record
        .integer(name)
        .ok_or_else(|| StoreError::validation(format!("field {:?} is missing or NULL", name)))
}
