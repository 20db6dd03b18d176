//! Sample book catalog.
//!
//! ```text
//! ID  Title  Author  Price  Saleable
//! ```
//!
//! `Book` is a small but complete [`Model`]: an auto-increment `id`, two
//! text columns the ranked search looks at, and the `price`/`saleable`
//! columns it filters on.

use crate::error::StoreResult;
use crate::field::FieldDescriptor;
use crate::model::{require_integer, require_text, Model, Repository};
use crate::record::Record;
use crate::value::Value;

/// Saleable flag of books that can be sold.
pub const SALEABLE: i64 = 1;

/// One book of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    /// Primary key, assigned on create.
    pub id: i64,
    /// Book title.
    pub title: String,
    /// Book author.
    pub author: String,
    /// Price in the smallest currency unit.
    pub price: i64,
    /// [`SALEABLE`] if the book is on sale.
    pub saleable: i64,
    line_number: Option<u64>,
}

impl Book {
    /// Creates a transient, saleable book.
    pub fn new(title: impl Into<String>, author: impl Into<String>, price: i64) -> Self {
        Self {
            id: 0,
            title: title.into(),
            author: author.into(),
            price,
            saleable: SALEABLE,
            line_number: None,
        }
    }

    /// Sets the saleable flag.
    #[must_use]
    pub fn with_saleable(mut self, saleable: i64) -> Self {
        self.saleable = saleable;
        self
    }

    /// Returns the 1-based line number, if persisted.
    pub fn line_number(&self) -> Option<u64> {
        self.line_number
    }
}

impl Model for Book {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::integer("id", "ID", 0).primary_key(),
            FieldDescriptor::text("title", "Title", 1),
            FieldDescriptor::text("author", "Author", 2),
            FieldDescriptor::integer("price", "Price", 3),
            FieldDescriptor::integer("saleable", "Saleable", 4),
        ]
    }

    fn from_record(record: &Record) -> StoreResult<Self> {
        Ok(Self {
            id: require_integer(record, "id")?,
            title: require_text(record, "title")?,
            author: require_text(record, "author")?,
            price: require_integer(record, "price")?,
            saleable: require_integer(record, "saleable")?,
            line_number: record.line_number(),
        })
    }

    fn to_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Integer(self.id)),
            ("title", Value::text(self.title.as_str())),
            ("author", Value::text(self.author.as_str())),
            ("price", Value::Integer(self.price)),
            ("saleable", Value::Integer(self.saleable)),
        ]
    }

    fn line_number(&self) -> Option<u64> {
        self.line_number
    }

    fn set_line_number(&mut self, line_number: Option<u64>) {
        self.line_number = line_number;
    }
}

/// Typed access to a book table.
pub type BookStore = Repository<Book>;

impl Repository<Book> {
    /// Creates a book with the next free id.
    pub fn create_book(
        &self,
        title: &str,
        author: &str,
        price: i64,
        saleable: i64,
    ) -> StoreResult<Book> {
        self.create(&Book::new(title, author, price).with_saleable(saleable))
    }

    /// Replaces every column of a persisted book except its id.
    pub fn update_book(
        &self,
        book: &mut Book,
        title: &str,
        author: &str,
        price: i64,
        saleable: i64,
    ) -> StoreResult<()> {
        let mut next = book.clone();
        next.title = title.to_string();
        next.author = author.to_string();
        next.price = price;
        next.saleable = saleable;
        self.update(&next)?;
        *book = next;
        Ok(())
    }

    /// Returns a lazy iterator over the books by `author`.
    pub fn get_multi_by_author(
        &self,
        author: &str,
    ) -> StoreResult<impl Iterator<Item = StoreResult<Book>>> {
        self.find_by("author", author.to_string())
    }
}
