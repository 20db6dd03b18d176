//! # flatdb-store
//!
//! Schema-driven flat-file record store.
//!
//! This crate implements:
//! - Typed field adapters converting between text cells and values
//! - A schema registry with column ordering and a single primary key
//! - File-backed tables: header validation, append, reverse read of the
//!   last line, and single-line rewrite
//! - A query engine: primary-key lookup, field equality, ranked search
//! - Statically typed models over tables
//!
//! # Architecture
//!
//! ```text
//! +-------------------------------------------------------+
//! |        Repository<M: Model>   (BookStore, ...)        |
//! +-------------------------------------------------------+
//! |   Query engine: get_by_pk / get_multi_by_field /      |
//! |                 search                                |
//! +-------------------------------------------------------+
//! |   Table: init_file / last / append / create /         |
//! |          update_in_place / scan                       |
//! +---------------------------+---------------------------+
//! |   LineCodec (split/join)  |   Schema (FieldDescriptor)|
//! +---------------------------+---------------------------+
//! |                  one text file per table              |
//! +-------------------------------------------------------+
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use flatdb_store::{BookStore, SearchQuery, TableConfig};
//!
//! let store = BookStore::open(TableConfig::new("data/book.tsv"))?;
//! store.init_file()?;
//!
//! let book = store.create_book("Dune", "Frank Herbert", 120, 1)?;
//! assert_eq!(store.get(book.id)?, Some(book));
//!
//! let hits = store.search(&SearchQuery::new("Dune").with_max_price(200))?;
//! assert_eq!(hits.len(), 1);
//! # Ok::<(), flatdb_store::StoreError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;

/// Field types and descriptors.
pub mod field;

/// Cell values.
pub mod value;

/// Schema registry.
pub mod schema;

/// In-memory records.
pub mod record;

/// Line encoding and decoding.
pub mod codec;

/// File-backed tables.
pub mod table;

/// Lookups and ranked search.
pub mod query;

/// Typed models.
pub mod model;

/// Sample book model.
pub mod book;

// Re-exports for convenience
pub use book::{Book, BookStore};
pub use codec::LineCodec;
pub use config::TableConfig;
pub use error::{StoreError, StoreResult};
pub use field::{FieldDescriptor, FieldType};
pub use model::{Model, Repository};
pub use query::{MatchRank, SearchColumns, SearchQuery, DEFAULT_SEARCH_LIMIT};
pub use record::Record;
pub use schema::Schema;
pub use table::{Scan, Table};
pub use value::Value;
