//! Query engine over a [`Table`].
//!
//! Every query is a sequential pass over the data lines; there are no
//! indexes, so lookups cost O(number of records).
//!
//! # Ranked Search
//!
//! [`Table::search`] filters and ranks records in one pass:
//!
//! 1. records whose saleable flag is not the active value are dropped;
//! 2. records whose price falls outside a supplied bound are dropped;
//! 3. the rest are ranked by where the query text occurs:
//!
//! | Rank | Query found in    |
//! |------|-------------------|
//! | 0    | title and author  |
//! | 1    | title only        |
//! | 2    | author only       |
//!
//! Records matching neither are dropped. Within a rank, file order is kept.
//! The ranks are concatenated and the page `[start, start + limit)` is
//! returned.

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::field::FieldType;
use crate::record::Record;
use crate::schema::Schema;
use crate::table::Table;
use crate::value::Value;

/// Default page size for searches.
pub const DEFAULT_SEARCH_LIMIT: usize = 30;

/// Names the fields a search reads, and the saleable value that counts as
/// active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchColumns {
    /// Text field ranked first.
    pub title: String,
    /// Text field ranked second.
    pub author: String,
    /// Integer field filtered by the price bounds.
    pub price: String,
    /// Integer field that must equal `active_value`.
    pub saleable: String,
    /// Value of `saleable` for records that may be returned.
    pub active_value: i64,
}

impl Default for SearchColumns {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            author: "author".to_string(),
            price: "price".to_string(),
            saleable: "saleable".to_string(),
            active_value: 1,
        }
    }
}

/// Parameters of a ranked search.
///
/// Price bounds are inclusive. `None` means unbounded; `Some(0)` is a real
/// bound of zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Substring looked for in the title and author.
    pub query: String,
    /// Inclusive lower price bound.
    pub min_price: Option<i64>,
    /// Inclusive upper price bound.
    pub max_price: Option<i64>,
    /// Number of ranked results to skip.
    pub start: usize,
    /// Maximum number of results to return.
    pub limit: usize,
}

impl SearchQuery {
    /// Creates an unbounded query returning the first page.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            min_price: None,
            max_price: None,
            start: 0,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Sets the inclusive lower price bound.
    #[must_use]
    pub fn with_min_price(mut self, min_price: i64) -> Self {
        self.min_price = Some(min_price);
        self
    }

    /// Sets the inclusive upper price bound.
    #[must_use]
    pub fn with_max_price(mut self, max_price: i64) -> Self {
        self.max_price = Some(max_price);
        self
    }

    /// Sets price bounds where 0 means "no bound".
    ///
    /// This is the convention of catalogs that pass 0 for an unset bound.
    #[must_use]
    pub fn with_legacy_bounds(mut self, min_price: i64, max_price: i64) -> Self {
        self.min_price = (min_price != 0).then_some(min_price);
        self.max_price = (max_price != 0).then_some(max_price);
        self
    }

    /// Sets the page window.
    #[must_use]
    pub fn page(mut self, start: usize, limit: usize) -> Self {
        self.start = start;
        self.limit = limit;
        self
    }

    fn price_in_range(&self, price: Option<i64>) -> bool {
        if self.min_price.is_none() && self.max_price.is_none() {
            return true;
        }
        let Some(price) = price else {
            return false;
        };
        self.min_price.map_or(true, |min| price >= min)
            && self.max_price.map_or(true, |max| price <= max)
    }
}

/// Search rank of a record; lower ranks are returned first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchRank {
    /// Query found in both title and author.
    TitleAndAuthor = 0,
    /// Query found in the title only.
    Title = 1,
    /// Query found in the author only.
    Author = 2,
}

impl MatchRank {
    /// Ranks a record by where `query` occurs, or `None` if it occurs in
    /// neither field.
    pub fn classify(query: &str, title: Option<&str>, author: Option<&str>) -> Option<Self> {
        let in_title = title.is_some_and(|t| t.contains(query));
        let in_author = author.is_some_and(|a| a.contains(query));
        match (in_title, in_author) {
            (true, true) => Some(MatchRank::TitleAndAuthor),
            (true, false) => Some(MatchRank::Title),
            (false, true) => Some(MatchRank::Author),
            (false, false) => None,
        }
    }
}

/// Resolved column positions for a search.
struct SearchPlan {
    title: usize,
    author: usize,
    price: usize,
    saleable: usize,
    active_value: i64,
}

impl SearchPlan {
    fn resolve(schema: &Schema, columns: &SearchColumns) -> StoreResult<Self> {
        let typed = |name: &str, expected: FieldType| -> StoreResult<usize> {
            let pos = schema.require_position(name)?;
            let actual = schema.fields()[pos].field_type();
            if actual != expected {
                return Err(StoreError::validation(format!(
                    "search field {:?} must be {}, found {}",
                    name, expected, actual
                )));
            }
            Ok(pos)
        };
        Ok(Self {
            title: typed(&columns.title, FieldType::Text)?,
            author: typed(&columns.author, FieldType::Text)?,
            price: typed(&columns.price, FieldType::Integer)?,
            saleable: typed(&columns.saleable, FieldType::Integer)?,
            active_value: columns.active_value,
        })
    }

    fn rank(&self, record: &Record, query: &SearchQuery) -> Option<MatchRank> {
        let values = record.values();
        if values[self.saleable].as_i64() != Some(self.active_value) {
            return None;
        }
        if !query.price_in_range(values[self.price].as_i64()) {
            return None;
        }
        MatchRank::classify(
            &query.query,
            values[self.title].as_str(),
            values[self.author].as_str(),
        )
    }
}

impl Table {
    /// Finds the record whose primary key equals `pk`.
    ///
    /// Only the key column is decoded until a match is found. Returns
    /// `None` if no record has that key.
    pub fn get_by_pk(&self, pk: i64) -> StoreResult<Option<Record>> {
        let schema = self.schema();
        let pk_pos = schema.primary_key_position();
        let target = Value::Integer(pk);
        let codec = self.codec();

        for entry in self.data_lines()? {
            let (line_number, line) = entry?;
            if codec.decode_column(schema, &line, pk_pos)? == target {
                let mut record = self.parse_line(&line)?;
                record.set_line_number(Some(line_number));
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Like [`Table::get_by_pk`], but a missing key is a
    /// [`StoreError::NotFound`].
    pub fn require_by_pk(&self, pk: i64) -> StoreResult<Record> {
        self.get_by_pk(pk)?
            .ok_or_else(|| StoreError::not_found(format!("primary key {}", pk)))
    }

    /// Returns a lazy iterator over records whose field `name` equals
    /// `value`, in file order.
    pub fn get_multi_by_field(
        &self,
        name: &str,
        value: impl Into<Value>,
    ) -> StoreResult<impl Iterator<Item = StoreResult<Record>>> {
        let pos = self.schema().require_position(name)?;
        let value = value.into();
        let field_type = self.schema().fields()[pos].field_type();
        if !field_type.accepts(&value) {
            return Err(StoreError::validation(format!(
                "field {:?} is {}, got {} value",
                name,
                field_type,
                value.kind()
            )));
        }
        Ok(self.scan()?.filter(move |result| match result {
            Ok(record) => record.values()[pos] == value,
            Err(_) => true,
        }))
    }

    /// Runs a ranked search using the default search columns.
    pub fn search(&self, query: &SearchQuery) -> StoreResult<Vec<Record>> {
        self.search_with(&SearchColumns::default(), query)
    }

    /// Runs a ranked search over the given columns.
    pub fn search_with(
        &self,
        columns: &SearchColumns,
        query: &SearchQuery,
    ) -> StoreResult<Vec<Record>> {
        let plan = SearchPlan::resolve(self.schema(), columns)?;

        let mut ranks: [Vec<Record>; 3] = Default::default();
        for record in self.scan()? {
            let record = record?;
            if let Some(rank) = plan.rank(&record, query) {
                ranks[rank as usize].push(record);
            }
        }

        let matched: usize = ranks.iter().map(Vec::len).sum();
        let page: Vec<Record> = ranks
            .into_iter()
            .flatten()
            .skip(query.start)
            .take(query.limit)
            .collect();

        debug!(
            path = %self.path().display(),
            query = %query.query,
            matched,
            returned = page.len(),
            "search finished"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableConfig;
    use crate::field::FieldDescriptor;
    use tempfile::TempDir;

    fn table(dir: &TempDir) -> Table {
        let schema = Schema::register(vec![
            FieldDescriptor::integer("id", "ID", 0).primary_key(),
            FieldDescriptor::text("title", "Title", 1),
            FieldDescriptor::text("author", "Author", 2),
            FieldDescriptor::integer("price", "Price", 3),
            FieldDescriptor::integer("saleable", "Saleable", 4),
        ])
        .unwrap();
        let config = TableConfig::new(dir.path().join("book.tsv")).with_sync_writes(false);
        let table = Table::open(config, schema).unwrap();
        table.init_file().unwrap();
        table
    }

    fn add(table: &Table, title: &str, author: &str, price: i64, saleable: i64) -> Record {
        let record = table
            .new_record()
            .with("title", title)
            .unwrap()
            .with("author", author)
            .unwrap()
            .with("price", price)
            .unwrap()
            .with("saleable", saleable)
            .unwrap();
        table.create(record).unwrap()
    }

    fn keys(records: &[Record]) -> Vec<i64> {
        records.iter().filter_map(Record::primary_key).collect()
    }

    #[test]
    fn test_get_by_pk() {
        let tmp = TempDir::new().unwrap();
        let table = table(&tmp);
        add(&table, "a", "b", 1, 1);
        add(&table, "c", "d", 2, 1);

        let record = table.get_by_pk(2).unwrap().unwrap();
        assert_eq!(record.text("title"), Some("c"));
        assert_eq!(record.line_number(), Some(2));

        assert!(table.get_by_pk(3).unwrap().is_none());
        assert!(table.require_by_pk(3).unwrap_err().is_not_found());
    }

    #[test]
    fn test_get_by_pk_empty_table() {
        let tmp = TempDir::new().unwrap();
        let table = table(&tmp);
        assert!(table.get_by_pk(1).unwrap().is_none());
    }

    #[test]
    fn test_get_multi_by_field() {
        let tmp = TempDir::new().unwrap();
        let table = table(&tmp);
        add(&table, "m1", "same", 99, 1);
        add(&table, "x", "other", 1, 1);
        add(&table, "m2", "same", 198, 1);
        add(&table, "m3", "same", 297, 0);

        let found: Vec<Record> = table
            .get_multi_by_field("author", "same")
            .unwrap()
            .collect::<StoreResult<_>>()
            .unwrap();
        assert_eq!(keys(&found), [1, 3, 4]);

        let unknown = table.get_multi_by_field("isbn", "x");
        assert!(matches!(unknown, Err(e) if e.is_validation()));
    }

    #[test]
    fn test_get_multi_by_field_rejects_wrong_type() {
        let tmp = TempDir::new().unwrap();
        let table = table(&tmp);
        add(&table, "a", "b", 1, 1);

        let mismatched = table.get_multi_by_field("price", "1");
        assert!(matches!(mismatched, Err(e) if e.is_validation()));

        let found = table
            .get_multi_by_field("price", 1)
            .unwrap()
            .collect::<StoreResult<Vec<_>>>()
            .unwrap();
        assert_eq!(keys(&found), [1]);
    }

    #[test]
    fn test_search_ranking() {
        let tmp = TempDir::new().unwrap();
        let table = table(&tmp);
        add(&table, "w", "x", 10, 1); // author only
        add(&table, "x", "z", 10, 1); // title only
        add(&table, "x", "y", 10, 1); // title only
        add(&table, "xx", "xy", 10, 1); // both
        add(&table, "x", "x", 10, 0); // not saleable
        add(&table, "q", "r", 10, 1); // neither

        let results = table.search(&SearchQuery::new("x")).unwrap();
        assert_eq!(keys(&results), [4, 2, 3, 1]);
    }

    #[test]
    fn test_search_price_window() {
        let tmp = TempDir::new().unwrap();
        let table = table(&tmp);
        add(&table, "x", "a", 50, 1);
        add(&table, "x", "a", 150, 1);
        add(&table, "x", "a", 250, 1);

        let q = SearchQuery::new("x").with_min_price(100).with_max_price(200);
        assert_eq!(keys(&table.search(&q).unwrap()), [2]);

        let q = SearchQuery::new("x").with_min_price(1000);
        assert!(table.search(&q).unwrap().is_empty());

        let q = SearchQuery::new("x").with_min_price(150).with_max_price(150);
        assert_eq!(keys(&table.search(&q).unwrap()), [2]);
    }

    #[test]
    fn test_zero_bound_semantics() {
        let tmp = TempDir::new().unwrap();
        let table = table(&tmp);
        add(&table, "x", "a", 0, 1);
        add(&table, "x", "a", 5, 1);
        add(&table, "x", "a", -3, 1);

        // Some(0) is a real bound.
        let q = SearchQuery::new("x").with_max_price(0);
        assert_eq!(keys(&table.search(&q).unwrap()), [1, 3]);
        let q = SearchQuery::new("x").with_min_price(0);
        assert_eq!(keys(&table.search(&q).unwrap()), [1, 2]);

        // Legacy bounds treat 0 as unset.
        let q = SearchQuery::new("x").with_legacy_bounds(0, 0);
        assert_eq!(q.min_price, None);
        assert_eq!(q.max_price, None);
        assert_eq!(keys(&table.search(&q).unwrap()), [1, 2, 3]);

        let q = SearchQuery::new("x").with_legacy_bounds(0, 4);
        assert_eq!(keys(&table.search(&q).unwrap()), [1, 3]);
    }

    #[test]
    fn test_null_price_fails_bounds() {
        let tmp = TempDir::new().unwrap();
        let table = table(&tmp);
        let record = table
            .new_record()
            .with("title", "x")
            .unwrap()
            .with("author", "a")
            .unwrap()
            .with("saleable", 1)
            .unwrap();
        table.create(record).unwrap();

        assert_eq!(table.search(&SearchQuery::new("x")).unwrap().len(), 1);
        let q = SearchQuery::new("x").with_min_price(0);
        assert!(table.search(&q).unwrap().is_empty());
    }

    #[test]
    fn test_search_pagination_matches_slice() {
        let tmp = TempDir::new().unwrap();
        let table = table(&tmp);
        for i in 0..7 {
            let (title, author) = match i % 3 {
                0 => ("x", "x"),
                1 => ("x", "-"),
                _ => ("-", "x"),
            };
            add(&table, title, author, i, 1);
        }

        let full = table.search(&SearchQuery::new("x").page(0, 100)).unwrap();
        assert_eq!(full.len(), 7);
        for start in 0..9 {
            for limit in 0..9 {
                let page = table
                    .search(&SearchQuery::new("x").page(start, limit))
                    .unwrap();
                let lo = start.min(full.len());
                let hi = (start + limit).min(full.len());
                assert_eq!(keys(&page), keys(&full[lo..hi]));
            }
        }
    }

    #[test]
    fn test_search_custom_columns() {
        let tmp = TempDir::new().unwrap();
        let table = table(&tmp);
        add(&table, "x", "a", 10, 2);
        add(&table, "x", "a", 10, 1);

        let columns = SearchColumns {
            active_value: 2,
            ..SearchColumns::default()
        };
        let results = table.search_with(&columns, &SearchQuery::new("x")).unwrap();
        assert_eq!(keys(&results), [1]);

        let columns = SearchColumns {
            price: "title".to_string(),
            ..SearchColumns::default()
        };
        let err = table.search_with(&columns, &SearchQuery::new("x")).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_classify() {
        assert_eq!(MatchRank::classify("x", Some("x"), Some("x")), Some(MatchRank::TitleAndAuthor));
        assert_eq!(MatchRank::classify("x", Some("ax"), Some("b")), Some(MatchRank::Title));
        assert_eq!(MatchRank::classify("x", None, Some("x")), Some(MatchRank::Author));
        assert_eq!(MatchRank::classify("x", Some("a"), None), None);
        assert!(MatchRank::TitleAndAuthor < MatchRank::Author);
    }
}
