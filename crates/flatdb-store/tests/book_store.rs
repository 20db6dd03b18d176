//! End-to-end tests over the public API.

use std::fs;

use flatdb_store::{
    Book, BookStore, FieldDescriptor, Record, Schema, SearchQuery, StoreResult, Table,
    TableConfig, Value,
};
use tempfile::TempDir;

fn open_store(dir: &TempDir) -> BookStore {
    let config = TableConfig::new(dir.path().join("book.tsv")).with_sync_writes(false);
    let store = BookStore::open(config).unwrap();
    store.init_file().unwrap();
    store
}

#[test]
fn test_catalog_lifecycle() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);

    let dune = store.create_book("Dune", "Frank Herbert", 120, 1).unwrap();
    let emma = store.create_book("Emma", "Jane Austen", 80, 1).unwrap();
    let persuasion = store.create_book("Persuasion", "Jane Austen", 95, 0).unwrap();
    assert_eq!((dune.id, emma.id, persuasion.id), (1, 2, 3));

    let before = fs::read_to_string(store.table().path()).unwrap();

    let mut emma = store.get(emma.id).unwrap().unwrap();
    store
        .update_book(&mut emma, "Emma", "Jane Austen", 70, 1)
        .unwrap();

    let after = fs::read_to_string(store.table().path()).unwrap();
    let before: Vec<&str> = before.lines().collect();
    let after: Vec<&str> = after.lines().collect();
    assert_eq!(before.len(), after.len());
    assert_eq!(before[0], after[0]);
    assert_eq!(before[1], after[1]);
    assert_eq!(after[2], "2\tEmma\tJane Austen\t70\t1");
    assert_eq!(before[3], after[3]);

    let austen: Vec<Book> = store
        .get_multi_by_author("Jane Austen")
        .unwrap()
        .collect::<StoreResult<_>>()
        .unwrap();
    assert_eq!(austen.len(), 2);

    // Persuasion is not saleable.
    let hits = store.search(&SearchQuery::new("Austen")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Emma");

    let last = store.last().unwrap().unwrap();
    assert_eq!(last.id, persuasion.id);
}

#[test]
fn test_reopen_continues_keys() {
    let tmp = TempDir::new().unwrap();
    {
        let store = open_store(&tmp);
        store.create_book("a", "b", 1, 1).unwrap();
        store.create_book("c", "d", 2, 1).unwrap();
    }

    let store = open_store(&tmp);
    let created = store.create_book("e", "f", 3, 1).unwrap();
    assert_eq!(created.id, 3);
    assert_eq!(created.line_number(), Some(3));
}

#[test]
fn test_search_pagination() {
    let tmp = TempDir::new().unwrap();
    let store = open_store(&tmp);
    for i in 0..40 {
        store
            .create_book(&format!("volume {}", i), "anon", 10 + i, 1)
            .unwrap();
    }

    let first = store.search(&SearchQuery::new("volume")).unwrap();
    assert_eq!(first.len(), 30);
    assert_eq!(first[0].title, "volume 0");

    let second = store
        .search(&SearchQuery::new("volume").page(30, 30))
        .unwrap();
    assert_eq!(second.len(), 10);
    assert_eq!(second[0].title, "volume 30");

    let window = store
        .search(&SearchQuery::new("volume").with_min_price(20).with_max_price(24))
        .unwrap();
    let prices: Vec<i64> = window.iter().map(|b| b.price).collect();
    assert_eq!(prices, [20, 21, 22, 23, 24]);
}

#[test]
fn test_header_follows_file_index() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("people.csv");

    let schema = Schema::register(vec![
        FieldDescriptor::text("name", "Name", 2),
        FieldDescriptor::integer("age", "Age", 1),
        FieldDescriptor::integer("id", "Id", 0).primary_key(),
    ])
    .unwrap();
    let table = Table::open(TableConfig::new(&path).with_separator(','), schema).unwrap();
    table.init_file().unwrap();

    let record = table
        .new_record()
        .with("name", "Ada")
        .unwrap()
        .with("age", None::<i64>)
        .unwrap();
    let created: Record = table.create(record).unwrap();
    assert_eq!(created.get("id"), Some(&Value::Integer(1)));

    assert_eq!(fs::read_to_string(&path).unwrap(), "Id,Age,Name\n1,\\N,Ada\n");
}

#[test]
fn test_mismatched_header_is_reported() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("book.tsv");
    fs::write(&path, "ID\tName\n").unwrap();

    let store = BookStore::open(TableConfig::new(&path)).unwrap();
    let err = store.init_file().unwrap_err();
    assert!(err.is_schema_mismatch());
}

#[test]
fn test_config_from_toml() {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("book.psv");
    let config = TableConfig::from_toml_str(&format!(
        "path = {:?}\nseparator = \"|\"\nsync_writes = false\n",
        data.display().to_string()
    ))
    .unwrap();

    let store = BookStore::open(config).unwrap();
    store.init_file().unwrap();
    store.create_book("a", "b", 1, 1).unwrap();

    assert_eq!(
        fs::read_to_string(&data).unwrap(),
        "ID|Title|Author|Price|Saleable\n1|a|b|1|1\n"
    );
}
