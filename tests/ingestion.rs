use std::{fs, path::Path};

use disaster_response::{
    datasets::{clean_data, load_data, DatasetError, IngestConfig, JoinStrategy, Table, Value},
    storage::{load_table, save_data},
};
use pretty_assertions::assert_eq;
use tempfile::{tempdir, TempDir};

const MESSAGES: &str = "\
id,message,genre
1,Need water,direct
2,Road is blocked,news
3,Send help now,social
";

const CATEGORIES: &str = "\
id,categories
1,related-1;request-0
2,related-0;request-1
3,related-1;request-1
";

fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn labels(table: &Table, from: usize) -> Vec<Vec<Value>> {
    table.rows().iter().map(|row| row[from..].to_vec()).collect()
}

fn ingest(dir: &TempDir, messages: &str, categories: &str) -> Result<Table, DatasetError> {
    let messages = write(dir, "messages.csv", messages);
    let categories = write(dir, "categories.csv", categories);

    load_data(messages, categories, &IngestConfig::default())
}

#[test]
fn merges_messages_with_encoded_categories() {
    let dir = tempdir().unwrap();

    let table = clean_data(ingest(&dir, MESSAGES, CATEGORIES).unwrap());

    assert_eq!(
        table.columns(),
        &["id", "message", "genre", "related", "request"]
    );
    assert_eq!(
        labels(&table, 3),
        vec![
            vec![Value::Integer(1), Value::Integer(0)],
            vec![Value::Integer(0), Value::Integer(1)],
            vec![Value::Integer(1), Value::Integer(1)],
        ]
    );
}

#[test]
fn encoded_values_are_binary() {
    let dir = tempdir().unwrap();
    let categories = "\
id,categories
1,related-2;request-0
2,related-1;request-7
3,related-0;request-1
";

    let table = ingest(&dir, MESSAGES, categories).unwrap();

    for row in labels(&table, 3) {
        for value in row {
            assert!(value == Value::Integer(0) || value == Value::Integer(1));
        }
    }
}

#[test]
fn extra_category_rows_are_dropped() {
    let dir = tempdir().unwrap();
    let categories = format!("{}4,related-0;request-0\n5,related-1;request-0\n", CATEGORIES);

    let table = ingest(&dir, MESSAGES, &categories).unwrap();

    assert_eq!(table.len(), 3);
}

#[test]
fn joining_on_id_requires_matching_keys() {
    let dir = tempdir().unwrap();
    let messages = write(&dir, "messages.csv", MESSAGES);
    let categories = write(
        &dir,
        "categories.csv",
        &format!("{}4,related-0;request-0\n", CATEGORIES),
    );

    let config = IngestConfig::new().with_join(JoinStrategy::Key("id".to_string()));
    let result = load_data(messages, categories, &config);

    assert!(matches!(result, Err(DatasetError::JoinCardinality { .. })));
}

#[test]
fn too_few_category_rows_is_an_error() {
    let dir = tempdir().unwrap();

    let result = ingest(&dir, MESSAGES, "id,categories\n1,related-1;request-0\n");

    assert!(matches!(result, Err(DatasetError::TooFewRows { .. })));
}

#[test]
fn a_missing_input_names_the_file() {
    let dir = tempdir().unwrap();
    let categories = write(&dir, "categories.csv", CATEGORIES);
    let missing = dir.path().join("missing.csv");

    let result = load_data(&missing, categories, &IngestConfig::default());

    match result {
        Err(DatasetError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}

#[test]
fn cleaning_is_idempotent() {
    let dir = tempdir().unwrap();
    let messages = format!("{}1,Need water,direct\n", MESSAGES);
    let categories = format!("{}1,related-1;request-0\n", CATEGORIES);

    let once = clean_data(ingest(&dir, &messages, &categories).unwrap());
    let twice = clean_data(once.clone());

    assert_eq!(once.len(), 3);
    assert_eq!(once, twice);
}

#[test]
fn persisted_tables_read_back_equal() {
    let dir = tempdir().unwrap();
    let store = dir.path().join("DisasterResponse.db");
    let table = clean_data(ingest(&dir, MESSAGES, CATEGORIES).unwrap());

    save_data(&table, &store).unwrap();
    // A second run replaces the table rather than appending to it
    save_data(&table, &store).unwrap();

    assert_eq!(load_table(&store).unwrap(), table);
    assert!(Path::new(&store).exists());
}
