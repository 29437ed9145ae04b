//! SQL statements for the messages table.
//!
//! Column names come from the category strings, so every identifier is quoted.

use crate::datasets::Table;

/// The table written by the ingestion job and read by the training job.
pub const MESSAGES_TABLE: &str = "messages_table";

/// Quote an identifier, doubling any embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn drop_table(name: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_identifier(name))
}

/// `CREATE TABLE` with one column per table column, typed from its cells.
pub fn create_table(name: &str, table: &Table) -> String {
    let columns = table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            format!(
                "{} {}",
                quote_identifier(column),
                table.column_type(index).sql_type()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    format!("CREATE TABLE {} ({})", quote_identifier(name), columns)
}

pub fn insert_row(name: &str, width: usize) -> String {
    let placeholders = (1..=width)
        .map(|index| format!("?{}", index))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {} VALUES ({})",
        quote_identifier(name),
        placeholders
    )
}

pub fn select_all(name: &str) -> String {
    format!("SELECT * FROM {}", quote_identifier(name))
}
