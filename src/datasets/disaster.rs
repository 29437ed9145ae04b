use std::{
    collections::{HashMap, HashSet},
    path::Path,
};

use derive_new::new;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{
    categories::{encode_categories, EncodedCategories, EncoderConfig},
    DatasetError, Table, Value,
};

/// The column holding each message's identifier
pub static ID_COLUMN: &str = "id";

/// How each message is associated with its category record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinStrategy {
    /// Pair row i of the messages with row i of the categories, truncating to the shorter input
    #[default]
    Positional,

    /// Pair rows sharing a value in the named column, which must match one-to-one
    Key(String),
}

/// Ingestion configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(default)]
pub struct IngestConfig {
    /// Category Encoder settings
    #[new(default)]
    pub encoder: EncoderConfig,

    /// How messages and categories are joined
    #[new(default)]
    pub join: JoinStrategy,
}

impl IngestConfig {
    /// Use a different Category Encoder configuration
    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = encoder;
        self
    }

    /// Use a different join strategy
    pub fn with_join(mut self, join: JoinStrategy) -> Self {
        self.join = join;
        self
    }
}

/// Read the messages and categories files and merge them into a single table
pub fn load_data(
    messages_path: impl AsRef<Path>,
    categories_path: impl AsRef<Path>,
    config: &IngestConfig,
) -> Result<Table, DatasetError> {
    let messages = Table::from_csv(messages_path)?;
    let categories = Table::from_csv(categories_path)?;

    debug!(
        "Read {} messages and {} category records",
        messages.len(),
        categories.len()
    );

    let encoded = encode_categories(&categories, &config.encoder)?;

    merge(messages, &categories, encoded, &config.join)
}

/// Append the encoded label columns to the messages table
pub fn merge(
    messages: Table,
    categories: &Table,
    encoded: EncodedCategories,
    join: &JoinStrategy,
) -> Result<Table, DatasetError> {
    match join {
        JoinStrategy::Positional => merge_positional(messages, encoded),
        JoinStrategy::Key(key) => merge_on_key(messages, categories, encoded, key),
    }
}

fn merged_columns(messages: &[String], labels: &[String]) -> Vec<String> {
    messages.iter().chain(labels).cloned().collect()
}

fn append_labels(mut row: Vec<Value>, labels: &[u8]) -> Vec<Value> {
    row.extend(labels.iter().map(|label| Value::Integer(i64::from(*label))));
    row
}

fn merge_positional(messages: Table, encoded: EncodedCategories) -> Result<Table, DatasetError> {
    if messages.len() != encoded.len() {
        warn!(
            "Messages have {} rows but categories have {}; keeping the first {}",
            messages.len(),
            encoded.len(),
            messages.len().min(encoded.len())
        );
    }

    let (names, labels) = encoded.into_parts();
    let (columns, rows) = messages.into_parts();

    let rows = rows
        .into_iter()
        .zip(&labels)
        .map(|(row, labels)| append_labels(row, labels))
        .collect();

    Table::from_rows(merged_columns(&columns, &names), rows)
}

fn merge_on_key(
    messages: Table,
    categories: &Table,
    encoded: EncodedCategories,
    key: &str,
) -> Result<Table, DatasetError> {
    let cardinality = |reason: String| DatasetError::JoinCardinality {
        key: key.to_string(),
        reason,
    };

    let mut by_key: HashMap<&Value, usize> = HashMap::with_capacity(categories.len());
    for (index, value) in categories.column(key)?.enumerate() {
        if by_key.insert(value, index).is_some() {
            return Err(cardinality(format!(
                "categories repeat the key {:?}",
                value.to_string()
            )));
        }
    }

    let key_index = messages
        .column_index(key)
        .ok_or_else(|| DatasetError::MissingColumn(key.to_string()))?;

    if messages.len() != by_key.len() {
        return Err(cardinality(format!(
            "{} messages but {} category records",
            messages.len(),
            by_key.len()
        )));
    }

    let (names, labels) = encoded.into_parts();
    let (columns, rows) = messages.into_parts();

    let mut used = HashSet::with_capacity(rows.len());
    let mut merged = Vec::with_capacity(rows.len());

    for row in rows {
        let index = *by_key.get(&row[key_index]).ok_or_else(|| {
            cardinality(format!(
                "no category record for key {:?}",
                row[key_index].to_string()
            ))
        })?;

        if !used.insert(index) {
            return Err(cardinality(format!(
                "messages repeat the key {:?}",
                row[key_index].to_string()
            )));
        }

        merged.push(append_labels(row, &labels[index]));
    }

    Table::from_rows(merged_columns(&columns, &names), merged)
}

/// Remove exact duplicate rows, keeping the first occurrence and the original order
pub fn clean_data(mut table: Table) -> Table {
    let before = table.len();

    let mut seen = HashSet::with_capacity(before);
    table.retain_rows(|row| seen.insert(row.clone()));

    debug!("Removed {} duplicate rows", before - table.len());

    table
}
