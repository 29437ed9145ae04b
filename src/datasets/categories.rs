use derive_new::new;
use serde::{Deserialize, Serialize};

use super::{DatasetError, Table};

/// The column holding the delimited category string
pub static CATEGORIES_COLUMN: &str = "categories";

/// Separates the "name-value" fields of a category string
pub const FIELD_DELIMITER: char = ';';

/// Separates a field's name from its value
pub const PAIR_SEPARATOR: char = '-';

/// The row whose field names become the encoded column names
pub const DEFAULT_NAMING_ROW: usize = 1;

/// Category Encoder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
#[serde(default)]
pub struct EncoderConfig {
    /// The zero-based row that supplies column names
    #[new(value = "DEFAULT_NAMING_ROW")]
    pub naming_row: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EncoderConfig {
    /// Read column names from a different row
    pub fn with_naming_row(mut self, naming_row: usize) -> Self {
        self.naming_row = naming_row;
        self
    }
}

/// A fixed-width binary label matrix, one row per category record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedCategories {
    /// Label names, in the order their fields appear
    names: Vec<String>,

    /// One 0/1 value per label for each row
    rows: Vec<Vec<u8>>,
}

impl EncodedCategories {
    /// Label names, in column order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The encoded rows
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    /// The number of encoded rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if nothing was encoded
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split into names and rows
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<u8>>) {
        (self.names, self.rows)
    }
}

/// Encode the `categories` column of a category table into binary label columns.
///
/// Every cell is split on `;` into "name-value" fields. Column names come from the fields of
/// the configured naming row; each value becomes 1 when its integer suffix is greater than
/// zero and 0 otherwise. Fields are matched to columns by position.
pub fn encode_categories(
    table: &Table,
    config: &EncoderConfig,
) -> Result<EncodedCategories, DatasetError> {
    let cells: Vec<String> = table
        .column(CATEGORIES_COLUMN)?
        .map(|value| value.to_string())
        .collect();

    if cells.len() <= config.naming_row {
        return Err(DatasetError::TooFewRows {
            required: config.naming_row + 1,
            found: cells.len(),
        });
    }

    let names: Vec<String> = cells[config.naming_row]
        .split(FIELD_DELIMITER)
        .map(|field| field.split(PAIR_SEPARATOR).next().unwrap_or(field).to_string())
        .collect();

    let rows = cells
        .iter()
        .enumerate()
        .map(|(row, cell)| encode_row(row, cell, names.len()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EncodedCategories { names, rows })
}

fn encode_row(row: usize, cell: &str, width: usize) -> Result<Vec<u8>, DatasetError> {
    let fields: Vec<&str> = cell.split(FIELD_DELIMITER).collect();

    if fields.len() != width {
        return Err(DatasetError::Parse {
            row,
            field: cell.to_string(),
            reason: format!("expected {} fields, found {}", width, fields.len()),
        });
    }

    fields
        .into_iter()
        .map(|field| encode_field(row, field))
        .collect()
}

fn encode_field(row: usize, field: &str) -> Result<u8, DatasetError> {
    let parse_error = |reason: &str| DatasetError::Parse {
        row,
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let value = field
        .split(PAIR_SEPARATOR)
        .nth(1)
        .ok_or_else(|| parse_error("missing \"-\" between name and value"))?;

    let value: i64 = value
        .trim()
        .parse()
        .map_err(|_| parse_error("value is not an integer"))?;

    Ok(u8::from(value > 0))
}
