use std::path::Path;

use log::{debug, info};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{datasets::Table, storage::load_table};

use super::ModelError;

/// The column holding the text to classify
pub static MESSAGE_COLUMN: &str = "message";

/// Columns that are never labels
pub static NON_LABEL_COLUMNS: [&str; 4] = ["id", "message", "original", "genre"];

/// Texts and their label rows, in table order
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingData {
    /// One text per row
    pub texts: Vec<String>,

    /// One value per label per row
    pub labels: Vec<Vec<f64>>,

    /// The label columns, in table order
    pub label_names: Vec<String>,
}

impl TrainingData {
    /// Read the messages table from the store at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let table = load_table(path)?;

        info!("Loaded {} rows", table.len());

        Self::from_table(&table)
    }

    /// Split a merged table into texts and labels. Every column other than the identifier,
    /// message, original text and genre is a label and must be numeric.
    pub fn from_table(table: &Table) -> Result<Self, ModelError> {
        let message = table
            .column_index(MESSAGE_COLUMN)
            .ok_or_else(|| ModelError::MissingColumn(MESSAGE_COLUMN.to_string()))?;

        let label_columns: Vec<(usize, &String)> = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, name)| !NON_LABEL_COLUMNS.contains(&name.as_str()))
            .collect();

        let mut texts = Vec::with_capacity(table.len());
        let mut labels = Vec::with_capacity(table.len());

        for (row_index, row) in table.rows().iter().enumerate() {
            texts.push(row[message].to_string());

            let values = label_columns
                .iter()
                .map(|(column, name)| {
                    row[*column].as_f64().ok_or_else(|| ModelError::InvalidLabel {
                        column: (*name).clone(),
                        row: row_index,
                    })
                })
                .collect::<Result<Vec<f64>, ModelError>>()?;

            labels.push(values);
        }

        let label_names = label_columns
            .into_iter()
            .map(|(_, name)| name.clone())
            .collect::<Vec<_>>();

        debug!("Found {} label columns", label_names.len());

        Ok(Self {
            texts,
            labels,
            label_names,
        })
    }

    /// The number of rows
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Returns true if there are no rows
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// The rows at the given indices, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            texts: indices.iter().map(|&index| self.texts[index].clone()).collect(),
            labels: indices.iter().map(|&index| self.labels[index].clone()).collect(),
            label_names: self.label_names.clone(),
        }
    }

    /// Shuffle the rows and hold out `ceil(len * test_size)` of them, returning `(train, test)`
    pub fn train_test_split(
        &self,
        test_size: f64,
        seed: Option<u64>,
    ) -> Result<(Self, Self), ModelError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(ModelError::Config(format!(
                "test size must be between 0 and 1, got {}",
                test_size
            )));
        }

        let n_test = (self.len() as f64 * test_size).ceil() as usize;
        if n_test == 0 || n_test >= self.len() {
            return Err(ModelError::Config(format!(
                "cannot hold out {} of {} rows and keep both splits non-empty",
                test_size,
                self.len()
            )));
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.shuffle(&mut rng);

        let (test, train) = order.split_at(n_test);

        Ok((self.select(train), self.select(test)))
    }
}
