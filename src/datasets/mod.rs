use std::path::PathBuf;

/// Generic in-memory tables read from delimited text
pub mod table;

/// The Category Encoder
pub mod categories;

/// The disaster-response messages dataset
pub mod disaster;

pub use categories::{encode_categories, EncodedCategories, EncoderConfig};
pub use disaster::{clean_data, load_data, IngestConfig, JoinStrategy};
pub use table::{ColumnType, Table, Value};

/// Dataset Error
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// An input file could not be opened
    #[error("unable to read {path}: {source}")]
    Io {
        /// The file that failed to open
        path: PathBuf,

        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The delimited text could not be read
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A category field is not a well-formed "name-value" pair
    #[error("row {row}: unable to parse category field {field:?}: {reason}")]
    Parse {
        /// Zero-based row index in the categories table
        row: usize,

        /// The offending field
        field: String,

        /// What was wrong with it
        reason: String,
    },

    /// Column names are read from a row that does not exist
    #[error("at least {required} category rows are required to derive column names, found {found}")]
    TooFewRows {
        /// The minimum number of rows
        required: usize,

        /// The number of rows present
        found: usize,
    },

    /// A required column is missing from the input
    #[error("missing column {0:?}")]
    MissingColumn(String),

    /// A row does not match the width of its table
    #[error("row has {found} cells but the table has {expected} columns")]
    RowWidth {
        /// The number of columns in the table
        expected: usize,

        /// The number of cells in the row
        found: usize,
    },

    /// The two inputs cannot be associated one-to-one on the join key
    #[error("join on {key:?} failed: {reason}")]
    JoinCardinality {
        /// The join column
        key: String,

        /// Why the key sets do not line up
        reason: String,
    },
}
