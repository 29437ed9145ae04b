//! Error type for the SQLite store.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("unable to replace {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table read back from the store is not rectangular.
    #[error("dataset error: {0}")]
    Dataset(#[from] crate::datasets::DatasetError),
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;
