//! SQLite persistence for the merged messages table.
//!
//! The ingestion job writes the table with replace semantics and the training job reads it
//! back. Writes go to a temporary copy of the store that is renamed over the target once
//! the new table is committed.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Result, StorageError};
pub use schema::MESSAGES_TABLE;
pub use store::{load_table, save_data, SqliteStore};
