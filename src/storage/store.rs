//! [`SqliteStore`]: a single SQLite file holding the messages table.

use std::path::Path;

use log::debug;
use rusqlite::{params_from_iter, Connection, OpenFlags};

use crate::{
    datasets::Table,
    storage::{
        encode::decode_value,
        schema::{self, MESSAGES_TABLE},
        Result, StorageError,
    },
    utils::files::StagedFile,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A relational store backed by a single SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an existing store without write access; fails if the file is missing.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Drop any table called `name` and write `table` in its place, in one transaction.
    pub fn replace_table(&mut self, name: &str, table: &Table) -> Result<()> {
        let tx = self.conn.transaction()?;

        tx.execute(&schema::drop_table(name), [])?;
        tx.execute(&schema::create_table(name, table), [])?;

        {
            let mut insert = tx.prepare(&schema::insert_row(name, table.columns().len()))?;
            for row in table.rows() {
                insert.execute(params_from_iter(row.iter()))?;
            }
        }

        tx.commit()?;

        debug!("Wrote {} rows to {}", table.len(), name);

        Ok(())
    }

    /// Read every row of the table called `name`, in storage order.
    pub fn read_table(&self, name: &str) -> Result<Table> {
        let mut select = self.conn.prepare(&schema::select_all(name))?;

        let columns: Vec<String> = select
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let width = columns.len();

        let rows = select
            .query_map([], |row| {
                (0..width)
                    .map(|index| row.get_ref(index).map(decode_value))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Table::from_rows(columns, rows)?)
    }

    /// Close the connection, reporting any error flushing it.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| StorageError::Database(err))
    }
}

// ─── Jobs ────────────────────────────────────────────────────────────────────

/// Replace the messages table in the store at `path`.
///
/// The write is staged on a copy of the store and renamed into place after it commits, so a
/// failure leaves the previous store as it was. Other tables in the store are preserved.
pub fn save_data(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let io_error = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    let staged = StagedFile::copy_of(path).map_err(io_error)?;

    let mut store = SqliteStore::open(staged.path())?;
    store.replace_table(MESSAGES_TABLE, table)?;
    store.close()?;

    staged.commit().map_err(io_error)
}

/// Read the messages table from the store at `path`.
pub fn load_table(path: impl AsRef<Path>) -> Result<Table> {
    let store = SqliteStore::open_read_only(path)?;
    let table = store.read_table(MESSAGES_TABLE)?;
    store.close()?;

    Ok(table)
}
