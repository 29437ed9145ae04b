use std::{ffi::OsString, path::PathBuf};

use anyhow::Context;
use log::info;
use pico_args::Arguments;

use crate::{
    datasets::{
        clean_data, disaster::ID_COLUMN, load_data, EncoderConfig, IngestConfig, JoinStrategy,
    },
    storage::save_data,
};

/// Usage text
pub const HELP: &str = "\
Usage: process_data MESSAGES CATEGORIES DATABASE [OPTIONS]

Provide the filepaths of the messages and categories datasets as the first and second
argument respectively, as well as the filepath of the database to save the cleaned data
to as the third argument.

Example: process_data disaster_messages.csv disaster_categories.csv DisasterResponse.db

Arguments:
  MESSAGES             The messages CSV file
  CATEGORIES           The categories CSV file
  DATABASE             The SQLite file to write 'messages_table' to

Options:
  -h, --help           Print help
  --join-on-id         Pair messages and categories by their 'id' column instead of row order
  --naming-row N       The categories row that category names are read from (defaults to 1)
  -v, --verbose        Debug logging
";

/// Ingestion job arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// The messages CSV file
    pub messages: PathBuf,

    /// The categories CSV file
    pub categories: PathBuf,

    /// The SQLite store
    pub database: PathBuf,

    /// Join on the id column
    pub join_on_id: bool,

    /// Override the category naming row
    pub naming_row: Option<usize>,

    /// Debug logging
    pub verbose: bool,
}

impl Args {
    /// Parse the process arguments. `None` means the usage text should be printed.
    pub fn parse() -> anyhow::Result<Option<Self>> {
        Self::parse_from(Arguments::from_env())
    }

    /// Parse the given arguments. `None` means the usage text should be printed.
    pub fn parse_from(mut pargs: Arguments) -> anyhow::Result<Option<Self>> {
        // Help has a higher priority and should be handled separately.
        if pargs.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let verbose = pargs.contains(["-v", "--verbose"]);
        let join_on_id = pargs.contains("--join-on-id");
        let naming_row = pargs.opt_value_from_str("--naming-row")?;

        let free: Vec<OsString> = pargs.finish();
        let [messages, categories, database]: [OsString; 3] = match free.try_into() {
            Ok(paths) => paths,
            Err(_) => return Ok(None),
        };

        Ok(Some(Args {
            messages: messages.into(),
            categories: categories.into(),
            database: database.into(),
            join_on_id,
            naming_row,
            verbose,
        }))
    }

    /// The ingestion settings selected by the options
    pub fn ingest_config(&self) -> IngestConfig {
        let mut config = IngestConfig::new();

        if let Some(naming_row) = self.naming_row {
            config = config.with_encoder(EncoderConfig::new().with_naming_row(naming_row));
        }

        if self.join_on_id {
            config = config.with_join(JoinStrategy::Key(ID_COLUMN.to_string()));
        }

        config
    }
}

/// Load, clean and store the dataset
pub fn run(args: &Args) -> anyhow::Result<()> {
    info!(
        "Loading data...\n    MESSAGES: {}\n    CATEGORIES: {}",
        args.messages.display(),
        args.categories.display()
    );

    let table = load_data(&args.messages, &args.categories, &args.ingest_config())
        .context("Unable to load the messages and categories")?;

    info!("Cleaning data...");

    let table = clean_data(table);

    info!("Saving data...\n    DATABASE: {}", args.database.display());

    save_data(&table, &args.database)
        .with_context(|| format!("Unable to save data to {}", args.database.display()))?;

    info!("Cleaned data saved to database!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(items: &[&str]) -> Option<Args> {
        let args = items.iter().map(OsString::from).collect();

        Args::parse_from(Arguments::from_vec(args)).unwrap()
    }

    #[test]
    fn parses_three_paths() {
        let args = parse(&["messages.csv", "categories.csv", "store.db"]).unwrap();

        assert_eq!(args.database, PathBuf::from("store.db"));
        assert_eq!(args.ingest_config(), IngestConfig::default());
    }

    #[test]
    fn wrong_arity_prints_usage() {
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["messages.csv", "categories.csv"]), None);
        assert_eq!(parse(&["a", "b", "c", "d"]), None);
        assert_eq!(parse(&["--help", "a", "b", "c"]), None);
    }

    #[test]
    fn options_select_the_ingest_config() {
        let args = parse(&["--join-on-id", "a", "b", "c", "--naming-row", "0", "-v"]).unwrap();

        assert!(args.verbose);
        assert_eq!(
            args.ingest_config(),
            IngestConfig::new()
                .with_encoder(EncoderConfig::new().with_naming_row(0))
                .with_join(JoinStrategy::Key("id".to_string()))
        );
    }
}
