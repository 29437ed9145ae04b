use std::{ffi::OsString, path::PathBuf};

use anyhow::Context;
use log::info;
use pico_args::Arguments;

use crate::pipelines::text_classification::{
    build_model, evaluate_model, init_lexicon, save_model, Model, TrainingConfig, TrainingData,
};

/// Usage text
pub const HELP: &str = "\
Usage: train_classifier DATABASE MODEL [OPTIONS]

Provide the filepath of the disaster messages database as the first argument and the
filepath of the model file to save the trained model to as the second argument.

Example: train_classifier DisasterResponse.db classifier.bin

Arguments:
  DATABASE             The SQLite file holding 'messages_table'
  MODEL                The file to write the trained model to

Options:
  -h, --help           Print help
  -c, --config FILE    A JSON training config; missing fields take their defaults
  --search             Run the hyper-parameter grid search
  -s, --seed N         Seed for the split and the forest
  -t, --test-size F    Fraction of rows held out for evaluation (defaults to 0.2)
  -v, --verbose        Debug logging
";

/// Training job arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// The SQLite store
    pub database: PathBuf,

    /// The model artifact
    pub model: PathBuf,

    /// A JSON training config
    pub config: Option<PathBuf>,

    /// Enable the grid search
    pub search: bool,

    /// Override the seed
    pub seed: Option<u64>,

    /// Override the held-out fraction
    pub test_size: Option<f64>,

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
        let search = pargs.contains("--search");
        let config = pargs.opt_value_from_str(["-c", "--config"])?;
        let seed = pargs.opt_value_from_str(["-s", "--seed"])?;
        let test_size = pargs.opt_value_from_str(["-t", "--test-size"])?;

        let free: Vec<OsString> = pargs.finish();
        let [database, model]: [OsString; 2] = match free.try_into() {
            Ok(paths) => paths,
            Err(_) => return Ok(None),
        };

        Ok(Some(Args {
            database: database.into(),
            model: model.into(),
            config,
            search,
            seed,
            test_size,
            verbose,
        }))
    }

    /// The training config: the config file if given, then the command line overrides
    pub fn training_config(&self) -> anyhow::Result<TrainingConfig> {
        let mut config = match &self.config {
            Some(path) => TrainingConfig::load(path)
                .with_context(|| format!("Unable to load config file {}", path.display()))?,
            None => TrainingConfig::new(),
        };

        if self.search {
            config = config.with_search_enabled(true);
        }

        if self.seed.is_some() {
            config = config.with_seed(self.seed);
        }

        if let Some(test_size) = self.test_size {
            config = config.with_test_size(test_size);
        }

        Ok(config)
    }
}

/// Load the data, then build, train, evaluate and save the model
pub fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.training_config()?;

    init_lexicon();

    info!("Loading data...\n    DATABASE: {}", args.database.display());

    let data = TrainingData::load(&args.database)
        .with_context(|| format!("Unable to load data from {}", args.database.display()))?;
    let (train, test) = data.train_test_split(config.test_size, config.seed)?;

    info!("Building model...");

    let mut model = build_model(&config);

    info!("Training model on {} rows...", train.len());

    model.fit(&train.texts, &train.labels, &train.label_names)?;

    info!("Evaluating model on {} rows...", test.len());

    evaluate_model(&model, &test.texts, &test.labels, &test.label_names)?;

    info!("Saving model...\n    MODEL: {}", args.model.display());

    save_model(&model.into_pipeline()?, &args.model)
        .with_context(|| format!("Unable to save model to {}", args.model.display()))?;

    info!("Trained model saved!");

    Ok(())
}
