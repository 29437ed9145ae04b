use log::{debug, LevelFilter};

/// The ingestion job
pub mod process_data;

/// The training job
pub mod train_classifier;

/// Install the logger: Info by default, Debug when verbose
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Only fails when a logger is already installed, which then keeps logging
    if let Err(err) = pretty_env_logger::formatted_timed_builder()
        .filter_level(level)
        .try_init()
    {
        debug!("Keeping the installed logger: {}", err);
    }
}
