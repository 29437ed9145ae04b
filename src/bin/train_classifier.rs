//! Command line tool to train, evaluate and save the message classifier

use disaster_response::cli::{
    init_logging,
    train_classifier::{run, Args, HELP},
};

fn main() -> anyhow::Result<()> {
    let args = match Args::parse()? {
        Some(args) => args,
        None => {
            print!("{}", HELP);

            return Ok(());
        }
    };

    init_logging(args.verbose);

    run(&args)
}
