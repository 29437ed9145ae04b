//! Command line tool to merge, clean and store the disaster-response messages

use disaster_response::cli::{
    init_logging,
    process_data::{run, Args, HELP},
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
