use clap::Parser;
use vfetch_core::logging;

mod cli;

use crate::cli::Cli;

fn main() {
    // Parse first so `--help` and usage errors leave no log file behind.
    let args = Cli::parse();

    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    if let Err(err) = args.run() {
        eprintln!("verified-fetch error: {:#}", err);
        std::process::exit(cli::exit_code(&err));
    }
}
