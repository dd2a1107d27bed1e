// crimedet-cli/src/main.rs
//
// Entry point for the crimedet binary.
//
// Responsibilities:
// - Parsing command-line arguments.
// - Setting up logging.
// - Dispatching to the train or analyze flow.
// - Mapping the outcome to the process exit code (0 on success, 1 on failure).

use clap::Parser;
use crimedet_cli::logging::{self, get_timestamp};
use crimedet_cli::{Cli, CliResult, run_analyze, run_train};
use crimedet_core::terminal_output::print_error;
use std::process;

fn run(cli: &Cli) -> CliResult<bool> {
    let config = cli.core_config();
    log::debug!("Run started: {}", get_timestamp());
    log::debug!("Configuration: {:?}", config);

    if cli.train {
        run_train(&config)?;
        return Ok(true);
    }

    let stdin = std::io::stdin();
    let outcome = run_analyze(&config, cli.video.as_deref(), &mut stdin.lock())?;
    Ok(outcome.is_success())
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            print_error(&format!("Error: {e}"));
            process::exit(1);
        }
    }
}
