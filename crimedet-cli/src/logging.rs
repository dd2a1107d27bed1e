// ============================================================================
// crimedet-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: env_logger Initialization and Helpers
//
// All output, including the user-facing report lines printed through
// crimedet_core::terminal_output, goes through the `log` facade. This module
// installs env_logger as the backend, writing to standard output.
//
// KEY COMPONENTS:
// - init: Logger setup with the CLI's record format
// - get_timestamp: Local timestamp for run headers
//
// USAGE:
// - default: info level, or debug with --verbose
// - RUST_LOG overrides the level (e.g. RUST_LOG=crimedet_core=trace)

use env_logger::{Env, Target};
use log::{Level, LevelFilter};
use std::io::Write;

/// Returns the current local timestamp formatted as "YYYY-MM-DD HH:MM:SS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Default level for the given verbosity.
pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs env_logger.
///
/// Info records are printed bare so report lines read cleanly; every other
/// level is prefixed with a time and the level name.
pub fn init(verbose: bool) {
    let level = level_for(verbose);
    env_logger::Builder::from_env(Env::default().default_filter_or(level.as_str()))
        .target(Target::Stdout)
        .format(|buf, record| {
            if record.level() == Level::Info {
                return writeln!(buf, "{}", record.args());
            }
            let style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    log::debug!("Logger initialized with level: {}", level);
}
