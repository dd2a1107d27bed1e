// crimedet-cli/src/lib.rs
//
// Library portion of the crimedet CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;

// Re-export items needed by the binary or integration tests
pub use cli::Cli;
pub use commands::analyze::{AnalyzeOutcome, run_analyze, run_analyze_with};
pub use commands::train::run_train;
pub use error::{CliErrorContext, CliResult};
