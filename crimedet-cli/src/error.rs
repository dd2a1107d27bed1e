// ============================================================================
// crimedet-cli/src/error.rs
// ============================================================================
//
// CLI ERRORS: CoreError with a command-level prefix
//
// The CLI has no error type of its own. Failures from the core library are
// passed through unchanged, or prefixed with what the command was doing
// (reading the prompt answer, saving the bundle) so the final
// "Error: ..." line names the step that failed.

use crimedet_core::{CoreError, CoreResult};

use std::fmt;

/// Result type for command functions.
pub type CliResult<T> = CoreResult<T>;

/// Prefixes an error with the step that produced it.
pub trait CliErrorContext<T> {
    /// Prefixes the error with `context`.
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display;

    /// Prefixes the error with the message built by `f`, only on failure.
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_context<C>(self, context: C) -> CliResult<T>
    where
        C: fmt::Display,
    {
        self.cli_with_context(|| context)
    }

    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| CoreError::OperationFailed(format!("{}: {}", f(), e.into())))
    }
}
