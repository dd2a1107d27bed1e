// ============================================================================
// crimedet-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types for crimedet-core
//
// This module defines the error types used throughout the crimedet-core
// library. It provides a unified error handling approach with specific error
// variants for the decoding, model and fusion stages of the pipeline.
//
// KEY COMPONENTS:
// - CoreError: Enum of all possible error types
// - CoreResult: Type alias for Result with CoreError
// - Helper functions for creating common error types

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Errors produced by the crimedet-core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to execute {0}: {1}")]
    CommandStart(String, io::Error),

    #[error("Failed to wait for {0}: {1}")]
    CommandWait(String, io::Error),

    #[error("Command {0} failed with status {1}. Stderr: {2}")]
    CommandFailed(String, ExitStatus, String),

    #[error("Required external command '{0}' not found or failed to execute.")]
    DependencyNotFound(String),

    #[error("Video file not found: {0}")]
    VideoNotFound(PathBuf),

    #[error("Failed to decode video '{path}': {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Failed to load encoder weights: {0}")]
    Weights(String),

    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("Model file not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Model bundle serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for crimedet-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

// ---- Helper constructors ----

/// Creates a [`CoreError::CommandStart`] for a command that could not be spawned.
pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

/// Creates a [`CoreError::CommandWait`] for a command whose exit could not be collected.
pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

/// Creates a [`CoreError::CommandFailed`] for a command that exited unsuccessfully.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed(cmd.into(), status, stderr.into())
}

/// Creates a [`CoreError::ShapeMismatch`] from anything printable.
pub fn shape_mismatch(
    context: impl Into<String>,
    expected: impl std::fmt::Debug,
    actual: impl std::fmt::Debug,
) -> CoreError {
    CoreError::ShapeMismatch {
        context: context.into(),
        expected: format!("{expected:?}"),
        actual: format!("{actual:?}"),
    }
}
