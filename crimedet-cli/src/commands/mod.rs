//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of one run mode.

/// Placeholder training: initialize the models and save the bundle.
pub mod train;

/// Interactive analysis of a single video file.
pub mod analyze;
