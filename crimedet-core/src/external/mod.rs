// ============================================================================
// crimedet-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg
//
// This module encapsulates interactions with the ffmpeg command-line tool,
// which is the only external collaborator of the pipeline. It provides traits
// and concrete implementations so that video decoding can be replaced in tests.
//
// KEY COMPONENTS:
// - FfmpegSpawner / FfmpegProcess: process-level abstraction over ffmpeg-sidecar
// - FrameSource: "give me the RGB frames of this file" abstraction
// - Dependency checking

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;
use std::process::{Command, Stdio};

// ============================================================================
// SUBMODULES
// ============================================================================

/// Contains the ffmpeg command builder used for decoding
pub mod ffmpeg_builder;

/// Contains traits and implementations for executing ffmpeg and reading frames
pub mod ffmpeg_executor;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use ffmpeg_builder::FfmpegCommandBuilder;
pub use ffmpeg_executor::{
    FfmpegFrameSource, FfmpegProcess, FfmpegSpawner, FrameSource, RgbFrame, SidecarProcess,
    SidecarSpawner, decode_frames,
};

// ============================================================================
// DEPENDENCY CHECKING
// ============================================================================

/// Checks if a required external command is available and executable.
///
/// Runs the command with `-version` and discards its output.
///
/// # Returns
///
/// * `Ok(())` - If the command could be started
/// * `Err(CoreError::DependencyNotFound)` - If the command is not found
/// * `Err(CoreError::CommandStart)` - If the command exists but fails to start
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyNotFound(cmd_name.to_string()))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_dependency_missing_command() {
        let result = check_dependency("crimedet-surely-not-a-real-binary");
        assert!(matches!(result, Err(CoreError::DependencyNotFound(name)) if name.contains("crimedet")));
    }
}
