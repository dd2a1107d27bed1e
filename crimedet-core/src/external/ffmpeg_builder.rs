//! FFmpeg command builder utilities
//!
//! This module provides a builder for the ffmpeg commands the pipeline runs.
//! The only command currently needed decodes the video stream of a file into
//! packed RGB24 frames on stdout.

use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::Path;

/// Builder for creating `FFmpeg` commands with common configurations
pub struct FfmpegCommandBuilder {
    cmd: FfmpegCommand,
    hide_banner: bool,
    video_only: bool,
}

impl Default for FfmpegCommandBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegCommandBuilder {
    /// Creates a new `FFmpeg` command builder with sensible defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            cmd: FfmpegCommand::new(),
            hide_banner: true,
            video_only: true,
        }
    }

    /// Sets whether to hide the `FFmpeg` banner
    #[must_use]
    pub fn with_hide_banner(mut self, hide: bool) -> Self {
        self.hide_banner = hide;
        self
    }

    /// Sets whether audio and subtitle streams are dropped
    #[must_use]
    pub fn with_video_only(mut self, video_only: bool) -> Self {
        self.video_only = video_only;
        self
    }

    /// Builds a command that decodes `input` into raw RGB24 frames on stdout
    #[must_use]
    pub fn build_rgb_decode(mut self, input: &Path) -> FfmpegCommand {
        if self.hide_banner {
            self.cmd.arg("-hide_banner");
        }
        self.cmd.input(input);
        if self.video_only {
            self.cmd.args(["-an", "-sn"]);
        }
        // -f rawvideo -pix_fmt rgb24 -
        self.cmd.rawvideo();
        self.cmd
    }
}
