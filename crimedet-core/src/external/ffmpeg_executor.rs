// ============================================================================
// crimedet-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Frame Decoding
//
// This module provides abstractions for spawning and interacting with FFmpeg
// processes, and uses them to decode a video file into RGB frames.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
// - FrameSource: Trait for anything that can produce the frames of a file
// - FfmpegFrameSource: FrameSource backed by an FfmpegSpawner

use crate::error::{
    CoreError, CoreResult, command_failed_error, command_start_error, command_wait_error,
};
use crate::external::ffmpeg_builder::FfmpegCommandBuilder;
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::FfmpegEvent;
use std::path::Path;
use std::process::ExitStatus;

// --- Decoded frame ---

/// A decoded video frame in packed RGB24 layout (row-major, 3 bytes per pixel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl RgbFrame {
    /// Wraps raw RGB24 bytes, checking that the buffer matches the dimensions.
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> CoreResult<Self> {
        let expected = width * height * 3;
        if data.len() != expected {
            return Err(CoreError::OperationFailed(format!(
                "RGB frame buffer has {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Creates a frame filled with a single color.
    pub fn filled(width: usize, height: usize, rgb: [u8; 3]) -> Self {
        let data = rgb.iter().copied().cycle().take(width * height * 3).collect();
        Self {
            width,
            height,
            data,
        }
    }

    /// Returns the (r, g, b) value at column `x`, row `y`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let offset = (y * self.width + x) * 3;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ]
    }
}

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Processes events from the running command using a provided handler closure.
    fn handle_events<F>(&mut self, handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
    where
        F: FnMut(FfmpegEvent) -> CoreResult<()>,
    {
        let iterator = self.0.iter().map_err(|e| {
            log::error!("Failed to get ffmpeg event iterator: {}", e);
            command_failed_error(
                "ffmpeg (sidecar - get iter)",
                ExitStatus::default(),
                e.to_string(),
            )
        })?;
        for event in iterator {
            handler(event)?;
        }
        Ok(())
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))
    }
}

// --- Frame decoding ---

/// Decodes `input_path` into RGB24 frames with the given spawner, handing
/// each frame to `on_frame` as soon as it is read. Returns the number of
/// frames delivered.
///
/// The ffmpeg process is always waited on once event handling finishes,
/// whether or not reading succeeded, so the child never outlives this call.
/// A non-zero exit status is logged as a warning and the frames read up to
/// that point stand; a file ffmpeg cannot open at all yields zero frames.
pub fn decode_frames<S: FfmpegSpawner>(
    spawner: &S,
    input_path: &Path,
    on_frame: &mut dyn FnMut(RgbFrame) -> CoreResult<()>,
) -> CoreResult<usize> {
    let cmd = FfmpegCommandBuilder::new().build_rgb_decode(input_path);
    log::debug!("Running frame decode command: {:?}", cmd);

    let mut process = spawner.spawn(cmd)?;
    let mut decoded = 0usize;
    let mut errors = Vec::new();

    let events_result = process.handle_events(|event| {
        match event {
            FfmpegEvent::OutputFrame(frame) => {
                on_frame(RgbFrame::new(
                    frame.width as usize,
                    frame.height as usize,
                    frame.data,
                )?)?;
                decoded += 1;
            }
            FfmpegEvent::Error(message) => {
                log::debug!("ffmpeg error while decoding: {}", message);
                errors.push(message);
            }
            _ => {}
        }
        Ok(())
    });
    let wait_result = process.wait();

    events_result.map_err(|e| CoreError::Decode {
        path: input_path.to_path_buf(),
        message: e.to_string(),
    })?;
    let status = wait_result?;
    if !status.success() {
        log::warn!(
            "ffmpeg stopped decoding {} after {} frame(s) ({}): {}",
            input_path.display(),
            decoded,
            status,
            errors.last().map(String::as_str).unwrap_or("no error output")
        );
    }

    log::debug!("Decoded {} frame(s) from {}", decoded, input_path.display());
    Ok(decoded)
}

/// Anything that can produce the RGB frames of a video file.
pub trait FrameSource {
    /// Streams the frames of `path` to `on_frame` in display order and
    /// returns how many were delivered.
    fn for_each_frame(
        &self,
        path: &Path,
        on_frame: &mut dyn FnMut(RgbFrame) -> CoreResult<()>,
    ) -> CoreResult<usize>;
}

/// [`FrameSource`] that decodes with ffmpeg through an [`FfmpegSpawner`].
#[derive(Debug, Clone, Default)]
pub struct FfmpegFrameSource<S: FfmpegSpawner = SidecarSpawner> {
    spawner: S,
}

impl<S: FfmpegSpawner> FfmpegFrameSource<S> {
    pub fn new(spawner: S) -> Self {
        Self { spawner }
    }
}

impl FfmpegFrameSource<SidecarSpawner> {
    /// Frame source that runs the system ffmpeg through ffmpeg-sidecar.
    pub fn sidecar() -> Self {
        Self::new(SidecarSpawner)
    }
}

impl<S: FfmpegSpawner> FrameSource for FfmpegFrameSource<S> {
    fn for_each_frame(
        &self,
        path: &Path,
        on_frame: &mut dyn FnMut(RgbFrame) -> CoreResult<()>,
    ) -> CoreResult<usize> {
        decode_frames(&self.spawner, path, on_frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ffmpeg_sidecar::event::OutputVideoFrame;
    use std::cell::Cell;
    use std::rc::Rc;

    #[cfg(unix)]
    use std::os::unix::process::ExitStatusExt;

    /// Scripted process: emits `frames` tiny frames, optionally fails while
    /// reading, exits with `exit_code`, and records whether it was waited on.
    struct ScriptedProcess {
        frames: usize,
        fail_events: bool,
        exit_code: i32,
        waited: Rc<Cell<bool>>,
    }

    fn tiny_frame(index: usize) -> OutputVideoFrame {
        OutputVideoFrame {
            width: 2,
            height: 1,
            pix_fmt: "rgb24".to_string(),
            output_index: 0,
            data: vec![index as u8; 6],
            frame_num: index as u32,
            timestamp: index as f32 / 30.0,
        }
    }

    impl FfmpegProcess for ScriptedProcess {
        fn handle_events<F>(&mut self, mut handler: F) -> CoreResult<()>
        where
            F: FnMut(FfmpegEvent) -> CoreResult<()>,
        {
            for index in 0..self.frames {
                handler(FfmpegEvent::OutputFrame(tiny_frame(index)))?;
            }
            handler(FfmpegEvent::Error("moov atom not found".to_string()))?;
            if self.fail_events {
                return Err(CoreError::OperationFailed("stream closed".to_string()));
            }
            Ok(())
        }

        fn wait(&mut self) -> CoreResult<ExitStatus> {
            self.waited.set(true);
            #[cfg(unix)]
            {
                // Wait status encoding: exit code in the high byte
                Ok(ExitStatus::from_raw(self.exit_code << 8))
            }
            #[cfg(not(unix))]
            {
                Ok(ExitStatus::default())
            }
        }
    }

    struct ScriptedSpawner {
        frames: usize,
        fail_events: bool,
        exit_code: i32,
        waited: Rc<Cell<bool>>,
    }

    impl ScriptedSpawner {
        fn new(frames: usize, exit_code: i32) -> Self {
            Self {
                frames,
                fail_events: false,
                exit_code,
                waited: Rc::new(Cell::new(false)),
            }
        }
    }

    impl FfmpegSpawner for ScriptedSpawner {
        type Process = ScriptedProcess;

        fn spawn(&self, _cmd: FfmpegCommand) -> CoreResult<Self::Process> {
            Ok(ScriptedProcess {
                frames: self.frames,
                fail_events: self.fail_events,
                exit_code: self.exit_code,
                waited: Rc::clone(&self.waited),
            })
        }
    }

    #[test]
    fn test_rgb_frame_rejects_wrong_buffer_length() {
        assert!(RgbFrame::new(2, 2, vec![0; 11]).is_err());
        assert!(RgbFrame::new(2, 2, vec![0; 12]).is_ok());
    }

    #[test]
    fn test_rgb_frame_pixel_access() {
        let frame = RgbFrame::new(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(frame.pixel(0, 0), [1, 2, 3]);
        assert_eq!(frame.pixel(1, 0), [4, 5, 6]);
        assert_eq!(RgbFrame::filled(3, 2, [9, 8, 7]).pixel(2, 1), [9, 8, 7]);
    }

    #[test]
    fn test_decode_frames_streams_in_order() {
        let spawner = ScriptedSpawner::new(3, 0);
        let mut seen = Vec::new();
        let count = decode_frames(&spawner, Path::new("clip.mp4"), &mut |frame| {
            seen.push(frame.pixel(0, 0)[0]);
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 3);
        assert_eq!(seen, vec![0, 1, 2]);
        assert!(spawner.waited.get());
    }

    #[cfg(unix)]
    #[test]
    fn test_undecodable_file_yields_no_frames() {
        let spawner = ScriptedSpawner::new(0, 1);
        let count = decode_frames(&spawner, Path::new("notes.mp4"), &mut |_| Ok(())).unwrap();
        assert_eq!(count, 0);
        assert!(spawner.waited.get());
    }

    #[cfg(unix)]
    #[test]
    fn test_truncated_file_keeps_frames_read_before_failure() {
        let spawner = ScriptedSpawner::new(5, 1);
        let mut delivered = 0;
        let count = decode_frames(&spawner, Path::new("cut.mp4"), &mut |_| {
            delivered += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!((count, delivered), (5, 5));
    }

    #[test]
    fn test_decode_frames_waits_even_when_reading_fails() {
        let spawner = ScriptedSpawner {
            fail_events: true,
            ..ScriptedSpawner::new(0, 0)
        };
        let result = decode_frames(&spawner, Path::new("broken.mp4"), &mut |_| Ok(()));
        assert!(matches!(result, Err(CoreError::Decode { .. })));
        assert!(spawner.waited.get());
    }

    #[test]
    fn test_frame_handler_error_stops_decoding() {
        let spawner = ScriptedSpawner::new(4, 0);
        let mut calls = 0;
        let result = decode_frames(&spawner, Path::new("clip.mp4"), &mut |_| {
            calls += 1;
            Err(CoreError::OperationFailed("full".to_string()))
        });
        assert!(matches!(result, Err(CoreError::Decode { .. })));
        assert_eq!(calls, 1);
        assert!(spawner.waited.get());
    }
}
