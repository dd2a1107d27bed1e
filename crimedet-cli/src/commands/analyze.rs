// ============================================================================
// crimedet-cli/src/commands/analyze.rs
// ============================================================================
//
// ANALYZE COMMAND: Single Video Inference
//
// Flow:
//   1. Load the model bundle (reporting a missing file as a user error)
//   2. Take the video path from --video or prompt for it on stdin
//   3. Check ffmpeg, build the encoder (pretrained or random)
//   4. Run the Analyzer and report the decision

use crate::error::{CliErrorContext, CliResult};

use crimedet_core::config::CoreConfig;
use crimedet_core::external::{FfmpegFrameSource, FrameSource, check_dependency};
use crimedet_core::models::{ModelBundle, load_encoder};
use crimedet_core::terminal_output::{
    clear_progress_bar, print_clip_progress, print_decision, print_error, print_processing,
    print_section, print_status, print_success,
};
use crimedet_core::{Analyzer, format_duration, seeded_rng};

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// How an analysis run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// A verdict was printed
    Completed,
    /// No bundle at the configured path
    ModelMissing,
    /// The given video path is not a file
    VideoMissing(PathBuf),
    /// The video produced no clips
    Failed,
}

impl AnalyzeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Prompts for a video path and returns the trimmed answer.
pub fn prompt_video_path<R: BufRead + ?Sized, W: Write + ?Sized>(
    input: &mut R,
    output: &mut W,
) -> CliResult<PathBuf> {
    write!(output, "Enter path to video file: ")?;
    output.flush()?;
    let mut line = String::new();
    input
        .read_line(&mut line)
        .cli_context("Failed to read video path from standard input")?;
    Ok(PathBuf::from(line.trim()))
}

/// Runs the analysis flow, decoding with the system ffmpeg.
///
/// `video` is used when given; otherwise the path is read from `input`.
pub fn run_analyze<R: BufRead + ?Sized>(
    config: &CoreConfig,
    video: Option<&Path>,
    input: &mut R,
) -> CliResult<AnalyzeOutcome> {
    run_analyze_with(config, video, input, || {
        check_dependency("ffmpeg")?;
        Ok(FfmpegFrameSource::sidecar())
    })
}

/// Runs the analysis flow with the frame source built by `make_source`.
///
/// `make_source` is only called once the bundle and the video file have
/// been found.
pub fn run_analyze_with<R, F, M>(
    config: &CoreConfig,
    video: Option<&Path>,
    input: &mut R,
    make_source: M,
) -> CliResult<AnalyzeOutcome>
where
    R: BufRead + ?Sized,
    F: FrameSource,
    M: FnOnce() -> CliResult<F>,
{
    config.validate()?;

    if !config.model_path.exists() {
        print_error(&format!(
            "Model file '{}' not found. Run with --train to create it first.",
            config.model_path.display()
        ));
        return Ok(AnalyzeOutcome::ModelMissing);
    }
    let bundle = ModelBundle::load(&config.model_path)?;
    log::info!("Models loaded from {}", config.model_path.display());

    let video_path = match video {
        Some(path) => path.to_path_buf(),
        None => prompt_video_path(input, &mut std::io::stdout())?,
    };
    if !video_path.is_file() {
        print_error(&format!("File {} does not exist.", video_path.display()));
        return Ok(AnalyzeOutcome::VideoMissing(video_path));
    }

    let source = make_source()?;

    print_section("Analysis");
    print_status("Video", &video_path.display().to_string(), true);
    print_status("Model bundle", &config.model_path.display().to_string(), false);

    let mut rng = seeded_rng(config.seed);
    let encoder = load_encoder(config, &mut rng)?;
    let analyzer = Analyzer::new(encoder, source, bundle, config.clone())?;

    print_processing("Embedding clips");
    let start = Instant::now();
    let result = analyzer.analyze(&video_path, &mut print_clip_progress);
    clear_progress_bar();
    let decision = result?;
    print_status(
        "Elapsed",
        &format_duration(start.elapsed().as_secs_f64()),
        false,
    );

    match decision {
        Some(decision) => {
            print_decision(&decision);
            print_success(&format!(
                "Final Prediction for video: {}",
                decision.verdict.to_string().to_uppercase()
            ));
            Ok(AnalyzeOutcome::Completed)
        }
        None => {
            print_error("Failed to analyze video.");
            Ok(AnalyzeOutcome::Failed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crimedet_core::config::CoreConfigBuilder;
    use crimedet_core::external::RgbFrame;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_prompt_trims_answer() {
        let mut input = Cursor::new("  /videos/street cam.mp4 \n");
        let mut output = Vec::new();
        let path = prompt_video_path(&mut input, &mut output).unwrap();
        assert_eq!(path, PathBuf::from("/videos/street cam.mp4"));
        assert_eq!(String::from_utf8(output).unwrap(), "Enter path to video file: ");
    }

    #[test]
    fn test_missing_model_is_reported() {
        let dir = tempdir().unwrap();
        let config = CoreConfigBuilder::new()
            .model_path(dir.path().join("model.joblib"))
            .build();
        let outcome = run_analyze(&config, None, &mut Cursor::new("")).unwrap();
        assert_eq!(outcome, AnalyzeOutcome::ModelMissing);
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_missing_video_is_reported() {
        let dir = tempdir().unwrap();
        let model_path = dir.path().join("model.joblib");
        let config = CoreConfigBuilder::new()
            .model_path(model_path)
            .ae_hidden_dim(4)
            .seed(1)
            .use_pretrained(false)
            .build();
        crate::commands::train::run_train(&config).unwrap();

        let video = dir.path().join("absent.mp4");
        let outcome = run_analyze(&config, Some(video.as_path()), &mut Cursor::new("")).unwrap();
        assert_eq!(outcome, AnalyzeOutcome::VideoMissing(video));
    }

    /// Stands in for ffmpeg on a file it cannot decode: no frames at all.
    struct UndecodableSource;

    impl FrameSource for UndecodableSource {
        fn for_each_frame(
            &self,
            _path: &Path,
            _on_frame: &mut dyn FnMut(RgbFrame) -> CliResult<()>,
        ) -> CliResult<usize> {
            Ok(0)
        }
    }

    #[test]
    fn test_undecodable_video_reports_failure() {
        let dir = tempdir().unwrap();
        let config = CoreConfigBuilder::new()
            .model_path(dir.path().join("model.joblib"))
            .ae_hidden_dim(4)
            .seed(2)
            .use_pretrained(false)
            .build();
        crate::commands::train::run_train(&config).unwrap();

        let video = dir.path().join("notes.mp4");
        std::fs::write(&video, b"plain text, not a video").unwrap();
        let outcome = run_analyze_with(&config, Some(video.as_path()), &mut Cursor::new(""), || {
            Ok(UndecodableSource)
        })
        .unwrap();
        assert_eq!(outcome, AnalyzeOutcome::Failed);
        assert!(!outcome.is_success());
    }
}
