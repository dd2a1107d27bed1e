//! Core library for classifying videos as "crime" or "no crime".
//!
//! Videos are decoded with ffmpeg, cut into overlapping clips, and embedded
//! with an R3D-18 encoder. The embedding sequence is then scored twice: a
//! linear classifier gives class confidences and an LSTM autoencoder gives a
//! reconstruction-error anomaly score. A fixed threshold policy fuses the two
//! into a verdict.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use crimedet_core::config::CoreConfigBuilder;
//! use crimedet_core::external::FfmpegFrameSource;
//! use crimedet_core::models::{ModelBundle, load_encoder};
//! use crimedet_core::{Analyzer, utils};
//! use std::path::{Path, PathBuf};
//!
//! let config = CoreConfigBuilder::new()
//!     .model_path(PathBuf::from("model.joblib"))
//!     .build();
//! let mut rng = utils::seeded_rng(config.seed);
//!
//! let encoder = load_encoder(&config, &mut rng).unwrap();
//! let bundle = ModelBundle::load(&config.model_path).unwrap();
//! let analyzer = Analyzer::new(encoder, FfmpegFrameSource::sidecar(), bundle, config).unwrap();
//!
//! if let Some(decision) = analyzer.analyze(Path::new("clip.mp4"), &mut |_, _| {}).unwrap() {
//!     println!("{}", decision.verdict);
//! }
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod models;
pub mod nn;
pub mod pipeline;
pub mod processing;
pub mod terminal_output;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, CoreConfigBuilder};
pub use error::{CoreError, CoreResult};
pub use models::{ModelBundle, R3dEncoder, load_encoder};
pub use pipeline::Analyzer;
pub use processing::{Decision, FusionPolicy, Verdict};
pub use utils::{format_bytes, format_duration, seeded_rng};
