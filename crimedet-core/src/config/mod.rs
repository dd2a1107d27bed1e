//! Configuration structures and constants for the crimedet-core library.
//!
//! This module provides the configuration for the inference pipeline: clip
//! geometry, model locations and encoder weight loading.

mod builder;

use crate::error::{CoreError, CoreResult};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use builder::CoreConfigBuilder;

// Default constants

/// Number of consecutive frames in one clip.
pub const DEFAULT_CLIP_LEN: usize = 16;

/// Frame step between the starts of two consecutive clips.
/// Smaller than the clip length, so clips overlap.
pub const DEFAULT_STRIDE: usize = 8;

/// Side length (pixels) frames are resized to before encoding.
pub const DEFAULT_FRAME_SIZE: usize = 112;

/// Width of the clip embeddings produced by the R3D-18 encoder.
pub const EMBEDDING_DIM: usize = 512;

/// Hidden state width of the sequence autoencoder.
pub const DEFAULT_AE_HIDDEN_DIM: usize = 128;

/// Number of classifier outputs: index 0 is "no crime", index 1 is "crime".
pub const NUM_CLASSES: usize = 2;

/// Default location of the persisted model bundle.
pub const DEFAULT_MODEL_FILE: &str = "model.joblib";

/// Default location of the pretrained encoder weight archive.
pub const DEFAULT_WEIGHTS_FILE: &str = "r3d_18.npz";

/// Per-channel (R, G, B) mean used to standardize frames (Kinetics-400 statistics).
pub const FRAME_MEAN: [f32; 3] = [0.43216, 0.394666, 0.37645];

/// Per-channel (R, G, B) standard deviation used to standardize frames.
pub const FRAME_STD: [f32; 3] = [0.22803, 0.22145, 0.216989];

/// Main configuration structure for the crimedet-core library.
///
/// Created by the consumer of the library (e.g., crimedet-cli) and passed to
/// the model constructors and the [`crate::pipeline::Analyzer`].
///
/// # Examples
///
/// ```rust
/// use crimedet_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .model_path(PathBuf::from("model.joblib"))
///     .use_pretrained(false)
///     .seed(7)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Location of the model bundle (classifier + autoencoder)
    pub model_path: PathBuf,

    /// Location of the pretrained encoder weight archive
    pub weights_path: PathBuf,

    /// Whether to try loading pretrained encoder weights
    pub use_pretrained: bool,

    /// Frames per clip
    pub clip_len: usize,

    /// Frames between clip starts
    pub stride: usize,

    /// Frame side length after resizing
    pub frame_size: usize,

    /// Hidden width of the sequence autoencoder
    pub ae_hidden_dim: usize,

    /// Seed for random weight initialization (entropy-seeded when absent)
    pub seed: Option<u64>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_FILE),
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_FILE),
            use_pretrained: true,
            clip_len: DEFAULT_CLIP_LEN,
            stride: DEFAULT_STRIDE,
            frame_size: DEFAULT_FRAME_SIZE,
            ae_hidden_dim: DEFAULT_AE_HIDDEN_DIM,
            seed: None,
        }
    }
}

impl CoreConfig {
    /// Checks the configuration for values the pipeline cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.clip_len == 0 {
            return Err(CoreError::Config("clip length must be at least 1".to_string()));
        }
        if self.stride == 0 {
            return Err(CoreError::Config("stride must be at least 1".to_string()));
        }
        if self.frame_size == 0 {
            return Err(CoreError::Config("frame size must be at least 1".to_string()));
        }
        if self.ae_hidden_dim == 0 {
            return Err(CoreError::Config(
                "autoencoder hidden size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = CoreConfig::default();
        assert_eq!(config.clip_len, 16);
        assert_eq!(config.stride, 8);
        assert_eq!(config.frame_size, 112);
        assert_eq!(config.ae_hidden_dim, 128);
        assert_eq!(config.model_path, PathBuf::from("model.joblib"));
        assert!(config.use_pretrained);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_geometry() {
        let config = CoreConfig {
            stride: 0,
            ..CoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let config = CoreConfig {
            clip_len: 0,
            ..CoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let config = CoreConfig {
            frame_size: 0,
            ..CoreConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }
}
