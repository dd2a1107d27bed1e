// ============================================================================
// crimedet-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// This module implements the builder pattern for the CoreConfig structure,
// providing a fluent API for creating and configuring CoreConfig instances.
//
// KEY COMPONENTS:
// - CoreConfigBuilder: Builder struct for creating CoreConfig instances
// - Default values for every parameter

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use crimedet_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .model_path(PathBuf::from("bundle.joblib"))
///     .weights_path(PathBuf::from("weights/r3d_18.npz"))
///     .use_pretrained(true)
///     .build();
/// assert_eq!(config.clip_len, 16);
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl Default for CoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        Self {
            config: CoreConfig::default(),
        }
    }

    /// Sets the model bundle location.
    pub fn model_path(mut self, model_path: PathBuf) -> Self {
        self.config.model_path = model_path;
        self
    }

    /// Sets the pretrained encoder weight archive location.
    pub fn weights_path(mut self, weights_path: PathBuf) -> Self {
        self.config.weights_path = weights_path;
        self
    }

    /// Sets whether pretrained encoder weights should be loaded.
    ///
    /// # Arguments
    ///
    /// * `enable` - When false, the encoder is always randomly initialized
    pub fn use_pretrained(mut self, enable: bool) -> Self {
        self.config.use_pretrained = enable;
        self
    }

    /// Sets the number of frames per clip.
    pub fn clip_len(mut self, clip_len: usize) -> Self {
        self.config.clip_len = clip_len;
        self
    }

    /// Sets the frame step between clip starts.
    pub fn stride(mut self, stride: usize) -> Self {
        self.config.stride = stride;
        self
    }

    /// Sets the side length frames are resized to.
    pub fn frame_size(mut self, frame_size: usize) -> Self {
        self.config.frame_size = frame_size;
        self
    }

    /// Sets the autoencoder hidden width.
    pub fn ae_hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.config.ae_hidden_dim = hidden_dim;
        self
    }

    /// Sets the random initialization seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Sets the random initialization seed from an optional value.
    pub fn maybe_seed(mut self, seed: Option<u64>) -> Self {
        self.config.seed = seed;
        self
    }

    /// Builds the CoreConfig instance.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = CoreConfigBuilder::new()
            .model_path(PathBuf::from("/tmp/bundle.joblib"))
            .weights_path(PathBuf::from("/tmp/w.npz"))
            .use_pretrained(false)
            .clip_len(8)
            .stride(4)
            .frame_size(32)
            .ae_hidden_dim(16)
            .seed(42)
            .build();

        assert_eq!(config.model_path, PathBuf::from("/tmp/bundle.joblib"));
        assert_eq!(config.weights_path, PathBuf::from("/tmp/w.npz"));
        assert!(!config.use_pretrained);
        assert_eq!(config.clip_len, 8);
        assert_eq!(config.stride, 4);
        assert_eq!(config.frame_size, 32);
        assert_eq!(config.ae_hidden_dim, 16);
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn test_maybe_seed_none_clears_seed() {
        let config = CoreConfigBuilder::new().seed(1).maybe_seed(None).build();
        assert!(config.seed.is_none());
    }
}
