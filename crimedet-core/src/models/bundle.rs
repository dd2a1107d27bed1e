// ============================================================================
// crimedet-core/src/models/bundle.rs
// ============================================================================
//
// MODEL BUNDLE: Persisted Classifier + Autoencoder Pair
//
// The classifier and the sequence autoencoder are always saved and loaded
// together. The on-disk form is a JSON object with the two models under the
// keys `embedding_classifier` and `lstmae`.
//
// KEY COMPONENTS:
// - ModelBundle: The pair itself
// - initialize: Freshly initialized models (the placeholder "training")
// - save / load: Atomic JSON persistence with dimension validation

use crate::config::{CoreConfig, EMBEDDING_DIM, NUM_CLASSES};
use crate::error::{CoreError, CoreResult, shape_mismatch};
use crate::models::{EmbeddingClassifier, SequenceAutoencoder};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub embedding_classifier: EmbeddingClassifier,
    pub lstmae: SequenceAutoencoder,
}

impl ModelBundle {
    /// Randomly initialized models sized for [`EMBEDDING_DIM`] embeddings.
    pub fn initialize<R: Rng + ?Sized>(config: &CoreConfig, rng: &mut R) -> Self {
        Self {
            embedding_classifier: EmbeddingClassifier::new(EMBEDDING_DIM, rng),
            lstmae: SequenceAutoencoder::new(EMBEDDING_DIM, config.ae_hidden_dim, rng),
        }
    }

    /// Writes the bundle to `path`, replacing any existing file atomically.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.persist(path).map_err(|e| CoreError::Io(e.error))?;
        log::debug!("Model bundle written to {}", path.display());
        Ok(())
    }

    /// Reads a bundle previously written by [`ModelBundle::save`].
    pub fn load(path: &Path) -> CoreResult<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CoreError::ModelNotFound(path.to_path_buf()),
            _ => CoreError::Io(e),
        })?;
        let bundle: Self = serde_json::from_reader(BufReader::new(file))?;
        bundle.check_dimensions(EMBEDDING_DIM)?;
        log::debug!("Model bundle loaded from {}", path.display());
        Ok(bundle)
    }

    /// Verifies both models agree with each other and with `embedding_dim`.
    ///
    /// Per-layer parameter shapes are already enforced while deserializing.
    pub fn check_dimensions(&self, embedding_dim: usize) -> CoreResult<()> {
        if self.embedding_classifier.input_dim() != embedding_dim {
            return Err(shape_mismatch(
                "classifier input",
                embedding_dim,
                self.embedding_classifier.input_dim(),
            ));
        }
        if self.embedding_classifier.num_classes() != NUM_CLASSES {
            return Err(shape_mismatch(
                "classifier classes",
                NUM_CLASSES,
                self.embedding_classifier.num_classes(),
            ));
        }
        if self.lstmae.input_dim() != embedding_dim {
            return Err(shape_mismatch(
                "autoencoder input",
                embedding_dim,
                self.lstmae.input_dim(),
            ));
        }
        self.lstmae.check_shape()
    }
}
