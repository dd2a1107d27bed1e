//! The three learned components of the pipeline and their persistence.
//!
//! - [`encoder`]: R3D-18 clip encoder producing one embedding per clip
//! - [`autoencoder`]: LSTM sequence autoencoder whose reconstruction error is the anomaly signal
//! - [`classifier`]: linear per-clip classifier producing crime / no-crime logits
//! - [`bundle`]: the classifier + autoencoder pair as saved on disk

pub mod autoencoder;
pub mod bundle;
pub mod classifier;
pub mod encoder;

pub use autoencoder::{SequenceAutoencoder, mean_squared_error};
pub use bundle::ModelBundle;
pub use classifier::{ClassifierInput, ClassifierLogits, EmbeddingClassifier};
pub use encoder::{ClipEncoder, NpzWeights, R3D18_WIDTHS, R3dEncoder, load_encoder};
