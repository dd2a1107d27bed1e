//! Data processing between the decoder and the verdict.
//!
//! Frames are turned into clips and embeddings in [`clips`]; classifier
//! logits and reconstruction error are combined in [`fusion`].

/// Frame normalization, clip sampling and clip embedding
pub mod clips;

/// Ordered threshold policy over classifier confidence and anomaly score
pub mod fusion;

pub use clips::{
    assemble_clip, clip_count, clip_starts, normalize_frame, sample_clips, video_to_embeddings,
};
pub use fusion::{Decision, FusionPolicy, Verdict};
