// ============================================================================
// crimedet-core/src/pipeline.rs
// ============================================================================
//
// ANALYSIS PIPELINE: Video File → Decision
//
// Ties the stages together for a single video:
//
//   decode → normalize → clips → embed → reconstruct + classify → fuse
//
// The classifier logits are averaged over all clips before fusion, so the
// decision is made from one logit pair per video.
//
// KEY COMPONENTS:
// - Analyzer: Owns the encoder, frame source, model bundle and policy

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::external::FrameSource;
use crate::models::{ClipEncoder, ModelBundle};
use crate::processing::{Decision, FusionPolicy, video_to_embeddings};

use std::path::Path;

/// Runs the full analysis for video files.
pub struct Analyzer<E, F> {
    encoder: E,
    source: F,
    bundle: ModelBundle,
    policy: FusionPolicy,
    config: CoreConfig,
}

impl<E: ClipEncoder, F: FrameSource> Analyzer<E, F> {
    /// Creates an analyzer, checking the bundle against the encoder's embedding size.
    pub fn new(encoder: E, source: F, bundle: ModelBundle, config: CoreConfig) -> CoreResult<Self> {
        config.validate()?;
        bundle.check_dimensions(encoder.embedding_dim())?;
        Ok(Self {
            encoder,
            source,
            bundle,
            policy: FusionPolicy::default(),
            config,
        })
    }

    #[must_use]
    pub fn with_policy(mut self, policy: FusionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Analyzes the video at `path`.
    ///
    /// Returns `Ok(None)` when no clip could be sampled (missing file, a file
    /// ffmpeg cannot decode, or a video shorter than one clip). `on_clip(done, total)` reports embedding
    /// progress.
    pub fn analyze(
        &self,
        path: &Path,
        on_clip: &mut dyn FnMut(usize, usize),
    ) -> CoreResult<Option<Decision>> {
        let Some(embeddings) =
            video_to_embeddings(path, &self.source, &self.encoder, &self.config, on_clip)?
        else {
            log::info!("No clips found.");
            return Ok(None);
        };

        let reconstruction = self.bundle.lstmae.forward(embeddings.view())?;
        let logits = self
            .bundle
            .embedding_classifier
            .mean_logits(embeddings.view())?;
        let decision = self
            .policy
            .fuse(logits.view(), embeddings.view(), reconstruction.view())?;

        log::debug!(
            "{}: {} over {} clips (confidence {:.4}, anomaly {:.4})",
            path.display(),
            decision.verdict,
            decision.clip_count,
            decision.confidence,
            decision.anomaly_score
        );
        Ok(Some(decision))
    }
}
