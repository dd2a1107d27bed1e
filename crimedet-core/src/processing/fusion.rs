// ============================================================================
// crimedet-core/src/processing/fusion.rs
// ============================================================================
//
// FUSION DECISION: Classifier Confidence + Anomaly Score → Verdict
//
// The classifier's softmax confidences and the autoencoder's reconstruction
// error are combined by an ordered threshold policy:
//
//   1. crime confidence  > crime threshold   → crime
//   2. normal confidence > normal threshold  → no crime
//   3. anomaly score     > anomaly threshold → crime
//   4. otherwise                             → no crime
//
// Logit column 0 is "no crime", column 1 is "crime".

use crate::error::{CoreResult, shape_mismatch};
use crate::models::mean_squared_error;
use crate::nn::softmax;

use ndarray::ArrayView2;
use std::fmt;

/// Column of the "no crime" class in classifier logits.
pub const NORMAL_CLASS: usize = 0;
/// Column of the "crime" class in classifier logits.
pub const CRIME_CLASS: usize = 1;

/// Final label for a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Crime,
    NoCrime,
}

impl Verdict {
    pub fn is_crime(self) -> bool {
        matches!(self, Self::Crime)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crime => write!(f, "crime"),
            Self::NoCrime => write!(f, "no crime"),
        }
    }
}

/// Outcome of fusing classifier output with the anomaly score.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub verdict: Verdict,
    /// Confidence of the class backing the verdict
    pub confidence: f32,
    pub crime_confidence: f32,
    pub normal_confidence: f32,
    /// Mean squared reconstruction error of the embedding sequence
    pub anomaly_score: f32,
    /// Number of embedded clips the decision was made from
    pub clip_count: usize,
}

/// Fixed decision thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionPolicy {
    pub crime_confidence: f32,
    pub normal_confidence: f32,
    pub anomaly: f32,
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self {
            crime_confidence: 0.75,
            normal_confidence: 0.8,
            anomaly: 0.7,
        }
    }
}

impl FusionPolicy {
    /// Applies the ordered threshold rules, returning the verdict and its confidence.
    pub fn decide(&self, crime_confidence: f32, normal_confidence: f32, anomaly_score: f32) -> (Verdict, f32) {
        if crime_confidence > self.crime_confidence {
            (Verdict::Crime, crime_confidence)
        } else if normal_confidence > self.normal_confidence {
            (Verdict::NoCrime, normal_confidence)
        } else if anomaly_score > self.anomaly {
            (Verdict::Crime, crime_confidence)
        } else {
            (Verdict::NoCrime, normal_confidence)
        }
    }

    /// Fuses `[rows, 2]` classifier logits with the embedding sequence and its reconstruction.
    ///
    /// Each logit row is softmaxed; the class confidences are the maxima over
    /// rows. The anomaly score is the mean over clips of the per-clip mean
    /// squared reconstruction error.
    pub fn fuse(
        &self,
        logits: ArrayView2<f32>,
        embeddings: ArrayView2<f32>,
        reconstruction: ArrayView2<f32>,
    ) -> CoreResult<Decision> {
        if logits.nrows() == 0 || logits.ncols() != 2 {
            return Err(shape_mismatch("fusion logits", "[rows >= 1, 2]", logits.shape()));
        }

        let mut crime_confidence = f32::NEG_INFINITY;
        let mut normal_confidence = f32::NEG_INFINITY;
        for row in logits.outer_iter() {
            let probs = softmax(&row.to_vec());
            crime_confidence = crime_confidence.max(probs[CRIME_CLASS]);
            normal_confidence = normal_confidence.max(probs[NORMAL_CLASS]);
        }

        let anomaly_score = mean_squared_error(embeddings, reconstruction)?;
        log::debug!(
            "Fusion inputs: crime={:.4} normal={:.4} anomaly={:.4}",
            crime_confidence,
            normal_confidence,
            anomaly_score
        );

        let (verdict, confidence) = self.decide(crime_confidence, normal_confidence, anomaly_score);
        Ok(Decision {
            verdict,
            confidence,
            crime_confidence,
            normal_confidence,
            anomaly_score,
            clip_count: embeddings.nrows(),
        })
    }
}
