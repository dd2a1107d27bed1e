//! Per-clip classifier: one linear projection from an embedding to class logits.

use crate::config::NUM_CLASSES;
use crate::error::{CoreError, CoreResult};
use crate::nn::Linear;

use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Embeddings handed to the classifier.
#[derive(Debug, Clone, Copy)]
pub enum ClassifierInput<'a> {
    /// One row per clip: `[clips, dim]`
    Clips(ArrayView2<'a, f32>),
    /// A batch of clip sequences: `[batch, clips, dim]`
    Sequences(ArrayView3<'a, f32>),
}

/// Raw logits, shaped like the input with the last axis replaced by the classes.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierLogits {
    Clips(Array2<f32>),
    Sequences(Array3<f32>),
}

impl ClassifierLogits {
    /// Returns the `[clips, classes]` logits, or `None` for batched output.
    pub fn into_clips(self) -> Option<Array2<f32>> {
        match self {
            Self::Clips(logits) => Some(logits),
            Self::Sequences(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingClassifier {
    fc: Linear,
}

impl EmbeddingClassifier {
    /// Randomly initialized classifier with [`NUM_CLASSES`] outputs.
    pub fn new<R: Rng + ?Sized>(input_dim: usize, rng: &mut R) -> Self {
        Self::with_classes(input_dim, NUM_CLASSES, rng)
    }

    pub fn with_classes<R: Rng + ?Sized>(input_dim: usize, num_classes: usize, rng: &mut R) -> Self {
        Self {
            fc: Linear::new(input_dim, num_classes, rng),
        }
    }

    pub fn from_linear(fc: Linear) -> Self {
        Self { fc }
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.fc.in_features()
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.fc.out_features()
    }

    /// Projects embeddings to logits.
    ///
    /// Batched sequences are flattened to `[batch·clips, dim]`, projected, and
    /// reshaped back to `[batch, clips, classes]`.
    pub fn forward(&self, input: ClassifierInput<'_>) -> CoreResult<ClassifierLogits> {
        match input {
            ClassifierInput::Clips(clips) => Ok(ClassifierLogits::Clips(self.fc.forward(clips)?)),
            ClassifierInput::Sequences(batch) => {
                let (b, s, d) = batch.dim();
                let flat = batch
                    .as_standard_layout()
                    .into_owned()
                    .into_shape((b * s, d))
                    .map_err(|e| CoreError::OperationFailed(format!("classifier flatten: {e}")))?;
                let logits = self.fc.forward(flat.view())?;
                let classes = logits.ncols();
                let reshaped = logits
                    .into_shape((b, s, classes))
                    .map_err(|e| CoreError::OperationFailed(format!("classifier reshape: {e}")))?;
                Ok(ClassifierLogits::Sequences(reshaped))
            }
        }
    }

    /// Logits for every clip averaged into a single `[1, classes]` row.
    pub fn mean_logits(&self, clips: ArrayView2<f32>) -> CoreResult<Array2<f32>> {
        let logits = self.fc.forward(clips)?;
        logits
            .mean_axis(Axis(0))
            .map(|mean| mean.insert_axis(Axis(0)))
            .ok_or_else(|| CoreError::OperationFailed("cannot average logits of zero clips".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, stack};

    fn classifier() -> EmbeddingClassifier {
        let fc = Linear::from_parts(arr2(&[[1.0, 0.0, 0.0], [0.0, 1.0, 1.0]]), arr1(&[0.0, 1.0])).unwrap();
        EmbeddingClassifier::from_linear(fc)
    }

    #[test]
    fn test_clip_matrix_is_projected_directly() {
        let clf = classifier();
        let x = arr2(&[[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]]);
        let logits = clf.forward(ClassifierInput::Clips(x.view())).unwrap();
        assert_eq!(logits, ClassifierLogits::Clips(arr2(&[[1.0, 6.0], [0.0, 1.0]])));
    }

    #[test]
    fn test_batched_sequences_match_per_sequence_projection() {
        let clf = classifier();
        let a = arr2(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let b = arr2(&[[-1.0, 0.5, 0.0], [2.0, 2.0, 2.0]]);
        let batch = stack(Axis(0), &[a.view(), b.view()]).unwrap();

        let ClassifierLogits::Sequences(batched) =
            clf.forward(ClassifierInput::Sequences(batch.view())).unwrap()
        else {
            panic!("expected batched logits");
        };
        assert_eq!(batched.dim(), (2, 2, 2));

        let first = clf.forward(ClassifierInput::Clips(a.view())).unwrap().into_clips().unwrap();
        let second = clf.forward(ClassifierInput::Clips(b.view())).unwrap().into_clips().unwrap();
        assert_eq!(batched.index_axis(Axis(0), 0), first);
        assert_eq!(batched.index_axis(Axis(0), 1), second);
    }

    #[test]
    fn test_mean_logits_averages_clips() {
        let clf = classifier();
        let x = arr2(&[[1.0, 2.0, 3.0], [3.0, 0.0, 1.0]]);
        let mean = clf.mean_logits(x.view()).unwrap();
        // Clip logits [1, 6] and [3, 2]
        assert_eq!(mean, arr2(&[[2.0, 4.0]]));
    }

    #[test]
    fn test_mean_logits_rejects_empty_input() {
        let clf = classifier();
        assert!(clf.mean_logits(Array2::zeros((0, 3)).view()).is_err());
    }

    #[test]
    fn test_default_class_count() {
        let mut rng = rand::thread_rng();
        let clf = EmbeddingClassifier::new(512, &mut rng);
        assert_eq!(clf.num_classes(), 2);
        assert_eq!(clf.input_dim(), 512);
    }
}
