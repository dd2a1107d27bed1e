//! Fully connected layer.

use crate::error::{CoreError, CoreResult, shape_mismatch};
use crate::nn::init;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Linear projection layer (fully connected / dense).
///
/// # Formula
///
/// ```text
/// y = x @ W^T + b
/// ```
///
/// where:
/// - `x`: Input [batch, in_features]
/// - `W`: Weight matrix [out_features, in_features]
/// - `b`: Bias vector [out_features]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LinearParams")]
pub struct Linear {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

/// Unchecked serialized form of [`Linear`].
#[derive(Deserialize)]
struct LinearParams {
    weight: Array2<f32>,
    bias: Array1<f32>,
}

impl TryFrom<LinearParams> for Linear {
    type Error = CoreError;

    fn try_from(params: LinearParams) -> CoreResult<Self> {
        Self::from_parts(params.weight, params.bias)
    }
}

impl Linear {
    /// Creates a randomly initialized layer.
    ///
    /// Weights and bias are drawn from `U(-1/sqrt(in), 1/sqrt(in))`.
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (in_features.max(1) as f32).sqrt();
        Self {
            weight: init::uniform((out_features, in_features), bound, rng),
            bias: init::uniform(out_features, bound, rng),
        }
    }

    /// Builds a layer from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::ShapeMismatch` if the bias length differs from the
    /// number of weight rows.
    pub fn from_parts(weight: Array2<f32>, bias: Array1<f32>) -> CoreResult<Self> {
        if bias.len() != weight.nrows() {
            return Err(shape_mismatch(
                "linear bias",
                [weight.nrows()],
                bias.shape(),
            ));
        }
        Ok(Self { weight, bias })
    }

    #[inline]
    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    #[inline]
    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    pub fn weight(&self) -> &Array2<f32> {
        &self.weight
    }

    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    /// Projects every row of `input` ([batch, in] → [batch, out]).
    pub fn forward(&self, input: ArrayView2<f32>) -> CoreResult<Array2<f32>> {
        if input.ncols() != self.in_features() {
            return Err(shape_mismatch(
                "linear input",
                [input.nrows(), self.in_features()],
                input.shape(),
            ));
        }
        let mut out = input.dot(&self.weight.t());
        out += &self.bias.view().insert_axis(Axis(0));
        Ok(out)
    }

    /// Projects a single vector ([in] → [out]).
    pub fn forward_one(&self, input: ArrayView1<f32>) -> CoreResult<Array1<f32>> {
        if input.len() != self.in_features() {
            return Err(shape_mismatch(
                "linear input",
                [self.in_features()],
                input.shape(),
            ));
        }
        Ok(self.weight.dot(&input) + &self.bias)
    }
}
