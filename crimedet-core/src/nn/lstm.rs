//! Single-layer, unidirectional LSTM.

use crate::error::{CoreError, CoreResult, shape_mismatch};
use crate::nn::{init, sigmoid};

use ndarray::{Array1, Array2, ArrayView2, Axis, s};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Long short-term memory layer over a `[seq_len, input_size]` sequence.
///
/// Gates are stacked in (input, forget, cell, output) order:
///
/// ```text
/// i = σ(W_ii x + b_ii + W_hi h + b_hi)
/// f = σ(W_if x + b_if + W_hf h + b_hf)
/// g = tanh(W_ig x + b_ig + W_hg h + b_hg)
/// o = σ(W_io x + b_io + W_ho h + b_ho)
/// c' = f * c + i * g
/// h' = o * tanh(c')
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LstmParams")]
pub struct Lstm {
    weight_ih: Array2<f32>,
    weight_hh: Array2<f32>,
    bias_ih: Array1<f32>,
    bias_hh: Array1<f32>,
}

#[derive(Deserialize)]
struct LstmParams {
    weight_ih: Array2<f32>,
    weight_hh: Array2<f32>,
    bias_ih: Array1<f32>,
    bias_hh: Array1<f32>,
}

impl TryFrom<LstmParams> for Lstm {
    type Error = CoreError;

    fn try_from(params: LstmParams) -> CoreResult<Self> {
        Self::from_parts(params.weight_ih, params.weight_hh, params.bias_ih, params.bias_hh)
    }
}

/// Result of running an [`Lstm`] over a sequence.
#[derive(Debug, Clone)]
pub struct LstmOutput {
    /// Hidden state at every step, `[seq_len, hidden_size]`
    pub outputs: Array2<f32>,
    /// Final hidden state
    pub hidden: Array1<f32>,
    /// Final cell state
    pub cell: Array1<f32>,
}

impl Lstm {
    /// Creates a randomly initialized layer, all parameters in `U(-1/sqrt(H), 1/sqrt(H))`.
    pub fn new<R: Rng + ?Sized>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (hidden_size.max(1) as f32).sqrt();
        let gates = 4 * hidden_size;
        Self {
            weight_ih: init::uniform((gates, input_size), bound, rng),
            weight_hh: init::uniform((gates, hidden_size), bound, rng),
            bias_ih: init::uniform(gates, bound, rng),
            bias_hh: init::uniform(gates, bound, rng),
        }
    }

    /// Builds a layer from explicit parameters.
    pub fn from_parts(
        weight_ih: Array2<f32>,
        weight_hh: Array2<f32>,
        bias_ih: Array1<f32>,
        bias_hh: Array1<f32>,
    ) -> CoreResult<Self> {
        let gates = weight_ih.nrows();
        if gates == 0 || gates % 4 != 0 {
            return Err(shape_mismatch("lstm weight_ih rows", "multiple of 4", gates));
        }
        let hidden = gates / 4;
        if weight_hh.shape() != [gates, hidden] {
            return Err(shape_mismatch("lstm weight_hh", [gates, hidden], weight_hh.shape()));
        }
        if bias_ih.len() != gates || bias_hh.len() != gates {
            return Err(shape_mismatch(
                "lstm biases",
                [gates, gates],
                [bias_ih.len(), bias_hh.len()],
            ));
        }
        Ok(Self {
            weight_ih,
            weight_hh,
            bias_ih,
            bias_hh,
        })
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.weight_ih.ncols()
    }

    #[inline]
    pub fn hidden_size(&self) -> usize {
        self.weight_hh.ncols()
    }

    /// Runs the layer over `input` starting from zero hidden and cell states.
    pub fn forward(&self, input: ArrayView2<f32>) -> CoreResult<LstmOutput> {
        if input.ncols() != self.input_size() {
            return Err(shape_mismatch(
                "lstm input",
                [input.nrows(), self.input_size()],
                input.shape(),
            ));
        }

        let hidden_size = self.hidden_size();
        // Input contribution for every step at once: [seq_len, 4H]
        let mut projected = input.dot(&self.weight_ih.t());
        projected += &(&self.bias_ih + &self.bias_hh).insert_axis(Axis(0));

        let mut h = Array1::<f32>::zeros(hidden_size);
        let mut c = Array1::<f32>::zeros(hidden_size);
        let mut outputs = Array2::<f32>::zeros((input.nrows(), hidden_size));

        for (step, pre) in projected.outer_iter().enumerate() {
            let gates = &pre + &self.weight_hh.dot(&h);
            let i = gates.slice(s![0..hidden_size]).mapv(sigmoid);
            let f = gates.slice(s![hidden_size..2 * hidden_size]).mapv(sigmoid);
            let g = gates.slice(s![2 * hidden_size..3 * hidden_size]).mapv(f32::tanh);
            let o = gates.slice(s![3 * hidden_size..]).mapv(sigmoid);

            c = &f * &c + &i * &g;
            h = &o * &c.mapv(f32::tanh);
            outputs.row_mut(step).assign(&h);
        }

        Ok(LstmOutput {
            outputs,
            hidden: h,
            cell: c,
        })
    }
}
