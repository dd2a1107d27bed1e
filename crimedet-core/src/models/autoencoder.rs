//! Recurrent sequence autoencoder used for anomaly scoring.
//!
//! An LSTM encoder compresses the whole embedding sequence into its final
//! hidden state; that state is repeated once per time step and decoded by a
//! second LSTM back into a sequence of the original width and length.
//! Sequences that the model reconstructs poorly are treated as anomalous.

use crate::error::{CoreResult, shape_mismatch};
use crate::nn::Lstm;

use ndarray::{Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceAutoencoder {
    encoder: Lstm,
    decoder: Lstm,
}

impl SequenceAutoencoder {
    /// Randomly initialized autoencoder for `input_dim`-wide sequences.
    pub fn new<R: Rng + ?Sized>(input_dim: usize, hidden_dim: usize, rng: &mut R) -> Self {
        Self {
            encoder: Lstm::new(input_dim, hidden_dim, rng),
            decoder: Lstm::new(hidden_dim, input_dim, rng),
        }
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.encoder.input_size()
    }

    #[inline]
    pub fn hidden_dim(&self) -> usize {
        self.encoder.hidden_size()
    }

    /// Checks that the decoder mirrors the encoder (`hidden → input`).
    pub fn check_shape(&self) -> CoreResult<()> {
        let expected = [self.hidden_dim(), self.input_dim()];
        let actual = [self.decoder.input_size(), self.decoder.hidden_size()];
        if actual != expected {
            return Err(shape_mismatch("autoencoder decoder", expected, actual));
        }
        Ok(())
    }

    /// Reconstructs a `[seq_len, input_dim]` sequence.
    pub fn forward(&self, sequence: ArrayView2<f32>) -> CoreResult<Array2<f32>> {
        let encoded = self.encoder.forward(sequence)?;
        let latent = encoded.hidden.insert_axis(Axis(0));
        let repeated = latent
            .broadcast((sequence.nrows(), self.hidden_dim()))
            .ok_or_else(|| shape_mismatch("autoencoder latent", [1, self.hidden_dim()], latent.shape()))?
            .to_owned();
        Ok(self.decoder.forward(repeated.view())?.outputs)
    }

    /// Mean squared reconstruction error of `sequence`.
    pub fn reconstruction_error(&self, sequence: ArrayView2<f32>) -> CoreResult<f32> {
        let reconstruction = self.forward(sequence)?;
        mean_squared_error(sequence, reconstruction.view())
    }
}

/// Mean of the squared element-wise differences of two equally shaped matrices.
///
/// Each row's mean squared error is computed first and the row errors are then
/// averaged, which equals the overall element mean for rectangular inputs.
pub fn mean_squared_error(x: ArrayView2<f32>, x_hat: ArrayView2<f32>) -> CoreResult<f32> {
    if x.dim() != x_hat.dim() {
        return Err(shape_mismatch("reconstruction", x.shape(), x_hat.shape()));
    }
    if x.is_empty() {
        return Err(shape_mismatch("reconstruction", "non-empty sequence", x.shape()));
    }
    let diff = &x - &x_hat;
    let per_row = (&diff * &diff).mean_axis(Axis(1));
    Ok(per_row.and_then(|rows| rows.mean()).unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::init;
    use ndarray::arr2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_reconstruction_has_input_shape() {
        let mut rng = StdRng::seed_from_u64(13);
        let ae = SequenceAutoencoder::new(12, 4, &mut rng);
        let seq = init::uniform((7, 12), 1.0, &mut rng);
        let out = ae.forward(seq.view()).unwrap();
        assert_eq!(out.dim(), (7, 12));
        assert_eq!(ae.input_dim(), 12);
        assert_eq!(ae.hidden_dim(), 4);
    }

    #[test]
    fn test_single_step_sequence() {
        let mut rng = StdRng::seed_from_u64(14);
        let ae = SequenceAutoencoder::new(5, 3, &mut rng);
        let seq = init::uniform((1, 5), 1.0, &mut rng);
        assert_eq!(ae.forward(seq.view()).unwrap().dim(), (1, 5));
    }

    #[test]
    fn test_rejects_wrong_width() {
        let mut rng = StdRng::seed_from_u64(15);
        let ae = SequenceAutoencoder::new(5, 3, &mut rng);
        assert!(ae.forward(Array2::zeros((3, 4)).view()).is_err());
    }

    #[test]
    fn test_mean_squared_error_values() {
        let x = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
        let y = arr2(&[[1.0, 0.0], [3.0, 6.0]]);
        // Row errors: (0 + 4) / 2 = 2 and (0 + 4) / 2 = 2
        assert_eq!(mean_squared_error(x.view(), y.view()).unwrap(), 2.0);
        assert_eq!(mean_squared_error(x.view(), x.view()).unwrap(), 0.0);
    }

    #[test]
    fn test_mean_squared_error_shape_checks() {
        let x = Array2::<f32>::zeros((2, 3));
        assert!(mean_squared_error(x.view(), Array2::zeros((3, 3)).view()).is_err());
        assert!(mean_squared_error(Array2::zeros((0, 3)).view(), Array2::zeros((0, 3)).view()).is_err());
    }

    #[test]
    fn test_reconstruction_error_matches_manual_mse() {
        let mut rng = StdRng::seed_from_u64(16);
        let ae = SequenceAutoencoder::new(6, 2, &mut rng);
        let seq = init::uniform((4, 6), 1.0, &mut rng);
        let manual = mean_squared_error(seq.view(), ae.forward(seq.view()).unwrap().view()).unwrap();
        assert_eq!(ae.reconstruction_error(seq.view()).unwrap(), manual);
    }

    #[test]
    fn test_check_shape_rejects_mismatched_decoder() {
        let mut rng = StdRng::seed_from_u64(17);
        let ae = SequenceAutoencoder::new(12, 4, &mut rng);
        assert!(ae.check_shape().is_ok());

        let lopsided = SequenceAutoencoder {
            encoder: Lstm::new(12, 4, &mut rng),
            decoder: Lstm::new(3, 12, &mut rng),
        };
        assert!(lopsided.check_shape().is_err());
    }
}
