//! 3D convolution, batch normalization and pooling over `[C, T, H, W]` volumes.

use crate::error::{CoreError, CoreResult, shape_mismatch};

use ndarray::{Array1, Array2, Array4, Array5, ArrayView4, Axis, s};
use rayon::prelude::*;

/// Bias-free 3D convolution.
///
/// The kernel is applied as a matrix product: for every output frame the
/// receptive fields are unfolded into a `[C_in·kt·kh·kw, H_out·W_out]`
/// matrix and multiplied by the flattened weights. Output frames are
/// independent and are computed in parallel.
#[derive(Debug, Clone, PartialEq)]
pub struct Conv3d {
    weight: Array5<f32>,
    stride: [usize; 3],
    padding: [usize; 3],
}

impl Conv3d {
    /// Creates a convolution from a `[out, in, kt, kh, kw]` weight tensor.
    pub fn new(weight: Array5<f32>, stride: [usize; 3], padding: [usize; 3]) -> CoreResult<Self> {
        if stride.contains(&0) {
            return Err(CoreError::Config(format!(
                "convolution stride must be positive, got {stride:?}"
            )));
        }
        Ok(Self {
            weight: weight.as_standard_layout().into_owned(),
            stride,
            padding,
        })
    }

    #[inline]
    pub fn in_channels(&self) -> usize {
        self.weight.shape()[1]
    }

    #[inline]
    pub fn out_channels(&self) -> usize {
        self.weight.shape()[0]
    }

    /// Kernel extent as (kt, kh, kw).
    pub fn kernel(&self) -> [usize; 3] {
        let shape = self.weight.shape();
        [shape[2], shape[3], shape[4]]
    }

    /// Output extent along one axis, or `None` if the kernel does not fit.
    fn out_extent(input: usize, kernel: usize, stride: usize, padding: usize) -> Option<usize> {
        let padded = input + 2 * padding;
        if padded < kernel {
            None
        } else {
            Some((padded - kernel) / stride + 1)
        }
    }

    /// Convolves a `[C_in, T, H, W]` volume into `[C_out, T', H', W']`.
    pub fn forward(&self, input: ArrayView4<f32>) -> CoreResult<Array4<f32>> {
        let (c_in, t_in, h_in, w_in) = input.dim();
        if c_in != self.in_channels() {
            return Err(shape_mismatch(
                "conv3d input channels",
                self.in_channels(),
                c_in,
            ));
        }

        let [kt, kh, kw] = self.kernel();
        let [st, sh, sw] = self.stride;
        let [pt, ph, pw] = self.padding;
        let extents = (
            Self::out_extent(t_in, kt, st, pt),
            Self::out_extent(h_in, kh, sh, ph),
            Self::out_extent(w_in, kw, sw, pw),
        );
        let (Some(t_out), Some(h_out), Some(w_out)) = extents else {
            return Err(shape_mismatch(
                "conv3d input extent",
                format!("at least kernel {:?}", self.kernel()),
                input.shape(),
            ));
        };

        let c_out = self.out_channels();
        let k = c_in * kt * kh * kw;
        let weight = self
            .weight
            .view()
            .into_shape((c_out, k))
            .map_err(|e| CoreError::OperationFailed(format!("conv3d weight reshape: {e}")))?;

        let slices: Vec<Array2<f32>> = (0..t_out)
            .into_par_iter()
            .map(|ot| {
                let mut cols = Array2::<f32>::zeros((k, h_out * w_out));
                for c in 0..c_in {
                    for dt in 0..kt {
                        let Some(it) = (ot * st + dt).checked_sub(pt).filter(|&v| v < t_in) else {
                            continue;
                        };
                        for dy in 0..kh {
                            for dx in 0..kw {
                                let row = ((c * kt + dt) * kh + dy) * kw + dx;
                                let mut col_row = cols.row_mut(row);
                                for oy in 0..h_out {
                                    let Some(iy) = (oy * sh + dy).checked_sub(ph).filter(|&v| v < h_in)
                                    else {
                                        continue;
                                    };
                                    for ox in 0..w_out {
                                        if let Some(ix) =
                                            (ox * sw + dx).checked_sub(pw).filter(|&v| v < w_in)
                                        {
                                            col_row[oy * w_out + ox] = input[[c, it, iy, ix]];
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
                weight.dot(&cols)
            })
            .collect();

        let mut output = Array4::<f32>::zeros((c_out, t_out, h_out, w_out));
        for (ot, slice) in slices.into_iter().enumerate() {
            let slice = slice
                .into_shape((c_out, h_out, w_out))
                .map_err(|e| CoreError::OperationFailed(format!("conv3d output reshape: {e}")))?;
            output.slice_mut(s![.., ot, .., ..]).assign(&slice);
        }
        Ok(output)
    }
}

/// Inference-mode 3D batch normalization.
///
/// `y = (x - running_mean) / sqrt(running_var + eps) * weight + bias`,
/// folded into a per-channel scale and shift.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchNorm3d {
    scale: Array1<f32>,
    shift: Array1<f32>,
}

impl BatchNorm3d {
    pub const EPS: f32 = 1e-5;

    pub fn new(
        weight: Array1<f32>,
        bias: Array1<f32>,
        running_mean: Array1<f32>,
        running_var: Array1<f32>,
    ) -> CoreResult<Self> {
        let channels = weight.len();
        let lengths = [bias.len(), running_mean.len(), running_var.len()];
        if lengths.iter().any(|&len| len != channels) {
            return Err(shape_mismatch(
                "batchnorm parameters",
                [channels; 3],
                lengths,
            ));
        }
        let scale = &weight / &running_var.mapv(|v| (v + Self::EPS).sqrt());
        let shift = &bias - &(&running_mean * &scale);
        Ok(Self { scale, shift })
    }

    /// Freshly initialized statistics: unit weight, zero bias, zero mean, unit variance.
    pub fn identity(channels: usize) -> Self {
        let scale = Array1::from_elem(channels, 1.0 / (1.0 + Self::EPS).sqrt());
        Self {
            scale,
            shift: Array1::zeros(channels),
        }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.scale.len()
    }

    /// Normalizes a `[C, T, H, W]` volume in place.
    pub fn forward_inplace(&self, x: &mut Array4<f32>) -> CoreResult<()> {
        if x.shape()[0] != self.channels() {
            return Err(shape_mismatch(
                "batchnorm input channels",
                self.channels(),
                x.shape()[0],
            ));
        }
        for (c, mut channel) in x.axis_iter_mut(Axis(0)).enumerate() {
            let (scale, shift) = (self.scale[c], self.shift[c]);
            channel.mapv_inplace(|v| v * scale + shift);
        }
        Ok(())
    }
}

/// Rectified linear unit, in place.
pub fn relu_inplace(x: &mut Array4<f32>) {
    x.mapv_inplace(|v| v.max(0.0));
}

/// Averages every channel of a `[C, T, H, W]` volume over (T, H, W).
pub fn global_avg_pool(x: ArrayView4<f32>) -> Array1<f32> {
    x.outer_iter()
        .map(|channel| channel.mean().unwrap_or(0.0))
        .collect()
}
