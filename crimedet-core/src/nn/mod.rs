//! Minimal neural-network building blocks on top of `ndarray`.
//!
//! Only inference is supported: every layer exposes a `forward` that takes
//! array views and returns owned arrays. Parameter layouts follow the PyTorch
//! conventions so that exported weights can be loaded without transposition:
//!
//! - [`Linear`]: weight `[out, in]`, bias `[out]`
//! - [`Lstm`]: `weight_ih [4H, in]`, `weight_hh [4H, H]`, gate order (i, f, g, o)
//! - [`Conv3d`]: weight `[out, in, kt, kh, kw]`, input `[C, T, H, W]`
//! - [`BatchNorm3d`]: per-channel affine + running statistics

pub mod conv;
pub mod init;
pub mod linear;
pub mod lstm;

pub use conv::{BatchNorm3d, Conv3d, global_avg_pool, relu_inplace};
pub use linear::Linear;
pub use lstm::{Lstm, LstmOutput};

/// Logistic sigmoid.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax over a slice of logits.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / sum).collect()
}
