//! Weight initializers matching the PyTorch defaults.

use ndarray::{Array, Dimension, ShapeBuilder};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

/// Samples every element from `U(-bound, bound)`.
///
/// This is what PyTorch's `Linear` and `LSTM` default initialization reduces
/// to, with `bound = 1 / sqrt(fan_in)` and `bound = 1 / sqrt(hidden_size)`.
pub fn uniform<Sh, D, R>(shape: Sh, bound: f32, rng: &mut R) -> Array<f32, D>
where
    Sh: ShapeBuilder<Dim = D>,
    D: Dimension,
    R: Rng + ?Sized,
{
    let dist = Uniform::new_inclusive(-bound, bound);
    Array::from_shape_fn(shape, |_| dist.sample(rng))
}

/// Kaiming-normal initialization in `fan_out` mode for ReLU networks:
/// `N(0, sqrt(2 / fan_out))`.
pub fn kaiming_normal_fan_out<Sh, D, R>(shape: Sh, fan_out: usize, rng: &mut R) -> Array<f32, D>
where
    Sh: ShapeBuilder<Dim = D>,
    D: Dimension,
    R: Rng + ?Sized,
{
    let std = (2.0 / fan_out.max(1) as f32).sqrt();
    Array::from_shape_fn(shape, |_| {
        let z: f32 = StandardNormal.sample(rng);
        z * std
    })
}
