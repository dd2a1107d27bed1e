// ============================================================================
// crimedet-core/src/models/encoder.rs
// ============================================================================
//
// CLIP ENCODER: R3D-18 Spatio-Temporal Feature Extractor
//
// This module implements the 18-layer 3D ResNet used to turn a clip of
// frames into a fixed-size embedding. The classification head is omitted:
// the output of the last residual stage is reduced by global average pooling.
//
// KEY COMPONENTS:
// - ClipEncoder: Trait for anything that embeds a clip
// - R3dEncoder: The network (stem + 4 stages of 2 BasicBlocks)
// - ParamSource: Where weights come from (random init or a .npz archive)
// - load_encoder: Pretrained loading with random-init fallback
//
// ARCHITECTURE:
//   stem    Conv3d(3→w0, k=3x7x7, s=1x2x2, p=1x3x3) + BN + ReLU
//   layer1  2 x BasicBlock(w0),            stride 1
//   layer2  2 x BasicBlock(w1), first has stride 2 and a 1x1x1 downsample
//   layer3  2 x BasicBlock(w2), same
//   layer4  2 x BasicBlock(w3), same
//   pool    mean over (T, H, W)

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::nn::{BatchNorm3d, Conv3d, global_avg_pool, init, relu_inplace};

use ndarray::{Array1, Array4, Array5, ArrayD, ArrayView4, Ix1, Ix5};
use ndarray_npy::NpzReader;
use rand::Rng;
use std::fs::File;
use std::path::Path;

/// Stage widths of the standard R3D-18 network; the last one is the embedding size.
pub const R3D18_WIDTHS: [usize; 4] = [64, 128, 256, 512];

/// Anything that turns a `[3, T, H, W]` clip into an embedding vector.
pub trait ClipEncoder {
    /// Length of the vectors returned by [`ClipEncoder::embed`].
    fn embedding_dim(&self) -> usize;

    fn embed(&self, clip: ArrayView4<f32>) -> CoreResult<Array1<f32>>;
}

// ============================================================================
// PARAMETER SOURCES
// ============================================================================

/// Supplies convolution and batch-norm parameters by state-dict name.
pub trait ParamSource {
    fn conv_weight(&mut self, name: &str, shape: [usize; 5]) -> CoreResult<Array5<f32>>;

    fn batch_norm(&mut self, prefix: &str, channels: usize) -> CoreResult<BatchNorm3d>;
}

/// Fresh weights: Kaiming-normal (fan_out) convolutions, identity batch norms.
pub struct RandomInit<'a, R: Rng + ?Sized> {
    rng: &'a mut R,
}

impl<'a, R: Rng + ?Sized> RandomInit<'a, R> {
    pub fn new(rng: &'a mut R) -> Self {
        Self { rng }
    }
}

impl<R: Rng + ?Sized> ParamSource for RandomInit<'_, R> {
    fn conv_weight(&mut self, _name: &str, shape: [usize; 5]) -> CoreResult<Array5<f32>> {
        let fan_out = shape[0] * shape[2] * shape[3] * shape[4];
        Ok(init::kaiming_normal_fan_out(shape, fan_out, &mut *self.rng))
    }

    fn batch_norm(&mut self, _prefix: &str, channels: usize) -> CoreResult<BatchNorm3d> {
        Ok(BatchNorm3d::identity(channels))
    }
}

/// Weights read from a NumPy `.npz` archive keyed by torchvision state-dict names.
pub struct NpzWeights {
    reader: NpzReader<File>,
}

impl NpzWeights {
    pub fn open(path: &Path) -> CoreResult<Self> {
        let file = File::open(path).map_err(|e| {
            CoreError::Weights(format!("cannot open '{}': {}", path.display(), e))
        })?;
        let reader = NpzReader::new(file).map_err(|e| {
            CoreError::Weights(format!("'{}' is not a valid .npz archive: {}", path.display(), e))
        })?;
        Ok(Self { reader })
    }

    fn tensor(&mut self, name: &str) -> CoreResult<ArrayD<f32>> {
        // numpy.savez stores entries as "<name>.npy"
        let entry = format!("{name}.npy");
        match self.reader.by_name(&entry) {
            Ok(array) => Ok(array),
            Err(_) => self
                .reader
                .by_name(name)
                .map_err(|e| CoreError::Weights(format!("missing tensor '{name}': {e}"))),
        }
    }

    fn vector(&mut self, name: &str, len: usize) -> CoreResult<Array1<f32>> {
        let array = self.tensor(name)?;
        if array.shape() != [len] {
            return Err(CoreError::Weights(format!(
                "tensor '{name}' has shape {:?}, expected [{len}]",
                array.shape()
            )));
        }
        array
            .into_dimensionality::<Ix1>()
            .map_err(|e| CoreError::Weights(format!("tensor '{name}': {e}")))
    }
}

impl ParamSource for NpzWeights {
    fn conv_weight(&mut self, name: &str, shape: [usize; 5]) -> CoreResult<Array5<f32>> {
        let array = self.tensor(name)?;
        if array.shape() != shape {
            return Err(CoreError::Weights(format!(
                "tensor '{name}' has shape {:?}, expected {:?}",
                array.shape(),
                shape
            )));
        }
        array
            .into_dimensionality::<Ix5>()
            .map_err(|e| CoreError::Weights(format!("tensor '{name}': {e}")))
    }

    fn batch_norm(&mut self, prefix: &str, channels: usize) -> CoreResult<BatchNorm3d> {
        BatchNorm3d::new(
            self.vector(&format!("{prefix}.weight"), channels)?,
            self.vector(&format!("{prefix}.bias"), channels)?,
            self.vector(&format!("{prefix}.running_mean"), channels)?,
            self.vector(&format!("{prefix}.running_var"), channels)?,
        )
    }
}

// ============================================================================
// NETWORK
// ============================================================================

/// Convolution followed by batch normalization.
#[derive(Debug, Clone)]
struct ConvBn {
    conv: Conv3d,
    bn: BatchNorm3d,
}

impl ConvBn {
    fn load<P: ParamSource + ?Sized>(
        params: &mut P,
        conv_name: &str,
        bn_prefix: &str,
        shape: [usize; 5],
        stride: [usize; 3],
        padding: [usize; 3],
    ) -> CoreResult<Self> {
        let conv = Conv3d::new(params.conv_weight(conv_name, shape)?, stride, padding)?;
        let bn = params.batch_norm(bn_prefix, shape[0])?;
        Ok(Self { conv, bn })
    }

    fn forward(&self, x: ArrayView4<f32>) -> CoreResult<Array4<f32>> {
        let mut y = self.conv.forward(x)?;
        self.bn.forward_inplace(&mut y)?;
        Ok(y)
    }
}

/// Two 3x3x3 convolutions with an identity (or 1x1x1 projected) shortcut.
#[derive(Debug, Clone)]
struct BasicBlock {
    conv1: ConvBn,
    conv2: ConvBn,
    downsample: Option<ConvBn>,
}

impl BasicBlock {
    fn load<P: ParamSource + ?Sized>(
        params: &mut P,
        prefix: &str,
        in_planes: usize,
        planes: usize,
        stride: usize,
    ) -> CoreResult<Self> {
        let conv1 = ConvBn::load(
            params,
            &format!("{prefix}.conv1.0.weight"),
            &format!("{prefix}.conv1.1"),
            [planes, in_planes, 3, 3, 3],
            [stride; 3],
            [1; 3],
        )?;
        let conv2 = ConvBn::load(
            params,
            &format!("{prefix}.conv2.0.weight"),
            &format!("{prefix}.conv2.1"),
            [planes, planes, 3, 3, 3],
            [1; 3],
            [1; 3],
        )?;
        let downsample = if stride != 1 || in_planes != planes {
            Some(ConvBn::load(
                params,
                &format!("{prefix}.downsample.0.weight"),
                &format!("{prefix}.downsample.1"),
                [planes, in_planes, 1, 1, 1],
                [stride; 3],
                [0; 3],
            )?)
        } else {
            None
        };
        Ok(Self {
            conv1,
            conv2,
            downsample,
        })
    }

    fn forward(&self, x: ArrayView4<f32>) -> CoreResult<Array4<f32>> {
        let mut out = self.conv1.forward(x)?;
        relu_inplace(&mut out);
        let mut out = self.conv2.forward(out.view())?;
        match &self.downsample {
            Some(down) => out += &down.forward(x)?,
            None => out += &x,
        }
        relu_inplace(&mut out);
        Ok(out)
    }
}

/// R3D-18 video encoder without its classification head.
#[derive(Debug, Clone)]
pub struct R3dEncoder {
    stem: ConvBn,
    layers: Vec<Vec<BasicBlock>>,
    widths: [usize; 4],
}

impl R3dEncoder {
    /// Builds the network, pulling every parameter from `params`.
    pub fn build<P: ParamSource + ?Sized>(params: &mut P, widths: [usize; 4]) -> CoreResult<Self> {
        let stem = ConvBn::load(
            params,
            "stem.0.weight",
            "stem.1",
            [widths[0], 3, 3, 7, 7],
            [1, 2, 2],
            [1, 3, 3],
        )?;

        let mut layers = Vec::with_capacity(widths.len());
        let mut in_planes = widths[0];
        for (index, &planes) in widths.iter().enumerate() {
            let stride = if index == 0 { 1 } else { 2 };
            let first = BasicBlock::load(
                params,
                &format!("layer{}.0", index + 1),
                in_planes,
                planes,
                stride,
            )?;
            let second = BasicBlock::load(params, &format!("layer{}.1", index + 1), planes, planes, 1)?;
            layers.push(vec![first, second]);
            in_planes = planes;
        }

        Ok(Self {
            stem,
            layers,
            widths,
        })
    }

    /// Randomly initialized network.
    pub fn random<R: Rng + ?Sized>(widths: [usize; 4], rng: &mut R) -> CoreResult<Self> {
        Self::build(&mut RandomInit::new(rng), widths)
    }

    /// Network with weights read from a `.npz` archive.
    pub fn from_npz(path: &Path, widths: [usize; 4]) -> CoreResult<Self> {
        Self::build(&mut NpzWeights::open(path)?, widths)
    }

    pub fn widths(&self) -> [usize; 4] {
        self.widths
    }

    /// Runs the stem and all residual stages, returning the final feature map.
    pub fn features(&self, clip: ArrayView4<f32>) -> CoreResult<Array4<f32>> {
        let mut x = self.stem.forward(clip)?;
        relu_inplace(&mut x);
        for block in self.layers.iter().flatten() {
            x = block.forward(x.view())?;
        }
        Ok(x)
    }
}

impl ClipEncoder for R3dEncoder {
    fn embedding_dim(&self) -> usize {
        self.widths[3]
    }

    fn embed(&self, clip: ArrayView4<f32>) -> CoreResult<Array1<f32>> {
        let features = self.features(clip)?;
        Ok(global_avg_pool(features.view()))
    }
}

/// Creates the clip encoder described by `config`.
///
/// When pretrained weights are requested but cannot be loaded, a warning is
/// logged and a randomly initialized network is returned instead.
pub fn load_encoder<R: Rng + ?Sized>(config: &CoreConfig, rng: &mut R) -> CoreResult<R3dEncoder> {
    if config.use_pretrained {
        match R3dEncoder::from_npz(&config.weights_path, R3D18_WIDTHS) {
            Ok(encoder) => {
                log::info!(
                    "Loaded pretrained R3D-18 weights from {}",
                    config.weights_path.display()
                );
                return Ok(encoder);
            }
            Err(e) => {
                log::warn!(
                    "Could not load R3D pretrained weights ({}). Using randomly initialized model.",
                    e
                );
            }
        }
    } else {
        log::debug!("Pretrained R3D weights disabled; using random initialization");
    }
    R3dEncoder::random(R3D18_WIDTHS, rng)
}
