// ============================================================================
// crimedet-core/src/processing/clips.rs
// ============================================================================
//
// CLIP SAMPLING: Frames → Normalized Clips → Embeddings
//
// This module turns the decoded frames of a video into the model's input:
// every frame is resized and standardized, the frame list is cut into
// overlapping fixed-length windows, and each window is embedded by a
// ClipEncoder.
//
// KEY COMPONENTS:
// - normalize_frame: Bilinear resize + [0,1] scaling + per-channel standardization
// - clip_count / clip_starts: Window arithmetic
// - sample_clips: All clips of a frame list, or None if it is too short
// - video_to_embeddings: File path to embedding matrix
//
// Clips are laid out channel-first as [3, T, H, W].

use crate::config::{CoreConfig, FRAME_MEAN, FRAME_STD};
use crate::error::{CoreResult, shape_mismatch};
use crate::external::{FrameSource, RgbFrame};
use crate::models::ClipEncoder;

use ndarray::{Array2, Array3, Array4, s};
use rayon::prelude::*;
use std::path::Path;

/// Source sample positions and weights for one output axis.
///
/// Pixel centers are aligned (`src = (dst + 0.5) * scale - 0.5`) and clamped
/// to the image border.
fn bilinear_taps(src_len: usize, dst_len: usize) -> Vec<(usize, usize, f32)> {
    let scale = src_len as f32 / dst_len as f32;
    let last = src_len.saturating_sub(1);
    (0..dst_len)
        .map(|d| {
            let pos = ((d as f32 + 0.5) * scale - 0.5).max(0.0);
            let lo = (pos.floor() as usize).min(last);
            let hi = (lo + 1).min(last);
            let frac = if lo == last { 0.0 } else { pos - lo as f32 };
            (lo, hi, frac)
        })
        .collect()
}

/// Resizes a frame to `size`×`size` and standardizes it.
///
/// Returns a `[size, size, 3]` array of `(pixel / 255 - mean) / std` per channel.
pub fn normalize_frame(frame: &RgbFrame, size: usize) -> Array3<f32> {
    let mut out = Array3::<f32>::zeros((size, size, 3));
    if frame.width == 0 || frame.height == 0 {
        return out;
    }
    let xs = bilinear_taps(frame.width, size);
    let ys = bilinear_taps(frame.height, size);
    let at = |x: usize, y: usize, c: usize| frame.data[(y * frame.width + x) * 3 + c] as f32;

    for (oy, &(y0, y1, fy)) in ys.iter().enumerate() {
        for (ox, &(x0, x1, fx)) in xs.iter().enumerate() {
            for c in 0..3 {
                let top = at(x0, y0, c) * (1.0 - fx) + at(x1, y0, c) * fx;
                let bottom = at(x0, y1, c) * (1.0 - fx) + at(x1, y1, c) * fx;
                let value = (top * (1.0 - fy) + bottom * fy) / 255.0;
                out[[oy, ox, c]] = (value - FRAME_MEAN[c]) / FRAME_STD[c];
            }
        }
    }
    out
}

/// Number of windows of `clip_len` frames, `stride` apart, that fit in `num_frames`.
#[must_use]
pub fn clip_count(num_frames: usize, clip_len: usize, stride: usize) -> usize {
    if clip_len == 0 || stride == 0 || num_frames < clip_len {
        0
    } else {
        (num_frames - clip_len) / stride + 1
    }
}

/// First frame index of every window.
pub fn clip_starts(num_frames: usize, clip_len: usize, stride: usize) -> impl Iterator<Item = usize> {
    (0..clip_count(num_frames, clip_len, stride)).map(move |i| i * stride)
}

/// Stacks `frames` (each `[H, W, 3]`) into a `[3, T, H, W]` clip.
pub fn assemble_clip(frames: &[Array3<f32>]) -> CoreResult<Array4<f32>> {
    let Some(first) = frames.first() else {
        return Err(shape_mismatch("clip frames", "at least one frame", 0));
    };
    let (h, w, c) = first.dim();
    let mut clip = Array4::<f32>::zeros((c, frames.len(), h, w));
    for (t, frame) in frames.iter().enumerate() {
        if frame.dim() != (h, w, c) {
            return Err(shape_mismatch("clip frame", (h, w, c), frame.dim()));
        }
        // HWC -> CHW
        clip.slice_mut(s![.., t, .., ..])
            .assign(&frame.view().permuted_axes([2, 0, 1]));
    }
    Ok(clip)
}

/// Cuts normalized frames into overlapping clips.
///
/// Returns `None` when there are fewer frames than `clip_len`.
pub fn sample_clips(
    frames: &[Array3<f32>],
    clip_len: usize,
    stride: usize,
) -> CoreResult<Option<Vec<Array4<f32>>>> {
    if clip_count(frames.len(), clip_len, stride) == 0 {
        return Ok(None);
    }
    clip_starts(frames.len(), clip_len, stride)
        .map(|start| assemble_clip(&frames[start..start + clip_len]))
        .collect::<CoreResult<Vec<_>>>()
        .map(Some)
}

/// Normalizes `pending` raw frames in parallel and appends them to `normalized`.
fn normalize_batch(pending: &mut Vec<RgbFrame>, normalized: &mut Vec<Array3<f32>>, size: usize) {
    normalized.par_extend(
        pending
            .par_drain(..)
            .map(|frame| normalize_frame(&frame, size)),
    );
}

/// Decodes, normalizes and embeds every clip of the video at `path`.
///
/// Frames are resized as they arrive, a small batch at a time, so only
/// `frame_size`×`frame_size` frames are kept for the whole video.
///
/// Returns `Ok(None)` if the file does not exist or yields fewer than
/// `config.clip_len` frames (including a file ffmpeg cannot decode).
/// `on_clip(done, total)` is called after each clip is embedded.
pub fn video_to_embeddings<F, E>(
    path: &Path,
    source: &F,
    encoder: &E,
    config: &CoreConfig,
    on_clip: &mut dyn FnMut(usize, usize),
) -> CoreResult<Option<Array2<f32>>>
where
    F: FrameSource + ?Sized,
    E: ClipEncoder + ?Sized,
{
    if !path.is_file() {
        log::warn!("File {} does not exist.", path.display());
        return Ok(None);
    }

    let size = config.frame_size;
    let batch_len = rayon::current_num_threads().max(1) * 2;
    let mut pending: Vec<RgbFrame> = Vec::with_capacity(batch_len);
    let mut normalized: Vec<Array3<f32>> = Vec::new();
    source.for_each_frame(path, &mut |frame| {
        pending.push(frame);
        if pending.len() >= batch_len {
            normalize_batch(&mut pending, &mut normalized, size);
        }
        Ok(())
    })?;
    normalize_batch(&mut pending, &mut normalized, size);

    let total = clip_count(normalized.len(), config.clip_len, config.stride);
    if total == 0 {
        log::warn!(
            "Not enough frames in {} ({} < {})",
            path.display(),
            normalized.len(),
            config.clip_len
        );
        return Ok(None);
    }
    log::debug!(
        "Sampling {} clips from {} frames (clip length {}, stride {})",
        total,
        normalized.len(),
        config.clip_len,
        config.stride
    );

    let dim = encoder.embedding_dim();
    let mut embeddings = Array2::<f32>::zeros((total, dim));
    for (index, start) in clip_starts(normalized.len(), config.clip_len, config.stride).enumerate() {
        let clip = assemble_clip(&normalized[start..start + config.clip_len])?;
        let embedding = encoder.embed(clip.view())?;
        if embedding.len() != dim {
            return Err(shape_mismatch("clip embedding", dim, embedding.len()));
        }
        embeddings.row_mut(index).assign(&embedding);
        on_clip(index + 1, total);
    }
    Ok(Some(embeddings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use ndarray::{Array1, ArrayView4};
    use tempfile::NamedTempFile;

    /// Returns `count` solid frames whose red channel encodes the frame index.
    struct CountingSource {
        count: usize,
    }

    impl FrameSource for CountingSource {
        fn for_each_frame(
            &self,
            _path: &Path,
            on_frame: &mut dyn FnMut(RgbFrame) -> CoreResult<()>,
        ) -> CoreResult<usize> {
            for i in 0..self.count {
                on_frame(RgbFrame::filled(8, 6, [i as u8, 0, 0]))?;
            }
            Ok(self.count)
        }
    }

    /// Embeds a clip as its mean red value at the first frame plus the clip length.
    struct FirstFrameEncoder;

    impl ClipEncoder for FirstFrameEncoder {
        fn embedding_dim(&self) -> usize {
            2
        }

        fn embed(&self, clip: ArrayView4<f32>) -> CoreResult<Array1<f32>> {
            let first_red = clip.slice(s![0, 0, .., ..]).mean().unwrap_or(0.0);
            Ok(Array1::from(vec![first_red, clip.shape()[1] as f32]))
        }
    }

    fn small_config() -> CoreConfig {
        CoreConfig {
            frame_size: 4,
            ..CoreConfig::default()
        }
    }

    #[test]
    fn test_clip_count_formula() {
        assert_eq!(clip_count(15, 16, 8), 0);
        assert_eq!(clip_count(16, 16, 8), 1);
        assert_eq!(clip_count(23, 16, 8), 1);
        assert_eq!(clip_count(24, 16, 8), 2);
        assert_eq!(clip_count(100, 16, 8), 11);
        assert_eq!(clip_count(10, 0, 8), 0);
    }

    #[test]
    fn test_clip_starts_are_stride_apart() {
        let starts: Vec<usize> = clip_starts(40, 16, 8).collect();
        assert_eq!(starts, vec![0, 8, 16, 24]);
    }

    #[test]
    fn test_normalize_solid_frame() {
        let frame = RgbFrame::filled(10, 7, [255, 0, 128]);
        let out = normalize_frame(&frame, 5);
        assert_eq!(out.dim(), (5, 5, 3));
        let expected = [
            (1.0 - FRAME_MEAN[0]) / FRAME_STD[0],
            (0.0 - FRAME_MEAN[1]) / FRAME_STD[1],
            (128.0 / 255.0 - FRAME_MEAN[2]) / FRAME_STD[2],
        ];
        for c in 0..3 {
            assert!(out.slice(s![.., .., c]).iter().all(|v| (v - expected[c]).abs() < 1e-5));
        }
    }

    #[test]
    fn test_normalize_interpolates_between_columns() {
        // Left column black, right column white; downscale 2 -> 1 lands in the middle
        let data = vec![0, 0, 0, 255, 255, 255];
        let frame = RgbFrame::new(2, 1, data).unwrap();
        let out = normalize_frame(&frame, 1);
        let expected = (0.5 - FRAME_MEAN[0]) / FRAME_STD[0];
        assert!((out[[0, 0, 0]] - expected).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_upscale_keeps_edges() {
        let data = vec![0, 0, 0, 255, 255, 255];
        let frame = RgbFrame::new(2, 1, data).unwrap();
        let out = normalize_frame(&frame, 4);
        let black = (0.0 - FRAME_MEAN[0]) / FRAME_STD[0];
        let white = (1.0 - FRAME_MEAN[0]) / FRAME_STD[0];
        assert!((out[[0, 0, 0]] - black).abs() < 1e-5);
        assert!((out[[0, 3, 0]] - white).abs() < 1e-5);
        assert!(out[[0, 1, 0]] > black && out[[0, 1, 0]] < white);
    }

    #[test]
    fn test_assemble_clip_is_channel_first() {
        let mut a = Array3::<f32>::zeros((2, 3, 3));
        a[[1, 2, 0]] = 5.0;
        a[[0, 1, 2]] = 7.0;
        let b = Array3::<f32>::ones((2, 3, 3));
        let clip = assemble_clip(&[a, b]).unwrap();
        assert_eq!(clip.dim(), (3, 2, 2, 3));
        assert_eq!(clip[[0, 0, 1, 2]], 5.0);
        assert_eq!(clip[[2, 0, 0, 1]], 7.0);
        assert_eq!(clip[[1, 1, 0, 0]], 1.0);
    }

    #[test]
    fn test_sample_clips_short_video_is_none() {
        let frames = vec![Array3::<f32>::zeros((2, 2, 3)); 15];
        assert!(sample_clips(&frames, 16, 8).unwrap().is_none());
    }

    #[test]
    fn test_sample_clips_overlap() {
        let frames: Vec<Array3<f32>> = (0..24)
            .map(|i| Array3::from_elem((2, 2, 3), i as f32))
            .collect();
        let clips = sample_clips(&frames, 16, 8).unwrap().unwrap();
        assert_eq!(clips.len(), 2);
        assert_eq!(clips[0].dim(), (3, 16, 2, 2));
        assert_eq!(clips[1][[0, 0, 0, 0]], 8.0);
        assert_eq!(clips[1][[0, 15, 0, 0]], 23.0);
    }

    #[test]
    fn test_video_to_embeddings_missing_file() {
        let source = CountingSource { count: 32 };
        let result = video_to_embeddings(
            Path::new("/definitely/not/here.mp4"),
            &source,
            &FirstFrameEncoder,
            &small_config(),
            &mut |_, _| {},
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_video_to_embeddings_too_short() {
        let file = NamedTempFile::new().unwrap();
        let source = CountingSource { count: 15 };
        let result = video_to_embeddings(
            file.path(),
            &source,
            &FirstFrameEncoder,
            &small_config(),
            &mut |_, _| {},
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_video_to_embeddings_rows_follow_clip_order() {
        let file = NamedTempFile::new().unwrap();
        let source = CountingSource { count: 40 };
        let mut progress = Vec::new();
        let embeddings = video_to_embeddings(
            file.path(),
            &source,
            &FirstFrameEncoder,
            &small_config(),
            &mut |done, total| progress.push((done, total)),
        )
        .unwrap()
        .unwrap();

        assert_eq!(embeddings.dim(), (4, 2));
        let red = |i: usize| (i as f32 / 255.0 - FRAME_MEAN[0]) / FRAME_STD[0];
        for (row, start) in [0usize, 8, 16, 24].iter().enumerate() {
            assert!((embeddings[[row, 0]] - red(*start)).abs() < 1e-5);
            assert_eq!(embeddings[[row, 1]], 16.0);
        }
        assert_eq!(progress, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
    }

    #[test]
    fn test_video_to_embeddings_propagates_decode_errors() {
        struct FailingSource;
        impl FrameSource for FailingSource {
            fn for_each_frame(
                &self,
                path: &Path,
                _on_frame: &mut dyn FnMut(RgbFrame) -> CoreResult<()>,
            ) -> CoreResult<usize> {
                Err(CoreError::Decode {
                    path: path.to_path_buf(),
                    message: "corrupt".to_string(),
                })
            }
        }
        let file = NamedTempFile::new().unwrap();
        let result = video_to_embeddings(
            file.path(),
            &FailingSource,
            &FirstFrameEncoder,
            &small_config(),
            &mut |_, _| {},
        );
        assert!(matches!(result, Err(CoreError::Decode { .. })));
    }

    #[test]
    fn test_video_without_decodable_frames_is_none() {
        let file = NamedTempFile::new().unwrap();
        let source = CountingSource { count: 0 };
        let result = video_to_embeddings(
            file.path(),
            &source,
            &FirstFrameEncoder,
            &small_config(),
            &mut |_, _| {},
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_frames_are_normalized_in_arrival_order_across_batches() {
        let count = 200;
        let file = NamedTempFile::new().unwrap();
        let config = CoreConfig {
            frame_size: 2,
            clip_len: 1,
            stride: 1,
            ..CoreConfig::default()
        };
        let embeddings = video_to_embeddings(
            file.path(),
            &CountingSource { count },
            &FirstFrameEncoder,
            &config,
            &mut |_, _| {},
        )
        .unwrap()
        .unwrap();

        assert_eq!(embeddings.nrows(), count);
        let red = |i: usize| (i as f32 / 255.0 - FRAME_MEAN[0]) / FRAME_STD[0];
        for i in 0..count {
            assert!((embeddings[[i, 0]] - red(i)).abs() < 1e-5);
        }
    }
}
