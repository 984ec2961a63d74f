// ============================================================
// Layer 5 - Normalizer
// ============================================================
// Applies ChannelStats to a batch of images:
//
//   standardize(x) = (x - mean[c]) / std[c]
//   normalize(x)   = standardize(x) / scale
//
// mean and std are stored as [1, C, 1, 1] tensors so they
// broadcast over a [N, C, H, W] batch.
//
// A channel whose std is below MIN_STD (every pixel identical,
// up to float rounding) is only centred: its divisor is 1.0.
// The same holds for a scale below MIN_STD.
//
// normalized_range reports where the pixel range [0, 1] lands
// after normalization; `show` prints it as a sanity check that
// the training inputs stay within about [-1, 1].

use anyhow::{anyhow, Result};
use burn::prelude::*;

use crate::domain::stats::{ChannelStats, CHANNELS};

/// Build a [1, C, 1, 1] tensor from per-channel values.
pub fn channel_tensor<B: Backend>(values: &[f64; CHANNELS], device: &B::Device) -> Tensor<B, 4> {
    Tensor::<B, 1>::from_data(
        TensorData::new(values.to_vec(), [CHANNELS]).convert::<B::FloatElem>(),
        device,
    )
    .reshape([1, CHANNELS, 1, 1])
}

/// Spreads smaller than this are treated as zero.
pub const MIN_STD: f64 = 1e-6;

fn safe_divisor(v: f64) -> f64 {
    if v > MIN_STD && v.is_finite() { v } else { 1.0 }
}

#[derive(Debug, Clone)]
pub struct Normalizer<B: Backend> {
    mean:  Tensor<B, 4>,
    std:   Tensor<B, 4>,
    scale: f64,
}

impl<B: Backend> Normalizer<B> {
    pub fn new(stats: &ChannelStats, device: &B::Device) -> Self {
        Self::from_parts(&stats.mean, &stats.std, stats.scale, device)
    }

    /// Normalizer with only mean and std, scale fixed at 1.0.
    pub fn standardizing(
        mean:   &[f64; CHANNELS],
        std:    &[f64; CHANNELS],
        device: &B::Device,
    ) -> Self {
        Self::from_parts(mean, std, 1.0, device)
    }

    fn from_parts(
        mean:   &[f64; CHANNELS],
        std:    &[f64; CHANNELS],
        scale:  f64,
        device: &B::Device,
    ) -> Self {
        let divisors = std.map(safe_divisor);
        Self {
            mean:  channel_tensor(mean, device),
            std:   channel_tensor(&divisors, device),
            scale: safe_divisor(scale),
        }
    }

    /// (x - mean) / std
    pub fn standardize(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        (images - self.mean.clone()) / self.std.clone()
    }

    /// ((x - mean) / std) / scale
    pub fn normalize(&self, images: Tensor<B, 4>) -> Tensor<B, 4> {
        self.standardize(images).div_scalar(self.scale)
    }
}

/// Normalized value of pixel 0.0 and pixel 1.0, per channel.
pub fn normalized_range<B: Backend>(
    stats:  &ChannelStats,
    device: &B::Device,
) -> Result<[(f64, f64); CHANNELS]> {
    let norm = Normalizer::<B>::new(stats, device);

    // one 1×2 image per channel: pixel 0 then pixel 1
    let ends: Vec<f64> = (0..CHANNELS).flat_map(|_| [0.0, 1.0]).collect();
    let img  = Tensor::<B, 4>::from_data(
        TensorData::new(ends, [1, CHANNELS, 1, 2]).convert::<B::FloatElem>(),
        device,
    );

    let out = norm
        .normalize(img)
        .into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))?;

    let mut range = [(0.0, 0.0); CHANNELS];
    for (c, r) in range.iter_mut().enumerate() {
        *r = (out[2 * c], out[2 * c + 1]);
    }
    Ok(range)
}
