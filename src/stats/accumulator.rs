// ============================================================
// Layer 5 - Statistics Passes
// ============================================================
// Three single-pass reductions over a DataLoader, run in order:
//
//   1. compute_mean            Σx / P                  per channel
//   2. compute_std             sqrt(Σ(x - mean)² / P)   per channel
//   3. compute_scaling_factor  max |(x - mean) / std|  over everything
//
// where P = N·H·W is the number of pixels per channel.
//
// Each batch is reduced on the tensor backend down to C values
// (sum over batch, height, width), then accumulated on the host
// in f64 so long runs do not lose precision.
//
// The std pass needs the finished mean and the scale pass needs
// both, which is why these are separate passes rather than one.
//
// Every pass also counts the images it saw. A decode failure
// makes the dataset return None, which ends the DataLoader's
// iteration early; the count check turns that into an error.
//
// A channel with zero variance is stored with std = 1.0, the
// divisor actually applied, so any consumer can divide by it.

use anyhow::{anyhow, bail, Result};
use burn::{data::dataloader::DataLoader, prelude::*};

use crate::data::batcher::ImageBatch;
use crate::domain::stats::{ChannelStats, CHANNELS};
use crate::stats::normalizer::{channel_tensor, Normalizer, MIN_STD};

/// Per-channel sums of a [N, C, H, W] tensor.
fn channel_sums<B: Backend>(images: Tensor<B, 4>) -> Result<[f64; CHANNELS]> {
    let summed = images.sum_dim(0).sum_dim(2).sum_dim(3);
    let values = to_f64_vec(summed)?;

    let mut out = [0.0; CHANNELS];
    if values.len() != CHANNELS {
        bail!("expected {CHANNELS} channel sums, got {}", values.len());
    }
    out.copy_from_slice(&values);
    Ok(out)
}

fn to_f64_vec<B: Backend, const D: usize>(t: Tensor<B, D>) -> Result<Vec<f64>> {
    t.into_data()
        .convert::<f64>()
        .to_vec::<f64>()
        .map_err(|e| anyhow!("Cannot read tensor data: {e:?}"))
}

/// Running totals shared by the mean and std passes.
#[derive(Default)]
struct Totals {
    sums:   [f64; CHANNELS],
    pixels: usize,
    images: usize,
}

impl Totals {
    fn add<B: Backend>(&mut self, reduced: Tensor<B, 4>, n: usize, [_, _, h, w]: [usize; 4]) -> Result<()> {
        let sums = channel_sums(reduced)?;
        for (acc, s) in self.sums.iter_mut().zip(sums) {
            *acc += s;
        }
        self.images += n;
        self.pixels += n * h * w;
        Ok(())
    }

    fn per_pixel(&self) -> Result<[f64; CHANNELS]> {
        if self.pixels == 0 {
            bail!("images have no pixels (image size 0?)");
        }
        Ok(self.sums.map(|s| s / self.pixels as f64))
    }
}

fn check_count(pass: &str, seen: usize, expected: usize) -> Result<()> {
    if expected == 0 {
        bail!("Cannot compute {pass}: the dataset is empty");
    }
    if seen != expected {
        bail!(
            "{pass} pass saw {seen} of {expected} images - \
             some images failed to decode (see errors above)"
        );
    }
    Ok(())
}

/// Per-channel mean of every pixel the loader yields.
pub fn compute_mean<B: Backend>(
    loader:   &dyn DataLoader<ImageBatch<B>>,
    expected: usize,
) -> Result<[f64; CHANNELS]> {
    let mut totals = Totals::default();

    for batch in loader.iter() {
        let dims = batch.images.dims();
        let n    = batch.labels.dims()[0];
        totals.add(batch.images, n, dims)?;
    }

    check_count("mean", totals.images, expected)?;
    let mean = totals.per_pixel()?;
    tracing::debug!("mean over {} pixels/channel: {:?}", totals.pixels, mean);
    Ok(mean)
}

/// Per-channel population standard deviation, given the mean.
pub fn compute_std<B: Backend>(
    loader:   &dyn DataLoader<ImageBatch<B>>,
    mean:     &[f64; CHANNELS],
    expected: usize,
) -> Result<[f64; CHANNELS]> {
    let mut totals = Totals::default();

    for batch in loader.iter() {
        let dims     = batch.images.dims();
        let n        = batch.labels.dims()[0];
        let mean_t   = channel_tensor::<B>(mean, &batch.images.device());
        let centered = batch.images - mean_t;
        totals.add(centered.clone() * centered, n, dims)?;
    }

    check_count("std", totals.images, expected)?;
    let mut std = totals.per_pixel()?.map(f64::sqrt);

    for (c, s) in std.iter_mut().enumerate() {
        if *s < MIN_STD {
            tracing::warn!("Channel {} has zero variance - storing std 1.0 (centring only)", c);
            *s = 1.0;
        }
    }
    Ok(std)
}

/// Largest absolute standardized value: max(|min|, |max|) of (x - mean) / std.
/// Returns 1.0 if every standardized value is (numerically) zero.
pub fn compute_scaling_factor<B: Backend>(
    loader:   &dyn DataLoader<ImageBatch<B>>,
    mean:     &[f64; CHANNELS],
    std:      &[f64; CHANNELS],
    expected: usize,
) -> Result<f64> {
    let mut lo     = f64::INFINITY;
    let mut hi     = f64::NEG_INFINITY;
    let mut images = 0usize;

    for batch in loader.iter() {
        images += batch.labels.dims()[0];
        if batch.images.dims().iter().product::<usize>() == 0 {
            bail!("Cannot compute scaling factor: images have no pixels");
        }

        let norm = Normalizer::<B>::standardizing(mean, std, &batch.images.device());
        let x    = norm.standardize(batch.images);

        lo = lo.min(x.clone().min().into_scalar().elem::<f64>());
        hi = hi.max(x.max().into_scalar().elem::<f64>());
    }

    check_count("scaling factor", images, expected)?;

    let scale = lo.abs().max(hi.abs());
    tracing::debug!("standardized range [{:.4}, {:.4}]", lo, hi);

    if scale < MIN_STD {
        tracing::warn!("All standardized values are zero - using scale 1.0");
        return Ok(1.0);
    }
    Ok(scale)
}

/// Run all three passes and bundle the result.
pub fn compute_channel_stats<B: Backend>(
    loader:   &dyn DataLoader<ImageBatch<B>>,
    expected: usize,
) -> Result<ChannelStats> {
    tracing::info!("Pass 1/3: mean over {} images", expected);
    let mean = compute_mean(loader, expected)?;

    tracing::info!("Pass 2/3: standard deviation");
    let std = compute_std(loader, &mean, expected)?;

    tracing::info!("Pass 3/3: scaling factor");
    let scale = compute_scaling_factor(loader, &mean, &std, expected)?;

    Ok(ChannelStats { mean, std, scale })
}
