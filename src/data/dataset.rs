// ============================================================
// Layer 4 - Image Dataset
// ============================================================
// Implements Burn's Dataset trait over a list of ImageRecords.
//
// Images are decoded lazily in get(): the full dataset is far
// too large to hold in memory, and the DataLoader workers call
// get() in parallel so decoding is spread across threads.
//
// Every item is normalised to the same shape so it can be
// stacked into a batch tensor:
//   1. decode (PNG / JPEG)
//   2. convert to RGB (sketches are often greyscale)
//   3. resize to image_size × image_size
//   4. scale bytes to [0, 1] and lay out channel-first (CHW)

use anyhow::{Context, Result};
use burn::data::dataset::Dataset;
use image::imageops::FilterType;
use std::path::Path;

use crate::data::scanner::ImageRecord;
use crate::domain::stats::CHANNELS;

/// Largest accepted resize target; larger values are almost
/// certainly a typo and would exhaust memory per batch.
pub const MAX_IMAGE_SIZE: u32 = 8192;

/// One decoded image ready for batching.
#[derive(Debug, Clone)]
pub struct ImageItem {
    /// Pixel values in [0, 1], channel-first: [C, H, W] flattened
    pub pixels: Vec<f32>,

    /// Class label
    pub label: usize,
}

pub struct ImageDataset {
    records:    Vec<ImageRecord>,
    image_size: u32,
}

impl ImageDataset {
    pub fn new(records: Vec<ImageRecord>, image_size: u32) -> Self {
        Self { records, image_size }
    }

    /// Keep only the first `max` records (useful for quick runs).
    pub fn with_limit(mut self, max: Option<usize>) -> Self {
        if let Some(max) = max {
            self.records.truncate(max);
        }
        self
    }

    pub fn image_size(&self) -> u32 {
        self.image_size
    }
}

impl Dataset<ImageItem> for ImageDataset {
    /// Decode the image at `index`.
    ///
    /// A decode failure is logged and reported as None; the
    /// statistics passes detect the resulting short iteration
    /// and fail the run rather than silently skipping images.
    fn get(&self, index: usize) -> Option<ImageItem> {
        let record = self.records.get(index)?;
        match load_pixels(&record.path, self.image_size) {
            Ok(pixels) => Some(ImageItem { pixels, label: record.label }),
            Err(e) => {
                tracing::error!("{:#}", e);
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Decode, convert to RGB, resize, and flatten an image to CHW floats.
pub fn load_pixels(path: &Path, size: u32) -> Result<Vec<f32>> {
    let img = image::open(path)
        .with_context(|| format!("Cannot decode '{}'", path.display()))?
        .to_rgb8();

    let img = if img.dimensions() == (size, size) {
        img
    } else {
        image::imageops::resize(&img, size, size, FilterType::Triangle)
    };

    let plane = size as usize * size as usize;
    let mut out = vec![0.0f32; CHANNELS * plane];

    for (i, px) in img.pixels().enumerate() {
        for c in 0..CHANNELS {
            out[c * plane + i] = px[c] as f32 / 255.0;
        }
    }

    Ok(out)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_util::{write_png, write_png_with};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn record(path: PathBuf, label: usize) -> ImageRecord {
        ImageRecord { path, label, class_name: "c".into(), key: "k".into() }
    }

    #[test]
    fn test_pixels_are_channel_first() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("a.png");
        write_png(&path, 2, [255, 0, 51]);

        let px = load_pixels(&path, 2).unwrap();
        assert_eq!(px.len(), 12);
        assert!(px[0..4].iter().all(|&v| v == 1.0));
        assert!(px[4..8].iter().all(|&v| v == 0.0));
        assert!(px[8..12].iter().all(|&v| (v - 0.2).abs() < 1e-6));
    }

    #[test]
    fn test_row_major_order_within_plane() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("a.png");
        // red channel encodes the pixel position
        write_png_with(&path, 2, |x, y| [(y * 2 + x) as u8, 0, 0]);

        let px = load_pixels(&path, 2).unwrap();
        let red: Vec<u8> = px[0..4].iter().map(|v| (v * 255.0).round() as u8).collect();
        assert_eq!(red, [0, 1, 2, 3]);
    }

    #[test]
    fn test_resizes_to_target() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("big.png");
        write_png(&path, 8, [0, 128, 0]);

        let px = load_pixels(&path, 4).unwrap();
        assert_eq!(px.len(), CHANNELS * 16);
    }

    #[test]
    fn test_dataset_get_and_limit() {
        let tmp = TempDir::new().unwrap();
        let a   = tmp.path().join("a.png");
        let b   = tmp.path().join("b.png");
        write_png(&a, 2, [0, 0, 0]);
        write_png(&b, 2, [0, 0, 0]);

        let ds = ImageDataset::new(vec![record(a, 3), record(b, 4)], 2);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1).unwrap().label, 4);
        assert!(ds.get(2).is_none());

        let ds = ds.with_limit(Some(1));
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_get_returns_none_for_undecodable_file() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("bad.png");
        std::fs::write(&path, b"garbage").unwrap();

        let ds = ImageDataset::new(vec![record(path, 0)], 2);
        assert!(ds.get(0).is_none());
    }
}
