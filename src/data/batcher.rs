// ============================================================
// Layer 4 - Image Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<ImageItem>
// into one tensor batch.
//
//   Input:  N ImageItems, each a flat [C * H * W] pixel Vec
//   Output: ImageBatch with images [N, C, H, W], labels [N]
//
// Every item was already resized to the same square size by
// the dataset, so batching is a flatten + reshape.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::ImageItem;
use crate::domain::stats::CHANNELS;

// ─── ImageBatch ───────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Pixel values in [0, 1] - shape: [batch_size, C, H, W]
    pub images: Tensor<B, 4>,

    /// Class labels - shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

// ─── ImageBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    device:     B::Device,
    image_size: usize,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device, image_size: usize) -> Self {
        Self { device, image_size }
    }
}

impl<B: Backend> Batcher<ImageItem, ImageBatch<B>> for ImageBatcher<B> {
    fn batch(&self, items: Vec<ImageItem>) -> ImageBatch<B> {
        let batch_size = items.len();
        let size       = self.image_size;

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|item| item.pixels.iter().copied())
            .collect();

        let labels: Vec<i64> = items
            .iter()
            .map(|item| item.label as i64)
            .collect();

        let images = Tensor::<B, 4>::from_data(
            TensorData::new(pixels, [batch_size, CHANNELS, size, size])
                .convert::<B::FloatElem>(),
            &self.device,
        );

        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]).convert::<B::IntElem>(),
            &self.device,
        );

        ImageBatch { images, labels }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_batch_shapes_and_values() {
        let device  = Default::default();
        let batcher = ImageBatcher::<TestBackend>::new(device, 2);

        let items = vec![
            ImageItem { pixels: vec![0.5; CHANNELS * 4], label: 1 },
            ImageItem { pixels: vec![0.25; CHANNELS * 4], label: 7 },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.images.dims(), [2, CHANNELS, 2, 2]);
        assert_eq!(batch.labels.dims(), [2]);

        let labels = batch.labels.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert_eq!(labels, [1, 7]);

        // second image is all 0.25
        let second = batch
            .images
            .slice([1..2, 0..CHANNELS, 0..2, 0..2])
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .unwrap();
        assert!(second.iter().all(|&v| v == 0.25));
    }
}
