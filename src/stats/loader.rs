// ============================================================
// Layer 5 - DataLoader Construction
// ============================================================
// Wraps an ImageDataset in Burn's DataLoader.
//
// No shuffling: the statistics do not depend on order, and a
// fixed order keeps runs reproducible. With more than one
// worker, Burn splits the dataset into contiguous parts and
// decodes them on separate threads.

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};
use std::sync::Arc;

use crate::data::{
    batcher::{ImageBatch, ImageBatcher},
    dataset::ImageDataset,
};

pub fn build_loader<B: Backend>(
    dataset:     ImageDataset,
    batch_size:  usize,
    num_workers: usize,
    device:      B::Device,
) -> Arc<dyn DataLoader<ImageBatch<B>>> {
    let batcher = ImageBatcher::<B>::new(device, dataset.image_size() as usize);

    let mut builder = DataLoaderBuilder::new(batcher).batch_size(batch_size.max(1));
    if num_workers > 1 {
        builder = builder.num_workers(num_workers);
    }

    builder.build(dataset)
}
