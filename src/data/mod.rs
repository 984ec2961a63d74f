// ============================================================
// Layer 4 - Data Pipeline
// ============================================================
// Everything from the image files on disk to tensor batches.
//
//   <root>/photo, <root>/sketch
//       │
//       ▼
//   DatasetLayout     → finds class folders and image files
//       │
//       ▼
//   QualityTable      → drops flagged sketches (sketch only)
//       │
//       ▼
//   ImageDataset      → implements Burn's Dataset trait,
//       │                decodes + resizes on demand
//       ▼
//   ImageBatcher      → stacks items into [N, C, H, W] tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the statistics passes
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Walks the dataset tree and builds the label map
pub mod scanner;

/// Sketch quality CSV and the filter step
pub mod metadata;

/// Implements Burn's Dataset trait for decoded images
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

#[cfg(test)]
pub(crate) mod test_util;
