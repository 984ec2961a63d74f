// ============================================================
// Layer 5 - Statistics Layer (Burn)
// ============================================================
// All tensor math lives here.
//
//   loader.rs      - builds a Burn DataLoader over an ImageDataset
//
//   accumulator.rs - the three passes over the loader:
//                    mean → std (given mean) → scaling factor
//
//   normalizer.rs  - applies finished ChannelStats to a batch,
//                    the same transform the training stage uses
//
// The backend is generic everywhere; the binary runs on
// Burn's CPU NdArray backend in f32.

/// DataLoader construction
pub mod loader;

/// Mean / std / scaling-factor passes
pub mod accumulator;

/// (x - mean) / std / scale on tensors
pub mod normalizer;

/// Backend used by the command-line pipeline
pub type StatsBackend = burn::backend::NdArray;
