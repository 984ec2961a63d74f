// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal each.
//
// Rules for this layer:
//   - No tensor math here (that's Layer 5)
//   - No printing here (that's Layer 1)
//   - No file formats here (that's Layers 4 and 6)
//   - Only workflow coordination

// Compute and save normalization statistics
pub mod stats_use_case;

// Explore the dataset and read back saved statistics
pub mod inspect_use_case;
