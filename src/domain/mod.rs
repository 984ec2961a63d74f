// ============================================================
// Layer 3 - Domain Layer
// ============================================================
// Plain Rust types that describe the dataset and the statistics
// computed from it.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums, and traits
//
// Everything here is unit-testable without touching the disk.

// Photo vs sketch
pub mod modality;

// Class name ↔ integer label helpers
pub mod label_map;

// Sketch quality flags and the filter built on them
pub mod quality;

// Per-channel mean / std / scale
pub mod stats;

// Core abstractions (traits) that other layers implement
pub mod traits;
