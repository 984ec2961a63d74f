// ============================================================
// Layer 6 - Infrastructure Layer
// ============================================================
// File formats the rest of the system should not know about:
//
//   stats_store.rs - the .npz statistics archive plus its
//                    sidecars (run config JSON, labels JSON).
//                    Implements the StatsStore trait.
//
//   summary.rs     - per-class counts written to CSV by the
//                    `inspect` command.
//
// Reference: ndarray-npy and csv crate documentation

/// .npz statistics archive and sidecar files
pub mod stats_store;

/// Per-class dataset summary CSV
pub mod summary;
