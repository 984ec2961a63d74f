// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The application layer talks to storage and metadata through
// these traits, never through concrete file formats:
//
//   - NpzStatsStore implements StatsStore (.npz archive)
//   - QualityTable  implements QualityLookup (CSV metadata)
//
// A different archive format or metadata source only needs a
// new implementation; the pipeline stays the same.

use anyhow::Result;

use crate::domain::quality::SketchQuality;
use crate::domain::stats::{DatasetStats, PartialStats};

// ─── StatsStore ───────────────────────────────────────────────────────────────
/// Somewhere normalization statistics can be written and read back.
pub trait StatsStore {
    /// Persist all six values.
    fn save(&self, stats: &DatasetStats) -> Result<()>;

    /// Read all six values. Fails if any is missing.
    fn load(&self) -> Result<DatasetStats>;

    /// Read whichever modalities are complete.
    /// Returns empty stats if nothing has been saved yet.
    fn load_partial(&self) -> Result<PartialStats>;
}

// ─── QualityLookup ────────────────────────────────────────────────────────────
/// Anything that knows the quality flags of a sketch by its key
/// (the file stem, e.g. `n02691156_58-1`).
pub trait QualityLookup {
    /// Flags for a sketch, or None if the sketch was never reviewed.
    fn quality_of(&self, key: &str) -> Option<SketchQuality>;
}
