// ============================================================
// Layer 3 - Sketch Quality
// ============================================================
// Every sketch in the dataset was reviewed and may carry one or
// more quality flags:
//
//   error      - the artist made a mistake (scribbles, unfinished)
//   context    - the sketch adds environment/background details
//   ambiguous  - the object is not recognisable from the sketch
//   wrong_pose - the sketch does not match the photo's pose
//
// Flagged sketches skew the pixel statistics (and later the
// classifier), so by default every flagged sketch is dropped.
// Each flag can be re-admitted individually.

use serde::{Deserialize, Serialize};

/// Quality flags attached to one sketch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SketchQuality {
    pub error:      bool,
    pub context:    bool,
    pub ambiguous:  bool,
    pub wrong_pose: bool,
}

impl SketchQuality {
    /// True if no flag is set
    pub fn is_clean(&self) -> bool {
        !(self.error || self.context || self.ambiguous || self.wrong_pose)
    }
}

/// Which quality flags cause a sketch to be excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityFilter {
    pub exclude_error:      bool,
    pub exclude_context:    bool,
    pub exclude_ambiguous:  bool,
    pub exclude_wrong_pose: bool,
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self {
            exclude_error:      true,
            exclude_context:    true,
            exclude_ambiguous:  true,
            exclude_wrong_pose: true,
        }
    }
}

impl QualityFilter {
    /// A filter that keeps every sketch.
    pub fn keep_all() -> Self {
        Self {
            exclude_error:      false,
            exclude_context:    false,
            exclude_ambiguous:  false,
            exclude_wrong_pose: false,
        }
    }

    /// True if a sketch with these flags survives the filter.
    pub fn keeps(&self, q: &SketchQuality) -> bool {
        !((self.exclude_error      && q.error)
            || (self.exclude_context    && q.context)
            || (self.exclude_ambiguous  && q.ambiguous)
            || (self.exclude_wrong_pose && q.wrong_pose))
    }
}

/// Counts of what a filter pass saw and removed.
///
/// The per-flag counters count flagged sketches among the inputs,
/// so a sketch with two flags is counted twice there but only
/// once in `dropped`. `clean` counts sketches with no flag at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub total:      usize,
    pub kept:       usize,
    pub dropped:    usize,
    pub clean:      usize,
    pub error:      usize,
    pub context:    usize,
    pub ambiguous:  usize,
    pub wrong_pose: usize,
}

impl FilterReport {
    /// Record one sketch and whether it was kept.
    pub fn record(&mut self, q: &SketchQuality, kept: bool) {
        self.total += 1;
        if kept { self.kept += 1 } else { self.dropped += 1 }
        self.clean      += q.is_clean()     as usize;
        self.error      += q.error      as usize;
        self.context    += q.context    as usize;
        self.ambiguous  += q.ambiguous  as usize;
        self.wrong_pose += q.wrong_pose as usize;
    }
}
