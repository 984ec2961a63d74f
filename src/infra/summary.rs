// ============================================================
// Layer 6 - Dataset Summary Writer
// ============================================================
// Writes the per-class counts gathered by `inspect` to CSV so
// class balance can be checked in a spreadsheet or plotted.
//
// Example output:
//   class,label,photos,sketches,sketches_kept
//   airplane,0,100,560,541
//   alarm_clock,1,100,545,522
//   ...
//
// A large gap between sketches and sketches_kept means the
// quality filter removes a big share of that class.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Image counts for one class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCount {
    pub class:         String,
    pub label:         usize,
    pub photos:        usize,
    pub sketches:      usize,
    pub sketches_kept: usize,
}

impl ClassCount {
    /// Fraction of this class's sketches removed by the filter
    pub fn dropped_fraction(&self) -> f64 {
        if self.sketches == 0 {
            return 0.0;
        }
        (self.sketches - self.sketches_kept) as f64 / self.sketches as f64
    }
}

/// Write all rows to `path`, replacing any existing file.
pub fn write_summary(path: &Path, rows: &[ClassCount]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Cannot create summary '{}'", path.display()))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    tracing::info!("Wrote class summary ({} rows) to '{}'", rows.len(), path.display());
    Ok(())
}
