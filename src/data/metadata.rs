// ============================================================
// Layer 4 - Sketch Quality Metadata
// ============================================================
// Reads the per-sketch review flags from a CSV file and applies
// a QualityFilter to a list of scanned sketches.
//
// CSV format (header required, extra columns ignored):
//
//   sketch,error,context,ambiguous,wrong_pose
//   n02691156_58-1,0,0,0,0
//   n02691156_58-2,1,0,0,1
//
// Flag columns accept 0/1, true/false, yes/no (any case).
// An empty cell or a missing column means "not flagged".
// Sketches that do not appear in the file are treated as clean.

use anyhow::{Context, Result};
use serde::{de::Error as _, Deserialize, Deserializer};
use std::{collections::HashMap, fs::File, io::Read, path::Path};

use crate::data::scanner::ImageRecord;
use crate::domain::quality::{FilterReport, QualityFilter, SketchQuality};
use crate::domain::traits::QualityLookup;

/// One CSV row as written by the reviewers
#[derive(Debug, Deserialize)]
struct QualityRow {
    sketch: String,
    #[serde(default, deserialize_with = "flag")]
    error: bool,
    #[serde(default, deserialize_with = "flag")]
    context: bool,
    #[serde(default, deserialize_with = "flag")]
    ambiguous: bool,
    #[serde(default, deserialize_with = "flag")]
    wrong_pose: bool,
}

fn flag<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    let raw = String::deserialize(d)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "n"  => Ok(false),
        "1" | "true" | "yes" | "y"       => Ok(true),
        other => Err(D::Error::custom(format!("invalid quality flag '{other}'"))),
    }
}

/// Quality flags keyed by sketch file stem.
#[derive(Debug, Clone, Default)]
pub struct QualityTable {
    flags: HashMap<String, SketchQuality>,
}

impl QualityTable {
    /// A table with no entries: every sketch is clean.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the table from a CSV file on disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Cannot open quality metadata '{}'", path.display()))?;
        let table = Self::from_reader(file)
            .with_context(|| format!("Cannot parse quality metadata '{}'", path.display()))?;
        if table.is_empty() {
            tracing::warn!("Quality metadata '{}' has no rows - no sketch will be filtered", path.display());
        } else {
            tracing::info!("Loaded quality flags for {} sketches", table.len());
        }
        Ok(table)
    }

    /// Load the table from any CSV source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut flags = HashMap::new();
        for (i, row) in rdr.deserialize::<QualityRow>().enumerate() {
            // +2: one for the header, one for 1-based numbering
            let row = row.with_context(|| format!("Bad row at line {}", i + 2))?;
            flags.insert(
                row.sketch,
                SketchQuality {
                    error:      row.error,
                    context:    row.context,
                    ambiguous:  row.ambiguous,
                    wrong_pose: row.wrong_pose,
                },
            );
        }

        Ok(Self { flags })
    }

    /// Load from `path` if given, otherwise an empty table.
    pub fn load_optional(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(Path::new(p)),
            None => {
                tracing::info!("No quality metadata given - all sketches are kept");
                Ok(Self::empty())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}

impl QualityLookup for QualityTable {
    fn quality_of(&self, key: &str) -> Option<SketchQuality> {
        self.flags.get(key).copied()
    }
}

/// Keep only the sketches the filter admits.
/// Order of the surviving records is preserved.
pub fn filter_sketches(
    records: Vec<ImageRecord>,
    lookup:  &impl QualityLookup,
    filter:  &QualityFilter,
) -> (Vec<ImageRecord>, FilterReport) {
    let mut report = FilterReport::default();

    let kept = records
        .into_iter()
        .filter(|r| {
            let q    = lookup.quality_of(&r.key).unwrap_or_default();
            let keep = filter.keeps(&q);
            report.record(&q, keep);
            if !keep {
                tracing::debug!("Filtered sketch '{}' ({:?})", r.key, q);
            }
            keep
        })
        .collect();

    (kept, report)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const CSV: &str = "\
sketch,error,context,ambiguous,wrong_pose
a-1,0,0,0,0
a-2,1,0,0,0
b-1,false,TRUE,no,
b-2,0,0,yes,1
";

    fn record(key: &str) -> ImageRecord {
        ImageRecord {
            path:       PathBuf::from(format!("{key}.png")),
            label:      0,
            class_name: "a".into(),
            key:        key.into(),
        }
    }

    #[test]
    fn test_parses_flag_spellings() {
        let t = QualityTable::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(t.len(), 4);
        assert!(t.quality_of("a-1").unwrap().is_clean());
        assert!(t.quality_of("a-2").unwrap().error);
        assert!(t.quality_of("b-1").unwrap().context);
        let b2 = t.quality_of("b-2").unwrap();
        assert!(b2.ambiguous && b2.wrong_pose);
    }

    #[test]
    fn test_missing_columns_default_to_clean() {
        let t = QualityTable::from_reader("sketch,error\nx-1,1\ny-1,\n".as_bytes()).unwrap();
        assert!(t.quality_of("x-1").unwrap().error);
        assert!(t.quality_of("y-1").unwrap().is_clean());
    }

    #[test]
    fn test_rejects_garbage_flag() {
        let err = QualityTable::from_reader("sketch,error\nx-1,maybe\n".as_bytes());
        assert!(err.is_err());
    }

    #[test]
    fn test_filter_default_keeps_clean_and_unknown() {
        let t = QualityTable::from_reader(CSV.as_bytes()).unwrap();
        let recs = ["a-1", "a-2", "b-1", "b-2", "c-1"].map(record).to_vec();

        let (kept, report) = filter_sketches(recs, &t, &QualityFilter::default());
        let keys: Vec<&str> = kept.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, ["a-1", "c-1"]);
        assert_eq!(report.total,   5);
        assert_eq!(report.dropped, 3);
        assert_eq!(report.wrong_pose, 1);
    }

    #[test]
    fn test_filter_keep_all() {
        let t = QualityTable::from_reader(CSV.as_bytes()).unwrap();
        let recs = ["a-1", "a-2"].map(record).to_vec();
        let (kept, report) = filter_sketches(recs, &t, &QualityFilter::keep_all());
        assert_eq!(kept.len(), 2);
        assert_eq!(report.error, 1);
    }
}
