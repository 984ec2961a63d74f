// ============================================================
// Layer 2 - InspectUseCase
// ============================================================
// Exploration before committing to a long statistics run:
//
//   - how many classes, photos and sketches are there?
//   - how are images spread across classes?
//   - how many sketches carry each quality flag, and how many
//     would the current filter drop?
//
// Only image headers are probed; nothing is decoded, so this
// runs in seconds even on the full dataset.
//
// Also home to `show_stats`, which reads back a saved archive
// together with its label map and reports the value range each
// channel is normalized into.

use anyhow::Result;
use std::path::Path;

use crate::data::{
    metadata::{filter_sketches, QualityTable},
    scanner::{DatasetLayout, ImageRecord},
};
use crate::domain::{
    label_map::LabelMap,
    modality::Modality,
    quality::{FilterReport, QualityFilter},
    stats::{DatasetStats, CHANNELS},
    traits::StatsStore,
};
use crate::stats::{normalizer::normalized_range, StatsBackend};
use crate::infra::{
    stats_store::NpzStatsStore,
    summary::{write_summary, ClassCount},
};

#[derive(Debug, Clone)]
pub struct InspectConfig {
    pub data_root:      String,
    pub photo_dir:      String,
    pub sketch_dir:     String,
    pub quality_csv:    Option<String>,
    pub quality_filter: QualityFilter,
    pub summary_csv:    Option<String>,
}

/// What `inspect` found.
#[derive(Debug, Clone)]
pub struct InspectReport {
    /// One row per class, in label order
    pub classes: Vec<ClassCount>,
    pub photos:  usize,
    pub filter:  FilterReport,
}

impl InspectReport {
    pub fn sketches(&self) -> usize {
        self.filter.total
    }
}

pub struct InspectUseCase {
    config: InspectConfig,
}

impl InspectUseCase {
    pub fn new(config: InspectConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<InspectReport> {
        let cfg    = &self.config;
        let layout = DatasetLayout::new(&cfg.data_root, &cfg.photo_dir, &cfg.sketch_dir);
        let labels = layout.label_map()?;

        let mut classes: Vec<ClassCount> = labels
            .names()
            .iter()
            .enumerate()
            .map(|(label, name)| ClassCount { class: name.clone(), label, ..Default::default() })
            .collect();

        let photos   = scan_if_present(&layout, Modality::Photo, &labels)?;
        let sketches = scan_if_present(&layout, Modality::Sketch, &labels)?;

        for r in &photos {
            classes[r.label].photos += 1;
        }
        for r in &sketches {
            classes[r.label].sketches += 1;
        }

        let table = QualityTable::load_optional(cfg.quality_csv.as_deref())?;
        let (kept, filter) = filter_sketches(sketches, &table, &cfg.quality_filter);
        for r in &kept {
            classes[r.label].sketches_kept += 1;
        }

        if let Some(path) = &cfg.summary_csv {
            write_summary(Path::new(path), &classes)?;
        }

        Ok(InspectReport { classes, photos: photos.len(), filter })
    }
}

fn scan_if_present(
    layout:   &DatasetLayout,
    modality: Modality,
    labels:   &LabelMap,
) -> Result<Vec<ImageRecord>> {
    if layout.dir(modality).is_dir() {
        layout.scan(modality, labels)
    } else {
        Ok(Vec::new())
    }
}

/// What `show` found next to an archive.
#[derive(Debug, Clone)]
pub struct ShowReport {
    pub stats: DatasetStats,

    /// None if no labels.json sits next to the archive
    pub labels: Option<LabelMap>,

    /// Normalized value of pixels 0.0 and 1.0, per modality and channel
    pub ranges: Vec<(Modality, [(f64, f64); CHANNELS])>,
}

/// Load a complete stats archive and its label map.
pub fn show_stats(path: &str) -> Result<ShowReport> {
    let store = NpzStatsStore::new(path);
    let stats = store.load()?;

    let labels = if store.labels_path().exists() {
        Some(store.load_labels()?)
    } else {
        tracing::warn!("No label map at '{}'", store.labels_path().display());
        None
    };

    let device = Default::default();
    let ranges = Modality::ALL
        .into_iter()
        .map(|m| Ok((m, normalized_range::<StatsBackend>(stats.get(m), &device)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(ShowReport { stats, labels, ranges })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_util::write_png;
    use std::fs;
    use tempfile::TempDir;

    fn config(root: &Path) -> InspectConfig {
        InspectConfig {
            data_root:      root.to_string_lossy().into_owned(),
            photo_dir:      "photo".into(),
            sketch_dir:     "sketch".into(),
            quality_csv:    Some(root.join("q.csv").to_string_lossy().into_owned()),
            quality_filter: QualityFilter::default(),
            summary_csv:    Some(root.join("summary.csv").to_string_lossy().into_owned()),
        }
    }

    #[test]
    fn test_counts_per_class() {
        let tmp  = TempDir::new().unwrap();
        let root = tmp.path();
        write_png(&root.join("photo/cat/c1.png"),    2, [1, 1, 1]);
        write_png(&root.join("sketch/cat/c1-1.png"), 2, [1, 1, 1]);
        write_png(&root.join("sketch/cat/c1-2.png"), 2, [1, 1, 1]);
        // a class that only exists as sketches
        write_png(&root.join("sketch/owl/o1-1.png"), 2, [1, 1, 1]);
        fs::write(root.join("q.csv"), "sketch,ambiguous\nc1-2,1\n").unwrap();

        let report = InspectUseCase::new(config(root)).execute().unwrap();

        assert_eq!(report.photos, 1);
        assert_eq!(report.sketches(), 3);
        assert_eq!(report.filter.ambiguous, 1);
        assert_eq!(report.filter.kept, 2);

        assert_eq!(report.classes.len(), 2);
        let cat = &report.classes[0];
        assert_eq!((cat.photos, cat.sketches, cat.sketches_kept), (1, 2, 1));
        let owl = &report.classes[1];
        assert_eq!((owl.photos, owl.sketches, owl.sketches_kept), (0, 1, 1));

        assert!(root.join("summary.csv").exists());
    }

    #[test]
    fn test_show_reads_archive_and_labels() {
        use crate::domain::stats::ChannelStats;

        let tmp   = TempDir::new().unwrap();
        let path  = tmp.path().join("dataset_stats.npz");
        let store = NpzStatsStore::new(&path);
        let one   = ChannelStats { mean: [0.5; 3], std: [0.25; 3], scale: 2.0 };
        store.save(&DatasetStats { photo: one, sketch: one }).unwrap();

        let report = show_stats(&path.to_string_lossy()).unwrap();
        assert!(report.labels.is_none());
        assert_eq!(report.ranges.len(), 2);
        let (lo, hi) = report.ranges[0].1[0];
        assert!((lo + 1.0).abs() < 1e-6 && (hi - 1.0).abs() < 1e-6);

        store.save_labels(&LabelMap::from_names(["owl", "cat"])).unwrap();
        let labels = show_stats(&path.to_string_lossy()).unwrap().labels.unwrap();
        assert_eq!(labels.name_of(1), Some("owl"));
    }

    #[test]
    fn test_show_missing_archive_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.npz");
        assert!(show_stats(&path.to_string_lossy()).is_err());
    }
}
