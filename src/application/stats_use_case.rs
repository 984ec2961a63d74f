// ============================================================
// Layer 2 - StatsUseCase
// ============================================================
// Orchestrates a statistics run in order:
//
//   Step 0: Validate the configuration
//   Step 1: Build the label map            (Layer 4 - data)
//   Step 2: Plan which modalities to run   (flags + old archive)
//   Step 3: Scan + filter each modality    (Layer 4 - data)
//   Step 4: Run the three passes           (Layer 5 - stats)
//   Step 5: Save archive, config, labels   (Layer 6 - infra)
//
// A modality switched off by its flag is reused from the
// archive already at the output path. If it is neither computed
// nor available there, the run stops before any pass starts, so
// a long computation is never thrown away at save time.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{ImageDataset, MAX_IMAGE_SIZE},
    metadata::{filter_sketches, QualityTable},
    scanner::DatasetLayout,
};
use crate::domain::{
    label_map::LabelMap,
    modality::Modality,
    quality::QualityFilter,
    stats::{ChannelStats, DatasetStats, PartialStats},
    traits::StatsStore,
};
use crate::infra::stats_store::NpzStatsStore;
use crate::stats::{accumulator::compute_channel_stats, loader::build_loader, StatsBackend};

// ─── Run Configuration ───────────────────────────────────────────────────────
// Every knob of a statistics run. Saved next to the archive so
// the numbers can always be traced back to how they were made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    pub data_root:      String,
    pub photo_dir:      String,
    pub sketch_dir:     String,
    pub quality_csv:    Option<String>,
    pub output:         String,
    pub image_size:     u32,
    pub batch_size:     usize,
    pub num_workers:    usize,
    pub compute_photo:  bool,
    pub compute_sketch: bool,
    pub quality_filter: QualityFilter,
    pub max_samples:    Option<usize>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            data_root:      "data".to_string(),
            photo_dir:      "photo".to_string(),
            sketch_dir:     "sketch".to_string(),
            quality_csv:    None,
            output:         "dataset_stats.npz".to_string(),
            image_size:     256,
            batch_size:     64,
            num_workers:    4,
            compute_photo:  true,
            compute_sketch: true,
            quality_filter: QualityFilter::default(),
            max_samples:    None,
        }
    }
}

impl StatsConfig {
    /// Reject values that would make the passes meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.image_size == 0 || self.image_size > MAX_IMAGE_SIZE {
            bail!("image_size must be between 1 and {MAX_IMAGE_SIZE}, got {}", self.image_size);
        }
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.max_samples == Some(0) {
            bail!("max_samples must be at least 1");
        }
        Ok(())
    }

    fn enabled(&self, modality: Modality) -> bool {
        match modality {
            Modality::Photo  => self.compute_photo,
            Modality::Sketch => self.compute_sketch,
        }
    }
}

// ─── StatsUseCase ─────────────────────────────────────────────────────────────
pub struct StatsUseCase {
    config: StatsConfig,
}

impl StatsUseCase {
    pub fn new(config: StatsConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline and return the saved statistics.
    pub fn execute(&self) -> Result<DatasetStats> {
        let cfg    = &self.config;
        let layout = DatasetLayout::new(&cfg.data_root, &cfg.photo_dir, &cfg.sketch_dir);
        let store  = NpzStatsStore::new(&cfg.output);

        // ── Step 0: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 1: Label map ─────────────────────────────────────────────────
        let labels = layout.label_map()?;

        // ── Step 2: Plan ──────────────────────────────────────────────────────
        let mut stats = self.plan(&store)?;

        // ── Steps 3-4: Compute each enabled modality ──────────────────────────
        for modality in Modality::ALL {
            if !cfg.enabled(modality) {
                continue;
            }
            let s = self.compute_modality(&layout, &labels, modality)?;
            tracing::info!(
                "{} stats: mean={:?} std={:?} scale={:.4}",
                modality, s.mean, s.std, s.scale
            );
            stats.set(modality, s);
        }

        // ── Step 5: Persist ───────────────────────────────────────────────────
        let stats = stats.complete()?;
        store.save(&stats)?;
        store.save_config(cfg)?;
        store.save_labels(&labels)?;

        Ok(stats)
    }

    /// Load reusable stats for disabled modalities and check that
    /// every modality will have a value once the run finishes.
    fn plan(&self, store: &NpzStatsStore) -> Result<PartialStats> {
        let cfg = &self.config;

        if cfg.compute_photo && cfg.compute_sketch {
            return Ok(PartialStats::default());
        }

        let existing = store.load_partial()?;
        let mut plan = PartialStats::default();

        for modality in Modality::ALL {
            if cfg.enabled(modality) {
                continue;
            }
            match existing.get(modality) {
                Some(s) => {
                    tracing::info!(
                        "Reusing {} stats from '{}'",
                        modality,
                        store.path().display()
                    );
                    plan.set(modality, *s);
                }
                None => bail!(
                    "{} statistics are disabled but '{}' has none to reuse",
                    modality,
                    store.path().display()
                ),
            }
        }

        Ok(plan)
    }

    fn compute_modality(
        &self,
        layout:   &DatasetLayout,
        labels:   &LabelMap,
        modality: Modality,
    ) -> Result<ChannelStats> {
        let cfg = &self.config;

        tracing::info!("Computing {} statistics", modality);
        let mut records = layout.scan(modality, labels)?;

        if modality == Modality::Sketch {
            let table = QualityTable::load_optional(cfg.quality_csv.as_deref())?;
            let (kept, report) = filter_sketches(records, &table, &cfg.quality_filter);
            tracing::info!(
                "Quality filter kept {} of {} sketches \
                 (error={}, context={}, ambiguous={}, wrong_pose={})",
                report.kept, report.total,
                report.error, report.context, report.ambiguous, report.wrong_pose,
            );
            records = kept;
        }

        let dataset  = ImageDataset::new(records, cfg.image_size).with_limit(cfg.max_samples);
        let expected = burn::data::dataset::Dataset::len(&dataset);
        if expected == 0 {
            bail!("No {} images to compute statistics from", modality);
        }

        let loader = build_loader::<StatsBackend>(
            dataset,
            cfg.batch_size,
            cfg.num_workers,
            Default::default(),
        );

        compute_channel_stats(loader.as_ref(), expected)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_util::write_png;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// photo: two white images; sketch: one black, one white (flagged)
    fn dataset(root: &Path) {
        write_png(&root.join("photo/cat/c1.png"),   4, [255, 255, 255]);
        write_png(&root.join("photo/dog/d1.png"),   4, [255, 255, 255]);
        write_png(&root.join("sketch/cat/c1-1.png"), 4, [0, 0, 0]);
        write_png(&root.join("sketch/dog/d1-1.png"), 4, [255, 255, 255]);
        fs::write(
            root.join("quality.csv"),
            "sketch,error,context,ambiguous,wrong_pose\nd1-1,1,0,0,0\n",
        )
        .unwrap();
    }

    fn config(root: &Path) -> StatsConfig {
        StatsConfig {
            data_root:   root.to_string_lossy().into_owned(),
            quality_csv: Some(root.join("quality.csv").to_string_lossy().into_owned()),
            output:      root.join("out/dataset_stats.npz").to_string_lossy().into_owned(),
            image_size:  4,
            batch_size:  1,
            num_workers: 1,
            ..StatsConfig::default()
        }
    }

    #[test]
    fn test_full_run_writes_all_files() {
        let tmp = TempDir::new().unwrap();
        dataset(tmp.path());
        let cfg = config(tmp.path());

        let stats = StatsUseCase::new(cfg.clone()).execute().unwrap();

        // photos are pure white
        assert!(stats.photo.mean.iter().all(|m| (m - 1.0).abs() < 1e-6));
        // the white sketch is flagged, only the black one remains
        assert!(stats.sketch.mean.iter().all(|m| m.abs() < 1e-6));

        let store = NpzStatsStore::new(&cfg.output);
        assert_eq!(store.load().unwrap(), stats);
        assert!(store.config_path().exists());
        assert_eq!(store.load_labels().unwrap().len(), 2);
    }

    #[test]
    fn test_without_filter_both_sketches_count() {
        let tmp = TempDir::new().unwrap();
        dataset(tmp.path());
        let cfg = StatsConfig { quality_filter: QualityFilter::keep_all(), ..config(tmp.path()) };

        let stats = StatsUseCase::new(cfg).execute().unwrap();
        assert!(stats.sketch.mean.iter().all(|m| (m - 0.5).abs() < 1e-6));
        assert!(stats.sketch.std.iter().all(|s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_skipped_modality_is_reused() {
        let tmp = TempDir::new().unwrap();
        dataset(tmp.path());
        let first = StatsUseCase::new(config(tmp.path())).execute().unwrap();

        // replace the photos; a photo-skipping run must keep the old values
        write_png(&tmp.path().join("photo/cat/c1.png"), 4, [0, 0, 0]);
        let cfg    = StatsConfig { compute_photo: false, ..config(tmp.path()) };
        let second = StatsUseCase::new(cfg).execute().unwrap();

        assert_eq!(second.photo, first.photo);
    }

    #[test]
    fn test_skipped_modality_without_archive_fails() {
        let tmp = TempDir::new().unwrap();
        dataset(tmp.path());
        let cfg = StatsConfig { compute_sketch: false, ..config(tmp.path()) };

        let err = StatsUseCase::new(cfg.clone()).execute().unwrap_err().to_string();
        assert!(err.contains("sketch"));
        assert!(!Path::new(&cfg.output).exists());
    }

    #[test]
    fn test_everything_filtered_is_an_error() {
        let tmp = TempDir::new().unwrap();
        dataset(tmp.path());
        fs::write(
            tmp.path().join("quality.csv"),
            "sketch,error,context,ambiguous,wrong_pose\nc1-1,0,1,0,0\nd1-1,1,0,0,0\n",
        )
        .unwrap();

        assert!(StatsUseCase::new(config(tmp.path())).execute().is_err());
    }

    #[test]
    fn test_invalid_config_fails_before_any_pass() {
        let tmp = TempDir::new().unwrap();
        dataset(tmp.path());

        for cfg in [
            StatsConfig { image_size: 0, ..config(tmp.path()) },
            StatsConfig { image_size: MAX_IMAGE_SIZE + 1, ..config(tmp.path()) },
            StatsConfig { batch_size: 0, ..config(tmp.path()) },
            StatsConfig { max_samples: Some(0), ..config(tmp.path()) },
        ] {
            assert!(StatsUseCase::new(cfg.clone()).execute().is_err());
            assert!(!Path::new(&cfg.output).exists());
        }
        assert!(config(tmp.path()).validate().is_ok());
    }

    #[test]
    fn test_config_json_roundtrip() {
        let cfg  = StatsConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: StatsConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.output, "dataset_stats.npz");
        assert_eq!(back.quality_filter, QualityFilter::default());
    }
}
