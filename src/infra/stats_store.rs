// ============================================================
// Layer 6 - Stats Store
// ============================================================
// Saves and restores normalization statistics as a NumPy .npz
// archive, so the training stage (Python or Rust) can load them
// with a single call.
//
// Archive entries (f64):
//
//   photo_mean    [3]      sketch_mean    [3]
//   photo_std     [3]      sketch_std     [3]
//   photo_scale   scalar   sketch_scale   scalar
//
// A channel with zero variance is stored with std 1.0, so every
// stored std is a safe divisor.
//
// Files written next to the archive:
//
//   dataset_stats.npz    ← the six values above
//   dataset_stats.json   ← the run configuration that produced them
//   labels.json          ← class name ↔ label mapping
//
// The archive is write-once, read-many: a run either writes all
// six values or nothing. A later run may reuse one modality from
// an existing archive (see load_partial).
//
// Reference: ndarray-npy crate documentation

use anyhow::{bail, Context, Result};
use ndarray::{arr0, Array0, Array1};
use ndarray_npy::{NpzReader, NpzWriter};
use serde::Serialize;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use crate::domain::label_map::LabelMap;
use crate::domain::modality::Modality;
use crate::domain::stats::{ChannelStats, DatasetStats, PartialStats};
use crate::domain::traits::StatsStore;

const FIELDS: [&str; 3] = ["mean", "std", "scale"];

/// Reads and writes the stats archive and its sidecar files.
pub struct NpzStatsStore {
    /// Path of the .npz archive
    path: PathBuf,
}

impl NpzStatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `dataset_stats.npz` → `dataset_stats.json`
    pub fn config_path(&self) -> PathBuf {
        self.path.with_extension("json")
    }

    /// `labels.json` in the same directory as the archive
    pub fn labels_path(&self) -> PathBuf {
        self.dir().join("labels.json")
    }

    fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn ensure_dir(&self) -> Result<()> {
        let dir = self.dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create directory '{}'", dir.display()))
    }

    /// Save the run configuration as pretty JSON.
    pub fn save_config<T: Serialize>(&self, cfg: &T) -> Result<()> {
        self.ensure_dir()?;
        let path = self.config_path();
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;
        tracing::debug!("Saved run config to '{}'", path.display());
        Ok(())
    }

    /// Save the label map as JSON.
    pub fn save_labels(&self, labels: &LabelMap) -> Result<()> {
        self.ensure_dir()?;
        let path = self.labels_path();
        fs::write(&path, serde_json::to_string_pretty(labels)?)
            .with_context(|| format!("Cannot write labels to '{}'", path.display()))?;
        tracing::debug!("Saved {} labels to '{}'", labels.len(), path.display());
        Ok(())
    }

    /// Load the label map written by `save_labels`.
    pub fn load_labels(&self) -> Result<LabelMap> {
        let path = self.labels_path();
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read labels from '{}'", path.display()))?;
        Ok(LabelMap::from_json(&json)?)
    }

    fn open_reader(&self) -> Result<NpzReader<File>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open stats archive '{}'", self.path.display()))?;
        NpzReader::new(file)
            .with_context(|| format!("'{}' is not a valid .npz archive", self.path.display()))
    }
}

/// Find the archive entry for `key`, with or without the `.npy` suffix.
fn entry_name(names: &[String], key: &str) -> Option<String> {
    names
        .iter()
        .find(|n| n.as_str() == key || n.strip_suffix(".npy") == Some(key))
        .cloned()
}

/// Read one modality's three entries.
/// None if none of them exist; an error if only some do.
fn read_modality(
    npz:      &mut NpzReader<File>,
    names:    &[String],
    modality: Modality,
) -> Result<Option<ChannelStats>> {
    let found: Vec<Option<String>> = FIELDS
        .iter()
        .map(|f| entry_name(names, &modality.archive_key(f)))
        .collect();

    let [Some(mean_name), Some(std_name), Some(scale_name)] = found.as_slice() else {
        if found.iter().any(Option::is_some) {
            bail!("Stats archive has incomplete {} entries", modality);
        }
        return Ok(None);
    };

    let mean: Array1<f64> = npz
        .by_name(mean_name)
        .with_context(|| format!("Cannot read '{mean_name}'"))?;
    let std: Array1<f64> = npz
        .by_name(std_name)
        .with_context(|| format!("Cannot read '{std_name}'"))?;
    let scale: Array0<f64> = npz
        .by_name(scale_name)
        .with_context(|| format!("Cannot read '{scale_name}'"))?;

    let stats = ChannelStats::from_slices(&mean.to_vec(), &std.to_vec(), scale.into_scalar())
        .with_context(|| format!("Invalid {} statistics", modality))?;
    Ok(Some(stats))
}

impl StatsStore for NpzStatsStore {
    fn save(&self, stats: &DatasetStats) -> Result<()> {
        self.ensure_dir()?;

        let file = File::create(&self.path)
            .with_context(|| format!("Cannot create '{}'", self.path.display()))?;
        let mut npz = NpzWriter::new(file);

        for modality in Modality::ALL {
            let s = stats.get(modality);
            npz.add_array(modality.archive_key("mean"),  &Array1::from(s.mean.to_vec()))?;
            npz.add_array(modality.archive_key("std"),   &Array1::from(s.std.to_vec()))?;
            npz.add_array(modality.archive_key("scale"), &arr0(s.scale))?;
        }

        npz.finish()
            .with_context(|| format!("Cannot finish '{}'", self.path.display()))?;

        tracing::info!("Saved dataset statistics to '{}'", self.path.display());
        Ok(())
    }

    fn load(&self) -> Result<DatasetStats> {
        if !self.path.exists() {
            bail!(
                "Stats archive '{}' not found. Run 'stats' first.",
                self.path.display()
            );
        }
        self.load_partial()?
            .complete()
            .with_context(|| format!("Stats archive '{}' is incomplete", self.path.display()))
    }

    fn load_partial(&self) -> Result<PartialStats> {
        if !self.path.exists() {
            return Ok(PartialStats::default());
        }

        let mut npz = self.open_reader()?;
        let names   = npz.names()?;

        let mut out = PartialStats::default();
        for modality in Modality::ALL {
            if let Some(s) = read_modality(&mut npz, &names, modality)? {
                out.set(modality, s);
            }
        }
        Ok(out)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stats() -> DatasetStats {
        DatasetStats {
            photo:  ChannelStats { mean: [0.47, 0.45, 0.40], std: [0.27, 0.26, 0.28], scale: 3.5 },
            sketch: ChannelStats { mean: [0.95, 0.95, 0.95], std: [0.20, 0.20, 0.20], scale: 4.75 },
        }
    }

    #[test]
    fn test_save_then_load() {
        let tmp   = TempDir::new().unwrap();
        let store = NpzStatsStore::new(tmp.path().join("out/dataset_stats.npz"));

        store.save(&stats()).unwrap();
        assert_eq!(store.load().unwrap(), stats());
    }

    #[test]
    fn test_archive_has_six_named_entries() {
        let tmp   = TempDir::new().unwrap();
        let store = NpzStatsStore::new(tmp.path().join("dataset_stats.npz"));
        store.save(&stats()).unwrap();

        let mut names = store.open_reader().unwrap().names().unwrap();
        for n in names.iter_mut() {
            if let Some(stripped) = n.strip_suffix(".npy") {
                *n = stripped.to_string();
            }
        }
        names.sort();
        assert_eq!(
            names,
            ["photo_mean", "photo_scale", "photo_std", "sketch_mean", "sketch_scale", "sketch_std"]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let tmp   = TempDir::new().unwrap();
        let store = NpzStatsStore::new(tmp.path().join("none.npz"));
        assert!(store.load().is_err());
        assert_eq!(store.load_partial().unwrap(), PartialStats::default());
    }

    #[test]
    fn test_load_partial_reads_single_modality() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("partial.npz");

        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("sketch_mean",  &Array1::from(vec![0.9, 0.9, 0.9])).unwrap();
        npz.add_array("sketch_std",   &Array1::from(vec![0.1, 0.1, 0.1])).unwrap();
        npz.add_array("sketch_scale", &arr0(2.0)).unwrap();
        npz.finish().unwrap();

        let store   = NpzStatsStore::new(&path);
        let partial = store.load_partial().unwrap();
        assert!(partial.photo.is_none());
        assert_eq!(partial.sketch.unwrap().scale, 2.0);
        assert!(store.load().is_err());
    }

    #[test]
    fn test_incomplete_modality_is_an_error() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("broken.npz");

        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        npz.add_array("photo_mean", &Array1::from(vec![0.5, 0.5, 0.5])).unwrap();
        npz.finish().unwrap();

        assert!(NpzStatsStore::new(&path).load_partial().is_err());
    }

    #[test]
    fn test_wrong_channel_count_is_an_error() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("short.npz");

        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        for m in Modality::ALL {
            let mean = if m == Modality::Photo { vec![0.5, 0.5] } else { vec![0.5; 3] };
            npz.add_array(m.archive_key("mean"),  &Array1::from(mean)).unwrap();
            npz.add_array(m.archive_key("std"),   &Array1::from(vec![0.2; 3])).unwrap();
            npz.add_array(m.archive_key("scale"), &arr0(1.5)).unwrap();
        }
        npz.finish().unwrap();

        let err = NpzStatsStore::new(&path).load().unwrap_err();
        assert!(format!("{err:#}").contains("photo"), "{err:#}");
    }

    #[test]
    fn test_sidecar_paths_and_labels() {
        let tmp   = TempDir::new().unwrap();
        let store = NpzStatsStore::new(tmp.path().join("dataset_stats.npz"));

        assert_eq!(store.config_path(), tmp.path().join("dataset_stats.json"));
        assert_eq!(store.labels_path(), tmp.path().join("labels.json"));

        let labels = LabelMap::from_names(["dog", "cat"]);
        store.save_labels(&labels).unwrap();
        assert_eq!(store.load_labels().unwrap().label_of("dog"), Some(1));
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        let store = NpzStatsStore::new("dataset_stats.npz");
        assert_eq!(store.labels_path(), PathBuf::from("./labels.json"));
    }
}
