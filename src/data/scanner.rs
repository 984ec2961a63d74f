// ============================================================
// Layer 4 - Dataset Scanner
// ============================================================
// Walks the on-disk dataset and produces one ImageRecord per
// usable image file.
//
// Expected layout:
//
//   <root>/
//     photo/
//       airplane/  n02691156_58.jpg  n02691156_196.jpg ...
//       cat/       ...
//     sketch/
//       airplane/  n02691156_58-1.png  n02691156_58-2.png ...
//       cat/       ...
//
// Class names are the sub-directory names. The scan is fully
// deterministic: classes and files are visited in sorted order,
// so two runs over the same tree produce the same record list.
//
// Each file's header is probed with `image::image_dimensions`
// (cheap, no full decode). Files that cannot be probed are
// skipped with a warning instead of failing the whole scan.

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::label_map::LabelMap;
use crate::domain::modality::Modality;

/// File extensions accepted as images (compared lowercase)
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// One image file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Full path to the image file
    pub path: PathBuf,

    /// Integer class label from the LabelMap
    pub label: usize,

    /// Class directory name
    pub class_name: String,

    /// File stem, used to look up sketch quality flags
    pub key: String,
}

/// Location of the two modality trees under a dataset root.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root:       PathBuf,
    photo_dir:  String,
    sketch_dir: String,
}

impl DatasetLayout {
    pub fn new(
        root:       impl Into<PathBuf>,
        photo_dir:  impl Into<String>,
        sketch_dir: impl Into<String>,
    ) -> Self {
        Self {
            root:       root.into(),
            photo_dir:  photo_dir.into(),
            sketch_dir: sketch_dir.into(),
        }
    }

    /// Directory holding the class folders of one modality
    pub fn dir(&self, modality: Modality) -> PathBuf {
        match modality {
            Modality::Photo  => self.root.join(&self.photo_dir),
            Modality::Sketch => self.root.join(&self.sketch_dir),
        }
    }

    /// Build the label map from the class folders of every
    /// modality directory that exists. Fails if none exists.
    pub fn label_map(&self) -> Result<LabelMap> {
        let mut names = Vec::new();
        let mut found = false;

        for modality in Modality::ALL {
            let dir = self.dir(modality);
            if !dir.is_dir() {
                tracing::warn!("No {} directory at '{}'", modality, dir.display());
                continue;
            }
            found = true;
            names.extend(class_names(&dir)?);
        }

        if !found {
            bail!(
                "Neither photo nor sketch directory found under '{}'",
                self.root.display()
            );
        }

        let map = LabelMap::from_names(names);
        if map.is_empty() {
            bail!("No class directories found under '{}'", self.root.display());
        }
        tracing::info!("Found {} classes", map.len());
        Ok(map)
    }

    /// Scan one modality and return its images in sorted order.
    pub fn scan(&self, modality: Modality, labels: &LabelMap) -> Result<Vec<ImageRecord>> {
        let dir = self.dir(modality);
        if !dir.is_dir() {
            bail!("{} directory '{}' does not exist", modality, dir.display());
        }

        let mut records = Vec::new();

        for class in class_names(&dir)? {
            let Some(label) = labels.label_of(&class) else {
                tracing::warn!("Class '{}' is not in the label map - skipping", class);
                continue;
            };

            for path in image_files(&dir.join(&class))? {
                if let Err(e) = image::image_dimensions(&path) {
                    tracing::warn!("Skipping '{}': {}", path.display(), e);
                    continue;
                }

                // the stem is the quality lookup key; a lossy key would
                // silently miss its flags
                let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                    tracing::warn!("Skipping '{}': file name is not valid UTF-8", path.display());
                    continue;
                };

                records.push(ImageRecord {
                    path,
                    label,
                    class_name: class.clone(),
                    key,
                });
            }
        }

        tracing::info!("Scanned {} {} images in '{}'", records.len(), modality, dir.display());
        Ok(records)
    }
}

/// Sorted names of the immediate sub-directories of `dir`.
pub fn class_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }

    names.sort();
    Ok(names)
}

/// Sorted image files directly inside `dir`.
fn image_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)
        .with_context(|| format!("Cannot read directory '{}'", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        } else {
            tracing::debug!("Ignoring '{}'", path.display());
        }
    }

    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
