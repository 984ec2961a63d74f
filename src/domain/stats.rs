// ============================================================
// Layer 3 - Normalization Statistics
// ============================================================
// The values the whole pipeline exists to produce.
//
// For each modality:
//   mean[c]  - average pixel value of channel c over every
//              pixel of every image (pixels scaled to [0, 1])
//   std[c]   - population standard deviation of channel c
//   scale    - largest |value| seen after (x - mean) / std,
//              so dividing by it maps the data into [-1, 1]
//
// Training then feeds the model ((x - mean) / std) / scale.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::domain::modality::Modality;

/// Number of colour channels; every image is converted to RGB.
pub const CHANNELS: usize = 3;

/// Statistics for one modality.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean:  [f64; CHANNELS],
    pub std:   [f64; CHANNELS],
    pub scale: f64,
}

impl ChannelStats {
    /// Build from slices, checking the channel count.
    pub fn from_slices(mean: &[f64], std: &[f64], scale: f64) -> Result<Self> {
        if mean.len() != CHANNELS || std.len() != CHANNELS {
            bail!(
                "expected {CHANNELS} channels, got mean={} std={}",
                mean.len(),
                std.len()
            );
        }
        let mut m = [0.0; CHANNELS];
        let mut s = [0.0; CHANNELS];
        m.copy_from_slice(mean);
        s.copy_from_slice(std);
        Ok(Self { mean: m, std: s, scale })
    }
}

/// The six persisted values: stats for both modalities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub photo:  ChannelStats,
    pub sketch: ChannelStats,
}

impl DatasetStats {
    pub fn get(&self, modality: Modality) -> &ChannelStats {
        match modality {
            Modality::Photo  => &self.photo,
            Modality::Sketch => &self.sketch,
        }
    }
}

/// Stats where either modality may still be missing.
/// Used while merging freshly computed values with a previous archive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartialStats {
    pub photo:  Option<ChannelStats>,
    pub sketch: Option<ChannelStats>,
}

impl PartialStats {
    pub fn get(&self, modality: Modality) -> Option<&ChannelStats> {
        match modality {
            Modality::Photo  => self.photo.as_ref(),
            Modality::Sketch => self.sketch.as_ref(),
        }
    }

    pub fn set(&mut self, modality: Modality, stats: ChannelStats) {
        match modality {
            Modality::Photo  => self.photo  = Some(stats),
            Modality::Sketch => self.sketch = Some(stats),
        }
    }

    /// Convert to complete stats, or fail naming the missing modality.
    pub fn complete(self) -> Result<DatasetStats> {
        match (self.photo, self.sketch) {
            (Some(photo), Some(sketch)) => Ok(DatasetStats { photo, sketch }),
            (None, _) => bail!("photo statistics are missing"),
            (_, None) => bail!("sketch statistics are missing"),
        }
    }
}
