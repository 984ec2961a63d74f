// ============================================================
// Layer 3 - Modality Domain Type
// ============================================================
// The dataset pairs two kinds of image for every class:
//
//   Photo  - a real photograph of an object
//   Sketch - a hand-drawn sketch of the same object
//
// Both modalities share the same classes but are stored in
// separate directory trees and get separate statistics,
// because a sketch (mostly white paper, thin dark strokes)
// has a very different pixel distribution from a photo.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two image modalities in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Photo,
    Sketch,
}

impl Modality {
    /// Both modalities, in the order they are processed and saved.
    pub const ALL: [Modality; 2] = [Modality::Photo, Modality::Sketch];

    /// Lowercase name, used for directory defaults and archive keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Photo  => "photo",
            Modality::Sketch => "sketch",
        }
    }

    /// Name of an entry in the stats archive for this modality,
    /// e.g. `photo_mean` or `sketch_scale`.
    pub fn archive_key(&self, field: &str) -> String {
        format!("{}_{}", self.as_str(), field)
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
