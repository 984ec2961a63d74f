// ============================================================
// Layer 3 - Label Map
// ============================================================
// Maps class names (directory names such as "airplane") to the
// integer labels a classifier is trained against, and back.
//
// Labels are assigned by sorting the class names, so the same
// set of class directories always produces the same mapping no
// matter what order the filesystem returns them in. The map is
// saved next to the statistics so the training stage uses the
// exact same indices.
//
//   ["cat", "airplane", "zebra"]  →  airplane=0, cat=1, zebra=2

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Bidirectional class name ↔ label mapping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelMap {
    /// Class names indexed by label
    names: Vec<String>,

    /// Reverse lookup, rebuilt after deserialisation
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LabelMap {
    /// Build a map from any collection of class names.
    /// Duplicates are merged; order of the input does not matter.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        Self::from_sorted(sorted.into_iter().collect())
    }

    fn from_sorted(names: Vec<String>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, index }
    }

    /// Label of a class name, if the class is known.
    pub fn label_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Class name of a label, if the label is in range.
    pub fn name_of(&self, label: usize) -> Option<&str> {
        self.names.get(label).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Parse a map previously written with `serde_json`.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let parsed: LabelMap = serde_json::from_str(json)?;
        Ok(Self::from_sorted(parsed.names))
    }
}
