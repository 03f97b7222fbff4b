use crate::errors::LocatorError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Real-world height, in metres, of each detector class usable as a distance
/// reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct ReferenceHeightTable {
    heights_m: BTreeMap<String, f64>,
}

/// How a detector's label set lines up with the height table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelCoverage {
    /// Table entries the detector can never emit.
    pub unused_entries: Vec<String>,
    /// Detector classes with no known height.
    pub unmeasured_classes: Vec<String>,
}

impl LabelCoverage {
    pub fn is_exact(&self) -> bool {
        self.unused_entries.is_empty() && self.unmeasured_classes.is_empty()
    }
}

impl ReferenceHeightTable {
    pub fn try_new(
        heights_m: impl IntoIterator<Item = (String, f64)>,
    ) -> Result<Self, LocatorError> {
        let heights_m: BTreeMap<String, f64> = heights_m.into_iter().collect();

        if let Some((class_name, &height_m)) = heights_m
            .iter()
            .find(|(_, h)| !(h.is_finite() && **h > 0.0))
        {
            return Err(LocatorError::InvalidReferenceHeight {
                class_name: class_name.clone(),
                height_m,
            });
        }

        Ok(Self { heights_m })
    }

    pub fn get(&self, class_name: &str) -> Option<f64> {
        self.heights_m.get(class_name).copied()
    }

    pub fn len(&self) -> usize {
        self.heights_m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights_m.is_empty()
    }

    /// Class names ordered from shortest to tallest reference object.
    pub fn classes_by_height(&self) -> Vec<String> {
        let mut entries: Vec<(&String, f64)> =
            self.heights_m.iter().map(|(k, v)| (k, *v)).collect();
        entries.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        entries.into_iter().map(|(k, _)| k.clone()).collect()
    }

    /// Compare against the class names a detector was trained with.
    pub fn coverage<S: AsRef<str>>(&self, detector_classes: &[S]) -> LabelCoverage {
        let detector: BTreeSet<&str> = detector_classes.iter().map(AsRef::as_ref).collect();

        let unused_entries = self
            .heights_m
            .keys()
            .filter(|k| !detector.contains(k.as_str()))
            .cloned()
            .collect();

        let unmeasured_classes = detector
            .iter()
            .filter(|c| !self.heights_m.contains_key(**c))
            .map(|c| c.to_string())
            .collect();

        LabelCoverage {
            unused_entries,
            unmeasured_classes,
        }
    }
}

impl TryFrom<BTreeMap<String, f64>> for ReferenceHeightTable {
    type Error = LocatorError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::try_new(map)
    }
}

impl From<ReferenceHeightTable> for BTreeMap<String, f64> {
    fn from(table: ReferenceHeightTable) -> Self {
        table.heights_m
    }
}

impl Default for ReferenceHeightTable {
    fn default() -> Self {
        let heights_m = [
            ("80", 0.80),
            ("120", 1.20),
            ("140", 1.40),
            ("160", 1.60),
            ("200", 2.00),
            ("210", 2.10),
            ("220", 2.20),
            ("380", 3.80),
            ("650", 8.50),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self { heights_m }
    }
}
