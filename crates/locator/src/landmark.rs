use crate::errors::LocatorError;
use crate::geo::GeoCoordinate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The landmarks the classifier was trained on, in output-index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LandmarkLabel {
    #[serde(rename = "Civil")]
    Civil,
    #[serde(rename = "CS")]
    Cs,
    #[serde(rename = "EE")]
    Ee,
    #[serde(rename = "Gate 5")]
    Gate5,
    #[serde(rename = "Library")]
    Library,
    #[serde(rename = "Main")]
    Main,
    #[serde(rename = "NB")]
    Nb,
    #[serde(rename = "Old cafe")]
    OldCafe,
    #[serde(rename = "Wuzu")]
    Wuzu,
}

impl LandmarkLabel {
    pub const ALL: [LandmarkLabel; 9] = [
        LandmarkLabel::Civil,
        LandmarkLabel::Cs,
        LandmarkLabel::Ee,
        LandmarkLabel::Gate5,
        LandmarkLabel::Library,
        LandmarkLabel::Main,
        LandmarkLabel::Nb,
        LandmarkLabel::OldCafe,
        LandmarkLabel::Wuzu,
    ];

    /// Map a classifier output index to its label.
    pub fn from_index(index: usize) -> Result<Self, LocatorError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(LocatorError::IndexOutOfRange {
                index,
                len: Self::ALL.len(),
            })
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LandmarkLabel::Civil => "Civil",
            LandmarkLabel::Cs => "CS",
            LandmarkLabel::Ee => "EE",
            LandmarkLabel::Gate5 => "Gate 5",
            LandmarkLabel::Library => "Library",
            LandmarkLabel::Main => "Main",
            LandmarkLabel::Nb => "NB",
            LandmarkLabel::OldCafe => "Old cafe",
            LandmarkLabel::Wuzu => "Wuzu",
        }
    }
}

impl fmt::Display for LandmarkLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LandmarkLabel {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| LocatorError::UnknownLandmark(s.to_string()))
    }
}

/// Known coordinate of each landmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkTable {
    coordinates: BTreeMap<LandmarkLabel, GeoCoordinate>,
}

/// Outcome of resolving a classifier prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Identification {
    pub label: LandmarkLabel,
    /// `None` when the table has no entry for the label.
    pub coordinates: Option<GeoCoordinate>,
}

impl LandmarkTable {
    pub fn new(coordinates: impl IntoIterator<Item = (LandmarkLabel, GeoCoordinate)>) -> Self {
        Self {
            coordinates: coordinates.into_iter().collect(),
        }
    }

    pub fn get(&self, label: LandmarkLabel) -> Option<GeoCoordinate> {
        self.coordinates.get(&label).copied()
    }

    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// Resolve a classifier output index.
    ///
    /// An index outside the label enumeration is an error for the request.
    /// A known label without a table entry yields `coordinates: None`.
    pub fn identify(&self, predicted_index: usize) -> Result<Identification, LocatorError> {
        let label = LandmarkLabel::from_index(predicted_index)?;
        let coordinates = self.get(label);

        if coordinates.is_none() {
            tracing::warn!(label = %label, "Coordinates not found for predicted landmark");
        }

        Ok(Identification { label, coordinates })
    }
}

impl Default for LandmarkTable {
    fn default() -> Self {
        Self::new([
            (
                LandmarkLabel::Civil,
                GeoCoordinate::new(31.481986801343748, 74.30364459192805),
            ),
            (
                LandmarkLabel::Cs,
                GeoCoordinate::new(31.48115970726234, 74.30288450189659),
            ),
            (
                LandmarkLabel::Ee,
                GeoCoordinate::new(31.48106738002753, 74.3033040174629),
            ),
            (
                LandmarkLabel::Gate5,
                GeoCoordinate::new(31.48079536833649, 74.30415120439103),
            ),
            (
                LandmarkLabel::Library,
                GeoCoordinate::new(31.481559513821388, 74.30379489883944),
            ),
            (
                LandmarkLabel::Main,
                GeoCoordinate::new(31.4816111, 74.3029722),
            ),
            (
                LandmarkLabel::Nb,
                GeoCoordinate::new(31.480306772468865, 74.30395136592784),
            ),
            (
                LandmarkLabel::OldCafe,
                GeoCoordinate::new(31.481028590362214, 74.30391442211119),
            ),
            (
                LandmarkLabel::Wuzu,
                GeoCoordinate::new(31.481380587602427, 74.30330995882208),
            ),
        ])
    }
}
