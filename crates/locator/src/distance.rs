//! Pinhole-camera distance estimation.
//!
//! An object of known height `H` metres that appears `h` pixels tall through
//! a lens with focal length `f` pixels sits roughly `f * H / h` metres away.

use crate::detection::Detection;
use crate::errors::LocatorError;
use crate::heights::ReferenceHeightTable;
use serde::{Deserialize, Serialize};

/// Focal length in pixels. Always positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct FocalLength(f64);

impl FocalLength {
    /// Calibrated for the phone the reference photos were taken with.
    pub const DEFAULT_PX: f64 = 680.0;

    pub fn new(px: f64) -> Result<Self, LocatorError> {
        if px.is_finite() && px > 0.0 {
            Ok(Self(px))
        } else {
            Err(LocatorError::InvalidFocalLength(px))
        }
    }

    pub fn px(&self) -> f64 {
        self.0
    }
}

impl Default for FocalLength {
    fn default() -> Self {
        Self(Self::DEFAULT_PX)
    }
}

impl TryFrom<f64> for FocalLength {
    type Error = LocatorError;

    fn try_from(px: f64) -> Result<Self, Self::Error> {
        Self::new(px)
    }
}

impl From<FocalLength> for f64 {
    fn from(f: FocalLength) -> Self {
        f.0
    }
}

/// Why a detection did or did not yield a distance sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceOutcome {
    Estimated(f64),
    /// The class has no entry in the reference height table.
    MissingReferenceHeight,
    /// The box has no vertical extent.
    ZeroPixelHeight,
}

impl DistanceOutcome {
    pub fn distance_m(&self) -> Option<f64> {
        match self {
            DistanceOutcome::Estimated(d) => Some(*d),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangedDetection {
    pub detection: Detection,
    pub outcome: DistanceOutcome,
}

impl RangedDetection {
    pub fn estimated_distance_m(&self) -> Option<f64> {
        self.outcome.distance_m()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistanceEstimate {
    /// One entry per input detection, in input order.
    pub detections: Vec<RangedDetection>,
    /// Mean of the present samples; `None` when there are none.
    pub average_distance_m: Option<f64>,
}

impl DistanceEstimate {
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.detections.iter().filter_map(|d| d.estimated_distance_m())
    }
}

pub struct DistanceEstimator<'a> {
    heights: &'a ReferenceHeightTable,
    focal_length: FocalLength,
}

impl<'a> DistanceEstimator<'a> {
    pub fn new(heights: &'a ReferenceHeightTable, focal_length: FocalLength) -> Self {
        Self {
            heights,
            focal_length,
        }
    }

    pub fn focal_length(&self) -> FocalLength {
        self.focal_length
    }

    pub fn range(&self, detection: &Detection) -> DistanceOutcome {
        let Some(real_height_m) = self.heights.get(&detection.class_name) else {
            tracing::debug!(
                class_name = %detection.class_name,
                confidence = detection.confidence,
                "No known height for distance calculation"
            );
            return DistanceOutcome::MissingReferenceHeight;
        };

        let height_px = detection.height_px();
        if height_px <= 0 {
            tracing::warn!(
                class_name = %detection.class_name,
                height_px,
                "Pixel height is not positive, cannot calculate distance"
            );
            return DistanceOutcome::ZeroPixelHeight;
        }

        let distance_m = self.focal_length.px() * real_height_m / f64::from(height_px);
        tracing::debug!(
            class_name = %detection.class_name,
            height_px,
            real_height_m,
            distance_m,
            "Estimated distance"
        );
        DistanceOutcome::Estimated(distance_m)
    }

    pub fn estimate(&self, detections: &[Detection]) -> DistanceEstimate {
        let detections: Vec<RangedDetection> = detections
            .iter()
            .map(|d| RangedDetection {
                detection: d.clone(),
                outcome: self.range(d),
            })
            .collect();

        let (sum, count) = detections
            .iter()
            .filter_map(RangedDetection::estimated_distance_m)
            .fold((0.0, 0usize), |(sum, n), d| (sum + d, n + 1));

        let average_distance_m = (count > 0).then(|| sum / count as f64);

        DistanceEstimate {
            detections,
            average_distance_m,
        }
    }
}

/// Invert the distance relation for a reference photo taken `distance_m`
/// away from an object of `real_height_m` that appeared `height_px` tall.
pub fn focal_length_from_observation(
    height_px: i32,
    real_height_m: f64,
    distance_m: f64,
) -> Option<FocalLength> {
    if height_px <= 0 || !(real_height_m.is_finite() && real_height_m > 0.0) {
        return None;
    }
    FocalLength::new(f64::from(height_px) * distance_m / real_height_m).ok()
}
