use crate::detection::BoundingBox;
use crate::distance::{DistanceEstimate, RangedDetection};
use crate::geo::{DEFAULT_BEARING_DEG, GeoCoordinate, destination_point};
use crate::landmark::{Identification, LandmarkLabel};
use serde::{Deserialize, Serialize};

/// Response body of a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationReport {
    pub predicted_label: LandmarkLabel,
    pub label_confidence: f32,
    pub coordinates: Option<GeoCoordinate>,
    pub detections: Vec<ReportedDetection>,
    pub average_distance_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_user_coordinates: Option<GeoCoordinate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedDetection {
    pub class_name: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub height_px: i32,
    pub estimated_distance_m: Option<f64>,
}

impl From<RangedDetection> for ReportedDetection {
    fn from(ranged: RangedDetection) -> Self {
        let estimated_distance_m = ranged.estimated_distance_m();
        let height_px = ranged.detection.height_px();
        Self {
            class_name: ranged.detection.class_name,
            confidence: ranged.detection.confidence,
            bbox: ranged.detection.bbox,
            height_px,
            estimated_distance_m,
        }
    }
}

impl LocationReport {
    /// Combine the identified landmark and the distance estimate into one
    /// response.
    ///
    /// When both the landmark coordinate and an average distance are known,
    /// the observer's position is projected from the landmark along
    /// `bearing_deg` (due south when absent).
    pub fn assemble(
        identification: Identification,
        label_confidence: f32,
        estimate: DistanceEstimate,
        bearing_deg: Option<f64>,
    ) -> Self {
        let estimated_user_coordinates = identification
            .coordinates
            .zip(estimate.average_distance_m)
            .map(|(landmark, distance_m)| {
                destination_point(
                    landmark,
                    distance_m,
                    bearing_deg.unwrap_or(DEFAULT_BEARING_DEG),
                )
            });

        Self {
            predicted_label: identification.label,
            label_confidence,
            coordinates: identification.coordinates,
            detections: estimate.detections.into_iter().map(Into::into).collect(),
            average_distance_m: estimate.average_distance_m,
            estimated_user_coordinates,
        }
    }
}
