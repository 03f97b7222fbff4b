//! Focal-length calibration from reference photos taken at a measured
//! distance.

use locator::{Detection, FocalLength, ReferenceHeightTable, focal_length_from_observation};

/// One focal-length estimate from one detected reference object.
#[derive(Debug, Clone, PartialEq)]
pub struct FocalSample {
    pub class_name: String,
    pub height_px: i32,
    pub focal_length: FocalLength,
}

/// Turn the detections of a photo taken `distance_m` away into focal-length
/// samples. Detections without a known height, with a degenerate box, or
/// outside `class_filter` yield nothing.
pub fn focal_samples(
    detections: &[Detection],
    heights: &ReferenceHeightTable,
    distance_m: f64,
    class_filter: Option<&str>,
) -> Vec<FocalSample> {
    detections
        .iter()
        .filter(|d| class_filter.is_none_or(|class| d.class_name == class))
        .filter_map(|d| {
            let real_height_m = heights.get(&d.class_name)?;
            let focal_length =
                focal_length_from_observation(d.height_px(), real_height_m, distance_m)?;
            Some(FocalSample {
                class_name: d.class_name.clone(),
                height_px: d.height_px(),
                focal_length,
            })
        })
        .collect()
}

pub fn mean_focal_length(samples: &[FocalSample]) -> Option<FocalLength> {
    if samples.is_empty() {
        return None;
    }
    let sum: f64 = samples.iter().map(|s| s.focal_length.px()).sum();
    FocalLength::new(sum / samples.len() as f64).ok()
}
