use locator::{
    BoundingBox, CalibrationProfile, Detection, FocalLength, LandmarkLabel, LocationReport,
    LocatorError,
};
use std::fs;
use tempfile::tempdir;

fn detection(class_name: &str, height_px: i32) -> Detection {
    Detection::new(class_name, 0.9, BoundingBox::new(100, 200, 180, 200 + height_px))
}

/// Walks one request through identification, estimation and assembly.
///
/// Tests:
/// - Known class with positive height gets f * H / h
/// - Unknown class and zero height are reported without a distance
/// - Average uses only present samples
#[test]
fn test_report_from_default_profile() {
    let profile = CalibrationProfile::default();

    let identification = profile.landmarks.identify(4).unwrap();
    assert_eq!(identification.label, LandmarkLabel::Library);

    let estimate = profile.estimator(None).estimate(&[
        detection("120", 100),
        detection("unknown_7", 60),
        detection("200", 0),
        detection("80", 50),
    ]);

    let report = LocationReport::assemble(identification, 0.93, estimate, Some(90.0));

    assert_eq!(report.detections.len(), 4);
    let distances: Vec<Option<f64>> = report
        .detections
        .iter()
        .map(|d| d.estimated_distance_m)
        .collect();

    assert!((distances[0].unwrap() - 8.16).abs() < 1e-9);
    assert_eq!(distances[1], None, "unknown class degrades to no distance");
    assert_eq!(distances[2], None, "zero pixel height degrades to no distance");
    // 680 * 0.80 / 50 = 10.88
    assert!((distances[3].unwrap() - 10.88).abs() < 1e-9);

    let average = report.average_distance_m.unwrap();
    assert!((average - (8.16 + 10.88) / 2.0).abs() < 1e-9);

    let user = report.estimated_user_coordinates.unwrap();
    let landmark = report.coordinates.unwrap();
    assert!(user.longitude > landmark.longitude, "bearing 90 moves east");
}

/// Custom calibration tables replace the campus defaults.
#[test]
fn test_report_from_profile_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("profile.json");
    fs::write(
        &path,
        r#"{
            "focalLengthPx": 1000,
            "landmarks": { "Wuzu": { "latitude": 10.0, "longitude": 20.0 } },
            "referenceHeightsM": { "door": 2.0 }
        }"#,
    )
    .unwrap();

    let profile = CalibrationProfile::from_json_file(&path).unwrap();

    let with_coords = profile.landmarks.identify(LandmarkLabel::Wuzu.index()).unwrap();
    assert!(with_coords.coordinates.is_some());

    let without_coords = profile.landmarks.identify(LandmarkLabel::Civil.index()).unwrap();
    assert!(without_coords.coordinates.is_none());

    let estimate = profile
        .estimator(None)
        .estimate(&[detection("door", 400), detection("120", 100)]);
    // 1000 * 2.0 / 400 = 5.0 ; "120" is not in this table.
    assert_eq!(estimate.average_distance_m, Some(5.0));

    let report = LocationReport::assemble(without_coords, 0.5, estimate, None);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["coordinates"], serde_json::Value::Null);
    assert_eq!(json["averageDistanceM"], 5.0);
}

/// Per-request focal length replaces the profile value for one estimate.
#[test]
fn test_focal_override() {
    let profile = CalibrationProfile::default();
    let focal = FocalLength::new(1360.0).unwrap();

    let estimate = profile.estimator(Some(focal)).estimate(&[detection("120", 100)]);
    assert!((estimate.average_distance_m.unwrap() - 16.32).abs() < 1e-9);
}

#[test]
fn test_out_of_range_prediction() {
    let profile = CalibrationProfile::default();
    let err = profile.landmarks.identify(20).unwrap_err();
    assert!(matches!(
        err,
        LocatorError::IndexOutOfRange { index: 20, len: 9 }
    ));
}
