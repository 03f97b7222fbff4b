use crate::distance::{DistanceEstimator, FocalLength};
use crate::errors::LocatorError;
use crate::heights::ReferenceHeightTable;
use crate::landmark::LandmarkTable;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Every static input of the locator: camera focal length plus the landmark
/// and reference-height tables.
///
/// Loaded once at startup and shared read-only between requests. Fields left
/// out of a JSON profile fall back to the built-in campus defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalibrationProfile {
    pub focal_length_px: FocalLength,
    pub landmarks: LandmarkTable,
    pub reference_heights_m: ReferenceHeightTable,
}

impl CalibrationProfile {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LocatorError> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, LocatorError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn write_json_file(&self, path: impl AsRef<Path>) -> Result<(), LocatorError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Estimator for this profile, optionally with a per-request focal length.
    pub fn estimator(&self, focal_override: Option<FocalLength>) -> DistanceEstimator<'_> {
        DistanceEstimator::new(
            &self.reference_heights_m,
            focal_override.unwrap_or(self.focal_length_px),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::LandmarkLabel;

    #[test]
    fn partial_profile_keeps_defaults() {
        let profile = CalibrationProfile::from_json_str(r#"{ "focalLengthPx": 1450.5 }"#).unwrap();

        assert_eq!(profile.focal_length_px.px(), 1450.5);
        assert_eq!(profile.landmarks, LandmarkTable::default());
        assert_eq!(profile.reference_heights_m, ReferenceHeightTable::default());
    }

    #[test]
    fn invalid_focal_length_rejected() {
        let err = CalibrationProfile::from_json_str(r#"{ "focalLengthPx": 0 }"#).unwrap_err();
        assert!(matches!(err, LocatorError::MalformedProfile(_)));
    }

    #[test]
    fn override_takes_precedence() {
        let profile = CalibrationProfile::default();
        assert_eq!(profile.estimator(None).focal_length().px(), 680.0);

        let phone = FocalLength::new(1200.0).unwrap();
        assert_eq!(profile.estimator(Some(phone)).focal_length(), phone);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");

        let mut profile = CalibrationProfile::default();
        profile.focal_length_px = FocalLength::new(912.0).unwrap();
        profile.write_json_file(&path).unwrap();

        let loaded = CalibrationProfile::from_json_file(&path).unwrap();
        assert_eq!(loaded, profile);
        assert!(loaded.landmarks.get(LandmarkLabel::Library).is_some());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = CalibrationProfile::from_json_file("/nonexistent/profile.json").unwrap_err();
        assert!(matches!(err, LocatorError::IoError(_)));
    }
}
