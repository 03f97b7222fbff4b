use crate::backend::ExecutionProvider;
use crate::detector::DetectorSettings;
use crate::processing::labels::resolve_class_names;
use crate::processing::post::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_DETECTIONS,
};
use anyhow::Context;
use common::{env_optional, env_or};
use locator::CalibrationProfile;
use std::fmt;
use std::str::FromStr;

/// Which object detector realisation serves `detect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorBackend {
    /// YOLO ONNX model run in-process on the decoded image.
    Onnx,
    /// External program fed a staged image path.
    Command,
}

impl FromStr for DetectorBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "onnx" | "yolo" => Ok(Self::Onnx),
            "command" | "cmd" => Ok(Self::Command),
            other => Err(format!(
                "{} is not a supported detector backend. Use either `onnx` or `command`.",
                other
            )),
        }
    }
}

impl fmt::Display for DetectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorBackend::Onnx => f.write_str("onnx"),
            DetectorBackend::Command => f.write_str("command"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub classifier_model_path: String,
    pub detector_model_path: String,
    pub detector_backend: DetectorBackend,
    pub detector_command: Option<String>,
    /// Detector class names in model index order. Overrides the names
    /// embedded in the model.
    pub detector_labels: Option<Vec<String>>,
    pub calibration_profile_path: Option<String>,
    pub execution_provider: ExecutionProvider,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl InferenceConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let detector_backend = env_optional("DETECTOR_BACKEND")
            .map(|s| s.parse::<DetectorBackend>())
            .transpose()
            .map_err(anyhow::Error::msg)?
            .unwrap_or(DetectorBackend::Onnx);

        let execution_provider = env_optional("EXECUTION_PROVIDER")
            .map(|s| s.parse::<ExecutionProvider>())
            .transpose()
            .map_err(anyhow::Error::msg)?
            .unwrap_or(ExecutionProvider::Cpu);

        let detector_command = env_optional("DETECTOR_COMMAND");
        if detector_backend == DetectorBackend::Command && detector_command.is_none() {
            anyhow::bail!("DETECTOR_BACKEND=command requires DETECTOR_COMMAND");
        }

        Ok(Self {
            classifier_model_path: env_or(
                "CLASSIFIER_MODEL_PATH",
                "models/landmark_classifier.onnx".to_string(),
            ),
            detector_model_path: env_or("DETECTOR_MODEL_PATH", "models/yolo.onnx".to_string()),
            detector_backend,
            detector_command,
            detector_labels: env_optional("DETECTOR_LABELS").map(|s| parse_labels(&s)),
            calibration_profile_path: env_optional("CALIBRATION_PROFILE_PATH"),
            execution_provider,
            confidence_threshold: env_or("CONFIDENCE_THRESHOLD", DEFAULT_CONFIDENCE_THRESHOLD),
            iou_threshold: env_or("IOU_THRESHOLD", DEFAULT_IOU_THRESHOLD),
            max_detections: env_or("MAX_DETECTIONS", DEFAULT_MAX_DETECTIONS),
        })
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            classifier_model_path: "/models/classifier.onnx".to_string(),
            detector_model_path: "/models/yolo.onnx".to_string(),
            detector_backend: DetectorBackend::Onnx,
            detector_command: None,
            detector_labels: None,
            calibration_profile_path: None,
            execution_provider: ExecutionProvider::Cpu,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
        }
    }

    /// The configured profile file, or the built-in campus profile.
    pub fn load_profile(&self) -> anyhow::Result<CalibrationProfile> {
        match &self.calibration_profile_path {
            Some(path) => {
                let profile = CalibrationProfile::from_json_file(path)
                    .with_context(|| format!("Failed to load calibration profile {}", path))?;
                tracing::info!(
                    path = %path,
                    focal_length_px = profile.focal_length_px.px(),
                    "Calibration profile loaded"
                );
                Ok(profile)
            }
            None => {
                tracing::info!("Using built-in calibration profile");
                Ok(CalibrationProfile::default())
            }
        }
    }

    /// Thresholds plus class names. `embedded_names` is the model's `names`
    /// metadata, used when no labels are configured.
    pub fn detector_settings(
        &self,
        profile: &CalibrationProfile,
        embedded_names: Option<&str>,
    ) -> DetectorSettings {
        let class_names = resolve_class_names(
            self.detector_labels.as_deref(),
            embedded_names,
            &profile.reference_heights_m,
        );

        DetectorSettings {
            confidence_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
            max_detections: self.max_detections,
            class_names,
        }
    }
}

/// Comma-separated class names, blanks dropped.
pub fn parse_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InferenceBackend;
    use crate::processing::labels::NAMES_METADATA_KEY;
    use crate::test_utils::FakeBackend;
    use serial_test::serial;
    use std::env;

    const VARS: [&str; 6] = [
        "DETECTOR_BACKEND",
        "DETECTOR_COMMAND",
        "DETECTOR_LABELS",
        "EXECUTION_PROVIDER",
        "CONFIDENCE_THRESHOLD",
        "MAX_DETECTIONS",
    ];

    fn clear() {
        for var in VARS {
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    #[serial]
    fn defaults_without_environment() {
        clear();
        let config = InferenceConfig::from_env().unwrap();

        assert_eq!(config.detector_backend, DetectorBackend::Onnx);
        assert_eq!(config.execution_provider, ExecutionProvider::Cpu);
        assert_eq!(config.confidence_threshold, 0.25);
        assert_eq!(config.max_detections, 300);
        assert!(config.detector_labels.is_none());
    }

    #[test]
    #[serial]
    fn reads_overrides() {
        clear();
        unsafe {
            env::set_var("DETECTOR_BACKEND", "command");
            env::set_var("DETECTOR_COMMAND", "python3 detect.py");
            env::set_var("DETECTOR_LABELS", "person, 120 ,,650");
            env::set_var("EXECUTION_PROVIDER", "cuda");
            env::set_var("MAX_DETECTIONS", "50");
        }

        let config = InferenceConfig::from_env().unwrap();
        clear();

        assert_eq!(config.detector_backend, DetectorBackend::Command);
        assert_eq!(config.detector_command.as_deref(), Some("python3 detect.py"));
        assert_eq!(
            config.detector_labels,
            Some(vec!["person".to_string(), "120".into(), "650".into()])
        );
        assert_eq!(config.execution_provider, ExecutionProvider::Cuda);
        assert_eq!(config.max_detections, 50);
    }

    #[test]
    #[serial]
    fn command_backend_requires_command() {
        clear();
        unsafe { env::set_var("DETECTOR_BACKEND", "command") };
        let result = InferenceConfig::from_env();
        clear();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn unknown_provider_is_rejected() {
        clear();
        unsafe { env::set_var("EXECUTION_PROVIDER", "tpu") };
        let result = InferenceConfig::from_env();
        clear();
        assert!(result.is_err());
    }

    #[test]
    fn detector_labels_come_from_model_metadata() {
        let profile = CalibrationProfile::default();
        let mut backend = FakeBackend::new(ndarray::ArrayD::zeros(ndarray::IxDyn(&[1, 5, 0])));
        backend.names = Some("{0: '120', 1: '140', 2: '160', 3: '80'}".into());

        let settings = InferenceConfig::test_default()
            .detector_settings(&profile, backend.metadata(NAMES_METADATA_KEY).as_deref());

        assert_eq!(settings.class_names, vec!["120", "140", "160", "80"]);
        let coverage = profile.reference_heights_m.coverage(&settings.class_names);
        assert_eq!(coverage.unused_entries, vec!["200", "210", "220", "380", "650"]);
    }

    #[test]
    fn configured_labels_override_model_metadata() {
        let config = InferenceConfig {
            detector_labels: Some(vec!["650".into(), "80".into()]),
            ..InferenceConfig::test_default()
        };
        let settings =
            config.detector_settings(&CalibrationProfile::default(), Some("{0: '120'}"));

        assert_eq!(settings.class_names, vec!["650", "80"]);
    }

    #[test]
    fn missing_profile_file_is_an_error() {
        let config = InferenceConfig {
            calibration_profile_path: Some("/nonexistent/profile.json".into()),
            ..InferenceConfig::test_default()
        };
        assert!(config.load_profile().is_err());
    }
}
