use crate::{classifier::Classifier, detector::Detector, errors::ServiceError};
use image::RgbImage;
use locator::{CalibrationProfile, FocalLength, LocationReport};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::sync::Arc;
use std::time::Instant;

#[cfg(feature = "ort-backend")]
use crate::{
    backend::{InferenceBackend, ort::OrtBackend},
    classifier::OnnxClassifier,
    command::CommandDetector,
    config::{DetectorBackend, InferenceConfig},
    detector::OnnxDetector,
    processing::labels::NAMES_METADATA_KEY,
};
#[cfg(feature = "ort-backend")]
use preprocess::PreprocessSpec;

/// Per-request knobs on top of the static profile.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LocateRequest {
    pub focal_length: Option<FocalLength>,
    pub bearing_deg: Option<f64>,
}

struct Metrics {
    requests: Counter<u64>,
    detections: Counter<u64>,
    duration: Histogram<f64>,
}

fn init_metrics(meter_name: &'static str) -> Metrics {
    let meter = global::meter(meter_name);
    let latency_buckets = [
        0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
    ];
    Metrics {
        requests: meter
            .u64_counter("locator_requests_total")
            .with_description("Total locate requests, by outcome")
            .build(),
        detections: meter
            .u64_counter("locator_detections_total")
            .with_description("Total detections produced")
            .build(),
        duration: meter
            .f64_histogram("locator_request_duration_seconds")
            .with_description("Time to classify, detect and estimate one photo")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build(),
    }
}

/// Classifier, detector and profile wired into one `locate` call.
pub struct LocatorService {
    classifier: Box<dyn Classifier>,
    detector: Box<dyn Detector>,
    profile: Arc<CalibrationProfile>,
    metrics: Metrics,
}

impl LocatorService {
    pub fn new(
        classifier: Box<dyn Classifier>,
        detector: Box<dyn Detector>,
        profile: Arc<CalibrationProfile>,
    ) -> Self {
        log_label_coverage(&profile, detector.class_names());

        Self {
            classifier,
            detector,
            profile,
            metrics: init_metrics("locator"),
        }
    }

    /// Load both models and the profile described by `config`.
    #[cfg(feature = "ort-backend")]
    pub fn from_config(config: &InferenceConfig) -> anyhow::Result<Self> {
        let profile = Arc::new(config.load_profile()?);

        let classifier = OnnxClassifier::new(
            OrtBackend::load_model(&config.classifier_model_path, config.execution_provider)?,
            PreprocessSpec::classifier(),
        );

        let detector: Box<dyn Detector> = match config.detector_backend {
            DetectorBackend::Onnx => {
                let backend =
                    OrtBackend::load_model(&config.detector_model_path, config.execution_provider)?;
                let names = backend.metadata(NAMES_METADATA_KEY);
                let settings = config.detector_settings(&profile, names.as_deref());
                Box::new(OnnxDetector::new(backend, PreprocessSpec::detector(), settings))
            }
            DetectorBackend::Command => {
                let settings = config.detector_settings(&profile, None);
                let command = config.detector_command.as_deref().ok_or_else(|| {
                    anyhow::anyhow!("Command detector selected without DETECTOR_COMMAND")
                })?;
                Box::new(CommandDetector::from_command_line(
                    command,
                    settings.class_names,
                )?)
            }
        };

        tracing::info!(
            classifier = %config.classifier_model_path,
            detector_backend = %config.detector_backend,
            "Locator service ready"
        );

        Ok(Self::new(Box::new(classifier), detector, profile))
    }

    pub fn profile(&self) -> &CalibrationProfile {
        &self.profile
    }

    #[tracing::instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn locate(
        &self,
        image: &RgbImage,
        request: &LocateRequest,
    ) -> Result<LocationReport, ServiceError> {
        let start = Instant::now();
        let result = self.run(image, request);

        let outcome = if result.is_ok() { "ok" } else { "error" };
        self.metrics
            .requests
            .add(1, &[KeyValue::new("outcome", outcome)]);
        self.metrics
            .duration
            .record(start.elapsed().as_secs_f64(), &[]);

        result
    }

    fn run(
        &self,
        image: &RgbImage,
        request: &LocateRequest,
    ) -> Result<LocationReport, ServiceError> {
        let classification = self
            .classifier
            .classify(image)
            .map_err(ServiceError::Classifier)?;

        // Reject a bad label before paying for detection.
        let identification = self.profile.landmarks.identify(classification.index)?;

        let detections = self.detector.detect(image).map_err(ServiceError::Detector)?;
        self.metrics.detections.add(detections.len() as u64, &[]);

        let estimate = self
            .profile
            .estimator(request.focal_length)
            .estimate(&detections);

        tracing::info!(
            label = %identification.label,
            confidence = classification.confidence,
            detections = detections.len(),
            average_distance_m = ?estimate.average_distance_m,
            "Photo located"
        );

        Ok(LocationReport::assemble(
            identification,
            classification.confidence,
            estimate,
            request.bearing_deg,
        ))
    }
}

fn log_label_coverage(profile: &CalibrationProfile, detector_classes: &[String]) {
    let coverage = profile.reference_heights_m.coverage(detector_classes);

    if !coverage.unused_entries.is_empty() {
        tracing::warn!(
            entries = ?coverage.unused_entries,
            "Reference heights for classes the detector never emits"
        );
    }
    if !coverage.unmeasured_classes.is_empty() {
        tracing::info!(
            classes = ?coverage.unmeasured_classes,
            "Detector classes without a reference height are reported without distance"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;
    use locator::{BoundingBox, Detection, LandmarkLabel, LocatorError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClassifier(Classification);

    impl Classifier for FixedClassifier {
        fn classify(&self, _image: &RgbImage) -> anyhow::Result<Classification> {
            Ok(self.0)
        }
    }

    struct FixedDetector {
        detections: Vec<Detection>,
        calls: Arc<AtomicUsize>,
        class_names: Vec<String>,
    }

    impl FixedDetector {
        fn boxed(detections: Vec<Detection>) -> (Box<dyn Detector>, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let detector = Self {
                detections,
                calls: calls.clone(),
                class_names: vec!["120".into(), "80".into()],
            };
            (Box::new(detector), calls)
        }
    }

    impl Detector for FixedDetector {
        fn detect(&self, _image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.detections.clone())
        }

        fn class_names(&self) -> &[String] {
            &self.class_names
        }
    }

    struct BrokenDetector;

    impl Detector for BrokenDetector {
        fn detect(&self, _image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
            anyhow::bail!("weights missing")
        }

        fn class_names(&self) -> &[String] {
            &[]
        }
    }

    fn service(index: usize, detector: Box<dyn Detector>) -> LocatorService {
        LocatorService::new(
            Box::new(FixedClassifier(Classification {
                index,
                confidence: 0.93,
            })),
            detector,
            Arc::new(CalibrationProfile::default()),
        )
    }

    fn photo() -> RgbImage {
        RgbImage::new(4, 4)
    }

    #[test]
    fn locates_landmark_and_averages_distances() {
        let (detector, _) = FixedDetector::boxed(vec![
            Detection::new("120", 0.9, BoundingBox::new(0, 0, 10, 100)),
            Detection::new("80", 0.8, BoundingBox::new(0, 10, 10, 118)),
            Detection::new("person", 0.7, BoundingBox::new(0, 0, 10, 50)),
        ]);

        let report = service(3, detector)
            .locate(&photo(), &LocateRequest::default())
            .unwrap();

        assert_eq!(report.predicted_label, LandmarkLabel::Gate5);
        assert!(report.coordinates.is_some());
        assert_eq!(report.detections.len(), 3);
        assert!((report.detections[0].estimated_distance_m.unwrap() - 8.16).abs() < 1e-9);
        assert!(report.detections[2].estimated_distance_m.is_none());
        let expected = (8.16 + 680.0 * 0.8 / 108.0) / 2.0;
        assert!((report.average_distance_m.unwrap() - expected).abs() < 1e-9);
        assert!(report.estimated_user_coordinates.is_some());
    }

    #[test]
    fn out_of_range_label_skips_detection() {
        let (detector, calls) = FixedDetector::boxed(vec![]);

        let err = service(20, detector)
            .locate(&photo(), &LocateRequest::default())
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Locator(LocatorError::IndexOutOfRange { index: 20, len: 9 })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn per_request_focal_length_overrides_profile() {
        let (detector, _) =
            FixedDetector::boxed(vec![Detection::new("120", 0.9, BoundingBox::new(0, 0, 10, 100))]);
        let request = LocateRequest {
            focal_length: Some(FocalLength::new(1360.0).unwrap()),
            bearing_deg: Some(90.0),
        };

        let report = service(0, detector).locate(&photo(), &request).unwrap();
        assert!((report.average_distance_m.unwrap() - 16.32).abs() < 1e-9);
    }

    #[test]
    fn no_detections_means_no_average() {
        let (detector, calls) = FixedDetector::boxed(vec![]);

        let report = service(4, detector)
            .locate(&photo(), &LocateRequest::default())
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(report.detections.is_empty());
        assert!(report.average_distance_m.is_none());
        assert!(report.estimated_user_coordinates.is_none());
    }

    #[test]
    fn detector_failure_is_reported() {
        let err = service(1, Box::new(BrokenDetector))
            .locate(&photo(), &LocateRequest::default())
            .unwrap_err();

        assert!(matches!(err, ServiceError::Detector(_)));
        assert!(err.to_string().contains("weights missing"));
    }
}
