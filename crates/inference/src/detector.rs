use crate::backend::InferenceBackend;
use crate::processing::post::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IOU_THRESHOLD, DEFAULT_MAX_DETECTIONS, PostProcessor,
    RawDetection,
};
use common::span;
use image::RgbImage;
use locator::{BoundingBox, Detection};
use preprocess::{CpuPreProcessor, PreprocessSpec};
use std::sync::Mutex;

pub trait Detector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>>;

    /// Every class name this detector can emit, in model index order.
    fn class_names(&self) -> &[String];
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub class_names: Vec<String>,
}

impl DetectorSettings {
    pub fn with_class_names(class_names: Vec<String>) -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
            max_detections: DEFAULT_MAX_DETECTIONS,
            class_names,
        }
    }

    fn class_name(&self, class_id: usize) -> String {
        match self.class_names.get(class_id) {
            Some(name) => name.clone(),
            None => {
                tracing::warn!(
                    class_id,
                    known = self.class_names.len(),
                    "Detector emitted a class id with no label"
                );
                format!("Unknown_{}", class_id)
            }
        }
    }
}

struct Session<B> {
    backend: B,
    preprocessor: CpuPreProcessor,
}

/// YOLO detector running on an in-memory image.
pub struct OnnxDetector<B: InferenceBackend> {
    session: Mutex<Session<B>>,
    postprocessor: PostProcessor,
    settings: DetectorSettings,
}

impl<B: InferenceBackend> OnnxDetector<B> {
    pub fn new(backend: B, spec: PreprocessSpec, settings: DetectorSettings) -> Self {
        let postprocessor = PostProcessor::new(
            settings.confidence_threshold,
            settings.iou_threshold,
            settings.max_detections,
        );
        Self {
            session: Mutex::new(Session {
                backend,
                preprocessor: CpuPreProcessor::new(spec),
            }),
            postprocessor,
            settings,
        }
    }

    fn to_detection(&self, raw: RawDetection) -> Detection {
        Detection::new(
            self.settings.class_name(raw.class_id),
            raw.confidence,
            BoundingBox::from_f32(raw.x1, raw.y1, raw.x2, raw.y2),
        )
    }
}

impl<B: InferenceBackend> Detector for OnnxDetector<B> {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        let _s = span!("detect");

        let raw = {
            let mut session = self
                .session
                .lock()
                .map_err(|_| anyhow::anyhow!("Detector session lock poisoned"))?;
            let Session {
                backend,
                preprocessor,
            } = &mut *session;

            let (input, transform) = preprocessor.preprocess_from_u8_slice(
                image.as_raw(),
                image.width(),
                image.height(),
            )?;
            let output = backend.infer(&input)?;
            self.postprocessor
                .parse_detections(&output.view(), &transform)?
        };

        let detections: Vec<Detection> = raw.into_iter().map(|d| self.to_detection(d)).collect();
        tracing::debug!(count = detections.len(), "Detections decoded");

        Ok(detections)
    }

    fn class_names(&self) -> &[String] {
        &self.settings.class_names
    }
}
