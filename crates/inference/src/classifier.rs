use crate::backend::InferenceBackend;
use common::span;
use image::RgbImage;
use preprocess::{CpuPreProcessor, PreprocessSpec};
use std::sync::Mutex;

/// Top-1 prediction of the landmark classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// Raw output index; validated against the label set by the caller.
    pub index: usize,
    pub confidence: f32,
}

pub trait Classifier: Send + Sync {
    fn classify(&self, image: &RgbImage) -> anyhow::Result<Classification>;
}

struct Session<B> {
    backend: B,
    preprocessor: CpuPreProcessor,
}

/// Image classifier backed by a model producing a probability vector.
pub struct OnnxClassifier<B: InferenceBackend> {
    session: Mutex<Session<B>>,
}

impl<B: InferenceBackend> OnnxClassifier<B> {
    pub fn new(backend: B, spec: PreprocessSpec) -> Self {
        Self {
            session: Mutex::new(Session {
                backend,
                preprocessor: CpuPreProcessor::new(spec),
            }),
        }
    }
}

impl<B: InferenceBackend> Classifier for OnnxClassifier<B> {
    fn classify(&self, image: &RgbImage) -> anyhow::Result<Classification> {
        let _s = span!("classify");

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Classifier session lock poisoned"))?;
        let Session {
            backend,
            preprocessor,
        } = &mut *session;

        let (input, _) =
            preprocessor.preprocess_from_u8_slice(image.as_raw(), image.width(), image.height())?;
        let probabilities = backend.infer(&input)?;

        let (index, confidence) = probabilities
            .iter()
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .ok_or_else(|| anyhow::anyhow!("Classifier returned an empty output"))?;

        tracing::info!(index, confidence, "Classifier prediction");

        Ok(Classification { index, confidence })
    }
}
