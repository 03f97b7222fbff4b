use crate::backend::{ExecutionProvider, InferenceBackend};
use ndarray::{Array, ArrayD, IxDyn};
use preprocess::ImageTransform;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Build a `[1, 4 + num_classes, n]` YOLO head from `(cxcywh, class, score)`.
pub fn yolo_output(boxes: &[([f32; 4], usize, f32)], num_classes: usize) -> ArrayD<f32> {
    let n = boxes.len();
    let mut out = ArrayD::<f32>::zeros(IxDyn(&[1, 4 + num_classes, n]));
    for (i, (b, class_id, score)) in boxes.iter().enumerate() {
        for (c, v) in b.iter().enumerate() {
            out[[0, c, i]] = *v;
        }
        out[[0, 4 + class_id, i]] = *score;
    }
    out
}

pub fn identity_transform(width: u32, height: u32) -> ImageTransform {
    ImageTransform {
        orig_width: width,
        orig_height: height,
        scale_x: 1.0,
        scale_y: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    }
}

/// Backend that replays a canned output and records the input shapes it saw.
pub struct FakeBackend {
    pub output: ArrayD<f32>,
    pub calls: Arc<AtomicUsize>,
    pub last_input_shape: Option<Vec<usize>>,
    pub names: Option<String>,
}

impl FakeBackend {
    pub fn new(output: ArrayD<f32>) -> Self {
        Self {
            output,
            calls: Arc::new(AtomicUsize::new(0)),
            last_input_shape: None,
            names: None,
        }
    }
}

impl InferenceBackend for FakeBackend {
    fn load_model(path: &str, _provider: ExecutionProvider) -> anyhow::Result<Self> {
        anyhow::bail!("FakeBackend cannot load {}", path)
    }

    fn infer(&mut self, input: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_input_shape = Some(input.shape().to_vec());
        Ok(self.output.clone())
    }

    fn metadata(&self, key: &str) -> Option<String> {
        (key == "names").then(|| self.names.clone()).flatten()
    }
}

/// Solid-colour test photo.
pub fn test_image(width: u32, height: u32) -> image::RgbImage {
    image::RgbImage::from_pixel(width, height, image::Rgb([90, 120, 150]))
}
