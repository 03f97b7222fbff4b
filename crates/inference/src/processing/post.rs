use preprocess::ImageTransform;

/// Ultralytics `predict` defaults.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.7;
pub const DEFAULT_MAX_DETECTIONS: usize = 300;

/// Box in original-image float coordinates, before class-name lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: usize,
}

impl RawDetection {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    fn iou(&self, other: &RawDetection) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }
}

pub struct PostProcessor {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for PostProcessor {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONFIDENCE_THRESHOLD,
            DEFAULT_IOU_THRESHOLD,
            DEFAULT_MAX_DETECTIONS,
        )
    }
}

impl PostProcessor {
    pub fn new(confidence_threshold: f32, iou_threshold: f32, max_detections: usize) -> Self {
        Self {
            confidence_threshold,
            iou_threshold,
            max_detections,
        }
    }

    /// Decode a YOLO head output into detections on the original image.
    ///
    /// Expects the Ultralytics export layout `[1, 4 + classes, anchors]`:
    /// `cx, cy, w, h` in model-input pixels followed by one score per class.
    #[tracing::instrument(skip(self, output, transform))]
    pub fn parse_detections(
        &self,
        output: &ndarray::ArrayViewD<f32>,
        transform: &ImageTransform,
    ) -> anyhow::Result<Vec<RawDetection>> {
        let shape = output.shape();
        if shape.len() != 3 || shape[0] != 1 {
            anyhow::bail!("Unexpected detector output shape {:?}", shape);
        }

        let (num_channels, num_anchors) = (shape[1], shape[2]);

        if num_channels <= 4 {
            anyhow::bail!(
                "Detector output has {} channels, need 4 box values plus class scores",
                num_channels
            );
        }

        let at = |anchor: usize, channel: usize| output[[0, channel, anchor]];

        let mut candidates = Vec::new();

        for i in 0..num_anchors {
            let mut confidence = f32::NEG_INFINITY;
            let mut class_id = 0usize;
            for c in 4..num_channels {
                let score = at(i, c);
                if score > confidence {
                    confidence = score;
                    class_id = c - 4;
                }
            }

            if confidence < self.confidence_threshold {
                continue;
            }

            let (x1, y1, x2, y2) = cxcywh_to_xyxy(at(i, 0), at(i, 1), at(i, 2), at(i, 3));
            candidates.push(RawDetection {
                x1,
                y1,
                x2,
                y2,
                confidence,
                class_id,
            });
        }

        let kept = self.non_max_suppression(candidates);

        Ok(kept
            .into_iter()
            .map(|d| {
                let (x1, y1) = transform.to_original(d.x1, d.y1);
                let (x2, y2) = transform.to_original(d.x2, d.y2);
                RawDetection {
                    x1,
                    y1,
                    x2,
                    y2,
                    ..d
                }
            })
            .collect())
    }

    /// Greedy per-class NMS, highest confidence first.
    fn non_max_suppression(&self, mut candidates: Vec<RawDetection>) -> Vec<RawDetection> {
        candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let mut kept: Vec<RawDetection> = Vec::new();
        for candidate in candidates {
            if kept.len() >= self.max_detections {
                break;
            }
            let suppressed = kept.iter().any(|k| {
                k.class_id == candidate.class_id && k.iou(&candidate) > self.iou_threshold
            });
            if !suppressed {
                kept.push(candidate);
            }
        }
        kept
    }
}

/// Convert bounding box from center-width-height format to corner format
#[inline]
fn cxcywh_to_xyxy(cx: f32, cy: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
    let x1 = cx - w / 2.0;
    let y1 = cy - h / 2.0;
    let x2 = cx + w / 2.0;
    let y2 = cy + h / 2.0;
    (x1, y1, x2, y2)
}
