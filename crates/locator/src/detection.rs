use serde::{Deserialize, Serialize};

/// Axis-aligned box in integer pixel coordinates of the original image.
///
/// Serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from detector float coordinates, truncating toward zero.
    pub fn from_f32(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1 as i32,
            y1: y1 as i32,
            x2: x2 as i32,
            y2: y2 as i32,
        }
    }

    /// Apparent height in pixels. Zero for degenerate boxes; negative only if
    /// a producer handed over inverted corners.
    pub fn height_px(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn width_px(&self) -> i32 {
        self.x2 - self.x1
    }
}

impl From<[i32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [i32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One object reported by the detector for a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub class_name: String,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_name: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_name: class_name.into(),
            confidence,
            bbox,
        }
    }

    pub fn height_px(&self) -> i32 {
        self.bbox.height_px()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_f32_truncates_toward_zero() {
        let b = BoundingBox::from_f32(10.9, 20.2, 110.99, 120.5);
        assert_eq!(b, BoundingBox::new(10, 20, 110, 120));
        assert_eq!(b.height_px(), 100);
        assert_eq!(b.width_px(), 100);
    }

    #[test]
    fn box_serializes_as_array() {
        let det = Detection::new("120", 0.91, BoundingBox::new(1, 2, 3, 4));
        let json = serde_json::to_value(&det).unwrap();

        assert_eq!(json["className"], "120");
        assert_eq!(json["box"], serde_json::json!([1, 2, 3, 4]));

        let back: Detection = serde_json::from_value(json).unwrap();
        assert_eq!(back.bbox, det.bbox);
    }
}
