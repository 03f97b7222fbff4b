pub mod config;
pub mod cpu;

pub use config::{CLASSIFIER_INPUT_SIZE, DETECTOR_INPUT_SIZE};
pub use cpu::CpuPreProcessor;

/// How the source image is fitted into the model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// Keep aspect ratio, centre, pad with [`config::LETTERBOX_COLOR`].
    Letterbox,
    /// Scale each axis independently to fill the input.
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TensorLayout {
    /// `[1, 3, H, W]`
    Nchw,
    /// `[1, H, W, 3]`
    Nhwc,
}

/// Everything a model expects from its input tensor. Pixels are always
/// scaled to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessSpec {
    pub input_size: (u32, u32),
    pub resize: ResizeMode,
    pub layout: TensorLayout,
}

impl PreprocessSpec {
    /// YOLO: letterboxed 640x640, `[0, 1]`, channels first.
    pub const fn detector() -> Self {
        Self {
            input_size: DETECTOR_INPUT_SIZE,
            resize: ResizeMode::Letterbox,
            layout: TensorLayout::Nchw,
        }
    }

    /// Keras CNN: stretched 224x224, `[0, 1]`, channels last.
    pub const fn classifier() -> Self {
        Self {
            input_size: CLASSIFIER_INPUT_SIZE,
            resize: ResizeMode::Stretch,
            layout: TensorLayout::Nhwc,
        }
    }
}

/// Maps model-input pixel coordinates back onto the source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTransform {
    pub orig_width: u32,
    pub orig_height: u32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl ImageTransform {
    /// Inverse transform, clamped to the source image bounds.
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        let ox = ((x - self.offset_x) / self.scale_x).clamp(0.0, self.orig_width as f32);
        let oy = ((y - self.offset_y) / self.scale_y).clamp(0.0, self.orig_height as f32);
        (ox, oy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_original_inverts_letterbox_and_clamps() {
        let transform = ImageTransform {
            orig_width: 800,
            orig_height: 600,
            scale_x: 0.8,
            scale_y: 0.8,
            offset_x: 0.0,
            offset_y: 80.0,
        };

        let (x, y) = transform.to_original(320.0, 320.0);
        assert!((x - 400.0).abs() < 1e-3);
        assert!((y - 300.0).abs() < 1e-3);

        assert_eq!(transform.to_original(-5.0, 10.0), (0.0, 0.0));
        assert_eq!(transform.to_original(700.0, 640.0), (800.0, 600.0));
    }
}
