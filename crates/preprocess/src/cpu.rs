use crate::config::LETTERBOX_COLOR;
use crate::{ImageTransform, PreprocessSpec, ResizeMode, TensorLayout};
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, IxDyn};

pub struct CpuPreProcessor {
    pub spec: PreprocessSpec,
    canvas: Vec<u8>,
}

impl CpuPreProcessor {
    pub fn new(spec: PreprocessSpec) -> Self {
        let (w, h) = spec.input_size;
        Self {
            spec,
            canvas: vec![LETTERBOX_COLOR; (w * h * 3) as usize],
        }
    }

    pub fn preprocess_from_u8_slice(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<(Array<f32, IxDyn>, ImageTransform)> {
        let _s = span!("preprocess_image");

        tracing::trace!(
            width,
            height,
            pixel_bytes = pixels.len(),
            "Preprocessing image dimensions"
        );

        if width == 0 || height == 0 {
            anyhow::bail!("Image has no pixels ({}x{})", width, height);
        }

        let expected_size = (width as usize) * (height as usize) * 3;
        if pixels.len() != expected_size {
            anyhow::bail!(
                "Buffer size mismatch: expected {}, got {} bytes",
                expected_size,
                pixels.len()
            );
        }

        let transform = self.resize_into_canvas(pixels, width, height)?;
        let input = self.normalize()?;

        Ok((input, transform))
    }

    fn fitted_size(&self, width: u32, height: u32) -> (u32, u32, ImageTransform) {
        let (in_w, in_h) = self.spec.input_size;

        match self.spec.resize {
            ResizeMode::Letterbox => {
                let scale = (in_w as f32 / width as f32).min(in_h as f32 / height as f32);
                let new_width = ((width as f32 * scale) as u32).clamp(1, in_w);
                let new_height = ((height as f32 * scale) as u32).clamp(1, in_h);
                let offset_x = (in_w - new_width) / 2;
                let offset_y = (in_h - new_height) / 2;

                (
                    new_width,
                    new_height,
                    ImageTransform {
                        orig_width: width,
                        orig_height: height,
                        scale_x: scale,
                        scale_y: scale,
                        offset_x: offset_x as f32,
                        offset_y: offset_y as f32,
                    },
                )
            }
            ResizeMode::Stretch => (
                in_w,
                in_h,
                ImageTransform {
                    orig_width: width,
                    orig_height: height,
                    scale_x: in_w as f32 / width as f32,
                    scale_y: in_h as f32 / height as f32,
                    offset_x: 0.0,
                    offset_y: 0.0,
                },
            ),
        }
    }

    fn resize_into_canvas(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<ImageTransform> {
        let _s = span!("resize_into_canvas");

        let (new_width, new_height, transform) = self.fitted_size(width, height);

        let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;
        let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        self.canvas.fill(LETTERBOX_COLOR);

        let resized_data = resized.buffer();
        let stride = self.spec.input_size.0 * 3;
        let row_bytes = (new_width * 3) as usize;
        let offset_x = transform.offset_x as u32;
        let offset_y = transform.offset_y as u32;

        for y in 0..new_height {
            let src_row = (y * new_width * 3) as usize;
            let dst_row = ((y + offset_y) * stride + offset_x * 3) as usize;

            self.canvas[dst_row..dst_row + row_bytes]
                .copy_from_slice(&resized_data[src_row..src_row + row_bytes]);
        }

        Ok(transform)
    }

    fn normalize(&self) -> anyhow::Result<Array<f32, IxDyn>> {
        let _s = span!("normalize");

        let width = self.spec.input_size.0 as usize;
        let height = self.spec.input_size.1 as usize;
        let spatial = width * height;

        let mut output = vec![0.0f32; 3 * spatial];

        for (i, px) in self.canvas.chunks_exact(3).enumerate() {
            for c in 0..3 {
                let v = px[c] as f32 / 255.0;
                match self.spec.layout {
                    TensorLayout::Nchw => output[i + c * spatial] = v,
                    TensorLayout::Nhwc => output[i * 3 + c] = v,
                }
            }
        }

        let shape = match self.spec.layout {
            TensorLayout::Nchw => [1, 3, height, width],
            TensorLayout::Nhwc => [1, height, width, 3],
        };

        Ok(Array::from_shape_vec(IxDyn(&shape), output)?)
    }
}
