use anyhow::Context;
use image::{ImageFormat, RgbImage};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// An image written to a named temporary file for a path-based detector.
///
/// The file exists only as long as this guard; dropping it removes the file,
/// including when the caller bails out early or unwinds.
pub struct StagedImage {
    file: NamedTempFile,
}

impl StagedImage {
    pub fn write(image: &RgbImage) -> anyhow::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("landmark-")
            .suffix(".jpg")
            .tempfile()
            .context("Failed to create staging file")?;

        {
            let mut writer = BufWriter::new(file.as_file_mut());
            image
                .write_to(&mut writer, ImageFormat::Jpeg)
                .context("Failed to encode staged image")?;
            writer.flush().context("Failed to flush staged image")?;
        }

        tracing::debug!(path = %file.path().display(), "Image staged");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for StagedImage {
    fn drop(&mut self) {
        tracing::debug!(path = %self.file.path().display(), "Removing staged image");
    }
}
