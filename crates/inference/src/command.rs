use crate::detector::Detector;
use crate::staging::StagedImage;
use anyhow::Context;
use common::span;
use image::RgbImage;
use locator::{BoundingBox, Detection};
use serde::Deserialize;
use std::process::Command;

/// One detection as printed by an external detector program.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireDetection {
    class_name: String,
    confidence: f32,
    #[serde(rename = "box")]
    bbox: [f32; 4],
}

impl From<WireDetection> for Detection {
    fn from(wire: WireDetection) -> Self {
        let [x1, y1, x2, y2] = wire.bbox;
        Detection::new(
            wire.class_name,
            wire.confidence,
            BoundingBox::from_f32(x1, y1, x2, y2),
        )
    }
}

/// Detector backed by an external program that takes an image path.
///
/// The program is run as `program [args..] <image path>` and must print a JSON
/// array of `{"className", "confidence", "box": [x1, y1, x2, y2]}` on stdout.
/// The image is staged in a temporary file for the duration of the call.
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
    class_names: Vec<String>,
}

impl CommandDetector {
    pub fn new(program: impl Into<String>, args: Vec<String>, class_names: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            class_names,
        }
    }

    /// Split a shell-style command line on whitespace into program and args.
    pub fn from_command_line(command: &str, class_names: Vec<String>) -> anyhow::Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("Detector command is empty"))?;
        Ok(Self::new(program, parts.collect(), class_names))
    }
}

impl Detector for CommandDetector {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        let _s = span!("detect_command");

        let staged = StagedImage::write(image)?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(staged.path())
            .output()
            .with_context(|| format!("Failed to launch detector '{}'", self.program))?;

        if !output.status.success() {
            anyhow::bail!(
                "Detector '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let wire: Vec<WireDetection> = serde_json::from_slice(&output.stdout)
            .context("Detector printed malformed JSON")?;

        Ok(wire.into_iter().map(Detection::from).collect())
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }
}
