use anyhow::Context;
use calibration::{FocalSample, focal_samples, mean_focal_length};
use clap::Parser;
use common::Environment;
use indicatif::{ProgressBar, ProgressStyle};
use inference::{
    Detector, DetectorSettings, ExecutionProvider, InferenceBackend, OnnxDetector,
    backend::ort::OrtBackend,
    config::parse_labels,
    processing::labels::{NAMES_METADATA_KEY, resolve_class_names},
};
use locator::CalibrationProfile;
use preprocess::PreprocessSpec;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "calibration",
    about = "Estimate the camera focal length from photos taken at a known distance"
)]
struct Args {
    /// Path to the YOLO ONNX model
    #[arg(long, value_name = "PATH", default_value = "models/yolo.onnx")]
    detector_model: String,

    /// Glob matching the reference photos
    #[arg(long, value_name = "GLOB")]
    images: String,

    /// Measured camera-to-object distance for every photo, in metres
    #[arg(long, value_name = "METRES")]
    distance_m: f64,

    /// Only sample detections of this class
    #[arg(long, value_name = "CLASS")]
    class: Option<String>,

    /// Comma-separated detector class names in model index order, overriding
    /// the names embedded in the model
    #[arg(long, value_name = "NAMES")]
    labels: Option<String>,

    /// Profile supplying the height table (built-in default otherwise)
    #[arg(long, value_name = "PATH")]
    profile: Option<PathBuf>,

    /// Write the profile with the calibrated focal length here
    #[arg(long, value_name = "PATH")]
    write_profile: Option<PathBuf>,

    #[arg(long, default_value = "cpu", value_name = "PROVIDER")]
    execution_provider: String,

    #[arg(long, default_value_t = 0.25)]
    confidence_threshold: f32,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    common::setup_logging(Environment::Development);

    if !(args.distance_m.is_finite() && args.distance_m > 0.0) {
        anyhow::bail!("--distance-m must be a positive number of metres");
    }

    let mut profile = match &args.profile {
        Some(path) => CalibrationProfile::from_json_file(path)
            .with_context(|| format!("Failed to load profile {}", path.display()))?,
        None => CalibrationProfile::default(),
    };

    let provider: ExecutionProvider = args
        .execution_provider
        .parse()
        .map_err(anyhow::Error::msg)?;
    let backend = OrtBackend::load_model(&args.detector_model, provider)?;
    let configured = args.labels.as_deref().map(parse_labels);
    let embedded = backend.metadata(NAMES_METADATA_KEY);
    let class_names = resolve_class_names(
        configured.as_deref(),
        embedded.as_deref(),
        &profile.reference_heights_m,
    );
    let settings = DetectorSettings {
        confidence_threshold: args.confidence_threshold,
        ..DetectorSettings::with_class_names(class_names)
    };

    let detector = OnnxDetector::new(backend, PreprocessSpec::detector(), settings);

    let paths: Vec<PathBuf> = glob::glob(&args.images)
        .with_context(|| format!("Invalid glob {}", args.images))?
        .collect::<Result<_, _>>()?;
    if paths.is_empty() {
        anyhow::bail!("No images match {}", args.images);
    }

    let progress = ProgressBar::new(paths.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut samples: Vec<FocalSample> = Vec::new();
    for path in &paths {
        progress.set_message(path.display().to_string());

        let image = image::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .to_rgb8();
        let detections = detector.detect(&image)?;
        let found = focal_samples(
            &detections,
            &profile.reference_heights_m,
            args.distance_m,
            args.class.as_deref(),
        );

        for sample in &found {
            progress.println(format!(
                "{}: class {} at {} px -> focal {:.1} px",
                path.display(),
                sample.class_name,
                sample.height_px,
                sample.focal_length.px()
            ));
        }
        if found.is_empty() {
            progress.println(format!("{}: no usable reference object", path.display()));
        }

        samples.extend(found);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let focal_length = mean_focal_length(&samples)
        .ok_or_else(|| anyhow::anyhow!("No reference objects detected in any image"))?;

    println!(
        "Focal length: {:.1} px (mean of {} samples over {} images)",
        focal_length.px(),
        samples.len(),
        paths.len()
    );

    if let Some(out) = &args.write_profile {
        profile.focal_length_px = focal_length;
        profile
            .write_json_file(out)
            .with_context(|| format!("Failed to write profile {}", out.display()))?;
        println!("Profile written to {}", out.display());
    }

    Ok(())
}
