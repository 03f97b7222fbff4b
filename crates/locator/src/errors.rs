use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocatorError {
    #[error("Predicted label index {index} is out of range for {len} known landmarks")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Focal length must be a positive, finite number of pixels (got {0})")]
    InvalidFocalLength(f64),

    #[error("Reference height for class '{class_name}' must be positive and finite (got {height_m})")]
    InvalidReferenceHeight { class_name: String, height_m: f64 },

    #[error("Unknown landmark label '{0}'")]
    UnknownLandmark(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Malformed calibration profile: {0}")]
    MalformedProfile(#[from] serde_json::Error),
}
