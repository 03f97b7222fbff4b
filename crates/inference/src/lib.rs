pub mod backend;
pub mod classifier;
pub mod command;
pub mod config;
pub mod detector;
pub mod errors;
pub mod processing;
pub mod service;
pub mod staging;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export commonly used types for convenience
pub use backend::{ExecutionProvider, InferenceBackend};
pub use classifier::{Classification, Classifier, OnnxClassifier};
pub use command::CommandDetector;
pub use config::{DetectorBackend, InferenceConfig};
pub use detector::{Detector, DetectorSettings, OnnxDetector};
pub use errors::ServiceError;
pub use service::{LocateRequest, LocatorService};
pub use staging::StagedImage;
