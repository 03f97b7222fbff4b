use locator::LocatorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error("Classifier failed: {0:#}")]
    Classifier(anyhow::Error),

    #[error("Detector failed: {0:#}")]
    Detector(anyhow::Error),
}

impl ServiceError {
    /// Whether the caller sent something unusable, as opposed to a failure
    /// on our side.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ServiceError::Locator(LocatorError::InvalidFocalLength(_)))
    }
}
