//! Landmark identification and monocular distance estimation.
//!
//! This crate is the pure core of the service: it never touches a model.
//! Classifier indices and detector boxes come in, a [`LocationReport`] goes
//! out, and every table it consults lives in an explicit
//! [`CalibrationProfile`].

pub mod detection;
pub mod distance;
pub mod errors;
pub mod geo;
pub mod heights;
pub mod landmark;
pub mod profile;
pub mod report;

pub use detection::{BoundingBox, Detection};
pub use distance::{
    DistanceEstimate, DistanceEstimator, DistanceOutcome, FocalLength, RangedDetection,
    focal_length_from_observation,
};
pub use errors::LocatorError;
pub use geo::{DEFAULT_BEARING_DEG, GeoCoordinate, destination_point};
pub use heights::{LabelCoverage, ReferenceHeightTable};
pub use landmark::{Identification, LandmarkLabel, LandmarkTable};
pub use profile::CalibrationProfile;
pub use report::{LocationReport, ReportedDetection};
