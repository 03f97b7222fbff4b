/// Square input of the Ultralytics YOLO export.
pub const DETECTOR_INPUT_SIZE: (u32, u32) = (640, 640);

/// Input of the landmark classifier.
pub const CLASSIFIER_INPUT_SIZE: (u32, u32) = (224, 224);

/// Grey used to pad letterboxed images, matching Ultralytics.
pub const LETTERBOX_COLOR: u8 = 114;
