/// Requested capture resolution for camera streams.
pub const VIDEO_WIDTH: u32 = 640;
pub const VIDEO_HEIGHT: u32 = 480;

pub const DETECTION_INTERVAL_MS: u64 = 300;

pub const MAX_LOG_ENTRIES: usize = 100;

/// Label used when no dominant emotion can be derived.
pub const NO_EMOTION: &str = "N/A";

/// Cameras whose label contains this (case-insensitive) win default selection.
pub const PREFERRED_CAMERA_LABEL: &str = "iphone";

pub const CAPTURE_PREFIX: &str = "ai_vision_capture";

pub const DEFAULT_MODEL_BASE: &str = "./models";

pub const LOG_EMOTION_PATH: &str = "/log-emotion";

pub const APP_DIR_NAME: &str = "MoodLens";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
