use std::path::Path;

use crate::shared::frame::VideoFrame;

/// Persists a composed capture frame.
pub trait CaptureWriter: Send {
    fn write(&self, path: &Path, frame: &VideoFrame) -> Result<(), Box<dyn std::error::Error>>;
}
