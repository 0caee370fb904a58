use std::path::Path;

use image::ImageFormat;

use crate::export::domain::capture_writer::CaptureWriter;
use crate::shared::frame::VideoFrame;

/// Encodes captures as PNG with the `image` crate.
pub struct PngCaptureWriter;

impl PngCaptureWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PngCaptureWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureWriter for PngCaptureWriter {
    fn write(&self, path: &Path, frame: &VideoFrame) -> Result<(), Box<dyn std::error::Error>> {
        if frame.is_empty() {
            return Err("cannot encode an empty frame".into());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("frame data does not match its dimensions")?;
        img.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_png_in_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("captures").join("shot.png");
        PngCaptureWriter::new()
            .write(&path, &VideoFrame::filled(20, 10, [50, 100, 200], 0))
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_pixels_survive_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        PngCaptureWriter::new()
            .write(&path, &VideoFrame::filled(8, 4, [1, 2, 3], 0))
            .unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (8, 4));
        assert_eq!(img.get_pixel(7, 3).0, [1, 2, 3]);
    }

    #[test]
    fn test_parent_that_is_a_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();
        let result = PngCaptureWriter::new().write(
            &blocker.join("shot.png"),
            &VideoFrame::filled(2, 2, [0, 0, 0], 0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = PngCaptureWriter::new()
            .write(&dir.path().join("shot.png"), &VideoFrame::new(Vec::new(), 0, 0, 0));
        assert!(result.is_err());
    }
}
