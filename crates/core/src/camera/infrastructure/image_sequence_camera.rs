use std::fs;
use std::path::{Path, PathBuf};

use crate::camera::domain::camera_source::{CameraSource, CameraStream, StreamConstraints};
use crate::camera::domain::device_descriptor::DeviceDescriptor;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::VideoFrame;

/// Camera backed by folders of still images.
///
/// Every sub-directory of `root` that contains images is one device; its
/// images, sorted by file name, are the looping frame sequence. Frames are
/// decoded with the `image` crate and resized to the requested resolution.
pub struct ImageSequenceCamera {
    root: PathBuf,
    permission_granted: bool,
}

impl ImageSequenceCamera {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            permission_granted: false,
        }
    }
}

impl CameraSource for ImageSequenceCamera {
    fn request_permission(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.root.is_dir() {
            return Err(format!("camera root {} is not accessible", self.root.display()).into());
        }
        self.permission_granted = true;
        Ok(())
    }

    fn enumerate_devices(&mut self) -> Result<Vec<DeviceDescriptor>, Box<dyn std::error::Error>> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        let mut devices = Vec::new();
        for dir in dirs {
            if image_files(&dir)?.is_empty() {
                continue;
            }
            let Some(id) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let label = if self.permission_granted {
                id.replace('_', " ")
            } else {
                String::new()
            };
            devices.push(DeviceDescriptor::camera(id, label));
        }
        Ok(devices)
    }

    fn open_stream(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, Box<dyn std::error::Error>> {
        let dir = self.root.join(&constraints.device_id);
        if !dir.is_dir() {
            return Err(format!("requested device not found: {}", constraints.device_id).into());
        }
        let paths = image_files(&dir)?;
        if paths.is_empty() {
            return Err(format!("device {} has no frames", constraints.device_id).into());
        }
        log::debug!(
            "Opened image sequence {} ({} frames, {}x{})",
            dir.display(),
            paths.len(),
            constraints.width,
            constraints.height
        );
        Ok(Box::new(ImageSequenceStream {
            device_id: constraints.device_id.clone(),
            paths,
            width: constraints.width,
            height: constraints.height,
            sequence: 0,
            live: true,
        }))
    }
}

fn image_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    files.sort();
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

struct ImageSequenceStream {
    device_id: String,
    paths: Vec<PathBuf>,
    width: u32,
    height: u32,
    sequence: u64,
    live: bool,
}

impl ImageSequenceStream {
    fn decode(&self, path: &Path, sequence: u64) -> Result<VideoFrame, image::ImageError> {
        let img = image::open(path)?.to_rgb8();
        let img = if img.dimensions() != (self.width, self.height) {
            image::imageops::resize(&img, self.width, self.height, image::imageops::FilterType::Triangle)
        } else {
            img
        };
        let (w, h) = img.dimensions();
        Ok(VideoFrame::new(img.into_raw(), w, h, sequence))
    }
}

impl CameraStream for ImageSequenceStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        if !self.live {
            return None;
        }
        let sequence = self.sequence;
        self.sequence += 1;
        let path = &self.paths[(sequence % self.paths.len() as u64) as usize];
        match self.decode(path, sequence) {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("Skipping undecodable frame {}: {e}", path.display());
                None
            }
        }
    }

    fn stop_all_tracks(&mut self) {
        self.live = false;
    }
}
