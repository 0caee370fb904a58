use crate::camera::domain::device_descriptor::DeviceDescriptor;
use crate::shared::frame::VideoFrame;

/// Constraints for opening a stream: the exact device plus a target
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub device_id: String,
    pub width: u32,
    pub height: u32,
}

/// An open camera stream.
///
/// The stream keeps producing frames until [`CameraStream::stop_all_tracks`]
/// is called; after that it yields nothing.
pub trait CameraStream: Send {
    fn device_id(&self) -> &str;

    /// Latest decoded frame, or `None` while nothing has been decoded yet.
    fn current_frame(&mut self) -> Option<VideoFrame>;

    fn stop_all_tracks(&mut self);
}

/// Platform camera access.
///
/// Device enumeration is only meaningful after a successful permission
/// probe; before that, labels may be empty.
pub trait CameraSource: Send {
    fn request_permission(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    /// Every media device known to the platform, cameras or not.
    fn enumerate_devices(&mut self) -> Result<Vec<DeviceDescriptor>, Box<dyn std::error::Error>>;

    fn open_stream(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, Box<dyn std::error::Error>>;
}
