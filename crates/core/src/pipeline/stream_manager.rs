use std::sync::{Arc, Mutex, PoisonError};

use crate::camera::domain::camera_source::{CameraSource, CameraStream, StreamConstraints};
use crate::camera::domain::device_descriptor::DeviceDescriptor;
use crate::shared::error::PipelineError;
use crate::shared::frame::VideoFrame;

type StreamSlot = Arc<Mutex<Option<Box<dyn CameraStream>>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Acquiring { device_id: String },
    Active { device_id: String },
    Error { device_id: String },
}

/// What a reconcile did, in order: release first, then attach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamTransition {
    pub released: Option<String>,
    pub attached: Option<String>,
}

/// Read handle onto whichever stream is currently held.
///
/// Returns `None` once the stream has been released, so a handle kept by
/// the scheduler can never read from a stale device.
#[derive(Clone)]
pub struct FrameTap {
    slot: StreamSlot,
}

impl FrameTap {
    pub fn grab(&self) -> Option<VideoFrame> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_mut().and_then(|stream| stream.current_frame())
    }
}

/// Sole owner of the camera stream.
///
/// At most one stream is open at a time, and every stream that is opened is
/// stopped again, either by a transition or when the manager is dropped.
pub struct StreamManager {
    state: StreamState,
    slot: StreamSlot,
    width: u32,
    height: u32,
}

impl StreamManager {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: StreamState::Idle,
            slot: Arc::new(Mutex::new(None)),
            width,
            height,
        }
    }

    pub fn state(&self) -> &StreamState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, StreamState::Active { .. })
    }

    /// Device of the held stream, if any.
    pub fn device_id(&self) -> Option<&str> {
        match &self.state {
            StreamState::Active { device_id } => Some(device_id),
            _ => None,
        }
    }

    pub fn frame_tap(&self) -> FrameTap {
        FrameTap {
            slot: self.slot.clone(),
        }
    }

    /// Whether bringing the stream in line with `desired` would change
    /// anything. A device in `Error` is not retried until the error is
    /// cleared.
    pub fn needs_transition(&self, desired: Option<&DeviceDescriptor>) -> bool {
        match (desired, &self.state) {
            (None, StreamState::Idle) => false,
            (None, _) => true,
            (Some(d), StreamState::Active { device_id }) => d.id != *device_id,
            (Some(d), StreamState::Error { device_id }) => d.id != *device_id,
            (Some(_), _) => true,
        }
    }

    /// Forgets a failed acquisition so the next reconcile tries again.
    pub fn clear_error(&mut self) {
        if matches!(self.state, StreamState::Error { .. }) {
            self.state = StreamState::Idle;
        }
    }

    /// Releases any held stream, then acquires `desired` if given.
    pub fn reconcile(
        &mut self,
        desired: Option<&DeviceDescriptor>,
        source: &mut dyn CameraSource,
    ) -> Result<StreamTransition, PipelineError> {
        let mut transition = StreamTransition::default();
        if !self.needs_transition(desired) {
            return Ok(transition);
        }

        transition.released = self.release();
        let Some(device) = desired else {
            return Ok(transition);
        };

        self.state = StreamState::Acquiring {
            device_id: device.id.clone(),
        };
        let constraints = StreamConstraints {
            device_id: device.id.clone(),
            width: self.width,
            height: self.height,
        };
        match source.open_stream(&constraints) {
            Ok(stream) => {
                *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(stream);
                self.state = StreamState::Active {
                    device_id: device.id.clone(),
                };
                log::info!("Camera stream attached: {device}");
                transition.attached = Some(device.id.clone());
                Ok(transition)
            }
            Err(e) => {
                log::warn!("Failed to start camera {device}: {e}");
                self.state = StreamState::Error {
                    device_id: device.id.clone(),
                };
                Err(PipelineError::StreamAcquisition {
                    device: device.display_label().to_string(),
                    cause: e.to_string(),
                })
            }
        }
    }

    /// Stops and detaches the held stream and moves to `Idle`. Returns the
    /// released device id, or `None` when nothing was held.
    pub fn release(&mut self) -> Option<String> {
        let stream = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.state = StreamState::Idle;
        stream.map(|mut stream| {
            stream.stop_all_tracks();
            let device_id = stream.device_id().to_string();
            log::info!("Camera stream released: {device_id}");
            device_id
        })
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.release();
    }
}
