use std::fmt;

use crate::camera::domain::device_descriptor::DeviceDescriptor;
use crate::pipeline::readiness_gate::Readiness;
use crate::shared::error::ErrorInfo;

/// The view the user is looking at. Only the live view needs the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Consumer {
    #[default]
    Live,
    Analytics,
    Log,
}

impl Consumer {
    pub fn requires_camera(self) -> bool {
        self == Consumer::Live
    }
}

impl fmt::Display for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Consumer::Live => "live",
            Consumer::Analytics => "analytics",
            Consumer::Log => "log",
        })
    }
}

/// Snapshot of the controller's lifecycle state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineState {
    pub models_ready: bool,
    pub model_readiness: Readiness,
    pub selected_device: Option<DeviceDescriptor>,
    pub stream_active: bool,
    pub detecting: bool,
    pub active_consumer: Consumer,
    pub last_error: Option<ErrorInfo>,
    /// Human-readable progress line, e.g. "Loading AI Models...".
    pub status_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_live_requires_camera() {
        assert!(Consumer::Live.requires_camera());
        assert!(!Consumer::Analytics.requires_camera());
        assert!(!Consumer::Log.requires_camera());
    }

    #[test]
    fn test_default_state_is_idle_live_view() {
        let state = PipelineState::default();
        assert!(!state.models_ready);
        assert_eq!(state.model_readiness, Readiness::Pending);
        assert!(!state.stream_active);
        assert!(!state.detecting);
        assert_eq!(state.active_consumer, Consumer::Live);
        assert!(state.last_error.is_none());
    }
}
