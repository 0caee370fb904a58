use crate::shared::error::ErrorInfo;

/// Notifications for presentation layers, sent over the controller's event
/// channel in the order they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    ModelsReady,
    ModelsFailed(ErrorInfo),
    DevicesDiscovered(usize),
    StreamAttached { device_id: String },
    StreamReleased { device_id: String },
    DetectionStarted,
    DetectionStopped,
    /// A detection result was applied; `faces` is 0 for an empty tick.
    FrameApplied { faces: usize },
    Error(ErrorInfo),
}
