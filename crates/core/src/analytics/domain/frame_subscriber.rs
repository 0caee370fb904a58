use crate::analytics::domain::detection_log::LogEntry;
use crate::detection::domain::face_observation::DetectionFrame;

/// Observer notified after each detection frame has been applied.
///
/// `entry` is the log entry recorded for the frame, or `None` when the frame
/// had no faces. Called while fan-out updates are serialized, so
/// implementations must not block.
pub trait FrameSubscriber: Send {
    fn on_frame(&mut self, frame: &DetectionFrame, entry: Option<&LogEntry>);
}
