use crate::detection::domain::face_observation::DetectionFrame;
use crate::shared::frame::VideoFrame;

/// Domain interface for the face/attribute detector.
///
/// Produces every face in the frame together with its expression scores,
/// age and gender estimates. Implementations may keep state across calls,
/// hence `&mut self`.
pub trait FaceAnalyzer: Send {
    fn detect(&mut self, frame: &VideoFrame) -> Result<DetectionFrame, Box<dyn std::error::Error>>;
}
