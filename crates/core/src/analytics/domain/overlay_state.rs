use crate::detection::domain::face_observation::{DetectionFrame, FaceObservation};
use crate::shared::bounding_box::BoundingBox;

/// Text drawn under one face box, one plate per line.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLabel {
    pub bounding_box: BoundingBox,
    pub lines: Vec<String>,
}

impl OverlayLabel {
    pub fn for_face(face: &FaceObservation) -> Self {
        let mut lines = Vec::with_capacity(3);
        let dominant = face.dominant_emotion();
        if !dominant.is_none() {
            lines.push(format!("{} ({})", dominant.label, percent(dominant.confidence)));
        }
        if let Some(gender) = &face.gender {
            lines.push(format!("{gender} ({})", percent(face.gender_probability)));
        }
        if let Some(age) = face.rounded_age() {
            lines.push(format!("{age} yrs"));
        }
        Self {
            bounding_box: face.bounding_box,
            lines,
        }
    }

    /// Bottom-left corner of the face box; plates stack downward from here.
    pub fn anchor(&self) -> (f64, f64) {
        self.bounding_box.bottom_left()
    }
}

fn percent(p: f64) -> String {
    format!("{}%", (p * 100.0).round() as i64)
}

/// The detection frame currently drawn over the live video.
///
/// Replaced wholesale on every applied tick, including empty ticks, so the
/// overlay never shows boxes from an older frame.
#[derive(Clone, Debug, Default)]
pub struct OverlayState {
    frame: DetectionFrame,
}

impl OverlayState {
    pub fn replace(&mut self, frame: DetectionFrame) {
        self.frame = frame;
    }

    pub fn clear(&mut self) {
        self.frame = DetectionFrame::default();
    }

    pub fn frame(&self) -> &DetectionFrame {
        &self.frame
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    pub fn labels(&self) -> Vec<OverlayLabel> {
        self.frame
            .observations()
            .iter()
            .map(OverlayLabel::for_face)
            .collect()
    }
}
