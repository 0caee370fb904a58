use crate::detection::domain::face_observation::DominantEmotion;
use crate::shared::constants::NO_EMOTION;

/// The "current detection" readout for the first face of the latest frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSnapshot {
    pub emotion: String,
    pub confidence: f64,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

impl Default for LiveSnapshot {
    fn default() -> Self {
        Self {
            emotion: NO_EMOTION.to_string(),
            confidence: 0.0,
            age: None,
            gender: None,
        }
    }
}

impl LiveSnapshot {
    pub fn new(dominant: &DominantEmotion, age: Option<u32>, gender: Option<String>) -> Self {
        Self {
            emotion: dominant.label.clone(),
            confidence: dominant.confidence,
            age,
            gender,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_cleared(&self) -> bool {
        *self == Self::default()
    }
}
