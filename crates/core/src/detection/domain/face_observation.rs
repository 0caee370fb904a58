use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::NO_EMOTION;

/// Expression label → probability, in the order the detector reported them.
///
/// Order matters: ties in [`ExpressionScores::dominant`] go to the entry
/// that comes first. Serialized as a JSON object; deserialization keeps
/// document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionScores {
    entries: Vec<(String, f64)>,
}

impl ExpressionScores {
    pub fn new(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(label, p)| (label.as_str(), *p))
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.iter().find(|(l, _)| *l == label).map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with the strictly greatest probability; the earliest entry
    /// wins ties. `("N/A", 0)` for an empty map.
    pub fn dominant(&self) -> DominantEmotion {
        let mut iter = self.entries.iter();
        let Some(first) = iter.next() else {
            return DominantEmotion::none();
        };
        let best = iter.fold(first, |best, curr| if curr.1 > best.1 { curr } else { best });
        DominantEmotion {
            label: best.0.clone(),
            confidence: best.1,
        }
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ExpressionScores {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(l, p)| (l.into(), p)).collect())
    }
}

impl Serialize for ExpressionScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, p) in &self.entries {
            map.serialize_entry(label, p)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ExpressionScores {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedScores;

        impl<'de> Visitor<'de> for OrderedScores {
            type Value = ExpressionScores;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of expression label to probability")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(7));
                while let Some((label, p)) = access.next_entry::<String, f64>()? {
                    entries.push((label, p));
                }
                Ok(ExpressionScores::new(entries))
            }
        }

        deserializer.deserialize_map(OrderedScores)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DominantEmotion {
    pub label: String,
    pub confidence: f64,
}

impl DominantEmotion {
    pub fn none() -> Self {
        Self {
            label: NO_EMOTION.to_string(),
            confidence: 0.0,
        }
    }

    pub fn is_none(&self) -> bool {
        self.label == NO_EMOTION
    }
}

/// One face reported by the detector for a single frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceObservation {
    #[serde(rename = "box")]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub expressions: ExpressionScores,
    pub age: f64,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub gender_probability: f64,
}

impl FaceObservation {
    pub fn dominant_emotion(&self) -> DominantEmotion {
        self.expressions.dominant()
    }

    /// Age rounded to whole years; `None` when the estimate is not a usable
    /// number.
    pub fn rounded_age(&self) -> Option<u32> {
        (self.age.is_finite() && self.age >= 0.0).then(|| self.age.round() as u32)
    }
}

/// All faces from one detection tick, in detector order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionFrame {
    observations: Vec<FaceObservation>,
}

impl DetectionFrame {
    pub fn new(observations: Vec<FaceObservation>) -> Self {
        Self { observations }
    }

    pub fn observations(&self) -> &[FaceObservation] {
        &self.observations
    }

    pub fn first(&self) -> Option<&FaceObservation> {
        self.observations.first()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn scores(entries: &[(&str, f64)]) -> ExpressionScores {
        entries.iter().map(|&(l, p)| (l, p)).collect()
    }

    #[test]
    fn test_dominant_tie_keeps_first_entry() {
        let d = scores(&[("happy", 0.5), ("neutral", 0.5)]).dominant();
        assert_eq!(d.label, "happy");
        assert_relative_eq!(d.confidence, 0.5);
    }

    #[test]
    fn test_dominant_tie_order_reversed() {
        let d = scores(&[("neutral", 0.5), ("happy", 0.5)]).dominant();
        assert_eq!(d.label, "neutral");
    }

    #[rstest]
    #[case(&[("neutral", 0.1), ("happy", 0.8), ("sad", 0.1)], "happy", 0.8)]
    #[case(&[("angry", 0.3), ("fearful", 0.2), ("surprised", 0.31)], "surprised", 0.31)]
    #[case(&[("sad", 0.0), ("happy", 0.0)], "sad", 0.0)]
    #[case(&[("disgusted", 1.0)], "disgusted", 1.0)]
    fn test_dominant_picks_strict_maximum(
        #[case] entries: &[(&str, f64)],
        #[case] label: &str,
        #[case] confidence: f64,
    ) {
        let d = scores(entries).dominant();
        assert_eq!(d.label, label);
        assert_relative_eq!(d.confidence, confidence);
    }

    #[test]
    fn test_dominant_of_empty_map_is_none() {
        let d = ExpressionScores::default().dominant();
        assert!(d.is_none());
        assert_eq!(d, DominantEmotion::none());
        assert_eq!(d.label, "N/A");
    }

    #[test]
    fn test_deserialize_keeps_document_order() {
        let json = r#"{"surprised": 0.4, "angry": 0.4, "happy": 0.2}"#;
        let parsed: ExpressionScores = serde_json::from_str(json).unwrap();
        let labels: Vec<&str> = parsed.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, ["surprised", "angry", "happy"]);
        assert_eq!(parsed.dominant().label, "surprised");
    }

    #[test]
    fn test_observation_without_expressions_or_gender() {
        let json = r#"{"box": {"x": 1, "y": 2, "width": 3, "height": 4}, "age": 29.6}"#;
        let face: FaceObservation = serde_json::from_str(json).unwrap();
        assert!(face.expressions.is_empty());
        assert!(face.gender.is_none());
        assert!(face.dominant_emotion().is_none());
        assert_eq!(face.rounded_age(), Some(30));
    }

    #[rstest]
    #[case(f64::NAN, None)]
    #[case(f64::INFINITY, None)]
    #[case(-1.0, None)]
    #[case(0.4, Some(0))]
    #[case(34.5, Some(35))]
    fn test_rounded_age(#[case] age: f64, #[case] expected: Option<u32>) {
        let face = FaceObservation {
            bounding_box: BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            expressions: ExpressionScores::default(),
            age,
            gender: None,
            gender_probability: 0.0,
        };
        assert_eq!(face.rounded_age(), expected);
    }

    #[test]
    fn test_detection_frame_is_json_array() {
        let json = r#"[{"box": {"x": 0, "y": 0, "width": 10, "height": 10},
                        "expressions": {"happy": 0.9, "sad": 0.1},
                        "age": 30, "gender": "female", "gender_probability": 0.97}]"#;
        let frame: DetectionFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.len(), 1);
        let face = frame.first().unwrap();
        assert_eq!(face.gender.as_deref(), Some("female"));
        assert_relative_eq!(face.expressions.get("happy").unwrap(), 0.9);

        let empty: DetectionFrame = serde_json::from_str("[]").unwrap();
        assert!(empty.is_empty());
        assert!(empty.first().is_none());
    }
}
