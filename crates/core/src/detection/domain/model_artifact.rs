use std::fmt;

/// The detector networks that must all be loaded before detection can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelArtifact {
    TinyFaceDetector,
    FaceLandmark68,
    FaceExpression,
    AgeGender,
}

impl ModelArtifact {
    pub const ALL: [ModelArtifact; 4] = [
        ModelArtifact::TinyFaceDetector,
        ModelArtifact::FaceLandmark68,
        ModelArtifact::FaceExpression,
        ModelArtifact::AgeGender,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ModelArtifact::TinyFaceDetector => "tiny_face_detector",
            ModelArtifact::FaceLandmark68 => "face_landmark_68",
            ModelArtifact::FaceExpression => "face_expression",
            ModelArtifact::AgeGender => "age_gender",
        }
    }

    /// File name of the weights manifest under the model base location.
    pub fn manifest_file(self) -> String {
        format!("{}_model-weights_manifest.json", self.name())
    }
}

impl fmt::Display for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_file_names() {
        assert_eq!(
            ModelArtifact::TinyFaceDetector.manifest_file(),
            "tiny_face_detector_model-weights_manifest.json"
        );
        assert_eq!(
            ModelArtifact::AgeGender.manifest_file(),
            "age_gender_model-weights_manifest.json"
        );
    }

    #[test]
    fn test_all_lists_each_artifact_once() {
        let mut names: Vec<_> = ModelArtifact::ALL.iter().map(|a| a.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 4);
    }
}
