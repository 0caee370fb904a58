use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::detection::domain::model_artifact::ModelArtifact;

/// Failures surfaced by the detection pipeline.
///
/// Only [`PipelineError::ModelLoad`] and [`PipelineError::StreamAcquisition`]
/// block forward progress; the rest are recoverable.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to load AI model {artifact}: {cause}")]
    ModelLoad { artifact: ModelArtifact, cause: String },
    #[error("could not access camera list, please grant permission: {0}")]
    PermissionDenied(String),
    #[error("no video input devices found")]
    NoDeviceFound,
    #[error("error starting webcam {device}: {cause}")]
    StreamAcquisition { device: String, cause: String },
    #[error("face detection failed: {0}")]
    DetectionTick(String),
    #[error("capture available only in live analysis with active detection")]
    NothingToCapture,
    #[error("failed to export capture to {path}: {cause}")]
    Export { path: PathBuf, cause: String },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::ModelLoad { .. } => ErrorKind::ModelLoad,
            PipelineError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            PipelineError::NoDeviceFound => ErrorKind::NoDeviceFound,
            PipelineError::StreamAcquisition { .. } => ErrorKind::StreamAcquisition,
            PipelineError::DetectionTick(_) => ErrorKind::DetectionTick,
            PipelineError::NothingToCapture => ErrorKind::NothingToCapture,
            PipelineError::Export { .. } => ErrorKind::Export,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ModelLoad,
    PermissionDenied,
    NoDeviceFound,
    StreamAcquisition,
    DetectionTick,
    NothingToCapture,
    Export,
}

impl ErrorKind {
    /// Whether this kind of failure keeps the pipeline from making progress
    /// until the user intervenes.
    pub fn is_blocking(self) -> bool {
        matches!(self, ErrorKind::ModelLoad | ErrorKind::StreamAcquisition)
    }
}

/// Cloneable record of the most recent failure, kept in `PipelineState`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PipelineError> for ErrorInfo {
    fn from(err: &PipelineError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PipelineError::ModelLoad { artifact: ModelArtifact::AgeGender, cause: "404".into() }, true)]
    #[case(PipelineError::StreamAcquisition { device: "cam".into(), cause: "busy".into() }, true)]
    #[case(PipelineError::PermissionDenied("denied".into()), false)]
    #[case(PipelineError::NoDeviceFound, false)]
    #[case(PipelineError::DetectionTick("boom".into()), false)]
    #[case(PipelineError::NothingToCapture, false)]
    fn test_blocking_kinds(#[case] err: PipelineError, #[case] blocking: bool) {
        assert_eq!(err.kind().is_blocking(), blocking);
    }

    #[test]
    fn test_error_info_keeps_message() {
        let err = PipelineError::ModelLoad {
            artifact: ModelArtifact::FaceExpression,
            cause: "connection refused".into(),
        };
        let info = ErrorInfo::from(&err);
        assert_eq!(info.kind, ErrorKind::ModelLoad);
        assert!(info.message.contains("face_expression"));
        assert!(info.message.contains("connection refused"));
    }
}
