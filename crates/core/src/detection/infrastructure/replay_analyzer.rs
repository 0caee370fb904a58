use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::detection::domain::face_observation::DetectionFrame;
use crate::shared::frame::VideoFrame;

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("failed to read detection trace: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid detection trace at line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Replays a recorded detection trace as detector output.
///
/// The trace is JSON lines, one [`DetectionFrame`] (a JSON array of faces)
/// per line. Each call returns the next recorded frame, wrapping around at
/// the end. Blank lines are ignored.
pub struct ReplayAnalyzer {
    frames: Vec<DetectionFrame>,
    cursor: usize,
}

impl ReplayAnalyzer {
    pub fn new(frames: Vec<DetectionFrame>) -> Self {
        Self { frames, cursor: 0 }
    }

    pub fn open(path: &Path) -> Result<Self, ReplayError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ReplayError> {
        let mut frames = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let frame = serde_json::from_str(&line).map_err(|e| ReplayError::Parse {
                line: i + 1,
                source: e,
            })?;
            frames.push(frame);
        }
        Ok(Self::new(frames))
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FaceAnalyzer for ReplayAnalyzer {
    fn detect(&mut self, _frame: &VideoFrame) -> Result<DetectionFrame, Box<dyn std::error::Error>> {
        if self.frames.is_empty() {
            return Ok(DetectionFrame::default());
        }
        let frame = self.frames[self.cursor % self.frames.len()].clone();
        self.cursor += 1;
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FACE_30: &str = r#"[{"box": {"x": 0, "y": 0, "width": 10, "height": 10}, "expressions": {"happy": 0.9}, "age": 30, "gender": "male", "gender_probability": 0.9}]"#;

    fn video_frame() -> VideoFrame {
        VideoFrame::filled(4, 4, [0, 0, 0], 0)
    }

    #[test]
    fn test_replays_in_order_and_wraps() {
        let trace = format!("{FACE_30}\n[]\n");
        let mut analyzer = ReplayAnalyzer::from_reader(trace.as_bytes()).unwrap();
        assert_eq!(analyzer.len(), 2);

        assert_eq!(analyzer.detect(&video_frame()).unwrap().len(), 1);
        assert!(analyzer.detect(&video_frame()).unwrap().is_empty());
        assert_eq!(analyzer.detect(&video_frame()).unwrap().len(), 1);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let trace = format!("\n{FACE_30}\n\n   \n");
        let analyzer = ReplayAnalyzer::from_reader(trace.as_bytes()).unwrap();
        assert_eq!(analyzer.len(), 1);
    }

    #[test]
    fn test_parse_error_reports_line_number() {
        let trace = format!("{FACE_30}\nnot json\n");
        let err = ReplayAnalyzer::from_reader(trace.as_bytes())
            .err()
            .unwrap();
        assert!(matches!(err, ReplayError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_empty_trace_reports_no_faces() {
        let mut analyzer = ReplayAnalyzer::new(Vec::new());
        assert!(analyzer.is_empty());
        assert!(analyzer.detect(&video_frame()).unwrap().is_empty());
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = ReplayAnalyzer::open(&tmp.path().join("trace.jsonl"));
        assert!(matches!(result, Err(ReplayError::Io(_))));
    }
}
