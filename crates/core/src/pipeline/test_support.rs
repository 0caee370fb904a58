//! Fakes for the camera and detector seams, shared by the pipeline tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};

use crate::camera::domain::camera_source::{CameraSource, CameraStream, StreamConstraints};
use crate::camera::domain::device_descriptor::{DeviceDescriptor, DeviceKind};
use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::detection::domain::face_observation::{
    DetectionFrame, ExpressionScores, FaceObservation,
};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::VideoFrame;

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Camera whose streams record `acquire:<id>` and `release:<id>` events.
pub struct FakeCamera {
    pub devices: Vec<DeviceDescriptor>,
    pub deny_permission: bool,
    pub failing_devices: Vec<String>,
    /// Streams yield zero-sized frames, as before the first decode.
    pub blank_frames: bool,
    pub log: EventLog,
    pub open_streams: Arc<Mutex<usize>>,
}

impl FakeCamera {
    pub fn with_labels(labels: &[(&str, &str)]) -> Self {
        Self {
            devices: labels
                .iter()
                .map(|(id, label)| DeviceDescriptor::camera(*id, *label))
                .collect(),
            deny_permission: false,
            failing_devices: Vec::new(),
            blank_frames: false,
            log: EventLog::default(),
            open_streams: Arc::new(Mutex::new(0)),
        }
    }

    pub fn two_cameras() -> Self {
        let mut camera = Self::with_labels(&[("cam-a", "FaceTime HD"), ("cam-b", "iPhone Camera")]);
        camera.devices.push(DeviceDescriptor {
            id: "mic".into(),
            label: "Built-in Microphone".into(),
            kind: DeviceKind::AudioInput,
        });
        camera
    }
}

impl CameraSource for FakeCamera {
    fn request_permission(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.deny_permission {
            return Err("Permission denied".into());
        }
        Ok(())
    }

    fn enumerate_devices(&mut self) -> Result<Vec<DeviceDescriptor>, Box<dyn std::error::Error>> {
        Ok(self.devices.clone())
    }

    fn open_stream(
        &mut self,
        constraints: &StreamConstraints,
    ) -> Result<Box<dyn CameraStream>, Box<dyn std::error::Error>> {
        if self.failing_devices.contains(&constraints.device_id) {
            return Err("device busy".into());
        }
        let mut open = self.open_streams.lock().unwrap();
        assert_eq!(*open, 0, "a second stream was opened while one is held");
        *open += 1;
        self.log
            .lock()
            .unwrap()
            .push(format!("acquire:{}", constraints.device_id));
        Ok(Box::new(FakeStream {
            device_id: constraints.device_id.clone(),
            width: if self.blank_frames { 0 } else { constraints.width },
            height: if self.blank_frames { 0 } else { constraints.height },
            sequence: 0,
            live: true,
            log: self.log.clone(),
            open_streams: self.open_streams.clone(),
        }))
    }
}

pub struct FakeStream {
    device_id: String,
    width: u32,
    height: u32,
    sequence: u64,
    live: bool,
    log: EventLog,
    open_streams: Arc<Mutex<usize>>,
}

impl CameraStream for FakeStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn current_frame(&mut self) -> Option<VideoFrame> {
        if !self.live {
            return None;
        }
        self.sequence += 1;
        if self.width == 0 || self.height == 0 {
            return Some(VideoFrame::new(Vec::new(), 0, 0, self.sequence));
        }
        Some(VideoFrame::filled(self.width, self.height, [90, 90, 90], self.sequence))
    }

    fn stop_all_tracks(&mut self) {
        if self.live {
            self.live = false;
            *self.open_streams.lock().unwrap() -= 1;
            self.log
                .lock()
                .unwrap()
                .push(format!("release:{}", self.device_id));
        }
    }
}

pub fn face(emotion: &str, confidence: f64, age: f64, gender: &str) -> FaceObservation {
    FaceObservation {
        bounding_box: BoundingBox::new(4.0, 4.0, 8.0, 8.0),
        expressions: ExpressionScores::new(vec![
            ("neutral".to_string(), 0.01),
            (emotion.to_string(), confidence),
        ]),
        age,
        gender: Some(gender.to_string()),
        gender_probability: 0.9,
    }
}

pub fn one_face(emotion: &str, age: f64) -> DetectionFrame {
    DetectionFrame::new(vec![face(emotion, 0.8, age, "female")])
}

/// Returns scripted results in order, then empty frames.
pub struct ScriptedAnalyzer {
    pub script: VecDeque<Result<DetectionFrame, String>>,
    pub calls: Arc<Mutex<usize>>,
}

impl ScriptedAnalyzer {
    pub fn new(script: Vec<Result<DetectionFrame, String>>) -> Self {
        Self {
            script: script.into(),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Always reports one face.
    pub fn endless(emotion: &str, age: f64) -> Self {
        Self::new(std::iter::repeat_with(|| Ok(one_face(emotion, age))).take(10_000).collect())
    }
}

impl FaceAnalyzer for ScriptedAnalyzer {
    fn detect(&mut self, _frame: &VideoFrame) -> Result<DetectionFrame, Box<dyn std::error::Error>> {
        *self.calls.lock().unwrap() += 1;
        match self.script.pop_front() {
            Some(Ok(frame)) => Ok(frame),
            Some(Err(e)) => Err(e.into()),
            None => Ok(DetectionFrame::default()),
        }
    }
}

/// Blocks every call until the test releases it.
///
/// Each call announces itself on `started` and then waits for one result
/// on `release`.
pub struct GatedAnalyzer {
    started: Sender<u64>,
    release: Receiver<DetectionFrame>,
}

pub struct AnalyzerGate {
    pub started: Receiver<u64>,
    pub release: Sender<DetectionFrame>,
}

pub fn gated_analyzer() -> (GatedAnalyzer, AnalyzerGate) {
    let (started_tx, started_rx) = crossbeam_channel::unbounded();
    let (release_tx, release_rx) = crossbeam_channel::unbounded();
    (
        GatedAnalyzer {
            started: started_tx,
            release: release_rx,
        },
        AnalyzerGate {
            started: started_rx,
            release: release_tx,
        },
    )
}

impl FaceAnalyzer for GatedAnalyzer {
    fn detect(&mut self, frame: &VideoFrame) -> Result<DetectionFrame, Box<dyn std::error::Error>> {
        let _ = self.started.send(frame.sequence());
        self.release.recv().map_err(|e| e.to_string().into())
    }
}
