use chrono::Local;

use crate::analytics::domain::detection_log::{DetectionLog, LogEntry};
use crate::analytics::domain::frame_subscriber::FrameSubscriber;
use crate::analytics::domain::live_snapshot::LiveSnapshot;
use crate::analytics::domain::overlay_state::OverlayState;
use crate::analytics::domain::session_aggregate::SessionAggregate;
use crate::detection::domain::face_observation::DetectionFrame;

/// Applies detection results to every consumer.
///
/// Owns the overlay, the live snapshot, the session aggregate and the
/// detection log; they are only mutated through here.
#[derive(Default)]
pub struct ResultFanout {
    overlay: OverlayState,
    snapshot: LiveSnapshot,
    session: SessionAggregate,
    log: DetectionLog,
    subscribers: Vec<Box<dyn FrameSubscriber>>,
}

impl ResultFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_subscriber(&mut self, subscriber: Box<dyn FrameSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Applies one detection frame.
    ///
    /// The overlay always shows `frame`. A frame with faces updates the
    /// snapshot, the session counts and the log from its first face. An
    /// empty frame only clears the snapshot.
    pub fn apply(&mut self, frame: DetectionFrame) {
        let entry = match frame.first() {
            Some(face) => {
                let dominant = face.dominant_emotion();
                let age = face.rounded_age();

                self.session.record_emotion(&dominant.label);
                if let Some(age) = age {
                    self.session.record_age(f64::from(age));
                }
                if let Some(gender) = &face.gender {
                    self.session.record_gender(gender);
                }

                self.snapshot = LiveSnapshot::new(&dominant, age, face.gender.clone());
                let entry = LogEntry {
                    timestamp: Local::now(),
                    emotion: dominant.label,
                    confidence: dominant.confidence,
                    age,
                    gender: face.gender.clone(),
                };
                self.log.push(entry.clone());
                Some(entry)
            }
            None => {
                self.snapshot.clear();
                None
            }
        };

        for subscriber in &mut self.subscribers {
            subscriber.on_frame(&frame, entry.as_ref());
        }
        self.overlay.replace(frame);
    }

    /// Drops everything tied to the current stream: overlay and snapshot.
    pub fn clear_live(&mut self) {
        self.overlay.clear();
        self.snapshot.clear();
    }

    pub fn reset_session(&mut self) {
        self.session.reset();
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn overlay(&self) -> &OverlayState {
        &self.overlay
    }

    pub fn snapshot(&self) -> &LiveSnapshot {
        &self.snapshot
    }

    pub fn session(&self) -> &SessionAggregate {
        &self.session
    }

    pub fn log(&self) -> &DetectionLog {
        &self.log
    }
}
