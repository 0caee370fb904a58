use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::analytics::domain::detection_log::LogEntry;
use crate::analytics::domain::frame_subscriber::FrameSubscriber;
use crate::detection::domain::face_observation::DetectionFrame;
use crate::shared::constants::LOG_EMOTION_PATH;

const QUEUE_CAPACITY: usize = 32;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of `POST /log-emotion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionRecord {
    pub emotion: String,
    pub confidence: f64,
    pub timestamp: String,
}

impl From<&LogEntry> for EmotionRecord {
    fn from(entry: &LogEntry) -> Self {
        Self {
            emotion: entry.emotion.clone(),
            confidence: entry.confidence,
            timestamp: entry.timestamp.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LogResponse {
    message: String,
    #[allow(dead_code)]
    data: serde_json::Value,
}

/// Forwards every logged detection to a remote HTTP endpoint.
///
/// Requests are made on a background thread so the fan-out never waits on
/// the network. When the queue is full the record is dropped with a
/// warning. Failed requests are logged and otherwise ignored.
pub struct RemoteEmotionLogger {
    tx: Option<Sender<EmotionRecord>>,
    handle: Option<JoinHandle<()>>,
}

impl RemoteEmotionLogger {
    pub fn new(endpoint: &str) -> Self {
        let url = log_url(endpoint);
        let (tx, rx) = crossbeam_channel::bounded::<EmotionRecord>(QUEUE_CAPACITY);
        let handle = std::thread::spawn(move || {
            let client = match reqwest::blocking::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
            {
                Ok(client) => client,
                Err(e) => {
                    log::warn!("Remote emotion logging disabled: {e}");
                    return;
                }
            };
            for record in rx {
                if let Err(e) = post(&client, &url, &record) {
                    log::warn!("Failed to log emotion to {url}: {e}");
                }
            }
        });
        log::info!("Logging detected emotions to {}", log_url(endpoint));
        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }
}

fn log_url(endpoint: &str) -> String {
    format!("{}{LOG_EMOTION_PATH}", endpoint.trim_end_matches('/'))
}

fn post(
    client: &reqwest::blocking::Client,
    url: &str,
    record: &EmotionRecord,
) -> Result<(), reqwest::Error> {
    let response: LogResponse = client
        .post(url)
        .json(record)
        .send()?
        .error_for_status()?
        .json()?;
    log::debug!("{}: {} ({:.2})", response.message, record.emotion, record.confidence);
    Ok(())
}

impl FrameSubscriber for RemoteEmotionLogger {
    fn on_frame(&mut self, _frame: &DetectionFrame, entry: Option<&LogEntry>) {
        let (Some(entry), Some(tx)) = (entry, &self.tx) else {
            return;
        };
        match tx.try_send(EmotionRecord::from(entry)) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                log::warn!("Remote log queue full, dropping {}", record.emotion);
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Remote log sender has stopped");
            }
        }
    }
}

impl Drop for RemoteEmotionLogger {
    fn drop(&mut self) {
        // Closing the channel lets the sender thread drain and exit.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
