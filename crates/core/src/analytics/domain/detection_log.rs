use std::collections::VecDeque;

use chrono::{DateTime, Local};

use crate::shared::constants::MAX_LOG_ENTRIES;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub emotion: String,
    pub confidence: f64,
    pub age: Option<u32>,
    pub gender: Option<String>,
}

impl LogEntry {
    /// Wall-clock time of day, e.g. `14:03:27`.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }
}

/// Fixed-capacity detection history, newest entry first.
///
/// Pushing past capacity evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct DetectionLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for DetectionLog {
    fn default() -> Self {
        Self::with_capacity(MAX_LOG_ENTRIES)
    }
}

impl DetectionLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}
