use std::collections::BTreeMap;

use crate::shared::constants::NO_EMOTION;

/// Running statistics for the current session.
///
/// Counts only grow until [`SessionAggregate::reset`], which empties every
/// collection at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionAggregate {
    emotion_counts: BTreeMap<String, u64>,
    age_samples: Vec<f64>,
    gender_counts: BTreeMap<String, u64>,
}

impl SessionAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one observation of `label`. The "N/A" placeholder is ignored.
    pub fn record_emotion(&mut self, label: &str) {
        if label == NO_EMOTION {
            return;
        }
        *self.emotion_counts.entry(label.to_string()).or_default() += 1;
    }

    /// Appends an age sample; non-finite values are ignored.
    pub fn record_age(&mut self, age: f64) {
        if age.is_finite() {
            self.age_samples.push(age);
        }
    }

    pub fn record_gender(&mut self, label: &str) {
        if label.is_empty() {
            return;
        }
        *self.gender_counts.entry(label.to_string()).or_default() += 1;
    }

    pub fn reset(&mut self) {
        self.emotion_counts.clear();
        self.age_samples.clear();
        self.gender_counts.clear();
    }

    pub fn emotion_counts(&self) -> &BTreeMap<String, u64> {
        &self.emotion_counts
    }

    pub fn age_samples(&self) -> &[f64] {
        &self.age_samples
    }

    pub fn gender_counts(&self) -> &BTreeMap<String, u64> {
        &self.gender_counts
    }

    pub fn is_empty(&self) -> bool {
        self.emotion_counts.is_empty() && self.age_samples.is_empty() && self.gender_counts.is_empty()
    }

    pub fn average_age(&self) -> Option<f64> {
        if self.age_samples.is_empty() {
            return None;
        }
        Some(self.age_samples.iter().sum::<f64>() / self.age_samples.len() as f64)
    }

    /// Average age with one decimal, or "N/A" for an empty session.
    pub fn average_age_label(&self) -> String {
        self.average_age()
            .map(|avg| format!("{avg:.1}"))
            .unwrap_or_else(|| NO_EMOTION.to_string())
    }

    /// Each observed emotion's share of all counted emotions, in percent.
    pub fn emotion_shares(&self) -> Vec<(String, f64)> {
        let total: u64 = self.emotion_counts.values().sum();
        if total == 0 {
            return Vec::new();
        }
        self.emotion_counts
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(label, &count)| (label.clone(), count as f64 / total as f64 * 100.0))
            .collect()
    }
}
