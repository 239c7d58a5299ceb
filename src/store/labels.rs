use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use crate::types::activity::ActivityId;
use crate::types::label::{LabelFilter, LabelInput, QualityLabel};

/// At most one quality label per activity.
#[derive(Clone, Default)]
pub struct LabelStore {
    labels: Arc<DashMap<ActivityId, QualityLabel>>,
    next_id: Arc<AtomicU64>,
}

impl LabelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, activity_id: ActivityId) -> Option<QualityLabel> {
        self.labels.get(&activity_id).map(|entry| entry.clone())
    }

    pub fn is_labeled(&self, activity_id: ActivityId) -> bool {
        self.labels.contains_key(&activity_id)
    }

    /// Keeps the label's id and `created_at` when the activity is already labeled.
    pub fn upsert(&self, activity_id: ActivityId, input: LabelInput) -> QualityLabel {
        let mut entry = self.labels.entry(activity_id).or_insert_with(|| QualityLabel {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            activity_id,
            label_bad: input.label_bad,
            label_source: String::new(),
            label_reason: None,
            label_confidence: None,
            label_version: 1,
            created_at: Utc::now(),
            created_by: None,
        });
        let label = entry.value_mut();
        label.label_bad = input.label_bad;
        label.label_source = input.label_source;
        label.label_reason = input.label_reason;
        label.label_confidence = input.label_confidence;
        label.label_version = input.label_version;
        label.created_by = input.created_by;
        label.clone()
    }

    /// Newest first, ties broken by the higher id.
    pub fn list(&self, filter: &LabelFilter, limit: usize, offset: usize) -> Vec<QualityLabel> {
        let mut labels: Vec<QualityLabel> = self
            .labels
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        labels.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        labels.into_iter().skip(offset).take(limit).collect()
    }

    pub fn remove(&self, activity_id: ActivityId) {
        self.labels.remove(&activity_id);
    }
}
