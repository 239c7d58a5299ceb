use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;

use crate::store::FeatureSnapshotStore;
use crate::types::activity::ActivityId;
use crate::types::features::{FeaturePayload, FeatureSnapshot, FeatureVersion};

#[derive(Clone, Default)]
pub struct FeatureStore {
    snapshots: Arc<DashMap<(ActivityId, FeatureVersion), FeatureSnapshot>>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

impl FeatureSnapshotStore for FeatureStore {
    fn get_features(
        &self,
        activity_id: ActivityId,
        feature_version: FeatureVersion,
    ) -> Option<FeatureSnapshot> {
        self.snapshots
            .get(&(activity_id, feature_version))
            .map(|entry| entry.clone())
    }

    fn upsert_features(
        &self,
        activity_id: ActivityId,
        feature_version: FeatureVersion,
        payload: FeaturePayload,
    ) -> FeatureSnapshot {
        let snapshot = FeatureSnapshot {
            activity_id,
            feature_version,
            payload,
            computed_at: Utc::now(),
        };
        self.snapshots
            .insert((activity_id, feature_version), snapshot.clone());
        snapshot
    }

    fn clear_features(&self, activity_id: ActivityId) {
        self.snapshots.retain(|(id, _), _| *id != activity_id);
    }
}
