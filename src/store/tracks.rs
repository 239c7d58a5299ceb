use std::sync::Arc;

use dashmap::DashMap;

use crate::store::{PointStore, QualitySnapshotStore};
use crate::types::activity::{ActivityId, RawTelemetryPoint};
use crate::types::quality::{QualityMetricSnapshot, QualityReport, QualityThresholds};

/// Points and quality snapshot of one activity, stored in a single map entry so a reader
/// never sees points from one ingest next to a snapshot from another.
#[derive(Debug, Clone, Default)]
pub struct TrackRecord {
    pub points: Arc<Vec<RawTelemetryPoint>>,
    pub quality: Option<QualityMetricSnapshot>,
}

#[derive(Clone, Default)]
pub struct TrackStore {
    tracks: Arc<DashMap<ActivityId, TrackRecord>>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points and snapshot read together from one entry.
    pub fn track(&self, activity_id: ActivityId) -> Option<TrackRecord> {
        self.tracks.get(&activity_id).map(|entry| entry.clone())
    }

    pub fn remove(&self, activity_id: ActivityId) {
        self.tracks.remove(&activity_id);
    }
}

impl PointStore for TrackStore {
    fn points(&self, activity_id: ActivityId) -> Vec<RawTelemetryPoint> {
        self.tracks
            .get(&activity_id)
            .map(|entry| entry.points.as_ref().clone())
            .unwrap_or_default()
    }

    fn replace_track(
        &self,
        activity_id: ActivityId,
        points: Vec<RawTelemetryPoint>,
        quality: QualityMetricSnapshot,
    ) {
        self.tracks.insert(
            activity_id,
            TrackRecord {
                points: Arc::new(points),
                quality: Some(quality),
            },
        );
    }
}

impl QualitySnapshotStore for TrackStore {
    fn get_quality(&self, activity_id: ActivityId) -> Option<QualityMetricSnapshot> {
        self.tracks
            .get(&activity_id)
            .and_then(|entry| entry.quality.clone())
    }

    fn upsert_quality(
        &self,
        activity_id: ActivityId,
        report: QualityReport,
        thresholds: QualityThresholds,
    ) -> QualityMetricSnapshot {
        let snapshot = QualityMetricSnapshot::new(activity_id, report, thresholds);
        self.tracks.entry(activity_id).or_default().quality = Some(snapshot.clone());
        snapshot
    }
}
