//! In-memory associative stores keyed by activity id.
//!
//! Every snapshot write replaces the stored value wholesale (last writer wins); nothing is
//! merged field by field.

pub mod activities;
pub mod features;
pub mod labels;
pub mod locks;
pub mod tracks;

use crate::types::activity::{ActivityId, RawTelemetryPoint};
use crate::types::features::{FeaturePayload, FeatureSnapshot, FeatureVersion};
use crate::types::quality::{QualityMetricSnapshot, QualityReport, QualityThresholds};

pub trait QualitySnapshotStore {
    fn get_quality(&self, activity_id: ActivityId) -> Option<QualityMetricSnapshot>;

    /// Replaces the activity's snapshot and stamps `computed_at` with the current time.
    fn upsert_quality(
        &self,
        activity_id: ActivityId,
        report: QualityReport,
        thresholds: QualityThresholds,
    ) -> QualityMetricSnapshot;
}

pub trait FeatureSnapshotStore {
    fn get_features(
        &self,
        activity_id: ActivityId,
        feature_version: FeatureVersion,
    ) -> Option<FeatureSnapshot>;

    fn upsert_features(
        &self,
        activity_id: ActivityId,
        feature_version: FeatureVersion,
        payload: FeaturePayload,
    ) -> FeatureSnapshot;

    /// Drops every version stored for the activity.
    fn clear_features(&self, activity_id: ActivityId);
}

pub trait PointStore {
    /// Points of the activity ordered by sequence; empty when none were ingested.
    fn points(&self, activity_id: ActivityId) -> Vec<RawTelemetryPoint>;

    /// Replaces the whole point set and the quality snapshot in one visible step.
    fn replace_track(
        &self,
        activity_id: ActivityId,
        points: Vec<RawTelemetryPoint>,
        quality: QualityMetricSnapshot,
    );
}
