use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type FeatureVersion = u32;

pub const FEATURE_VERSION_V1: FeatureVersion = 1;

/// Activity metadata carried alongside derived features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMetadata {
    pub name: Option<String>,
    pub sport_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub moving_time_s: Option<i64>,
    pub distance_m_official: Option<f64>,
    pub elevation_gain_m: Option<f64>,
}

/// Raw quality fields plus normalized ratios. Every ratio is `None` when its denominator is
/// missing or non-positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    pub point_count: usize,
    pub duration_s: i64,
    pub distance_m_gps: f64,
    pub distance_ratio_gps_vs_official: Option<f64>,
    pub avg_speed_mps_gps: Option<f64>,
    pub max_speed_mps: f64,
    pub max_speed_kmh: f64,
    pub spike_count: u32,
    pub spikes_per_km: Option<f64>,
    pub stopped_time_s: i64,
    pub stopped_fraction: Option<f64>,
    pub stop_segments: u32,
    pub jitter_score: f64,
    pub points_per_km: Option<f64>,
    pub points_per_min: Option<f64>,
    pub stop_segments_per_hour: Option<f64>,
    pub spike_fraction: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturePayload {
    pub metadata: FeatureMetadata,
    pub features: DerivedFeatures,
}

/// Persisted payload for one `(activity, feature_version)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub activity_id: u64,
    pub feature_version: FeatureVersion,
    pub payload: FeaturePayload,
    pub computed_at: DateTime<Utc>,
}

/// Document returned to callers of the feature endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureDocument {
    pub activity_id: u64,
    pub strava_activity_id: Option<u64>,
    pub feature_version: FeatureVersion,
    pub computed_at: DateTime<Utc>,
    pub metadata: FeatureMetadata,
    pub features: DerivedFeatures,
}
