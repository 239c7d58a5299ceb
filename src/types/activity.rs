use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ActivityId = u64;

/// Summary metadata of one recorded activity, as synced from the upstream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    pub strava_activity_id: Option<u64>,
    pub name: Option<String>,
    pub sport_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub distance_m: Option<f64>,
    pub moving_time_s: Option<i64>,
    pub elevation_gain_m: Option<f64>,
}

/// Activity fields as supplied by a caller or by the sync job; the id is assigned by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityInput {
    #[serde(default)]
    pub strava_activity_id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sport_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub distance_m: Option<f64>,
    #[serde(default)]
    pub moving_time_s: Option<i64>,
    #[serde(default)]
    pub elevation_gain_m: Option<f64>,
}

impl ActivityInput {
    pub fn into_activity(self, id: ActivityId) -> Activity {
        Activity {
            id,
            strava_activity_id: self.strava_activity_id,
            name: self.name,
            sport_type: self.sport_type,
            start_date: self.start_date,
            distance_m: self.distance_m,
            moving_time_s: self.moving_time_s,
            elevation_gain_m: self.elevation_gain_m,
        }
    }
}

/// One stored position sample. `sequence` is dense and 0-based per activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawTelemetryPoint {
    pub sequence: u32,
    pub elapsed_seconds: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub elevation_m: Option<i32>,
}

/// The `(lat, lon, elapsed)` triple the quality analyzer consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackSample {
    pub lat: f64,
    pub lon: f64,
    pub elapsed_seconds: i64,
}

impl From<&RawTelemetryPoint> for TrackSample {
    fn from(point: &RawTelemetryPoint) -> Self {
        Self {
            lat: point.latitude,
            lon: point.longitude,
            elapsed_seconds: point.elapsed_seconds,
        }
    }
}

/// Raw stream arrays for one activity. Any array may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamPayload {
    #[serde(default)]
    pub latlng: Option<Vec<[f64; 2]>>,
    #[serde(default)]
    pub time: Option<Vec<i64>>,
    #[serde(default)]
    pub altitude: Option<Vec<Option<f64>>>,
}
