use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SPIKE_SPEED_MPS: f64 = 12.0;
pub const DEFAULT_STOP_SPEED_MPS: f64 = 0.6;
pub const DEFAULT_STOP_MIN_DURATION_S: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Speed at or above which a sample counts as a GPS spike (~43 km/h).
    pub spike_speed_threshold_mps: f64,
    /// Speed at or below which a sample counts as stopped.
    pub stop_speed_threshold_mps: f64,
    pub stop_min_duration_s: i64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            spike_speed_threshold_mps: DEFAULT_SPIKE_SPEED_MPS,
            stop_speed_threshold_mps: DEFAULT_STOP_SPEED_MPS,
            stop_min_duration_s: DEFAULT_STOP_MIN_DURATION_S,
        }
    }
}

impl QualityThresholds {
    pub fn validate(&self) -> Result<(), String> {
        let speeds = [
            ("spike_speed_threshold_mps", self.spike_speed_threshold_mps),
            ("stop_speed_threshold_mps", self.stop_speed_threshold_mps),
        ];
        for (name, value) in speeds {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a finite non-negative number", name));
            }
        }
        if self.stop_min_duration_s < 0 {
            return Err("stop_min_duration_s must be non-negative".to_string());
        }
        Ok(())
    }
}

/// Signal-reliability summary of one track.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityReport {
    pub point_count: usize,
    pub duration_s: i64,
    pub distance_m: f64,
    pub max_speed_mps: f64,
    pub spike_count: u32,
    pub stopped_time_s: i64,
    pub stop_segments: u32,
    pub jitter_score: f64,
}

impl QualityReport {
    pub fn empty(point_count: usize) -> Self {
        Self {
            point_count,
            ..Self::default()
        }
    }
}

/// Persisted quality report for one activity, with the thresholds it was computed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetricSnapshot {
    pub activity_id: u64,
    #[serde(flatten)]
    pub report: QualityReport,
    #[serde(flatten)]
    pub thresholds: QualityThresholds,
    pub computed_at: DateTime<Utc>,
}

impl QualityMetricSnapshot {
    pub fn new(activity_id: u64, report: QualityReport, thresholds: QualityThresholds) -> Self {
        Self {
            activity_id,
            report,
            thresholds,
            computed_at: Utc::now(),
        }
    }
}
