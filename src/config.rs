use std::time::Duration;

use crate::types::features::{FeatureVersion, FEATURE_VERSION_V1};
use crate::types::quality::{
    QualityThresholds, DEFAULT_SPIKE_SPEED_MPS, DEFAULT_STOP_MIN_DURATION_S, DEFAULT_STOP_SPEED_MPS,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub max_body_size: usize,
    pub thresholds: QualityThresholds,
    pub feature_version: FeatureVersion,
    pub strava_api_base: String,
    pub strava_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env_or("PORT", 3000);
        let max_body_size_mb: usize = env_or("MAX_BODY_SIZE_MB", 25);

        let thresholds = QualityThresholds {
            spike_speed_threshold_mps: env_or("SPIKE_SPEED_THRESHOLD_MPS", DEFAULT_SPIKE_SPEED_MPS),
            stop_speed_threshold_mps: env_or("STOP_SPEED_THRESHOLD_MPS", DEFAULT_STOP_SPEED_MPS),
            stop_min_duration_s: env_or("STOP_MIN_DURATION_S", DEFAULT_STOP_MIN_DURATION_S),
        };

        let strava_api_base = std::env::var("STRAVA_API_BASE")
            .ok()
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "https://www.strava.com/api/v3".to_string());

        let strava_timeout_seconds = env_or("STRAVA_TIMEOUT_SECONDS", 20);

        Self {
            port,
            max_body_size: max_body_size_mb * 1024 * 1024,
            thresholds,
            feature_version: env_or("FEATURE_VERSION", FEATURE_VERSION_V1),
            strava_api_base,
            strava_timeout: Duration::from_secs(strava_timeout_seconds),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
