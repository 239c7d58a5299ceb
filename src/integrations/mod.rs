pub mod strava;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::types::activity::StreamPayload;

/// Activity summary as listed by the upstream source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteActivity {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sport_type: Option<String>,
    #[serde(default, rename = "type")]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub moving_time: Option<i64>,
    #[serde(default)]
    pub total_elevation_gain: Option<f64>,
}

/// Upstream source of raw activity streams. Retries and rate limiting are the implementor's
/// concern; callers see one fetch or one failure.
#[async_trait]
pub trait StreamSource: Send + Sync {
    async fn fetch_streams(
        &self,
        access_token: &str,
        remote_activity_id: u64,
    ) -> Result<StreamPayload, FetchError>;

    async fn list_activities(
        &self,
        access_token: &str,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<RemoteActivity>, FetchError>;
}
