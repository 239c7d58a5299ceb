use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::FetchError;
use crate::integrations::{RemoteActivity, StreamSource};
use crate::types::activity::StreamPayload;

pub struct StravaClient {
    http: reqwest::Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct StreamEntry<T> {
    data: Vec<T>,
}

/// Response shape of `/activities/{id}/streams?key_by_type=true`.
#[derive(Debug, Deserialize)]
struct StreamSet {
    latlng: Option<StreamEntry<[f64; 2]>>,
    time: Option<StreamEntry<i64>>,
    altitude: Option<StreamEntry<Option<f64>>>,
}

impl StravaClient {
    pub fn new(api_base: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| FetchError::Request(err.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.into(),
        })
    }

    pub fn with_defaults(api_base: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        access_token: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchError> {
        let url = format!("{}/{}", self.api_base, path.trim_start_matches('/'));
        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|err| FetchError::Request(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|err| FetchError::Decode(err.to_string()))
    }
}

#[async_trait]
impl StreamSource for StravaClient {
    async fn fetch_streams(
        &self,
        access_token: &str,
        remote_activity_id: u64,
    ) -> Result<StreamPayload, FetchError> {
        let path = format!("activities/{}/streams", remote_activity_id);
        let streams: StreamSet = self
            .get_json(
                access_token,
                &path,
                &[
                    ("keys", "latlng,time,altitude".to_string()),
                    ("key_by_type", "true".to_string()),
                ],
            )
            .await?;

        tracing::debug!(
            "Fetched streams for remote activity {} ({} latlng samples)",
            remote_activity_id,
            streams.latlng.as_ref().map_or(0, |s| s.data.len())
        );

        Ok(StreamPayload {
            latlng: streams.latlng.map(|s| s.data),
            time: streams.time.map(|s| s.data),
            altitude: streams.altitude.map(|s| s.data),
        })
    }

    async fn list_activities(
        &self,
        access_token: &str,
        per_page: u32,
        page: u32,
    ) -> Result<Vec<RemoteActivity>, FetchError> {
        self.get_json(
            access_token,
            "athlete/activities",
            &[
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }
}
