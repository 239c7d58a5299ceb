use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::integrations::strava::StravaClient;
use crate::integrations::StreamSource;
use crate::store::activities::ActivityStore;
use crate::store::features::FeatureStore;
use crate::store::labels::LabelStore;
use crate::store::locks::WriteGates;
use crate::store::tracks::TrackStore;
use crate::store::FeatureSnapshotStore;
use crate::types::activity::{Activity, ActivityId};

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pub activities: ActivityStore,
    pub tracks: TrackStore,
    pub features: FeatureStore,
    pub labels: LabelStore,
    pub gates: WriteGates,
    streams: Arc<dyn StreamSource>,
}

impl AppState {
    /// Builds state backed by the Strava client from `config`.
    pub fn new(config: Config) -> Self {
        let source: Arc<dyn StreamSource> =
            match StravaClient::new(config.strava_api_base.clone(), config.strava_timeout) {
                Ok(client) => Arc::new(client),
                Err(err) => {
                    tracing::warn!("Falling back to default HTTP client settings: {}", err);
                    Arc::new(StravaClient::with_defaults(config.strava_api_base.clone()))
                }
            };
        Self::with_stream_source(config, source)
    }

    pub fn with_stream_source(config: Config, streams: Arc<dyn StreamSource>) -> Self {
        Self {
            config: Arc::new(config),
            activities: ActivityStore::new(),
            tracks: TrackStore::new(),
            features: FeatureStore::new(),
            labels: LabelStore::new(),
            gates: WriteGates::new(),
            streams,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stream_source(&self) -> &dyn StreamSource {
        self.streams.as_ref()
    }

    pub fn activity(&self, activity_id: ActivityId) -> Result<Activity, AppError> {
        self.activities
            .get(activity_id)
            .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", activity_id)))
    }

    /// Removes the activity together with everything it owns and retires its write gate, so a
    /// write racing the delete cannot bring points or snapshots back.
    pub fn delete_activity(&self, activity_id: ActivityId) -> Option<Activity> {
        let removed = self.gates.retire(activity_id, || {
            let removed = self.activities.remove(activity_id)?;
            self.tracks.remove(activity_id);
            self.features.clear_features(activity_id);
            self.labels.remove(activity_id);
            Some(removed)
        });
        if removed.is_some() {
            tracing::info!("Deleted activity {} and its derived data", activity_id);
        }
        removed
    }
}
