use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppError;
use crate::pipeline::{features, ingest};
use crate::routes::bearer_token;
use crate::state::AppState;
use crate::types::activity::{Activity, ActivityId, RawTelemetryPoint, StreamPayload};
use crate::types::features::{FeatureDocument, FeatureVersion};
use crate::types::quality::{QualityMetricSnapshot, QualityThresholds};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/activities/:activity_id/ingest_streams",
            post(ingest_remote_streams),
        )
        .route(
            "/api/activities/:activity_id/streams",
            put(ingest_uploaded_streams),
        )
        .route("/api/activities/:activity_id/track", get(track))
        .route("/api/activities/:activity_id/points.geojson", get(points_geojson))
        .route("/api/activities/:activity_id/quality", get(quality))
        .route(
            "/api/activities/:activity_id/quality/recompute",
            post(recompute_quality),
        )
        .route("/api/activities/:activity_id/features", get(activity_features))
}

#[derive(Serialize, Deserialize)]
struct IngestResponse {
    ok: bool,
    points: usize,
}

async fn ingest_remote_streams(
    State(state): State<AppState>,
    Path(activity_id): Path<ActivityId>,
    headers: HeaderMap,
) -> Result<Json<IngestResponse>, AppError> {
    let activity = state.activity(activity_id)?;
    let access_token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("Missing Strava Bearer token".to_string()))?;
    let remote_id = activity.strava_activity_id.ok_or_else(|| {
        AppError::BadRequest(format!("Activity {} has no upstream id", activity_id))
    })?;

    let payload = state
        .stream_source()
        .fetch_streams(&access_token, remote_id)
        .await?;

    run_ingest(&state, activity_id, &payload)
}

async fn ingest_uploaded_streams(
    State(state): State<AppState>,
    Path(activity_id): Path<ActivityId>,
    Json(payload): Json<StreamPayload>,
) -> Result<Json<IngestResponse>, AppError> {
    state.activity(activity_id)?;
    run_ingest(&state, activity_id, &payload)
}

fn run_ingest(
    state: &AppState,
    activity_id: ActivityId,
    payload: &StreamPayload,
) -> Result<Json<IngestResponse>, AppError> {
    let outcome = ingest::ingest(
        &state.tracks,
        &state.features,
        &state.gates,
        activity_id,
        payload,
        &state.config().thresholds,
    )?;
    Ok(Json(IngestResponse {
        ok: true,
        points: outcome.point_count,
    }))
}

fn track_properties(activity: &Activity, point_count: usize) -> Value {
    json!({
        "activity_id": activity.id,
        "name": activity.name,
        "sport_type": activity.sport_type,
        "point_count": point_count,
        "start_date": activity.start_date,
    })
}

fn stored_points(
    state: &AppState,
    activity_id: ActivityId,
) -> Result<Arc<Vec<RawTelemetryPoint>>, AppError> {
    state
        .tracks
        .track(activity_id)
        .map(|record| record.points)
        .filter(|points| !points.is_empty())
        .ok_or_else(|| AppError::NotFound("No points found. Ingest streams first.".to_string()))
}

async fn track(
    State(state): State<AppState>,
    Path(activity_id): Path<ActivityId>,
) -> Result<Json<Value>, AppError> {
    let activity = state.activity(activity_id)?;
    let points = stored_points(&state, activity_id)?;

    let coordinates: Vec<[f64; 2]> = points.iter().map(|p| [p.longitude, p.latitude]).collect();

    Ok(Json(json!({
        "type": "Feature",
        "geometry": {
            "type": "LineString",
            "coordinates": coordinates,
        },
        "properties": track_properties(&activity, points.len()),
    })))
}

async fn points_geojson(
    State(state): State<AppState>,
    Path(activity_id): Path<ActivityId>,
) -> Result<Json<Value>, AppError> {
    let activity = state.activity(activity_id)?;
    let points = stored_points(&state, activity_id)?;

    let features: Vec<Value> = points
        .iter()
        .map(|p| {
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [p.longitude, p.latitude]},
                "properties": {
                    "activity_id": activity_id,
                    "seq": p.sequence,
                    "time_s": p.elapsed_seconds,
                    "ele_m": p.elevation_m,
                },
            })
        })
        .collect();

    Ok(Json(json!({
        "type": "FeatureCollection",
        "features": features,
        "properties": track_properties(&activity, points.len()),
    })))
}

fn quality_payload(activity: &Activity, metric: &QualityMetricSnapshot) -> Value {
    let report = &metric.report;
    json!({
        "activity_id": activity.id,
        "name": activity.name,
        "sport_type": activity.sport_type,
        "point_count": report.point_count,
        "duration_s": report.duration_s,
        "distance_m_gps": report.distance_m,
        "max_speed_mps": report.max_speed_mps,
        "max_speed_kmh": report.max_speed_mps * 3.6,
        "spike_count": report.spike_count,
        "stopped_time_s": report.stopped_time_s,
        "stop_segments": report.stop_segments,
        "jitter_score": report.jitter_score,
        "computed_at": metric.computed_at,
        "notes": metric.thresholds,
    })
}

async fn quality(
    State(state): State<AppState>,
    Path(activity_id): Path<ActivityId>,
) -> Result<Json<Value>, AppError> {
    let activity = state.activity(activity_id)?;
    let metric = ingest::get_or_compute_quality(
        &state.tracks,
        &state.gates,
        activity_id,
        &state.config().thresholds,
    )?;
    Ok(Json(quality_payload(&activity, &metric)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThresholdOverrides {
    spike_speed_threshold_mps: Option<f64>,
    stop_speed_threshold_mps: Option<f64>,
    stop_min_duration_s: Option<i64>,
}

impl ThresholdOverrides {
    /// An empty body keeps every default; anything else must be a valid overrides object.
    fn parse(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|err| AppError::BadRequest(format!("Invalid threshold overrides: {}", err)))
    }

    fn apply(self, base: QualityThresholds) -> QualityThresholds {
        QualityThresholds {
            spike_speed_threshold_mps: self
                .spike_speed_threshold_mps
                .unwrap_or(base.spike_speed_threshold_mps),
            stop_speed_threshold_mps: self
                .stop_speed_threshold_mps
                .unwrap_or(base.stop_speed_threshold_mps),
            stop_min_duration_s: self.stop_min_duration_s.unwrap_or(base.stop_min_duration_s),
        }
    }
}

async fn recompute_quality(
    State(state): State<AppState>,
    Path(activity_id): Path<ActivityId>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let activity = state.activity(activity_id)?;
    let thresholds = ThresholdOverrides::parse(&body)?.apply(state.config().thresholds);
    thresholds.validate().map_err(AppError::BadRequest)?;

    let metric = ingest::recompute_from_points(
        &state.tracks,
        &state.features,
        &state.gates,
        activity_id,
        &thresholds,
    )?;
    Ok(Json(quality_payload(&activity, &metric)))
}

#[derive(Deserialize)]
struct FeaturesQuery {
    version: Option<FeatureVersion>,
    #[serde(default = "default_persist")]
    persist: bool,
}

fn default_persist() -> bool {
    true
}

async fn activity_features(
    State(state): State<AppState>,
    Path(activity_id): Path<ActivityId>,
    Query(params): Query<FeaturesQuery>,
) -> Result<Json<FeatureDocument>, AppError> {
    let activity = state.activity(activity_id)?;
    let version = params.version.unwrap_or(state.config().feature_version);
    let document = features::build_activity_features(&state, &activity, version, params.persist)?;
    Ok(Json(document))
}
