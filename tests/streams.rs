use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use track_quality_rs::{
    config::Config,
    error::FetchError,
    integrations::{RemoteActivity, StreamSource},
    routes,
    state::AppState,
    store::{FeatureSnapshotStore, PointStore, QualitySnapshotStore},
    types::activity::StreamPayload,
};

struct FakeStravaSource {
    streams: StreamPayload,
}

#[async_trait]
impl StreamSource for FakeStravaSource {
    async fn fetch_streams(
        &self,
        _access_token: &str,
        _remote_activity_id: u64,
    ) -> Result<StreamPayload, FetchError> {
        Ok(self.streams.clone())
    }

    async fn list_activities(
        &self,
        _access_token: &str,
        _per_page: u32,
        _page: u32,
    ) -> Result<Vec<RemoteActivity>, FetchError> {
        Ok(Vec::new())
    }
}

fn fixture_streams() -> StreamPayload {
    StreamPayload {
        latlng: Some(vec![[52.52, 13.405], [52.5201, 13.4052], [52.5203, 13.4055]]),
        time: Some(vec![0, 5, 10]),
        altitude: Some(vec![Some(34.0), Some(35.0), Some(36.0)]),
    }
}

fn app_with(streams: StreamPayload) -> (Router, AppState) {
    let state = AppState::with_stream_source(
        Config::from_env(),
        Arc::new(FakeStravaSource { streams }),
    );
    (routes::router().with_state(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .uri(uri)
        .method(method)
        .header("authorization", "Bearer access-token");
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn send_raw(app: &Router, uri: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .uri(uri)
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn seed_activity(app: &Router) -> u64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/activities",
        Some(json!({
            "strava_activity_id": 999111,
            "name": "Fixture Run",
            "sport_type": "Run",
            "distance_m": 50.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_u64().expect("activity id")
}

#[tokio::test]
async fn ingest_streams_persists_points_and_quality() {
    let (app, state) = app_with(fixture_streams());
    let id = seed_activity(&app).await;

    let (status, body) = send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"], 3);

    let track = state.tracks.track(id).expect("track");
    assert_eq!(track.points.len(), 3);
    assert_eq!(track.quality.expect("quality").report.point_count, 3);
}

#[tokio::test]
async fn ingest_without_required_streams_is_rejected() {
    let (app, state) = app_with(StreamPayload {
        latlng: Some(vec![[0.0, 0.0]]),
        time: None,
        altitude: None,
    });
    let id = seed_activity(&app).await;

    let (status, body) = send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or("").contains("time"));
    assert!(state.tracks.points(id).is_empty());
}

#[tokio::test]
async fn ingest_for_unknown_activity_returns_not_found() {
    let (app, _) = app_with(fixture_streams());
    let (status, _) = send(&app, "POST", "/api/activities/404/ingest_streams", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uploaded_streams_are_ingested() {
    let (app, _) = app_with(StreamPayload::default());
    let id = seed_activity(&app).await;

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/activities/{id}/streams"),
        Some(json!({
            "latlng": [[0.0, 0.0], [0.0, 0.0], [0.001, 0.0], [0.001, 0.0]],
            "time": [0, 15, 20, 35]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["points"], 4);

    let (status, quality) = send(&app, "GET", &format!("/api/activities/{id}/quality"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quality["spike_count"], 1);
    assert_eq!(quality["stop_segments"], 2);
    assert_eq!(quality["stopped_time_s"], 30);
    assert_eq!(quality["notes"]["stop_min_duration_s"], 10);
}

#[tokio::test]
async fn track_endpoint_returns_geojson_linestring() {
    let (app, _) = app_with(fixture_streams());
    let id = seed_activity(&app).await;
    send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;

    let (status, body) = send(&app, "GET", &format!("/api/activities/{id}/track"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Feature");
    assert_eq!(body["geometry"]["type"], "LineString");
    assert_eq!(body["geometry"]["coordinates"].as_array().map(Vec::len), Some(3));
    assert_eq!(body["geometry"]["coordinates"][0], json!([13.405, 52.52]));
    assert_eq!(body["properties"]["point_count"], 3);
}

#[tokio::test]
async fn points_geojson_lists_every_point_in_order() {
    let (app, _) = app_with(fixture_streams());
    let id = seed_activity(&app).await;
    send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;

    let (status, body) = send(&app, "GET", &format!("/api/activities/{id}/points.geojson"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");
    let features = body["features"].as_array().expect("features");
    assert_eq!(features.len(), 3);
    assert_eq!(features[2]["properties"]["seq"], 2);
    assert_eq!(features[2]["properties"]["time_s"], 10);
    assert_eq!(features[2]["properties"]["ele_m"], 36);
}

#[tokio::test]
async fn track_without_points_returns_not_found() {
    let (app, _) = app_with(fixture_streams());
    let id = seed_activity(&app).await;

    let (status, _) = send(&app, "GET", &format!("/api/activities/{id}/track"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn quality_uses_persisted_metrics_when_points_are_missing() {
    let (app, state) = app_with(fixture_streams());
    let id = seed_activity(&app).await;
    send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;

    let quality = state.tracks.get_quality(id).expect("quality");
    state.tracks.replace_track(id, Vec::new(), quality);

    let (status, body) = send(&app, "GET", &format!("/api/activities/{id}/quality"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activity_id"], id);
    assert_eq!(body["point_count"], 3);
    assert!(body["computed_at"].is_string());
}

#[tokio::test]
async fn quality_without_points_reports_not_enough_data() {
    let (app, _) = app_with(fixture_streams());
    let id = seed_activity(&app).await;

    let (status, body) = send(&app, "GET", &format!("/api/activities/{id}/quality"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap_or("").contains("Not enough points"));
}

#[tokio::test]
async fn recompute_applies_threshold_overrides() {
    let (app, _) = app_with(fixture_streams());
    let id = seed_activity(&app).await;
    send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/activities/{id}/quality/recompute"),
        Some(json!({"spike_speed_threshold_mps": 1.0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["spike_count"], 2);
    assert_eq!(body["notes"]["spike_speed_threshold_mps"], 1.0);
    assert_eq!(body["notes"]["stop_speed_threshold_mps"], 0.6);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/activities/{id}/quality/recompute"),
        Some(json!({"stop_min_duration_s": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn features_are_persisted_per_version() {
    let (app, state) = app_with(fixture_streams());
    let id = seed_activity(&app).await;
    send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;

    let (status, v1) = send(&app, "GET", &format!("/api/activities/{id}/features"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v1["feature_version"], 1);
    assert_eq!(v1["strava_activity_id"], 999111);
    assert_eq!(v1["metadata"]["name"], "Fixture Run");
    assert!(v1["features"]["points_per_km"].is_number());
    assert!(v1["features"]["distance_ratio_gps_vs_official"].is_number());

    let (status, v2) = send(&app, "GET", &format!("/api/activities/{id}/features?version=2"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v2["feature_version"], 2);

    assert_eq!(state.features.get_features(id, 1).expect("v1").feature_version, 1);
    assert_eq!(state.features.get_features(id, 2).expect("v2").feature_version, 2);

    send(&app, "GET", &format!("/api/activities/{id}/features"), None).await;
    assert_eq!(state.features.len(), 2);
}

#[tokio::test]
async fn features_without_persist_leave_store_untouched() {
    let (app, state) = app_with(fixture_streams());
    let id = seed_activity(&app).await;
    send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;

    let (status, _) = send(&app, "GET", &format!("/api/activities/{id}/features?persist=false"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.features.is_empty());
}

#[tokio::test]
async fn deleting_activity_removes_owned_data() {
    let (app, state) = app_with(fixture_streams());
    let id = seed_activity(&app).await;
    send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;
    send(&app, "GET", &format!("/api/activities/{id}/features"), None).await;

    let (status, _) = send(&app, "DELETE", &format!("/api/activities/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.tracks.track(id).is_none());
    assert!(state.features.is_empty());

    let (status, _) = send(&app, "GET", &format!("/api/activities/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recompute_rejects_malformed_overrides() {
    let (app, state) = app_with(fixture_streams());
    let id = seed_activity(&app).await;
    send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;
    let before = state.tracks.get_quality(id).expect("quality");
    let uri = format!("/api/activities/{id}/quality/recompute");

    for body in [
        r#"{"spike_speed_threshold_mps": "fast"}"#,
        r#"{"spike_threshold": 1.0}"#,
        "not json",
    ] {
        let (status, response) = send_raw(&app, &uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
        assert!(response["error"]
            .as_str()
            .unwrap_or("")
            .contains("Invalid threshold overrides"));
    }
    assert_eq!(state.tracks.get_quality(id).expect("quality"), before);

    let (status, response) = send_raw(&app, &uri, "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["notes"]["spike_speed_threshold_mps"], 12.0);
}

#[tokio::test]
async fn reingest_drops_persisted_features() {
    let (app, state) = app_with(fixture_streams());
    let id = seed_activity(&app).await;
    send(&app, "POST", &format!("/api/activities/{id}/ingest_streams"), None).await;
    send(&app, "GET", &format!("/api/activities/{id}/features"), None).await;
    assert!(state.features.get_features(id, 1).is_some());

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/activities/{id}/streams"),
        Some(json!({"latlng": [[0.0, 0.0], [0.0001, 0.0]], "time": [0, 5]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(state.features.get_features(id, 1).is_none());

    let (status, rebuilt) = send(&app, "GET", &format!("/api/activities/{id}/features"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rebuilt["features"]["point_count"], 2);
    assert_eq!(
        state.features.get_features(id, 1).expect("rebuilt").payload.features.point_count,
        2
    );
}
