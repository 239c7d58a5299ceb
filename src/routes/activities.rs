use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::integrations::RemoteActivity;
use crate::routes::bearer_token;
use crate::state::AppState;
use crate::types::activity::{Activity, ActivityId, ActivityInput};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/activities", get(list_activities).post(create_activity))
        .route(
            "/api/activities/:activity_id",
            get(get_activity).delete(delete_activity),
        )
        .route("/api/sync/activities", post(sync_activities))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default = "default_list_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_list_limit() -> usize {
    20
}

async fn list_activities(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Json<Vec<Activity>> {
    Json(state.activities.list(params.limit, params.offset))
}

async fn create_activity(
    State(state): State<AppState>,
    Json(input): Json<ActivityInput>,
) -> Json<Activity> {
    let activity = state.activities.upsert(input);
    tracing::info!("Registered activity {}", activity.id);
    Json(activity)
}

async fn get_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<ActivityId>,
) -> Result<Json<Activity>, AppError> {
    Ok(Json(state.activity(activity_id)?))
}

async fn delete_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<ActivityId>,
) -> Result<Json<Activity>, AppError> {
    state
        .delete_activity(activity_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", activity_id)))
}

#[derive(Deserialize)]
struct SyncQuery {
    #[serde(default = "default_per_page")]
    per_page: u32,
    sport_type: Option<String>,
    name_contains: Option<String>,
}

fn default_per_page() -> u32 {
    30
}

#[derive(Serialize)]
struct SyncResponse {
    ok: bool,
    count: usize,
}

async fn sync_activities(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SyncQuery>,
) -> Result<Json<SyncResponse>, AppError> {
    let access_token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized("Missing Strava Bearer token".to_string()))?;

    let remote = state
        .stream_source()
        .list_activities(&access_token, params.per_page, 1)
        .await?;

    let sport_filter = params.sport_type.map(|s| s.to_lowercase());
    let name_filter = params.name_contains.map(|s| s.to_lowercase());

    let mut count = 0;
    for item in remote {
        let name = item.name.clone().unwrap_or_default();
        let sport = item
            .sport_type
            .clone()
            .or_else(|| item.activity_type.clone())
            .unwrap_or_default();

        if sport_filter.as_deref().is_some_and(|f| sport.to_lowercase() != f) {
            continue;
        }
        if name_filter
            .as_deref()
            .is_some_and(|f| !name.to_lowercase().contains(f))
        {
            continue;
        }

        state.activities.upsert(remote_to_input(item, name, sport));
        count += 1;
    }

    tracing::info!("Synced {} activities from upstream", count);
    Ok(Json(SyncResponse { ok: true, count }))
}

fn remote_to_input(item: RemoteActivity, name: String, sport: String) -> ActivityInput {
    ActivityInput {
        strava_activity_id: Some(item.id),
        name: Some(name).filter(|s| !s.is_empty()),
        sport_type: Some(sport).filter(|s| !s.is_empty()),
        start_date: item
            .start_date
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc)),
        distance_m: item.distance,
        moving_time_s: item.moving_time,
        elevation_gain_m: item.total_elevation_gain,
    }
}
