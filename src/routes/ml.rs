use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::pipeline::features;
use crate::state::AppState;
use crate::types::activity::ActivityId;
use crate::types::features::FeatureVersion;
use crate::types::label::{LabelFilter, LabelInput, QualityLabel};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ml/activities/:activity_id/label", post(upsert_label))
        .route("/api/ml/labels", get(list_labels))
        .route("/api/ml/features/rebuild", post(rebuild_features))
}

async fn upsert_label(
    State(state): State<AppState>,
    Path(activity_id): Path<ActivityId>,
    Json(input): Json<LabelInput>,
) -> Result<Json<QualityLabel>, AppError> {
    state.activity(activity_id)?;
    input.validate().map_err(AppError::BadRequest)?;

    let label = state.labels.upsert(activity_id, input);
    tracing::info!(
        "Labeled activity {} as {} ({})",
        activity_id,
        if label.label_bad { "bad" } else { "good" },
        label.label_source
    );
    Ok(Json(label))
}

#[derive(Deserialize)]
struct LabelsQuery {
    label_bad: Option<bool>,
    label_source: Option<String>,
    activity_id: Option<ActivityId>,
    #[serde(default = "default_label_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_label_limit() -> usize {
    100
}

async fn list_labels(
    State(state): State<AppState>,
    Query(params): Query<LabelsQuery>,
) -> Result<Json<Vec<QualityLabel>>, AppError> {
    if !(1..=1000).contains(&params.limit) {
        return Err(AppError::BadRequest(
            "limit must be between 1 and 1000".to_string(),
        ));
    }
    let filter = LabelFilter {
        label_bad: params.label_bad,
        label_source: params.label_source,
        activity_id: params.activity_id,
    };
    Ok(Json(state.labels.list(&filter, params.limit, params.offset)))
}

#[derive(Deserialize)]
struct RebuildQuery {
    #[serde(default = "default_labeled_only")]
    labeled_only: bool,
    limit: Option<usize>,
    #[serde(default)]
    offset: usize,
    version: Option<FeatureVersion>,
}

fn default_labeled_only() -> bool {
    true
}

#[derive(Serialize, Deserialize)]
struct RebuildResponse {
    ok: bool,
    feature_version: FeatureVersion,
    labeled_only: bool,
    selected: usize,
    rebuilt: usize,
    skipped: usize,
    skipped_activity_ids: Vec<ActivityId>,
    snapshots_in_store: usize,
}

async fn rebuild_features(
    State(state): State<AppState>,
    Query(params): Query<RebuildQuery>,
) -> Result<Json<RebuildResponse>, AppError> {
    if params.limit.is_some_and(|limit| !(1..=5000).contains(&limit)) {
        return Err(AppError::BadRequest(
            "limit must be between 1 and 5000".to_string(),
        ));
    }
    let version = params.version.unwrap_or(state.config().feature_version);

    let selected: Vec<ActivityId> = state
        .activities
        .ids()
        .into_iter()
        .filter(|id| !params.labeled_only || state.labels.is_labeled(*id))
        .skip(params.offset)
        .take(params.limit.unwrap_or(usize::MAX))
        .collect();

    let worker_state = state.clone();
    let ids = selected.clone();
    let summary = tokio::task::spawn_blocking(move || {
        features::rebuild_features(&worker_state, &ids, version)
    })
    .await
    .map_err(|err| AppError::Internal(format!("Feature rebuild task failed: {}", err)))?;

    Ok(Json(RebuildResponse {
        ok: true,
        feature_version: version,
        labeled_only: params.labeled_only,
        selected: selected.len(),
        rebuilt: summary.rebuilt,
        skipped: summary.skipped_activity_ids.len(),
        skipped_activity_ids: summary.skipped_activity_ids,
        snapshots_in_store: state.features.len(),
    }))
}
